mod helpers;
mod post;
mod scene;
mod targets;

use crate::canvas2d::CanvasSurface;
use crate::constants::{BLOOM_STRENGTH, BLOOM_THRESHOLD};
use hall_core::Hall;
use post::{PostBindGroups, PostResources, PostUniforms};
use scene::SceneRenderer;
use targets::RenderTargets;
use web_sys as web;

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    targets: RenderTargets,
    linear_sampler: wgpu::Sampler,
    post: PostResources,
    post_groups: PostBindGroups,
    scene: SceneRenderer,
    width: u32,
    height: u32,
    time_accum: f32,
}

impl GpuState {
    pub async fn new(canvas: &web::HtmlCanvasElement) -> anyhow::Result<Self> {
        let width = canvas.width().max(1);
        let height = canvas.height().max(1);

        let instance = wgpu::Instance::default();
        // the surface owns its own handle to the canvas element
        let surface = instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No WebGPU adapter"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    // Use default limits on web to avoid passing unknown fields to older WebGPU impls
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: Some("hall_device"),
                },
                None,
            )
            .await
            .map_err(|e| anyhow::anyhow!("request_device error: {:?}", e))?;
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| {
                matches!(
                    f,
                    wgpu::TextureFormat::Bgra8UnormSrgb | wgpu::TextureFormat::Rgba8UnormSrgb
                )
            })
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("surface reports no formats"))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let targets = RenderTargets::new(&device, width, height);
        let linear_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("linear_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let post_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("post_shader"),
            source: wgpu::ShaderSource::Wgsl(hall_core::POST_WGSL.into()),
        });
        let post = post::create_post_resources(&device, &post_shader, format);
        let post_groups = post.bind_groups(&device, &targets, &linear_sampler);
        let scene = SceneRenderer::new(&device, &queue);
        log::info!("[gpu] WebGPU ready: {width}x{height} {:?}", format);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            targets,
            linear_sampler,
            post,
            post_groups,
            scene,
            width,
            height,
            time_accum: 0.0,
        })
    }

    pub fn resize_if_needed(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.targets.recreate(&self.device, width, height);
            self.post_groups = self
                .post
                .bind_groups(&self.device, &self.targets, &self.linear_sampler);
        }
    }

    /// Draw one frame of `hall`: scene into HDR, then the bloom chain onto
    /// the swapchain.
    pub fn render(&mut self, hall: &mut Hall<CanvasSurface>, dt: f32) -> Result<(), wgpu::SurfaceError> {
        self.time_accum += dt;
        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("encoder"),
            });

        let camera = hall.camera();
        self.scene.render(
            &self.device,
            &self.queue,
            &mut encoder,
            &self.targets.hdr_view,
            &self.targets.depth_view,
            hall.scene_mut(),
            &camera,
        );

        let moving = if hall.navigation().is_moving() { 1.0 } else { 0.0 };
        self.post.write_uniforms(
            &self.queue,
            self.width,
            self.height,
            PostUniforms {
                resolution: [self.width as f32, self.height as f32],
                time: self.time_accum,
                motion: moving,
                blur_dir: [0.0, 0.0],
                bloom_strength: BLOOM_STRENGTH,
                threshold: BLOOM_THRESHOLD,
            },
        );
        self.post
            .encode(&mut encoder, &self.targets, &self.post_groups, &view);

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    /// Reconfigure after the surface reports `Lost` or `Outdated`.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }
}

impl Drop for GpuState {
    fn drop(&mut self) {
        self.scene.release_all();
        self.targets.destroy();
        self.device.destroy();
        log::info!("[gpu] GPU resources released");
    }
}
