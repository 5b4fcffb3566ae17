//! Bloom chain: bright pass into `bloom_a`, horizontal blur into `bloom_b`,
//! vertical blur back into `bloom_a`, then composite onto the swapchain.

use super::helpers;
use super::targets::{bloom_size, RenderTargets};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct PostUniforms {
    pub(crate) resolution: [f32; 2],
    pub(crate) time: f32,
    /// 1 while the camera is moving, else 0.
    pub(crate) motion: f32,
    pub(crate) blur_dir: [f32; 2],
    pub(crate) bloom_strength: f32,
    pub(crate) threshold: f32,
}

/// One uniform buffer per pass; queue writes land before the whole encoder
/// runs, so passes cannot share one.
pub(crate) struct PostUniformBuffers {
    pub(crate) main: wgpu::Buffer,
    pub(crate) blur_h: wgpu::Buffer,
    pub(crate) blur_v: wgpu::Buffer,
}

pub(crate) struct PostResources {
    pub(crate) bgl0: wgpu::BindGroupLayout, // tex+sampler+uniform
    pub(crate) bgl1: wgpu::BindGroupLayout, // tex+sampler
    pub(crate) uniforms: PostUniformBuffers,
    pub(crate) bright_pipeline: wgpu::RenderPipeline,
    pub(crate) blur_pipeline: wgpu::RenderPipeline,
    pub(crate) composite_pipeline: wgpu::RenderPipeline,
}

pub(crate) struct PostBindGroups {
    pub(crate) hdr: wgpu::BindGroup,
    pub(crate) from_bloom_a: wgpu::BindGroup,
    pub(crate) from_bloom_b: wgpu::BindGroup,
    pub(crate) bloom_a_only: wgpu::BindGroup,
}

fn uniform_buffer(device: &wgpu::Device, label: &str) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: std::mem::size_of::<PostUniforms>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

pub(crate) fn create_post_resources(
    device: &wgpu::Device,
    post_shader: &wgpu::ShaderModule,
    swap_format: wgpu::TextureFormat,
) -> PostResources {
    let bgl0 = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("post_bgl0"),
        entries: &[
            helpers::texture_entry(0),
            helpers::sampler_entry(1),
            helpers::uniform_entry(2, wgpu::ShaderStages::FRAGMENT, false),
        ],
    });
    let bgl1 = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("post_bgl1"),
        entries: &[helpers::texture_entry(0), helpers::sampler_entry(1)],
    });
    let uniforms = PostUniformBuffers {
        main: uniform_buffer(device, "post_uniforms"),
        blur_h: uniform_buffer(device, "post_uniforms_blur_h"),
        blur_v: uniform_buffer(device, "post_uniforms_blur_v"),
    };
    let pl_bright_blur = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("pl_post_0"),
        bind_group_layouts: &[&bgl0],
        push_constant_ranges: &[],
    });
    let pl_composite = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("pl_post_comp"),
        bind_group_layouts: &[&bgl0, &bgl1],
        push_constant_ranges: &[],
    });
    let bright_pipeline = helpers::make_post_pipeline(
        device,
        &pl_bright_blur,
        post_shader,
        "fs_bright",
        helpers::HDR_FORMAT,
        None,
    );
    let blur_pipeline = helpers::make_post_pipeline(
        device,
        &pl_bright_blur,
        post_shader,
        "fs_blur",
        helpers::HDR_FORMAT,
        None,
    );
    let composite_pipeline = helpers::make_post_pipeline(
        device,
        &pl_composite,
        post_shader,
        "fs_composite",
        swap_format,
        Some(wgpu::BlendState::REPLACE),
    );

    PostResources {
        bgl0,
        bgl1,
        uniforms,
        bright_pipeline,
        blur_pipeline,
        composite_pipeline,
    }
}

impl PostResources {
    /// Bind groups reference target views, so they are rebuilt on resize.
    pub(crate) fn bind_groups(
        &self,
        device: &wgpu::Device,
        targets: &RenderTargets,
        sampler: &wgpu::Sampler,
    ) -> PostBindGroups {
        let source = |label: &str, view: &wgpu::TextureView, uniforms: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &self.bgl0,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: uniforms.as_entire_binding(),
                    },
                ],
            })
        };
        PostBindGroups {
            hdr: source("bg_hdr", &targets.hdr_view, &self.uniforms.main),
            from_bloom_a: source("bg_from_bloom_a", &targets.bloom_a_view, &self.uniforms.blur_h),
            from_bloom_b: source("bg_from_bloom_b", &targets.bloom_b_view, &self.uniforms.blur_v),
            bloom_a_only: device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("bg_bloom_a_only"),
                layout: &self.bgl1,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&targets.bloom_a_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
            }),
        }
    }

    pub(crate) fn write_uniforms(&self, queue: &wgpu::Queue, width: u32, height: u32, base: PostUniforms) {
        let (bw, bh) = bloom_size(width, height);
        let bloom_res = [bw as f32, bh as f32];
        let main = PostUniforms {
            resolution: [width as f32, height as f32],
            blur_dir: [0.0, 0.0],
            ..base
        };
        let blur_h = PostUniforms {
            resolution: bloom_res,
            blur_dir: [1.0, 0.0],
            ..base
        };
        let blur_v = PostUniforms {
            resolution: bloom_res,
            blur_dir: [0.0, 1.0],
            ..base
        };
        queue.write_buffer(&self.uniforms.main, 0, bytemuck::bytes_of(&main));
        queue.write_buffer(&self.uniforms.blur_h, 0, bytemuck::bytes_of(&blur_h));
        queue.write_buffer(&self.uniforms.blur_v, 0, bytemuck::bytes_of(&blur_v));
    }

    /// Encode the bloom chain and the composite into `surface_view`.
    pub(crate) fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        targets: &RenderTargets,
        groups: &PostBindGroups,
        surface_view: &wgpu::TextureView,
    ) {
        blit(
            encoder,
            "bright_pass",
            &targets.bloom_a_view,
            wgpu::Color::BLACK,
            &self.bright_pipeline,
            &groups.hdr,
            None,
        );
        blit(
            encoder,
            "blur_h",
            &targets.bloom_b_view,
            wgpu::Color::BLACK,
            &self.blur_pipeline,
            &groups.from_bloom_a,
            None,
        );
        blit(
            encoder,
            "blur_v",
            &targets.bloom_a_view,
            wgpu::Color::BLACK,
            &self.blur_pipeline,
            &groups.from_bloom_b,
            None,
        );
        blit(
            encoder,
            "composite",
            surface_view,
            wgpu::Color::BLACK,
            &self.composite_pipeline,
            &groups.hdr,
            Some(&groups.bloom_a_only),
        );
    }
}

pub(crate) fn blit(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    clear: wgpu::Color,
    pipeline: &wgpu::RenderPipeline,
    bg0: &wgpu::BindGroup,
    bg1: Option<&wgpu::BindGroup>,
) {
    let mut r = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    r.set_pipeline(pipeline);
    r.set_bind_group(0, bg0, &[]);
    if let Some(g1) = bg1 {
        r.set_bind_group(1, g1, &[]);
    }
    r.draw(0..3, 0..1);
}
