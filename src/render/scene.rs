//! Scene pass: draws the hall's scene graph into the HDR target.
//!
//! GPU resources mirror the scene graph by id. Geometry uploads once,
//! textures re-upload whenever their version moves, and anything the hall
//! releases is destroyed on the next frame.

use super::helpers;
use crate::canvas2d::CanvasSurface;
use crate::constants::{DRAW_UNIFORM_STRIDE, INITIAL_DRAW_CAPACITY, MAX_LIGHTS, MIN_POINT_CAPACITY};
use fnv::FnvHashMap;
use glam::{Mat4, Vec3};
use hall_core::geometry::{MeshData, Vertex};
use hall_core::scene::{BlendMode, GeometryId, Material, NodeId, NodeKind, ResourceId, SceneGraph, TextureId};
use hall_core::{Camera, Surface2d};
use smallvec::SmallVec;
use std::num::NonZeroU64;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Default, bytemuck::Pod, bytemuck::Zeroable)]
struct LightPacked {
    pos_range: [f32; 4],
    color_intensity: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Globals {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    camera_right: [f32; 4],
    camera_up: [f32; 4],
    ambient: [f32; 4],
    lights: [LightPacked; MAX_LIGHTS],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct DrawUniforms {
    model: [[f32; 4]; 4],
    color: [f32; 4],
    params: [f32; 4],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum DrawKind {
    Mesh,
    Sprite,
    Points,
}

struct GpuMesh {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

struct GpuTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    version: u64,
    size: (u32, u32),
}

struct PointBuffer {
    buffer: wgpu::Buffer,
    capacity: u64,
    count: u32,
}

struct DrawItem {
    kind: DrawKind,
    blend: BlendMode,
    texture: Option<TextureId>,
    geometry: Option<GeometryId>,
    node: NodeId,
    depth: f32,
    uniforms: DrawUniforms,
}

pub(crate) struct SceneRenderer {
    pipelines: FnvHashMap<(DrawKind, BlendMode), wgpu::RenderPipeline>,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    draw_bgl: wgpu::BindGroupLayout,
    draw_buffer: wgpu::Buffer,
    draw_bind_group: wgpu::BindGroup,
    draw_capacity: u64,
    texture_bgl: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    white: GpuTexture,
    meshes: FnvHashMap<GeometryId, GpuMesh>,
    textures: FnvHashMap<TextureId, GpuTexture>,
    points: FnvHashMap<NodeId, PointBuffer>,
    staging: Vec<u8>,
}

fn draw_buffer(device: &wgpu::Device, capacity: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("draw_uniforms"),
        size: capacity * DRAW_UNIFORM_STRIDE,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn draw_bind_group(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, buffer: &wgpu::Buffer) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("draw_bg"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer,
                offset: 0,
                size: NonZeroU64::new(std::mem::size_of::<DrawUniforms>() as u64),
            }),
        }],
    })
}

fn texture_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("texture_bg"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn blend_state(blend: BlendMode) -> wgpu::BlendState {
    match blend {
        BlendMode::Opaque => wgpu::BlendState::REPLACE,
        BlendMode::Alpha => wgpu::BlendState::ALPHA_BLENDING,
        BlendMode::Additive => wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::Zero,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        },
    }
}

fn make_scene_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    kind: DrawKind,
    blend: BlendMode,
) -> wgpu::RenderPipeline {
    const MESH_ATTRS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];
    const POINT_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x4];
    let mesh_layout = [wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &MESH_ATTRS,
    }];
    let point_layout = [wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<[f32; 4]>() as u64,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &POINT_ATTRS,
    }];
    let (vs, fs, buffers): (&str, &str, &[wgpu::VertexBufferLayout]) = match kind {
        DrawKind::Mesh => ("vs_mesh", "fs_mesh", &mesh_layout),
        DrawKind::Sprite => ("vs_sprite", "fs_unlit", &[]),
        DrawKind::Points => ("vs_points", "fs_unlit", &point_layout),
    };
    let opaque = blend == BlendMode::Opaque;
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(vs),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some(vs),
            buffers,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            cull_mode: None,
            ..Default::default()
        },
        // translucent layers test against opaque depth but never write it
        depth_stencil: Some(wgpu::DepthStencilState {
            format: helpers::DEPTH_FORMAT,
            depth_write_enabled: opaque,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fs),
            targets: &[Some(wgpu::ColorTargetState {
                format: helpers::HDR_FORMAT,
                blend: Some(blend_state(blend)),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        cache: None,
        multiview: None,
    })
}

#[inline]
fn draw_uniforms(model: Mat4, material: &Material, extra: [f32; 3]) -> DrawUniforms {
    DrawUniforms {
        model: model.to_cols_array_2d(),
        color: material.color,
        params: [material.emissive, extra[0], extra[1], extra[2]],
    }
}

impl SceneRenderer {
    pub(crate) fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(hall_core::SCENE_WGSL.into()),
        });
        let both = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;
        let globals_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_globals_bgl"),
            entries: &[helpers::uniform_entry(0, both, false)],
        });
        let draw_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_draw_bgl"),
            entries: &[helpers::uniform_entry(0, both, true)],
        });
        let texture_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_texture_bgl"),
            entries: &[helpers::texture_entry(0), helpers::sampler_entry(1)],
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pl_scene"),
            bind_group_layouts: &[&globals_bgl, &draw_bgl, &texture_bgl],
            push_constant_ranges: &[],
        });

        let mut pipelines = FnvHashMap::default();
        for kind in [DrawKind::Mesh, DrawKind::Sprite, DrawKind::Points] {
            for blend in [BlendMode::Opaque, BlendMode::Alpha, BlendMode::Additive] {
                pipelines.insert(
                    (kind, blend),
                    make_scene_pipeline(device, &layout, &shader, kind, blend),
                );
            }
        }

        let globals_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene_globals"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_globals_bg"),
            layout: &globals_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });
        let draw_buffer = draw_buffer(device, INITIAL_DRAW_CAPACITY);
        let draw_bind_group = draw_bind_group(device, &draw_bgl, &draw_buffer);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("scene_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        // untextured materials sample a single white texel
        let white_tex = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("white_tex"),
                size: wgpu::Extent3d {
                    width: 1,
                    height: 1,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &[255, 255, 255, 255],
        );
        let white_view = white_tex.create_view(&wgpu::TextureViewDescriptor::default());
        let white = GpuTexture {
            bind_group: texture_bind_group(device, &texture_bgl, &white_view, &sampler),
            texture: white_tex,
            version: 0,
            size: (1, 1),
        };

        Self {
            pipelines,
            globals_buffer,
            globals_bind_group,
            draw_bgl,
            draw_buffer,
            draw_bind_group,
            draw_capacity: INITIAL_DRAW_CAPACITY,
            texture_bgl,
            sampler,
            white,
            meshes: FnvHashMap::default(),
            textures: FnvHashMap::default(),
            points: FnvHashMap::default(),
            staging: Vec::new(),
        }
    }

    fn destroy_released(&mut self, released: Vec<ResourceId>) {
        for id in released {
            match id {
                ResourceId::Geometry(g) => {
                    if let Some(mesh) = self.meshes.remove(&g) {
                        mesh.vertices.destroy();
                        mesh.indices.destroy();
                    }
                }
                ResourceId::Texture(t) => {
                    if let Some(tex) = self.textures.remove(&t) {
                        tex.texture.destroy();
                    }
                }
            }
        }
    }

    fn upload_mesh(device: &wgpu::Device, mesh: &MeshData) -> GpuMesh {
        GpuMesh {
            vertices: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_vertices"),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            indices: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_indices"),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            }),
            index_count: mesh.indices.len() as u32,
        }
    }

    fn sync_textures(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &SceneGraph<CanvasSurface>) {
        for (id, entry) in scene.textures() {
            if self.textures.get(&id).is_some_and(|t| t.version == entry.version) {
                continue;
            }
            let surface = &entry.payload;
            let size = (surface.width(), surface.height());
            if size.0 == 0 || size.1 == 0 {
                if let Some(stale) = self.textures.remove(&id) {
                    stale.texture.destroy();
                }
                continue;
            }
            let reuse = self.textures.get(&id).is_some_and(|t| t.size == size);
            if !reuse {
                let texture = device.create_texture(&wgpu::TextureDescriptor {
                    label: Some("canvas_tex"),
                    size: wgpu::Extent3d {
                        width: size.0,
                        height: size.1,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: wgpu::TextureFormat::Rgba8UnormSrgb,
                    usage: wgpu::TextureUsages::TEXTURE_BINDING
                        | wgpu::TextureUsages::COPY_DST
                        | wgpu::TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                });
                let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
                let bind_group = texture_bind_group(device, &self.texture_bgl, &view, &self.sampler);
                if let Some(old) = self.textures.insert(
                    id,
                    GpuTexture {
                        texture,
                        bind_group,
                        version: 0,
                        size,
                    },
                ) {
                    old.texture.destroy();
                }
            }
            let Some(gpu) = self.textures.get_mut(&id) else {
                continue;
            };
            queue.copy_external_image_to_texture(
                &wgpu::CopyExternalImageSourceInfo {
                    source: wgpu::ExternalImageSource::HTMLCanvasElement(surface.canvas().clone()),
                    origin: wgpu::Origin2d::ZERO,
                    flip_y: false,
                },
                wgpu::CopyExternalImageDestInfo {
                    texture: &gpu.texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                    color_space: wgpu::PredefinedColorSpace::Srgb,
                    premultiplied_alpha: false,
                },
                wgpu::Extent3d {
                    width: size.0,
                    height: size.1,
                    depth_or_array_layers: 1,
                },
            );
            gpu.version = entry.version;
        }
    }

    fn write_points(device: &wgpu::Device, queue: &wgpu::Queue, slot: &mut Option<PointBuffer>, data: &[[f32; 4]]) {
        let needed = (data.len() as u64).max(1);
        if !matches!(slot, Some(p) if p.capacity >= needed) {
            let capacity = needed.next_power_of_two().max(MIN_POINT_CAPACITY);
            if let Some(old) = slot.take() {
                old.buffer.destroy();
            }
            *slot = Some(PointBuffer {
                buffer: device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("point_instances"),
                    size: capacity * std::mem::size_of::<[f32; 4]>() as u64,
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                }),
                capacity,
                count: 0,
            });
        }
        if let Some(points) = slot.as_mut() {
            queue.write_buffer(&points.buffer, 0, bytemuck::cast_slice(data));
            points.count = data.len() as u32;
        }
    }

    fn collect_lights(scene: &SceneGraph<CanvasSurface>, eye: Vec3) -> (u32, [LightPacked; MAX_LIGHTS]) {
        let mut found: SmallVec<[(f32, LightPacked); 32]> = SmallVec::new();
        for (_, node) in scene.nodes() {
            if !node.visible {
                continue;
            }
            if let NodeKind::PointLight {
                color,
                intensity,
                distance,
            } = &node.kind
            {
                if *intensity <= 0.0 {
                    continue;
                }
                let p = node.transform.translation;
                found.push((
                    p.distance_squared(eye),
                    LightPacked {
                        pos_range: [p.x, p.y, p.z, *distance],
                        color_intensity: [color[0], color[1], color[2], *intensity],
                    },
                ));
            }
        }
        found.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut lights = [LightPacked::default(); MAX_LIGHTS];
        let count = found.len().min(MAX_LIGHTS);
        for (slot, (_, light)) in lights.iter_mut().zip(found.into_iter()) {
            *slot = light;
        }
        (count as u32, lights)
    }

    fn ensure_draw_capacity(&mut self, device: &wgpu::Device, needed: u64) {
        if needed <= self.draw_capacity {
            return;
        }
        let capacity = needed.next_power_of_two();
        self.draw_buffer.destroy();
        self.draw_buffer = draw_buffer(device, capacity);
        self.draw_bind_group = draw_bind_group(device, &self.draw_bgl, &self.draw_buffer);
        self.draw_capacity = capacity;
        log::debug!("[gpu] draw uniform capacity grown to {capacity}");
    }

    /// Sync GPU resources with the scene and encode the scene pass.
    pub(crate) fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        color: &wgpu::TextureView,
        depth: &wgpu::TextureView,
        scene: &mut SceneGraph<CanvasSurface>,
        camera: &Camera,
    ) {
        self.destroy_released(scene.drain_released());
        self.points
            .retain(|id, _| matches!(scene.node(*id).map(|n| &n.kind), Some(NodeKind::Points { .. })));
        self.sync_textures(device, queue, scene);

        let view = camera.view_matrix();
        let right = view.row(0).truncate();
        let up = view.row(1).truncate();
        let eye = camera.eye;
        let (light_count, lights) = Self::collect_lights(scene, eye);
        let globals = Globals {
            view_proj: camera.view_projection().to_cols_array_2d(),
            camera_pos: eye.extend(1.0).to_array(),
            camera_right: right.extend(0.0).to_array(),
            camera_up: up.extend(0.0).to_array(),
            ambient: [scene.ambient[0], scene.ambient[1], scene.ambient[2], light_count as f32],
            lights,
        };
        queue.write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));

        let mut items: Vec<DrawItem> = Vec::with_capacity(scene.node_count());
        for (id, node) in scene.nodes() {
            if !node.visible {
                continue;
            }
            let model = node.transform.matrix();
            let depth = node.transform.translation.distance_squared(eye);
            match &node.kind {
                NodeKind::Mesh { geometry, material } => {
                    if !self.meshes.contains_key(geometry) {
                        let Some(mesh) = scene.geometry(*geometry) else {
                            continue;
                        };
                        if mesh.is_empty() {
                            continue;
                        }
                        self.meshes.insert(*geometry, Self::upload_mesh(device, mesh));
                    }
                    items.push(DrawItem {
                        kind: DrawKind::Mesh,
                        blend: material.blend,
                        texture: material.texture,
                        geometry: Some(*geometry),
                        node: id,
                        depth,
                        uniforms: draw_uniforms(model, material, [0.0; 3]),
                    });
                }
                NodeKind::Sprite { size, material } => items.push(DrawItem {
                    kind: DrawKind::Sprite,
                    blend: material.blend,
                    texture: material.texture,
                    geometry: None,
                    node: id,
                    depth,
                    uniforms: draw_uniforms(model, material, [size.x, size.y, 0.0]),
                }),
                NodeKind::Points { cloud, material } => {
                    if cloud.is_empty() {
                        continue;
                    }
                    let data: Vec<[f32; 4]> = cloud
                        .positions
                        .iter()
                        .zip(cloud.alphas.iter())
                        .map(|(p, a)| [p.x, p.y, p.z, *a])
                        .collect();
                    let mut slot = self.points.remove(&id);
                    Self::write_points(device, queue, &mut slot, &data);
                    if let Some(buffer) = slot {
                        self.points.insert(id, buffer);
                    }
                    items.push(DrawItem {
                        kind: DrawKind::Points,
                        blend: material.blend,
                        texture: material.texture,
                        geometry: None,
                        node: id,
                        depth,
                        uniforms: draw_uniforms(model, material, [0.0, 0.0, cloud.size]),
                    });
                }
                NodeKind::PointLight { .. } => {}
            }
        }

        // opaque front-to-back, alpha back-to-front, additive last
        items.sort_by(|a, b| {
            let rank = |m: BlendMode| match m {
                BlendMode::Opaque => 0,
                BlendMode::Alpha => 1,
                BlendMode::Additive => 2,
            };
            rank(a.blend).cmp(&rank(b.blend)).then_with(|| match a.blend {
                BlendMode::Opaque => a.depth.total_cmp(&b.depth),
                _ => b.depth.total_cmp(&a.depth),
            })
        });

        self.ensure_draw_capacity(device, items.len() as u64);
        self.staging.clear();
        self.staging
            .resize(items.len() * DRAW_UNIFORM_STRIDE as usize, 0);
        for (i, item) in items.iter().enumerate() {
            let start = i * DRAW_UNIFORM_STRIDE as usize;
            let bytes = bytemuck::bytes_of(&item.uniforms);
            self.staging[start..start + bytes.len()].copy_from_slice(bytes);
        }
        if !self.staging.is_empty() {
            queue.write_buffer(&self.draw_buffer, 0, &self.staging);
        }

        let [r, g, b] = scene.clear_color;
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scene_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: r as f64,
                        g: g as f64,
                        b: b as f64,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_bind_group(0, &self.globals_bind_group, &[]);
        for (i, item) in items.iter().enumerate() {
            let Some(pipeline) = self.pipelines.get(&(item.kind, item.blend)) else {
                continue;
            };
            let texture = item
                .texture
                .and_then(|t| self.textures.get(&t))
                .unwrap_or(&self.white);
            pass.set_pipeline(pipeline);
            pass.set_bind_group(1, &self.draw_bind_group, &[(i as u64 * DRAW_UNIFORM_STRIDE) as u32]);
            pass.set_bind_group(2, &texture.bind_group, &[]);
            match item.kind {
                DrawKind::Mesh => {
                    let Some(mesh) = item.geometry.and_then(|g| self.meshes.get(&g)) else {
                        continue;
                    };
                    pass.set_vertex_buffer(0, mesh.vertices.slice(..));
                    pass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                }
                DrawKind::Sprite => pass.draw(0..6, 0..1),
                DrawKind::Points => {
                    let Some(points) = self.points.get(&item.node) else {
                        continue;
                    };
                    pass.set_vertex_buffer(0, points.buffer.slice(..));
                    pass.draw(0..6, 0..points.count);
                }
            }
        }
    }

    /// Destroy every GPU resource mirrored from the scene.
    pub(crate) fn release_all(&mut self) {
        for (_, mesh) in self.meshes.drain() {
            mesh.vertices.destroy();
            mesh.indices.destroy();
        }
        for (_, tex) in self.textures.drain() {
            tex.texture.destroy();
        }
        for (_, points) in self.points.drain() {
            points.buffer.destroy();
        }
        self.draw_buffer.destroy();
        self.globals_buffer.destroy();
        self.white.texture.destroy();
    }
}
