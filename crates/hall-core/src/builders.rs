//! Scene builders for the floor, edge trim, entrance arc, orb platforms and
//! corner lights. Each builder only adds nodes and resources; the hall keeps
//! the returned handles.

use crate::constants::*;
use crate::geometry::{disc, floor_quad, tube, CatmullRom};
use crate::layout::HallLayout;
use crate::particles::{EmitterShape, ParticleEmitter};
use crate::scene::{
    BlendMode, GeometryId, Material, Node, NodeId, NodeKind, PointCloud, SceneGraph, TextureId,
    Transform,
};
use glam::{Vec2, Vec3};
use std::f32::consts::PI;

const TRIM_CORE_SEGMENTS: u32 = 8;
const TRIM_GLOW_SEGMENTS: u32 = 12;
const ARC_SAMPLES: usize = 48;
const EDGE_HEIGHT: f32 = 0.05;
const CORNER_LIGHT_HEIGHT: f32 = 3.0;

/// Look of one trim run.
#[derive(Clone, Copy, Debug)]
pub struct TrimStyle {
    pub color: [f32; 3],
    pub core_radius: f32,
    pub glow_radius: f32,
    pub light_intensity: f32,
    pub light_distance: f32,
}

impl TrimStyle {
    pub fn edge(color: [f32; 3]) -> Self {
        Self {
            color,
            core_radius: EDGE_CORE_RADIUS,
            glow_radius: EDGE_GLOW_RADIUS,
            light_intensity: 0.6,
            light_distance: 10.0,
        }
    }

    pub fn arc(color: [f32; 3]) -> Self {
        Self {
            color,
            core_radius: ARC_TUBE_RADIUS,
            glow_radius: ARC_GLOW_RADIUS,
            light_intensity: 2.0,
            light_distance: 24.0,
        }
    }
}

/// Bright core, two translucent glow shells and a point light along one path.
#[derive(Clone, Debug)]
pub struct GlowTrim {
    pub core: NodeId,
    pub inner: NodeId,
    pub outer: NodeId,
    pub light: NodeId,
    pub style: TrimStyle,
}

impl GlowTrim {
    /// Scale shell opacity and light intensity by `level` in [0, 1].
    pub fn set_glow<T>(&self, scene: &mut SceneGraph<T>, level: f32) {
        let level = level.clamp(0.0, 1.0);
        if let Some(m) = scene.node_mut(self.inner).and_then(Node::material_mut) {
            m.color[3] = level;
        }
        if let Some(m) = scene.node_mut(self.outer).and_then(Node::material_mut) {
            m.color[3] = level * 0.45;
        }
        if let Some(i) = scene.node_mut(self.light).and_then(Node::light_mut) {
            *i = self.style.light_intensity * (0.5 + level);
        }
    }
}

pub fn glow_trim<T>(scene: &mut SceneGraph<T>, path: &[Vec3], style: TrimStyle) -> GlowTrim {
    let mesh_node = |scene: &mut SceneGraph<T>, radius: f32, segments: u32, material: Material| {
        let geometry = scene.add_geometry(tube(path, radius, segments));
        scene.add_node(Node::new(
            NodeKind::Mesh { geometry, material },
            Transform::default(),
        ))
    };
    let core = mesh_node(
        scene,
        style.core_radius,
        TRIM_CORE_SEGMENTS,
        Material {
            emissive: 3.0,
            ..Material::opaque(style.color)
        },
    );
    let inner = mesh_node(
        scene,
        style.glow_radius * 0.5,
        TRIM_GLOW_SEGMENTS,
        Material::glow(style.color, EDGE_GLOW_BASE, 1.5),
    );
    let outer = mesh_node(
        scene,
        style.glow_radius,
        TRIM_GLOW_SEGMENTS,
        Material::glow(style.color, EDGE_GLOW_BASE * 0.45, 1.0),
    );
    let mid = path.get(path.len() / 2).copied().unwrap_or(Vec3::ZERO);
    let light = scene.add_node(Node::new(
        NodeKind::PointLight {
            color: style.color,
            intensity: style.light_intensity,
            distance: style.light_distance,
        },
        Transform::at(mid + Vec3::Y * 0.5),
    ));
    GlowTrim {
        core,
        inner,
        outer,
        light,
        style,
    }
}

/// The three floor quads sharing the nebula texture.
pub fn build_floor<T>(scene: &mut SceneGraph<T>, layout: &HallLayout, texture: TextureId) -> Vec<NodeId> {
    layout
        .floor_rects()
        .iter()
        .map(|rect| {
            let geometry = scene.add_geometry(floor_quad(rect, 0.0));
            scene.add_node(Node::new(
                NodeKind::Mesh {
                    geometry,
                    material: Material::textured(texture, BlendMode::Opaque),
                },
                Transform::default(),
            ))
        })
        .collect()
}

/// One trim run per outline segment, lying on the floor edge.
pub fn build_edges<T>(scene: &mut SceneGraph<T>, layout: &HallLayout, color: [f32; 3]) -> Vec<GlowTrim> {
    layout
        .outline_segments()
        .into_iter()
        .map(|(a, b)| {
            let lift = Vec3::Y * EDGE_HEIGHT;
            glow_trim(scene, &[a + lift, b + lift], TrimStyle::edge(color))
        })
        .collect()
}

/// Seven control points on a half ellipse spanning the corridor at the
/// entrance plane.
pub fn arc_curve(layout: &HallLayout) -> CatmullRom {
    let hw = layout.half_width();
    let z = layout.entrance_z();
    let points = (0..7)
        .map(|k| {
            let theta = PI * k as f32 / 6.0;
            Vec3::new(-hw * theta.cos(), ARC_HEIGHT * theta.sin(), z)
        })
        .collect();
    CatmullRom::new(points)
}

pub struct EntranceArc {
    pub trim: GlowTrim,
    pub curve: CatmullRom,
}

pub fn build_arc<T>(scene: &mut SceneGraph<T>, layout: &HallLayout, color: [f32; 3]) -> EntranceArc {
    let curve = arc_curve(layout);
    let trim = glow_trim(scene, &curve.sample(ARC_SAMPLES), TrimStyle::arc(color));
    EntranceArc { trim, curve }
}

/// A point cloud node fed by `emitter`.
pub fn points_node<T>(
    scene: &mut SceneGraph<T>,
    emitter: &ParticleEmitter,
    texture: TextureId,
    size: f32,
) -> NodeId {
    let mut cloud = PointCloud::with_capacity(emitter.len(), size);
    emitter.write_into(&mut cloud);
    scene.add_node(Node::new(
        NodeKind::Points {
            cloud,
            material: Material::textured(texture, BlendMode::Additive),
        },
        Transform::default(),
    ))
}

/// Particles following the arc and particles drawn into the doorway.
pub fn entrance_flows(layout: &HallLayout, curve: &CatmullRom, seed: u64) -> [ParticleEmitter; 2] {
    let half_height = ARC_HEIGHT * 0.45;
    [
        ParticleEmitter::new(
            EmitterShape::CurveFlow {
                curve: curve.clone(),
                jitter: ARC_GLOW_RADIUS,
            },
            ARC_PARTICLES,
            seed ^ 0xa7c,
        ),
        ParticleEmitter::new(
            EmitterShape::DoorFlow {
                target: Vec3::new(0.0, half_height, layout.entrance_z()),
                half_extent: Vec2::new(layout.half_width(), half_height),
            },
            DOOR_PARTICLES,
            seed ^ 0xd00,
        ),
    ]
}

/// Geometry shared by all orb platforms.
#[derive(Clone, Copy, Debug)]
pub struct PlatformGeometry {
    pub decal: GeometryId,
    pub core: GeometryId,
}

impl PlatformGeometry {
    pub fn new<T>(scene: &mut SceneGraph<T>) -> Self {
        Self {
            decal: scene.add_geometry(disc(PLATFORM_RADIUS * 1.6, 32)),
            core: scene.add_geometry(disc(PLATFORM_RADIUS * 0.35, 24)),
        }
    }
}

pub struct Platform {
    pub decal: NodeId,
    pub core: NodeId,
    pub points: NodeId,
    pub emitter: ParticleEmitter,
}

/// Glowing floor decal, rising particles and a bright core disc under an orb.
pub fn build_platform<T>(
    scene: &mut SceneGraph<T>,
    shared: PlatformGeometry,
    glow: TextureId,
    at: Vec3,
    color: [f32; 3],
    seed: u64,
) -> Platform {
    let floor = Vec3::new(at.x, 0.0, at.z);
    let decal = scene.add_node(Node::new(
        NodeKind::Mesh {
            geometry: shared.decal,
            material: Material {
                color: [color[0], color[1], color[2], 0.8],
                ..Material::textured(glow, BlendMode::Additive)
            },
        },
        Transform::at(floor + Vec3::Y * 0.02),
    ));
    let core = scene.add_node(Node::new(
        NodeKind::Mesh {
            geometry: shared.core,
            material: Material::glow(color, 1.0, 3.0),
        },
        Transform::at(floor + Vec3::Y * 0.04),
    ));
    let emitter = ParticleEmitter::new(
        EmitterShape::Rising {
            center: floor + Vec3::Y * 0.1,
            radius: PLATFORM_RADIUS,
            height: PLATFORM_RISE_HEIGHT,
        },
        PLATFORM_PARTICLES,
        seed,
    );
    let points = points_node(scene, &emitter, glow, 0.12);
    Platform {
        decal,
        core,
        points,
        emitter,
    }
}

/// Lights at the four T-bar corners and the junction.
pub fn build_corner_lights<T>(scene: &mut SceneGraph<T>, layout: &HallLayout, color: [f32; 3]) -> Vec<NodeId> {
    layout
        .corner_points()
        .iter()
        .map(|p| {
            scene.add_node(Node::new(
                NodeKind::PointLight {
                    color,
                    intensity: 1.2,
                    distance: 20.0,
                },
                Transform::at(*p + Vec3::Y * CORNER_LIGHT_HEIGHT),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_uses_the_layout_rects() {
        let layout = HallLayout::default();
        let mut scene: SceneGraph<()> = SceneGraph::new();
        let tex = scene.add_texture(());
        let nodes = build_floor(&mut scene, &layout, tex);
        assert_eq!(nodes.len(), 3);
        for (node, rect) in nodes.iter().zip(layout.floor_rects()) {
            let NodeKind::Mesh { geometry, .. } = scene.node(*node).unwrap().kind else {
                panic!("floor must be a mesh");
            };
            let (lo, hi) = scene.geometry(geometry).unwrap().xz_bounds().unwrap();
            assert_eq!((lo.x, lo.y, hi.x, hi.y), (rect.min_x, rect.min_z, rect.max_x, rect.max_z));
        }
    }

    #[test]
    fn arc_spans_the_corridor() {
        let layout = HallLayout::default();
        let curve = arc_curve(&layout);
        assert_eq!(curve.control_points().len(), 7);
        assert!((curve.point_at(0.0).x + layout.half_width()).abs() < 1e-4);
        assert!((curve.point_at(0.5).y - ARC_HEIGHT).abs() < 1e-4);
        assert!((curve.point_at(1.0).x - layout.half_width()).abs() < 1e-4);
    }

    #[test]
    fn trim_glow_level_drives_light() {
        let mut scene: SceneGraph<()> = SceneGraph::new();
        let trim = glow_trim(&mut scene, &[Vec3::ZERO, Vec3::X], TrimStyle::edge([1.0; 3]));
        trim.set_glow(&mut scene, 1.0);
        let NodeKind::PointLight { intensity, .. } = scene.node(trim.light).unwrap().kind else {
            panic!("light expected");
        };
        assert!((intensity - 0.9).abs() < 1e-6);
        assert_eq!(scene.ledger().live_count(), 3);
    }

    #[test]
    fn edges_follow_outline() {
        let layout = HallLayout::default();
        let mut scene: SceneGraph<()> = SceneGraph::new();
        let edges = build_edges(&mut scene, &layout, [0.5, 0.3, 1.0]);
        assert_eq!(edges.len(), layout.outline_segments().len());
    }
}
