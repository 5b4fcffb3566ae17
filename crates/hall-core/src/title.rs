//! Floating title banner: stacked text layers for depth plus three lights.

use crate::constants::*;
use crate::scene::{BlendMode, Material, Node, NodeId, NodeKind, SceneGraph, TextureId, Transform};
use glam::{Vec2, Vec3};

pub struct TitleBanner {
    layers: Vec<NodeId>,
    /// Core light, then the left and right rim lights.
    lights: [NodeId; 3],
    base_y: f32,
    phase: f32,
    z: f32,
    half_width: f32,
}

impl TitleBanner {
    /// `pixel_size` is the painted title texture size; the banner keeps its
    /// aspect at [`TITLE_WORLD_HEIGHT`].
    pub fn build<T>(
        scene: &mut SceneGraph<T>,
        texture: TextureId,
        pixel_size: (u32, u32),
        z: f32,
        color: [f32; 3],
    ) -> Self {
        let aspect = pixel_size.0 as f32 / pixel_size.1.max(1) as f32;
        let size = Vec2::new(TITLE_WORLD_HEIGHT * aspect, TITLE_WORLD_HEIGHT);
        let base_y = TITLE_HEIGHT;

        let layers = (0..TITLE_LAYERS)
            .map(|i| {
                let depth = i as f32 / TITLE_LAYERS as f32;
                let (material, opacity) = if i == 0 {
                    (Material::textured(texture, BlendMode::Alpha), 1.0)
                } else {
                    (
                        Material {
                            color: [color[0], color[1], color[2], 1.0],
                            emissive: 1.5,
                            ..Material::textured(texture, BlendMode::Additive)
                        },
                        0.45 * (1.0 - depth),
                    )
                };
                scene.add_node(Node::new(
                    NodeKind::Sprite {
                        size,
                        material: material.with_opacity(opacity),
                    },
                    Transform::at(Vec3::new(0.0, base_y, z - i as f32 * TITLE_LAYER_SPACING)),
                ))
            })
            .collect();

        let half_width = size.x * 0.5;
        let light = |scene: &mut SceneGraph<T>, x: f32, intensity: f32| {
            scene.add_node(Node::new(
                NodeKind::PointLight {
                    color,
                    intensity,
                    distance: 30.0,
                },
                Transform::at(Vec3::new(x, base_y, z + 2.0)),
            ))
        };
        let lights = [
            light(scene, 0.0, 2.5),
            light(scene, -half_width, 1.2),
            light(scene, half_width, 1.2),
        ];

        Self {
            layers,
            lights,
            base_y,
            phase: 0.0,
            z,
            half_width,
        }
    }

    pub fn current_y(&self, t: f32) -> f32 {
        self.base_y + (t * TITLE_BOB_SPEED + self.phase).sin() * TITLE_BOB_AMPLITUDE
    }

    /// Bob every layer and light together; rim lights pulse against the core.
    pub fn update<T>(&self, scene: &mut SceneGraph<T>, t: f32) {
        let y = self.current_y(t);
        for (i, id) in self.layers.iter().enumerate() {
            scene.set_translation(*id, Vec3::new(0.0, y, self.z - i as f32 * TITLE_LAYER_SPACING));
        }
        let pulse = (t * 2.0).sin();
        let xs = [0.0, -self.half_width, self.half_width];
        let intensities = [2.5 + 0.5 * pulse, 1.2 - 0.4 * pulse, 1.2 - 0.4 * pulse];
        for ((id, x), intensity) in self.lights.iter().zip(xs).zip(intensities) {
            if let Some(node) = scene.node_mut(*id) {
                node.transform.translation = Vec3::new(x, y, self.z + 2.0);
                if let Some(i) = node.light_mut() {
                    *i = intensity;
                }
            }
        }
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.layers.iter().chain(self.lights.iter()).copied()
    }
}
