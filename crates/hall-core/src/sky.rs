//! Starfield dome with per-star twinkle, and the moon sprite.

use crate::constants::{SKY_RADIUS, STAR_COUNT};
use crate::scene::{BlendMode, Material, Node, NodeId, NodeKind, PointCloud, SceneGraph, TextureId, Transform};
use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

const STAR_SIZE: f32 = 1.6;
const MOON_SIZE: f32 = 48.0;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Twinkle {
    base: f32,
    speed: f32,
    phase: f32,
}

impl Twinkle {
    #[inline]
    fn alpha(&self, t: f32) -> f32 {
        (self.base * (0.55 + 0.45 * (t * self.speed + self.phase).sin())).clamp(0.0, 1.0)
    }
}

pub struct Sky {
    twinkles: Vec<Twinkle>,
    pub stars: NodeId,
    pub moon: NodeId,
}

/// Star positions on the upper part of a sphere around the hall.
pub fn star_positions(rng: &mut StdRng, count: usize, radius: f32) -> Vec<Vec3> {
    (0..count)
        .map(|_| {
            let azimuth = rng.gen_range(0.0..TAU);
            let elevation = rng.gen_range(0.05f32..1.0).asin();
            let ring = radius * elevation.cos();
            Vec3::new(ring * azimuth.cos(), radius * elevation.sin(), ring * azimuth.sin())
        })
        .collect()
}

impl Sky {
    pub fn build<T>(scene: &mut SceneGraph<T>, seed: u64, star_glow: TextureId, moon_texture: TextureId) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let positions = star_positions(&mut rng, STAR_COUNT, SKY_RADIUS);
        let twinkles: Vec<Twinkle> = (0..STAR_COUNT)
            .map(|_| Twinkle {
                base: rng.gen_range(0.4..1.0),
                speed: rng.gen_range(0.5..3.0),
                phase: rng.gen_range(0.0..TAU),
            })
            .collect();
        let alphas = twinkles.iter().map(|tw| tw.alpha(0.0)).collect();
        let stars = scene.add_node(Node::new(
            NodeKind::Points {
                cloud: PointCloud {
                    positions,
                    alphas,
                    size: STAR_SIZE,
                },
                material: Material::textured(star_glow, BlendMode::Additive),
            },
            Transform::default(),
        ));
        let moon = scene.add_node(Node::new(
            NodeKind::Sprite {
                size: Vec2::splat(MOON_SIZE),
                material: Material {
                    emissive: 1.4,
                    ..Material::textured(moon_texture, BlendMode::Alpha)
                },
            },
            Transform::at(Vec3::new(-SKY_RADIUS * 0.35, SKY_RADIUS * 0.45, -SKY_RADIUS * 0.7)),
        ));
        Self {
            twinkles,
            stars,
            moon,
        }
    }

    pub fn update<T>(&self, scene: &mut SceneGraph<T>, t: f32) {
        if let Some(Node {
            kind: NodeKind::Points { cloud, .. },
            ..
        }) = scene.node_mut(self.stars)
        {
            for (alpha, tw) in cloud.alphas.iter_mut().zip(&self.twinkles) {
                *alpha = tw.alpha(t);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stars_sit_above_the_horizon() {
        let mut rng = StdRng::seed_from_u64(9);
        for p in star_positions(&mut rng, 200, 100.0) {
            assert!(p.y > 0.0);
            assert!((p.length() - 100.0).abs() < 1e-2);
        }
    }

    #[test]
    fn twinkle_varies_per_star() {
        let mut scene: SceneGraph<()> = SceneGraph::new();
        let t = scene.add_texture(());
        let sky = Sky::build(&mut scene, 4, t, t);
        sky.update(&mut scene, 1.7);
        let NodeKind::Points { cloud, .. } = &scene.node(sky.stars).unwrap().kind else {
            panic!("stars must be points");
        };
        assert_eq!(cloud.len(), STAR_COUNT);
        assert!(cloud.alphas.iter().all(|a| (0.0..=1.0).contains(a)));
        let first = cloud.alphas[0];
        assert!(cloud.alphas.iter().any(|a| (a - first).abs() > 1e-3));
    }
}
