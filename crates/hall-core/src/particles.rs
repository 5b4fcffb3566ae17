//! Particle emitters. Particles are recycled when they reach their terminal
//! condition, so an emitter's population never changes after construction.

use crate::constants::FLOW_FADE_EDGE;
use crate::geometry::CatmullRom;
use crate::scene::PointCloud;
use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

#[derive(Clone, Debug, PartialEq)]
pub enum EmitterShape {
    /// Particles rise from a disc and restart at the bottom.
    Rising { center: Vec3, radius: f32, height: f32 },
    /// Particles travel along a curve and loop back to its start.
    CurveFlow { curve: CatmullRom, jitter: f32 },
    /// Particles drift from the rim of a rectangle towards its centre.
    DoorFlow { target: Vec3, half_extent: Vec2 },
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub start: Vec3,
    pub offset: Vec3,
    pub progress: f32,
    pub speed: f32,
    pub alpha: f32,
}

#[derive(Clone, Debug)]
pub struct ParticleEmitter {
    shape: EmitterShape,
    particles: Vec<Particle>,
    rng: StdRng,
}

impl ParticleEmitter {
    pub fn new(shape: EmitterShape, count: usize, seed: u64) -> Self {
        let mut emitter = Self {
            shape,
            particles: Vec::with_capacity(count),
            rng: StdRng::seed_from_u64(seed),
        };
        for _ in 0..count {
            let mut p = Particle::default();
            emitter.respawn(&mut p);
            // spread the initial population over the whole cycle
            p.progress = emitter.rng.gen_range(0.0..1.0);
            emitter.particles.push(p);
        }
        let mut particles = std::mem::take(&mut emitter.particles);
        for p in particles.iter_mut() {
            emitter.place(p);
        }
        emitter.particles = particles;
        emitter
    }

    pub fn shape(&self) -> &EmitterShape {
        &self.shape
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    fn respawn(&mut self, p: &mut Particle) {
        p.progress = 0.0;
        match &self.shape {
            EmitterShape::Rising { center, radius, .. } => {
                let a = self.rng.gen_range(0.0..TAU);
                let d = radius * self.rng.gen_range(0.0f32..1.0).sqrt();
                p.start = *center + Vec3::new(a.cos() * d, 0.0, a.sin() * d);
                p.speed = self.rng.gen_range(0.25..0.6);
            }
            EmitterShape::CurveFlow { jitter, .. } => {
                let j = *jitter;
                p.offset = Vec3::new(
                    self.rng.gen_range(-j..=j),
                    self.rng.gen_range(-j..=j),
                    self.rng.gen_range(-j..=j),
                );
                p.speed = self.rng.gen_range(0.05..0.12);
            }
            EmitterShape::DoorFlow {
                target,
                half_extent,
            } => {
                p.start = *target + perimeter_point(&mut self.rng, *half_extent);
                p.speed = self.rng.gen_range(0.2..0.45);
            }
        }
    }

    fn place(&self, p: &mut Particle) {
        match &self.shape {
            EmitterShape::Rising { height, .. } => {
                p.position = p.start + Vec3::Y * (p.progress * height);
                p.alpha = 1.0 - p.progress;
            }
            EmitterShape::CurveFlow { curve, .. } => {
                p.position = curve.point_at(p.progress) + p.offset;
                p.alpha = edge_fade(p.progress);
            }
            EmitterShape::DoorFlow { target, .. } => {
                p.position = p.start.lerp(*target, p.progress);
                p.alpha = 1.0 - p.progress;
            }
        }
    }

    pub fn update(&mut self, dt: f32) {
        let mut particles = std::mem::take(&mut self.particles);
        for p in particles.iter_mut() {
            p.progress += p.speed * dt;
            if p.progress >= 1.0 {
                match self.shape {
                    // loops continue from where they wrapped
                    EmitterShape::CurveFlow { .. } => p.progress -= p.progress.floor(),
                    _ => self.respawn(p),
                }
            }
            self.place(p);
        }
        self.particles = particles;
    }

    /// Copy positions and alphas into a point cloud for upload.
    pub fn write_into(&self, cloud: &mut PointCloud) {
        cloud.positions.clear();
        cloud.alphas.clear();
        cloud.positions.extend(self.particles.iter().map(|p| p.position));
        cloud.alphas.extend(self.particles.iter().map(|p| p.alpha));
    }
}

/// Opacity ramp near both ends of a looping path.
#[inline]
pub fn edge_fade(progress: f32) -> f32 {
    let head = (progress / FLOW_FADE_EDGE).min(1.0);
    let tail = ((1.0 - progress) / FLOW_FADE_EDGE).min(1.0);
    (head * tail).clamp(0.0, 1.0)
}

/// Random point on the boundary of a rectangle in the XY plane.
fn perimeter_point(rng: &mut StdRng, half: Vec2) -> Vec3 {
    let t = rng.gen_range(-1.0f32..=1.0);
    match rng.gen_range(0..4) {
        0 => Vec3::new(t * half.x, half.y, 0.0),
        1 => Vec3::new(t * half.x, -half.y, 0.0),
        2 => Vec3::new(half.x, t * half.y, 0.0),
        _ => Vec3::new(-half.x, t * half.y, 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn rising_particles_recycle_within_height() {
        let center = Vec3::new(0.0, 0.1, -20.0);
        let mut e = ParticleEmitter::new(
            EmitterShape::Rising {
                center,
                radius: 1.4,
                height: 3.0,
            },
            50,
            1,
        );
        for _ in 0..600 {
            e.update(DT);
            assert_eq!(e.len(), 50);
            for p in e.particles() {
                assert!(p.position.y >= center.y - 1e-4);
                assert!(p.position.y <= center.y + 3.0 + 1e-4);
                assert!(Vec2::new(p.position.x, p.position.z - center.z).length() <= 1.4 + 1e-4);
            }
        }
    }

    #[test]
    fn curve_flow_fades_at_ends() {
        assert_eq!(edge_fade(0.0), 0.0);
        assert_eq!(edge_fade(0.5), 1.0);
        assert_eq!(edge_fade(1.0), 0.0);
        let curve = CatmullRom::new(vec![Vec3::ZERO, Vec3::new(5.0, 5.0, 0.0), Vec3::new(10.0, 0.0, 0.0)]);
        let mut e = ParticleEmitter::new(EmitterShape::CurveFlow { curve, jitter: 0.0 }, 80, 2);
        for _ in 0..1200 {
            e.update(DT);
        }
        assert!(e.particles().iter().all(|p| (0.0..1.0).contains(&p.progress)));
    }

    #[test]
    fn door_flow_heads_to_target() {
        let target = Vec3::new(0.0, 6.0, 10.0);
        let mut e = ParticleEmitter::new(
            EmitterShape::DoorFlow {
                target,
                half_extent: Vec2::new(8.0, 6.0),
            },
            60,
            3,
        );
        for _ in 0..300 {
            let before: Vec<f32> = e.particles().iter().map(|p| p.position.distance(target)).collect();
            e.update(DT);
            for (p, d) in e.particles().iter().zip(before) {
                // either moved closer or was recycled to the rim
                assert!(p.position.distance(target) <= d + 1e-4 || p.progress < 0.1);
            }
        }
    }
}
