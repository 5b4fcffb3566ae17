//! Primitive mesh generation: floor quads, discs and spline tubes.

use crate::layout::FloorRect;
use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec2, Vec3};
use std::f32::consts::TAU;

/// World units covered by one repeat of the floor texture.
pub const FLOOR_UV_SPAN: f32 = 40.0;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    #[inline]
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv: uv.to_array(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Bounding rectangle of the vertices on the XZ plane.
    pub fn xz_bounds(&self) -> Option<(Vec2, Vec2)> {
        let mut iter = self.vertices.iter().map(|v| Vec2::new(v.position[0], v.position[2]));
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }
}

/// Horizontal quad covering `rect` at height `y`, facing up.
pub fn floor_quad(rect: &FloorRect, y: f32) -> MeshData {
    let corners = [
        (rect.min_x, rect.min_z),
        (rect.max_x, rect.min_z),
        (rect.max_x, rect.max_z),
        (rect.min_x, rect.max_z),
    ];
    let vertices = corners
        .iter()
        .map(|&(x, z)| {
            Vertex::new(
                Vec3::new(x, y, z),
                Vec3::Y,
                Vec2::new(x / FLOOR_UV_SPAN, z / FLOOR_UV_SPAN),
            )
        })
        .collect();
    MeshData {
        vertices,
        indices: vec![0, 2, 1, 0, 3, 2],
    }
}

/// Flat disc on the XZ plane centred at the origin.
pub fn disc(radius: f32, segments: u32) -> MeshData {
    let segments = segments.max(3);
    let mut vertices = Vec::with_capacity(segments as usize + 2);
    vertices.push(Vertex::new(Vec3::ZERO, Vec3::Y, Vec2::splat(0.5)));
    for i in 0..=segments {
        let a = i as f32 / segments as f32 * TAU;
        let (s, c) = a.sin_cos();
        vertices.push(Vertex::new(
            Vec3::new(c * radius, 0.0, s * radius),
            Vec3::Y,
            Vec2::new(0.5 + 0.5 * c, 0.5 + 0.5 * s),
        ));
    }
    let mut indices = Vec::with_capacity(segments as usize * 3);
    for i in 1..=segments {
        indices.extend_from_slice(&[0, i + 1, i]);
    }
    MeshData { vertices, indices }
}

/// Uniform Catmull-Rom spline through a list of control points.
#[derive(Clone, Debug, PartialEq)]
pub struct CatmullRom {
    points: Vec<Vec3>,
}

impl CatmullRom {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self { points }
    }

    pub fn control_points(&self) -> &[Vec3] {
        &self.points
    }

    /// Point at normalized parameter `t` in [0, 1]. End points are repeated
    /// as phantom neighbours so the curve passes through every control point.
    pub fn point_at(&self, t: f32) -> Vec3 {
        let n = self.points.len();
        match n {
            0 => return Vec3::ZERO,
            1 => return self.points[0],
            _ => {}
        }
        let segments = n - 1;
        let f = t.clamp(0.0, 1.0) * segments as f32;
        let i = (f.floor() as usize).min(segments - 1);
        let u = f - i as f32;

        let p0 = self.points[i.saturating_sub(1)];
        let p1 = self.points[i];
        let p2 = self.points[i + 1];
        let p3 = self.points[(i + 2).min(n - 1)];

        let u2 = u * u;
        let u3 = u2 * u;
        0.5 * ((2.0 * p1)
            + (p2 - p0) * u
            + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * u2
            + (3.0 * p1 - p0 - 3.0 * p2 + p3) * u3)
    }

    /// `count + 1` evenly spaced samples from start to end.
    pub fn sample(&self, count: usize) -> Vec<Vec3> {
        let count = count.max(1);
        (0..=count)
            .map(|k| self.point_at(k as f32 / count as f32))
            .collect()
    }
}

/// Extrude a circle along `path`. Ring frames are carried along the path by
/// parallel transport so the tube does not twist.
pub fn tube(path: &[Vec3], radius: f32, radial_segments: u32) -> MeshData {
    let n = path.len();
    if n < 2 {
        return MeshData::default();
    }
    let radial = radial_segments.max(3);
    let ring = radial as usize + 1;

    let tangents: Vec<Vec3> = (0..n)
        .map(|i| (path[(i + 1).min(n - 1)] - path[i.saturating_sub(1)]).normalize_or_zero())
        .collect();

    let mut vertices = Vec::with_capacity(n * ring);
    let mut normal = tangents[0].any_orthonormal_vector();
    for i in 0..n {
        if i > 0 {
            let (prev, cur) = (tangents[i - 1], tangents[i]);
            let axis = prev.cross(cur);
            if axis.length_squared() > 1e-10 {
                let angle = prev.dot(cur).clamp(-1.0, 1.0).acos();
                normal = Quat::from_axis_angle(axis.normalize(), angle) * normal;
            }
        }
        let binormal = tangents[i].cross(normal);
        let v = i as f32 / (n - 1) as f32;
        for j in 0..ring {
            let theta = j as f32 / radial as f32 * TAU;
            let (s, c) = theta.sin_cos();
            let dir = (normal * c + binormal * s).normalize_or_zero();
            vertices.push(Vertex::new(
                path[i] + dir * radius,
                dir,
                Vec2::new(v, j as f32 / radial as f32),
            ));
        }
    }

    let mut indices = Vec::with_capacity((n - 1) * radial as usize * 6);
    for i in 0..n - 1 {
        for j in 0..radial as usize {
            let a = (i * ring + j) as u32;
            let b = ((i + 1) * ring + j) as u32;
            indices.extend_from_slice(&[a, b, a + 1, b, b + 1, a + 1]);
        }
    }
    MeshData { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_quad_matches_rect() {
        let rect = FloorRect {
            min_x: -8.0,
            max_x: 8.0,
            min_z: -70.0,
            max_z: 10.0,
        };
        let mesh = floor_quad(&rect, 0.0);
        assert_eq!(mesh.triangle_count(), 2);
        let (lo, hi) = mesh.xz_bounds().unwrap();
        assert_eq!(lo, Vec2::new(-8.0, -70.0));
        assert_eq!(hi, Vec2::new(8.0, 10.0));
    }

    #[test]
    fn spline_passes_through_control_points() {
        let pts = vec![
            Vec3::new(-8.0, 0.0, 0.0),
            Vec3::new(-6.0, 8.0, 0.0),
            Vec3::new(0.0, 12.0, 0.0),
            Vec3::new(6.0, 8.0, 0.0),
            Vec3::new(8.0, 0.0, 0.0),
        ];
        let curve = CatmullRom::new(pts.clone());
        assert!((curve.point_at(0.0) - pts[0]).length() < 1e-5);
        assert!((curve.point_at(0.5) - pts[2]).length() < 1e-5);
        assert!((curve.point_at(1.0) - pts[4]).length() < 1e-5);
    }

    #[test]
    fn tube_vertices_stay_at_radius() {
        let path = CatmullRom::new(vec![Vec3::ZERO, Vec3::new(0.0, 5.0, 0.0), Vec3::new(5.0, 5.0, 0.0)])
            .sample(24);
        let mesh = tube(&path, 0.5, 8);
        assert_eq!(mesh.vertices.len(), path.len() * 9);
        for (i, p) in path.iter().enumerate() {
            for v in &mesh.vertices[i * 9..(i + 1) * 9] {
                let d = Vec3::from_array(v.position).distance(*p);
                assert!((d - 0.5).abs() < 1e-3);
            }
        }
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    }

    #[test]
    fn degenerate_tube_is_empty() {
        assert!(tube(&[Vec3::ONE], 1.0, 8).is_empty());
    }
}
