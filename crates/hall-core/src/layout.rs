//! Corridor geometry shared by the floor builder and the movement boundary.
//!
//! Every coordinate here is derived from the five scalars held by
//! [`HallLayout`]. The geometry builders and the navigation controller both
//! read the same value, so the visible floor and the walkable area cannot
//! drift apart.

use crate::constants::*;
use crate::error::HallError;
use glam::{Vec2, Vec3};
use std::f32::consts::{FRAC_PI_2, PI};

/// Axis-aligned rectangle on the XZ plane. Bounds are inclusive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FloorRect {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl FloorRect {
    #[inline]
    pub fn contains(&self, x: f32, z: f32) -> bool {
        x >= self.min_x && x <= self.max_x && z >= self.min_z && z <= self.max_z
    }
}

/// The T-shaped hall: an entrance strip, a main corridor running towards -Z
/// and a cross bar at its far end.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HallLayout {
    pub corridor_width: f32,
    pub corridor_length: f32,
    pub bar_width: f32,
    pub bar_length: f32,
    pub entrance_extension: f32,
}

impl Default for HallLayout {
    fn default() -> Self {
        Self {
            corridor_width: CORRIDOR_WIDTH,
            corridor_length: CORRIDOR_LENGTH,
            bar_width: BAR_WIDTH,
            bar_length: BAR_LENGTH,
            entrance_extension: ENTRANCE_EXTENSION,
        }
    }
}

impl HallLayout {
    pub fn new(
        corridor_width: f32,
        corridor_length: f32,
        bar_width: f32,
        bar_length: f32,
        entrance_extension: f32,
    ) -> Result<Self, HallError> {
        let scalars = [
            corridor_width,
            corridor_length,
            bar_width,
            bar_length,
            entrance_extension,
        ];
        if scalars.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(HallError::InvalidLayout(
                "corridor scalars must be finite and positive".into(),
            ));
        }
        if bar_width < corridor_width {
            return Err(HallError::InvalidLayout(format!(
                "bar width {bar_width} is narrower than the corridor {corridor_width}"
            )));
        }
        Ok(Self {
            corridor_width,
            corridor_length,
            bar_width,
            bar_length,
            entrance_extension,
        })
    }

    #[inline]
    pub fn half_width(&self) -> f32 {
        self.corridor_width * 0.5
    }

    #[inline]
    pub fn bar_half_width(&self) -> f32 {
        self.bar_width * 0.5
    }

    /// Z of the entrance plane, where the arc stands.
    #[inline]
    pub fn entrance_z(&self) -> f32 {
        ENTRANCE_Z
    }

    /// Z of the outer end of the entrance strip.
    #[inline]
    pub fn outer_z(&self) -> f32 {
        self.entrance_z() + self.entrance_extension
    }

    /// Z where the main corridor opens into the T-bar.
    #[inline]
    pub fn junction_z(&self) -> f32 {
        self.entrance_z() - self.corridor_length
    }

    /// Z of the T-bar's back wall.
    #[inline]
    pub fn back_z(&self) -> f32 {
        self.junction_z() - self.bar_length
    }

    pub fn entrance_rect(&self) -> FloorRect {
        FloorRect {
            min_x: -self.half_width(),
            max_x: self.half_width(),
            min_z: self.entrance_z(),
            max_z: self.outer_z(),
        }
    }

    pub fn corridor_rect(&self) -> FloorRect {
        FloorRect {
            min_x: -self.half_width(),
            max_x: self.half_width(),
            min_z: self.junction_z(),
            max_z: self.entrance_z(),
        }
    }

    pub fn bar_rect(&self) -> FloorRect {
        FloorRect {
            min_x: -self.bar_half_width(),
            max_x: self.bar_half_width(),
            min_z: self.back_z(),
            max_z: self.junction_z(),
        }
    }

    /// The three rectangles composing the walkable floor, in build order.
    pub fn floor_rects(&self) -> [FloorRect; 3] {
        [self.entrance_rect(), self.corridor_rect(), self.bar_rect()]
    }

    /// Boundary test used by the navigation controller.
    pub fn is_walkable(&self, x: f32, z: f32) -> bool {
        self.floor_rects().iter().any(|r| r.contains(x, z))
    }

    /// Camera spawn point: inside the entrance strip, looking down the corridor.
    pub fn spawn_point(&self) -> Vec3 {
        let z = (self.entrance_z() + CAMERA_START_BACKOFF).min(self.outer_z() - 1.0);
        Vec3::new(0.0, CAMERA_START_Y, z)
    }

    /// Outline of the walkable floor as line segments on y = 0.
    ///
    /// The long sides are split at the entrance plane so each segment belongs
    /// to a single floor rectangle.
    pub fn outline_segments(&self) -> Vec<(Vec3, Vec3)> {
        let hw = self.half_width();
        let bhw = self.bar_half_width();
        let (oz, ez, jz, bz) = (
            self.outer_z(),
            self.entrance_z(),
            self.junction_z(),
            self.back_z(),
        );
        let p = |x: f32, z: f32| Vec3::new(x, 0.0, z);
        vec![
            (p(-hw, oz), p(-hw, ez)),
            (p(-hw, ez), p(-hw, jz)),
            (p(-hw, jz), p(-bhw, jz)),
            (p(-bhw, jz), p(-bhw, bz)),
            (p(-bhw, bz), p(bhw, bz)),
            (p(bhw, bz), p(bhw, jz)),
            (p(bhw, jz), p(hw, jz)),
            (p(hw, jz), p(hw, ez)),
            (p(hw, ez), p(hw, oz)),
            (p(hw, oz), p(-hw, oz)),
        ]
    }

    /// Positions of the lights placed at the T-bar corners and the junction.
    pub fn corner_points(&self) -> [Vec3; 5] {
        let bhw = self.bar_half_width();
        let (jz, bz) = (self.junction_z(), self.back_z());
        [
            Vec3::new(-bhw, 0.0, jz),
            Vec3::new(bhw, 0.0, jz),
            Vec3::new(-bhw, 0.0, bz),
            Vec3::new(bhw, 0.0, bz),
            Vec3::new(0.0, 0.0, jz),
        ]
    }

    /// The fixed wall positions of the 27 orbs, in slot order.
    ///
    /// Order: corridor pairs from the entrance inwards (left then right),
    /// the two T-bar front walls beside the junction, the two T-bar ends,
    /// then the back wall from left to right.
    pub fn wall_slots(&self) -> Vec<WallSlot> {
        let mut slots = Vec::with_capacity(ORB_COUNT);
        let hw = self.half_width() - ORB_WALL_INSET;
        let bhw = self.bar_half_width() - ORB_WALL_INSET;

        let pairs = 8;
        let z_start = self.entrance_z() - 6.0;
        let z_end = self.junction_z() + 6.0;
        for i in 0..pairs {
            let t = i as f32 / (pairs - 1) as f32;
            let z = z_start + (z_end - z_start) * t;
            slots.push(WallSlot::new(-hw, z, FRAC_PI_2));
            slots.push(WallSlot::new(hw, z, -FRAC_PI_2));
        }

        let front_z = self.junction_z() - ORB_WALL_INSET;
        let front_x = (self.half_width() + self.bar_half_width()) * 0.5;
        slots.push(WallSlot::new(-front_x, front_z, PI));
        slots.push(WallSlot::new(front_x, front_z, PI));

        let end_z = (self.junction_z() + self.back_z()) * 0.5;
        slots.push(WallSlot::new(-bhw, end_z, FRAC_PI_2));
        slots.push(WallSlot::new(bhw, end_z, -FRAC_PI_2));

        let back = 7;
        let back_z = self.back_z() + ORB_WALL_INSET;
        let span = bhw - 5.0;
        for i in 0..back {
            let t = i as f32 / (back - 1) as f32;
            slots.push(WallSlot::new(-span + 2.0 * span * t, back_z, 0.0));
        }
        debug_assert_eq!(slots.len(), ORB_COUNT);
        slots
    }
}

/// One orb mount point: floor position plus the yaw its face points along.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WallSlot {
    pub position: Vec3,
    pub facing: f32,
}

impl WallSlot {
    fn new(x: f32, z: f32, facing: f32) -> Self {
        Self {
            position: Vec3::new(x, ORB_HEIGHT, z),
            facing,
        }
    }

    /// Unit vector the orb faces: +Z rotated by `facing` about the Y axis.
    pub fn normal(&self) -> Vec3 {
        Vec3::new(self.facing.sin(), 0.0, self.facing.cos())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_layout_planes() {
        let l = HallLayout::new(16.0, 80.0, 70.0, 12.0, 35.0).unwrap();
        assert_eq!(l.junction_z(), -70.0);
        assert_eq!(l.back_z(), -82.0);
        assert!(l.is_walkable(0.0, -75.0));
        assert!(!l.is_walkable(0.0, -90.0));
    }

    #[test]
    fn bar_extends_past_corridor_only_beyond_junction() {
        let l = HallLayout::default();
        assert!(l.is_walkable(30.0, -75.0));
        assert!(!l.is_walkable(30.0, -60.0));
        assert!(!l.is_walkable(0.0, l.outer_z() + 0.01));
    }

    #[test]
    fn wall_slots_are_walkable_and_complete() {
        let l = HallLayout::default();
        let slots = l.wall_slots();
        assert_eq!(slots.len(), ORB_COUNT);
        for s in &slots {
            assert!(l.is_walkable(s.position.x, s.position.z), "{s:?}");
        }
    }

    #[test]
    fn slots_face_into_the_hall() {
        let l = HallLayout::default();
        for s in l.wall_slots() {
            let ahead = s.position + s.normal() * 2.0;
            assert!(l.is_walkable(ahead.x, ahead.z), "{s:?} faces a wall");
        }
    }

    #[test]
    fn rejects_degenerate_layouts() {
        assert!(HallLayout::new(0.0, 80.0, 70.0, 12.0, 35.0).is_err());
        assert!(HallLayout::new(16.0, 80.0, 10.0, 12.0, 35.0).is_err());
        assert!(HallLayout::new(16.0, f32::NAN, 70.0, 12.0, 35.0).is_err());
    }

    #[test]
    fn outline_is_closed() {
        let segs = HallLayout::default().outline_segments();
        for w in segs.windows(2) {
            assert_eq!(w[0].1, w[1].0);
        }
        assert_eq!(segs.last().unwrap().1, segs[0].0);
    }
}
