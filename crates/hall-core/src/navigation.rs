//! First-person navigation: drag-to-look, key-driven movement with friction,
//! and wall sliding against the hall's floor rectangles.

use crate::camera::Camera;
use crate::constants::*;
use crate::layout::HallLayout;
use glam::{Vec2, Vec3};
use std::f32::consts::FRAC_PI_2;

/// Pitch limits: straight down to straight up.
const PITCH_MIN: f32 = -FRAC_PI_2;
const PITCH_MAX: f32 = FRAC_PI_2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveKeys {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

/// Pointer drag bookkeeping. `origin` is where the press happened and is only
/// used to tell a click from a drag on release.
#[derive(Default, Clone, Copy, Debug)]
pub struct DragState {
    pub down: bool,
    pub last: Vec2,
    pub origin: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerRelease {
    /// Release close to the press point; carries the release position.
    Click(Vec2),
    Drag,
}

/// What the collision step did with this frame's displacement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Idle,
    Moved,
    SlidX,
    SlidZ,
    Blocked,
}

#[derive(Clone, Debug)]
pub struct NavigationState {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub velocity: Vec3,
    pub keys: MoveKeys,
    pub drag: DragState,
}

impl NavigationState {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
            velocity: Vec3::ZERO,
            keys: MoveKeys::default(),
            drag: DragState::default(),
        }
    }

    pub fn set_key(&mut self, dir: Direction, pressed: bool) {
        match dir {
            Direction::Forward => self.keys.forward = pressed,
            Direction::Backward => self.keys.backward = pressed,
            Direction::Left => self.keys.left = pressed,
            Direction::Right => self.keys.right = pressed,
        }
    }

    /// Clear held keys, e.g. when the window loses focus.
    pub fn release_keys(&mut self) {
        self.keys = MoveKeys::default();
    }

    pub fn pointer_down(&mut self, pos: Vec2) {
        self.drag = DragState {
            down: true,
            last: pos,
            origin: pos,
        };
    }

    /// Returns true when the move changed the view direction.
    pub fn pointer_move(&mut self, pos: Vec2) -> bool {
        if !self.drag.down {
            return false;
        }
        let delta = pos - self.drag.last;
        self.drag.last = pos;
        if delta == Vec2::ZERO {
            return false;
        }
        self.apply_look_delta(delta.x, delta.y);
        true
    }

    /// Ends a drag. Returns `None` when no press was active.
    pub fn pointer_up(&mut self, pos: Vec2) -> Option<PointerRelease> {
        if !self.drag.down {
            return None;
        }
        self.drag.down = false;
        self.drag.last = pos;
        if pos.distance(self.drag.origin) < CLICK_THRESHOLD_PX {
            Some(PointerRelease::Click(pos))
        } else {
            Some(PointerRelease::Drag)
        }
    }

    pub fn apply_look_delta(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * LOOK_SENSITIVITY;
        self.pitch = (self.pitch - dy * LOOK_SENSITIVITY).clamp(PITCH_MIN, PITCH_MAX);
    }

    /// Horizontal forward vector; yaw 0 looks down -Z.
    #[inline]
    pub fn flat_forward(&self) -> Vec3 {
        Vec3::new(self.yaw.sin(), 0.0, -self.yaw.cos())
    }

    #[inline]
    pub fn flat_right(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, self.yaw.sin())
    }

    pub fn view_direction(&self) -> Vec3 {
        Vec3::new(
            self.yaw.sin() * self.pitch.cos(),
            self.pitch.sin(),
            -self.yaw.cos() * self.pitch.cos(),
        )
    }

    pub fn camera(&self, aspect: f32) -> Camera {
        let mut dir = self.view_direction();
        // look_at degenerates when looking straight up or down
        if dir.x.abs() < 1e-5 && dir.z.abs() < 1e-5 {
            dir += self.flat_forward() * 1e-3;
        }
        Camera::perspective(self.position, self.position + dir, aspect)
    }

    /// Advance one frame: accumulate input, apply friction, then resolve the
    /// candidate position against the floor boundary.
    pub fn update(&mut self, dt: f32, layout: &HallLayout) -> StepOutcome {
        let mut input = Vec2::ZERO;
        if self.keys.forward {
            input.y += 1.0;
        }
        if self.keys.backward {
            input.y -= 1.0;
        }
        if self.keys.right {
            input.x += 1.0;
        }
        if self.keys.left {
            input.x -= 1.0;
        }
        if input != Vec2::ZERO {
            let input = input.normalize();
            let dir = self.flat_forward() * input.y + self.flat_right() * input.x;
            self.velocity += dir * MOVE_SPEED * dt;
        }
        self.velocity *= FRICTION;

        let outcome = self.resolve_step(dt, layout);
        self.position.y = self.position.y.clamp(CAMERA_MIN_Y, CAMERA_MAX_Y);
        outcome
    }

    fn resolve_step(&mut self, dt: f32, layout: &HallLayout) -> StepOutcome {
        let dx = self.velocity.x * dt;
        let dz = self.velocity.z * dt;
        if dx == 0.0 && dz == 0.0 {
            return StepOutcome::Idle;
        }
        let (x, z) = (self.position.x, self.position.z);
        let (nx, nz) = (x + dx, z + dz);
        if layout.is_walkable(nx, nz) {
            self.position.x = nx;
            self.position.z = nz;
            return StepOutcome::Moved;
        }

        let x_free = dx != 0.0 && layout.is_walkable(nx, z);
        let z_free = dz != 0.0 && layout.is_walkable(x, nz);
        // Both single-axis moves can be free at a convex corner; keep the
        // dominant axis so the combined move never lands outside.
        let slide_x = match (x_free, z_free) {
            (true, false) => Some(true),
            (false, true) => Some(false),
            (true, true) => Some(dx.abs() >= dz.abs()),
            (false, false) => None,
        };
        match slide_x {
            Some(true) => {
                self.position.x = nx;
                self.velocity.z = 0.0;
                StepOutcome::SlidX
            }
            Some(false) => {
                self.position.z = nz;
                self.velocity.x = 0.0;
                StepOutcome::SlidZ
            }
            None => {
                self.velocity = Vec3::ZERO;
                StepOutcome::Blocked
            }
        }
    }

    pub fn is_moving(&self) -> bool {
        self.velocity.length() > VELOCITY_EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn drag_updates_yaw_and_pitch() {
        let mut nav = NavigationState::new(Vec3::ZERO);
        nav.pointer_down(Vec2::new(100.0, 100.0));
        assert!(nav.pointer_move(Vec2::new(200.0, 50.0)));
        assert!((nav.yaw - 100.0 * LOOK_SENSITIVITY).abs() < 1e-6);
        assert!((nav.pitch - 50.0 * LOOK_SENSITIVITY).abs() < 1e-6);
    }

    #[test]
    fn move_without_press_is_ignored() {
        let mut nav = NavigationState::new(Vec3::ZERO);
        assert!(!nav.pointer_move(Vec2::new(50.0, 50.0)));
        assert_eq!(nav.yaw, 0.0);
    }

    #[test]
    fn pitch_is_clamped_to_vertical() {
        let mut nav = NavigationState::new(Vec3::ZERO);
        nav.apply_look_delta(0.0, -1.0e6);
        assert!((nav.pitch - FRAC_PI_2).abs() < 1e-6);
        nav.apply_look_delta(0.0, 1.0e6);
        assert!((nav.pitch + FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn release_below_threshold_is_click() {
        let mut nav = NavigationState::new(Vec3::ZERO);
        nav.pointer_down(Vec2::new(10.0, 10.0));
        nav.pointer_move(Vec2::new(12.0, 13.0));
        assert_eq!(
            nav.pointer_up(Vec2::new(12.0, 13.0)),
            Some(PointerRelease::Click(Vec2::new(12.0, 13.0)))
        );
    }

    #[test]
    fn release_at_threshold_is_drag() {
        let mut nav = NavigationState::new(Vec3::ZERO);
        nav.pointer_down(Vec2::new(10.0, 10.0));
        assert_eq!(
            nav.pointer_up(Vec2::new(15.0, 10.0)),
            Some(PointerRelease::Drag)
        );
        assert_eq!(nav.pointer_up(Vec2::new(15.0, 10.0)), None);
    }

    #[test]
    fn forward_key_moves_down_the_corridor() {
        let layout = HallLayout::default();
        let mut nav = NavigationState::new(layout.spawn_point());
        let start = nav.position;
        nav.set_key(Direction::Forward, true);
        for _ in 0..30 {
            nav.update(DT, &layout);
        }
        assert!(nav.position.z < start.z);
        assert!((nav.position.x - start.x).abs() < 1e-4);
    }

    #[test]
    fn friction_converges_without_input() {
        let layout = HallLayout::default();
        let mut nav = NavigationState::new(Vec3::new(0.0, CAMERA_START_Y, -30.0));
        nav.velocity = Vec3::new(0.0, 0.0, -10.0);
        let initial = nav.velocity.length();
        let mut prev = initial;
        for _ in 0..60 {
            nav.update(DT, &layout);
            let speed = nav.velocity.length();
            assert!(speed < prev, "speed must strictly decrease");
            prev = speed;
        }
        assert!(prev < initial * 0.01);
    }

    #[test]
    fn height_is_clamped() {
        let layout = HallLayout::default();
        let mut nav = NavigationState::new(Vec3::new(0.0, 50.0, -30.0));
        nav.update(DT, &layout);
        assert_eq!(nav.position.y, CAMERA_MAX_Y);
    }

    #[test]
    fn blocked_both_axes_zeroes_velocity() {
        let layout = HallLayout::default();
        let hw = layout.half_width();
        let mut nav = NavigationState::new(Vec3::new(-hw, CAMERA_START_Y, layout.outer_z()));
        nav.velocity = Vec3::new(-5.0, 0.0, 5.0);
        assert_eq!(nav.update(DT, &layout), StepOutcome::Blocked);
        assert_eq!(nav.velocity, Vec3::ZERO);
    }
}
