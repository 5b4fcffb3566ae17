use glam::Vec2;
use hall_core::Direction;

/// What a key press means inside the hall.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Move(Direction),
    Exit,
}

/// WASD and arrow keys move; `Escape` leaves the hall.
#[inline]
pub fn key_action(key: &str) -> Option<KeyAction> {
    match key {
        "w" | "W" | "ArrowUp" => Some(KeyAction::Move(Direction::Forward)),
        "s" | "S" | "ArrowDown" => Some(KeyAction::Move(Direction::Backward)),
        "a" | "A" | "ArrowLeft" => Some(KeyAction::Move(Direction::Left)),
        "d" | "D" | "ArrowRight" => Some(KeyAction::Move(Direction::Right)),
        "Escape" => Some(KeyAction::Exit),
        _ => None,
    }
}

/// Map a client-space pointer position into canvas backing-store pixels.
///
/// `rect` is the canvas bounding rect as `(left, top, width, height)`.
#[inline]
pub fn client_to_canvas_px(client: Vec2, rect: (f32, f32, f32, f32), backing: (u32, u32)) -> Vec2 {
    let (left, top, w, h) = rect;
    if w <= 0.0 || h <= 0.0 {
        return Vec2::ZERO;
    }
    Vec2::new(
        (client.x - left) / w * backing.0 as f32,
        (client.y - top) / h * backing.1 as f32,
    )
}

#[inline]
pub fn cursor_for_hover(hovering: bool) -> &'static str {
    if hovering {
        "pointer"
    } else {
        "grab"
    }
}
