// Host-side tests for pure input functions.
// The main crate is wasm-only, so we include the pure-Rust modules directly.

#![allow(dead_code)]
mod input {
    include!("../src/input.rs");
}

use glam::Vec2;
use hall_core::Direction;
use input::*;

#[test]
fn wasd_and_arrows_map_to_the_same_directions() {
    let pairs = [
        ("w", "ArrowUp", Direction::Forward),
        ("s", "ArrowDown", Direction::Backward),
        ("a", "ArrowLeft", Direction::Left),
        ("d", "ArrowRight", Direction::Right),
    ];
    for (letter, arrow, dir) in pairs {
        assert_eq!(key_action(letter), Some(KeyAction::Move(dir)));
        assert_eq!(key_action(&letter.to_uppercase()), Some(KeyAction::Move(dir)));
        assert_eq!(key_action(arrow), Some(KeyAction::Move(dir)));
    }
}

#[test]
fn escape_exits_and_other_keys_are_ignored() {
    assert_eq!(key_action("Escape"), Some(KeyAction::Exit));
    for key in ["q", " ", "Enter", "Shift", "escape"] {
        assert_eq!(key_action(key), None, "{key:?}");
    }
}

#[test]
fn client_position_scales_to_backing_pixels() {
    // CSS box 400x300 at (10, 20), backing store at 2x
    let rect = (10.0, 20.0, 400.0, 300.0);
    let px = client_to_canvas_px(Vec2::new(210.0, 170.0), rect, (800, 600));
    assert!((px - Vec2::new(400.0, 300.0)).length() < 1e-4);

    let corner = client_to_canvas_px(Vec2::new(10.0, 20.0), rect, (800, 600));
    assert_eq!(corner, Vec2::ZERO);
}

#[test]
fn collapsed_canvas_maps_to_origin() {
    let px = client_to_canvas_px(Vec2::new(50.0, 50.0), (0.0, 0.0, 0.0, 0.0), (800, 600));
    assert_eq!(px, Vec2::ZERO);
}

#[test]
fn cursor_reflects_hover() {
    assert_eq!(cursor_for_hover(true), "pointer");
    assert_eq!(cursor_for_hover(false), "grab");
}
