// Host-side tests for front-end constants and their relationship to the shaders.
// The main crate is wasm-only, so we include the pure-Rust modules directly.

#![allow(dead_code)]
mod constants {
    include!("../src/constants.rs");
}

use constants::*;

#[test]
fn light_budget_matches_scene_shader() {
    let decl = format!("const MAX_LIGHTS: u32 = {}u;", MAX_LIGHTS);
    assert!(
        hall_core::SCENE_WGSL.contains(&decl),
        "scene.wgsl must declare {decl}"
    );
}

#[test]
#[allow(clippy::assertions_on_constants)]
fn draw_uniform_stride_fits_dynamic_offsets() {
    // model (64) + color (16) + params (16)
    assert!(DRAW_UNIFORM_STRIDE >= 96);
    assert_eq!(DRAW_UNIFORM_STRIDE % 256, 0);
    assert!(INITIAL_DRAW_CAPACITY > 0);
    assert!(MIN_POINT_CAPACITY.is_power_of_two());
}

#[test]
fn post_shader_exposes_bloom_entry_points() {
    for entry in ["vs_fullscreen", "fs_bright", "fs_blur", "fs_composite"] {
        assert!(hall_core::POST_WGSL.contains(&format!("fn {entry}(")), "{entry}");
    }
    for entry in ["vs_mesh", "fs_mesh", "vs_sprite", "vs_points", "fs_unlit"] {
        assert!(hall_core::SCENE_WGSL.contains(&format!("fn {entry}(")), "{entry}");
    }
}

#[test]
fn composite_reads_the_motion_flag() {
    assert!(hall_core::POST_WGSL.contains("  motion: f32,"));
    assert!(hall_core::POST_WGSL.contains("U.motion"));
    assert!(!hall_core::POST_WGSL.contains("ambient"));
}

#[test]
#[allow(clippy::assertions_on_constants)]
fn fades_and_bloom_are_sane() {
    assert!(LOADING_FADE_MS > 0 && BLACKOUT_FADE_MS > 0 && EXIT_FADE_MS > 0);
    assert!(BLOOM_STRENGTH > 0.0 && BLOOM_STRENGTH <= 2.0);
    assert!(BLOOM_THRESHOLD > 0.0 && BLOOM_THRESHOLD < 1.0);
}

#[test]
fn overlay_ids_are_distinct() {
    let ids = [CANVAS_ID, LOADING_ID, LOADING_BAR_ID, BLACKOUT_ID];
    for (i, a) in ids.iter().enumerate() {
        for b in &ids[i + 1..] {
            assert_ne!(a, b);
        }
    }
}
