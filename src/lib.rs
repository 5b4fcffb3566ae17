#![cfg(target_arch = "wasm32")]
//! Browser front-end for the memory hall: WebGPU rendering, DOM overlays,
//! input wiring and media loading around `hall_core`.
//!
//! The host page calls `enterHall(contentJson, accent)` and `exitHall()`,
//! and reports modal dismissal through `mediaClosed()`.

use wasm_bindgen::prelude::*;

mod canvas2d;
mod constants;
mod dom;
mod events;
mod frame;
mod input;
mod media;
mod modal;
mod overlay;
mod render;
mod session;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("memory-hall ready");
    Ok(())
}

/// Build and show the hall for `content_json`
/// (`{"title", "folder", "cardTitles"}`). `accent` is an optional `#rrggbb`.
#[wasm_bindgen(js_name = enterHall)]
pub async fn enter_hall(content_json: String, accent: Option<String>) -> Result<(), JsValue> {
    session::enter(&content_json, accent.as_deref()).await.map_err(|e| {
        log::error!("[hall] enter failed: {:?}", e);
        JsValue::from_str(&e.to_string())
    })
}

#[wasm_bindgen(js_name = exitHall)]
pub async fn exit_hall() {
    session::exit().await;
}

#[wasm_bindgen(js_name = mediaClosed)]
pub fn media_closed() {
    modal::mark_closed();
}
