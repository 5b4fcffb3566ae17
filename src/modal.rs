//! Bridge to the host page's media modal and exit callback.
//!
//! The host exposes `window.memoryHall = { openMedia(title, media), closeMedia(), onHallExit() }`
//! and calls the exported `mediaClosed()` when the user dismisses the modal.

use crate::media::WebAssetProbe;
use hall_core::media::probe_media_refs;
use hall_core::{MediaKind, MediaRef, PickTarget};
use std::cell::Cell;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = memoryHall, js_name = openMedia)]
    fn open_media_js(title: &str, media: &JsValue) -> Result<(), JsValue>;
    #[wasm_bindgen(catch, js_namespace = memoryHall, js_name = closeMedia)]
    fn close_media_js() -> Result<(), JsValue>;
    #[wasm_bindgen(catch, js_namespace = memoryHall, js_name = onHallExit)]
    fn on_hall_exit_js() -> Result<(), JsValue>;
}

thread_local! {
    static OPEN: Cell<bool> = const { Cell::new(false) };
}

fn media_array(media: &[MediaRef]) -> JsValue {
    let array = js_sys::Array::new();
    for m in media {
        let entry = js_sys::Object::new();
        let kind = match m.kind {
            MediaKind::Video => "video",
            MediaKind::Image => "image",
        };
        _ = js_sys::Reflect::set(&entry, &"type".into(), &kind.into());
        _ = js_sys::Reflect::set(&entry, &"src".into(), &m.url.as_str().into());
        array.push(&entry);
    }
    array.into()
}

pub fn is_open() -> bool {
    OPEN.with(Cell::get)
}

pub fn open(title: &str, media: &[MediaRef]) {
    match open_media_js(title, &media_array(media)) {
        Ok(()) => OPEN.with(|o| o.set(true)),
        Err(e) => log::error!("[modal] openMedia failed: {:?}", e),
    }
}

pub fn close() {
    if let Err(e) = close_media_js() {
        log::error!("[modal] closeMedia failed: {:?}", e);
    }
    mark_closed();
}

pub fn mark_closed() {
    OPEN.with(|o| o.set(false));
}

pub fn notify_exit() {
    if let Err(e) = on_hall_exit_js() {
        log::warn!("[modal] onHallExit failed: {:?}", e);
    }
}

/// Open the modal for a picked orb, probing its media first when the orb has
/// nothing cached.
pub async fn present(target: PickTarget) {
    let media = match &target.probe {
        Some(paths) => probe_media_refs(&WebAssetProbe, paths).await,
        None => target.media.clone(),
    };
    log::info!("[modal] {} with {} item(s)", target.slot_key, media.len());
    open(&target.title, &media);
}
