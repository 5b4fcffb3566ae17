//! HTML media elements behind the hall's `AssetProbe`.

use crate::constants::VIDEO_HAVE_CURRENT_DATA;
use crate::events::Listener;
use hall_core::{AssetProbe, MediaSource};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys as web;

#[derive(Clone, Debug)]
pub enum MediaElement {
    Video(web::HtmlVideoElement),
    Image(web::HtmlImageElement),
}

#[derive(Clone, Debug)]
pub struct WebMedia {
    url: String,
    element: MediaElement,
}

impl WebMedia {
    pub fn element(&self) -> &MediaElement {
        &self.element
    }

    /// Intrinsic size of the current frame in pixels.
    pub fn natural_size(&self) -> (f64, f64) {
        match &self.element {
            MediaElement::Video(v) => (v.video_width() as f64, v.video_height() as f64),
            MediaElement::Image(i) => (i.natural_width() as f64, i.natural_height() as f64),
        }
    }
}

impl MediaSource for WebMedia {
    fn is_video(&self) -> bool {
        matches!(self.element, MediaElement::Video(_))
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn has_frame(&self) -> bool {
        let (w, h) = self.natural_size();
        let ready = match &self.element {
            MediaElement::Video(v) => v.ready_state() >= VIDEO_HAVE_CURRENT_DATA,
            MediaElement::Image(i) => i.complete(),
        };
        ready && w > 0.0 && h > 0.0
    }

    fn release(&self) {
        match &self.element {
            MediaElement::Video(v) => {
                _ = v.pause();
                _ = v.remove_attribute("src");
                v.load();
            }
            MediaElement::Image(i) => {
                _ = i.remove_attribute("src");
            }
        }
        log::debug!("[media] released {}", self.url);
    }
}

/// Resolves to true on `ok`, false on `fail`. `start` runs after both
/// listeners are attached; the listeners are removed once settled.
async fn settle(target: &web::EventTarget, ok: &'static str, fail: &'static str, start: impl FnOnce()) -> bool {
    let mut listeners: Vec<Listener> = Vec::with_capacity(2);
    let mut start = Some(start);
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        let on_ok = resolve.clone();
        listeners.extend(Listener::new(target, ok, move |_: web::Event| {
            _ = on_ok.call1(&JsValue::NULL, &JsValue::TRUE);
        }));
        listeners.extend(Listener::new(target, fail, move |_: web::Event| {
            _ = resolve.call1(&JsValue::NULL, &JsValue::FALSE);
        }));
        if let Some(start) = start.take() {
            start();
        }
    });
    let settled = JsFuture::from(promise).await;
    drop(listeners);
    matches!(settled, Ok(v) if v.as_bool() == Some(true))
}

fn create<T: JsCast>(tag: &str) -> Option<T> {
    crate::dom::window_document()?
        .create_element(tag)
        .ok()?
        .dyn_into::<T>()
        .ok()
}

pub struct WebAssetProbe;

impl AssetProbe for WebAssetProbe {
    type Source = WebMedia;

    async fn load_video(&self, url: &str) -> Option<WebMedia> {
        let video: web::HtmlVideoElement = create("video")?;
        video.set_muted(true);
        video.set_loop(true);
        video.set_preload("auto");
        video.set_cross_origin(Some("anonymous"));
        _ = video.set_attribute("playsinline", "");
        let loaded = settle(&video, "loadeddata", "error", || video.set_src(url)).await;
        if !loaded {
            log::debug!("[media] no video at {url}");
            _ = video.remove_attribute("src");
            return None;
        }
        match video.play() {
            Ok(promise) => {
                let url = url.to_string();
                spawn_local(async move {
                    if let Err(e) = JsFuture::from(promise).await {
                        log::warn!("[media] playback rejected for {url}: {:?}", e);
                    }
                });
            }
            Err(e) => log::warn!("[media] play() failed for {url}: {:?}", e),
        }
        Some(WebMedia {
            url: url.to_string(),
            element: MediaElement::Video(video),
        })
    }

    async fn load_image(&self, url: &str) -> Option<WebMedia> {
        let image: web::HtmlImageElement = create("img")?;
        image.set_cross_origin(Some("anonymous"));
        let loaded = settle(&image, "load", "error", || image.set_src(url)).await;
        if !loaded {
            log::debug!("[media] no image at {url}");
            return None;
        }
        Some(WebMedia {
            url: url.to_string(),
            element: MediaElement::Image(image),
        })
    }
}
