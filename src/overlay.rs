//! Loading screen and blackout overlay driven by the loading handshake.

use crate::constants::*;
use crate::dom;
use hall_core::loading::{LoadingScreen, Pacer};
use wasm_bindgen::JsCast;
use web_sys as web;

const LOADING_STYLE: &str = "position:fixed;inset:0;z-index:20;display:flex;flex-direction:column;\
align-items:center;justify-content:center;gap:18px;background:#05040c;color:#d8ccff;\
font:500 15px system-ui,sans-serif;letter-spacing:0.2em;transition:opacity 600ms ease;";
const BAR_TRACK_STYLE: &str = "width:min(320px,60vw);height:3px;border-radius:2px;\
background:rgba(140,110,255,0.18);overflow:hidden;";
const BAR_STYLE: &str = "height:100%;width:0%;background:linear-gradient(90deg,#6d4bff,#c9b6ff);\
transition:width 120ms linear;";
const BLACKOUT_STYLE: &str = "position:fixed;inset:0;z-index:30;background:#000;opacity:0;\
pointer-events:none;transition:opacity 800ms ease;";

fn element(document: &web::Document, tag: &str, id: Option<&str>, style: &str) -> Option<web::HtmlElement> {
    let el = document.create_element(tag).ok()?.dyn_into::<web::HtmlElement>().ok()?;
    if let Some(id) = id {
        el.set_id(id);
    }
    _ = el.set_attribute("style", style);
    Some(el)
}

fn remove_by_id(document: &web::Document, id: &str) {
    if let Some(el) = document.get_element_by_id(id) {
        el.remove();
    }
}

fn html_by_id(document: &web::Document, id: &str) -> Option<web::HtmlElement> {
    document.get_element_by_id(id)?.dyn_into::<web::HtmlElement>().ok()
}

/// DOM loading screen. Elements are created on `show` and removed on `hide`.
pub struct DomLoadingScreen {
    document: web::Document,
}

impl DomLoadingScreen {
    pub fn new(document: web::Document) -> Self {
        Self { document }
    }
}

impl LoadingScreen for DomLoadingScreen {
    fn show(&self) {
        remove_by_id(&self.document, LOADING_ID);
        let Some(body) = self.document.body() else {
            return;
        };
        let Some(screen) = element(&self.document, "div", Some(LOADING_ID), LOADING_STYLE) else {
            return;
        };
        screen.set_text_content(Some("ENTERING THE HALL"));
        if let (Some(track), Some(bar)) = (
            element(&self.document, "div", None, BAR_TRACK_STYLE),
            element(&self.document, "div", Some(LOADING_BAR_ID), BAR_STYLE),
        ) {
            _ = track.append_child(&bar);
            _ = screen.append_child(&track);
        }
        _ = body.append_child(&screen);
    }

    fn set_progress(&self, percent: u32) {
        if let Some(bar) = html_by_id(&self.document, LOADING_BAR_ID) {
            dom::set_style(&bar, "width", &format!("{}%", percent.min(100)));
        }
    }

    async fn fade_to_black(&self) {
        remove_by_id(&self.document, BLACKOUT_ID);
        let Some(body) = self.document.body() else {
            return;
        };
        let Some(black) = element(&self.document, "div", Some(BLACKOUT_ID), BLACKOUT_STYLE) else {
            return;
        };
        _ = body.append_child(&black);
        dom::next_frame().await;
        dom::set_style(&black, "opacity", "1");
        dom::sleep_ms(BLACKOUT_FADE_MS).await;
        // the hall is already rendering underneath; drop the loading screen
        remove_by_id(&self.document, LOADING_ID);
    }

    async fn hide(&self) {
        if let Some(screen) = html_by_id(&self.document, LOADING_ID) {
            dom::set_style(&screen, "opacity", "0");
            dom::sleep_ms(LOADING_FADE_MS).await;
            remove_by_id(&self.document, LOADING_ID);
        }
        if let Some(black) = html_by_id(&self.document, BLACKOUT_ID) {
            dom::set_style(&black, "opacity", "0");
            dom::sleep_ms(BLACKOUT_FADE_MS).await;
            remove_by_id(&self.document, BLACKOUT_ID);
        }
    }
}

/// `setTimeout`-backed pacing for synthetic progress and the black hold.
pub struct TimeoutPacer;

impl Pacer for TimeoutPacer {
    async fn sleep(&self, ms: u32) {
        dom::sleep_ms(ms).await;
    }
}

/// Fade the hall canvas in or out over `ms`.
pub async fn fade_canvas(canvas: &web::HtmlCanvasElement, visible: bool, ms: u32) {
    dom::set_style(canvas, "transition", &format!("opacity {ms}ms ease"));
    dom::next_frame().await;
    dom::set_style(canvas, "opacity", if visible { "1" } else { "0" });
    dom::sleep_ms(ms).await;
}

/// Remove any overlay left behind by an interrupted handshake.
pub fn clear(document: &web::Document) {
    remove_by_id(document, LOADING_ID);
    remove_by_id(document, BLACKOUT_ID);
}
