//! DOM listener wiring. Every listener is owned by a [`Listener`] and removed
//! from its target when dropped, so a torn-down hall leaves no callbacks
//! behind.

pub mod keyboard;
pub mod pointer;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

pub struct Listener {
    target: web::EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(web::Event)>,
}

impl Listener {
    pub fn new<E, F>(target: &web::EventTarget, kind: &'static str, mut handler: F) -> Option<Self>
    where
        E: JsCast + 'static,
        F: FnMut(E) + 'static,
    {
        let closure = Closure::wrap(Box::new(move |ev: web::Event| {
            if let Ok(ev) = ev.dyn_into::<E>() {
                handler(ev);
            }
        }) as Box<dyn FnMut(web::Event)>);
        match target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref()) {
            Ok(()) => Some(Self {
                target: target.clone(),
                kind,
                closure,
            }),
            Err(e) => {
                log::error!("[events] could not listen for {kind}: {:?}", e);
                None
            }
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref());
    }
}
