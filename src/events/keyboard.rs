use super::Listener;
use crate::input::{key_action, KeyAction};
use crate::modal;
use crate::session::{self, SharedHall};
use web_sys as web;

fn handle_key(hall: &SharedHall, ev: &web::KeyboardEvent, pressed: bool) {
    let Some(action) = key_action(&ev.key()) else {
        return;
    };
    match action {
        KeyAction::Move(dir) => {
            if pressed && modal::is_open() {
                return;
            }
            if let Ok(mut h) = hall.try_borrow_mut() {
                h.navigation_mut().set_key(dir, pressed);
            }
            ev.prevent_default();
        }
        KeyAction::Exit if pressed => {
            if modal::is_open() {
                modal::close();
            } else {
                session::request_exit();
            }
        }
        KeyAction::Exit => {}
    }
}

pub fn wire(hall: &SharedHall, window: &web::Window) -> Vec<Listener> {
    let down = hall.clone();
    let up = hall.clone();
    let blur = hall.clone();
    [
        Listener::new(window, "keydown", move |ev: web::KeyboardEvent| {
            handle_key(&down, &ev, true);
        }),
        Listener::new(window, "keyup", move |ev: web::KeyboardEvent| {
            handle_key(&up, &ev, false);
        }),
        // keys released while the window is unfocused never deliver keyup
        Listener::new(window, "blur", move |_: web::Event| {
            if let Ok(mut h) = blur.try_borrow_mut() {
                h.navigation_mut().release_keys();
            }
        }),
    ]
    .into_iter()
    .flatten()
    .collect()
}
