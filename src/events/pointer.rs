use super::Listener;
use crate::dom;
use crate::input::{client_to_canvas_px, cursor_for_hover};
use crate::modal;
use crate::session::SharedHall;
use glam::Vec2;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

#[inline]
fn pointer_canvas_px(ev: &web::PointerEvent, canvas: &web::HtmlCanvasElement) -> Vec2 {
    let rect = canvas.get_bounding_client_rect();
    client_to_canvas_px(
        Vec2::new(ev.client_x() as f32, ev.client_y() as f32),
        (
            rect.left() as f32,
            rect.top() as f32,
            rect.width() as f32,
            rect.height() as f32,
        ),
        (canvas.width(), canvas.height()),
    )
}

pub fn wire(hall: &SharedHall, canvas: &web::HtmlCanvasElement) -> Vec<Listener> {
    let (down_hall, down_canvas) = (hall.clone(), canvas.clone());
    let (move_hall, move_canvas) = (hall.clone(), canvas.clone());
    let (up_hall, up_canvas) = (hall.clone(), canvas.clone());
    let cancel_hall = hall.clone();
    dom::set_style(canvas, "cursor", cursor_for_hover(false));

    [
        Listener::new(canvas, "pointerdown", move |ev: web::PointerEvent| {
            if modal::is_open() {
                return;
            }
            let pos = pointer_canvas_px(&ev, &down_canvas);
            if let Ok(mut h) = down_hall.try_borrow_mut() {
                h.pointer_down(pos);
            }
            _ = down_canvas.set_pointer_capture(ev.pointer_id());
            ev.prevent_default();
        }),
        Listener::new(canvas, "pointermove", move |ev: web::PointerEvent| {
            let pos = pointer_canvas_px(&ev, &move_canvas);
            let Ok(mut h) = move_hall.try_borrow_mut() else {
                return;
            };
            if !h.pointer_move(pos) {
                let hovering = !modal::is_open() && h.hover(pos);
                dom::set_style(&move_canvas, "cursor", cursor_for_hover(hovering));
            }
        }),
        Listener::new(canvas, "pointerup", move |ev: web::PointerEvent| {
            let pos = pointer_canvas_px(&ev, &up_canvas);
            _ = up_canvas.release_pointer_capture(ev.pointer_id());
            let picked = match up_hall.try_borrow_mut() {
                Ok(mut h) => h.pointer_up(pos),
                Err(_) => None,
            };
            if let Some(target) = picked {
                spawn_local(modal::present(target));
            }
            ev.prevent_default();
        }),
        Listener::new(canvas, "pointercancel", move |ev: web::PointerEvent| {
            // a cancelled press never opens anything
            if let Ok(mut h) = cancel_hall.try_borrow_mut() {
                h.navigation_mut().drag.down = false;
            }
            ev.prevent_default();
        }),
    ]
    .into_iter()
    .flatten()
    .collect()
}
