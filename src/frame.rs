use crate::canvas2d::CanvasSurface;
use crate::dom;
use crate::render;
use hall_core::Hall;
use instant::Instant;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

pub struct FrameContext {
    pub hall: Rc<RefCell<Hall<CanvasSurface>>>,
    pub gpu: render::GpuState,
    pub canvas: web::HtmlCanvasElement,
    pub last_instant: Instant,
}

impl FrameContext {
    pub fn new(
        hall: Rc<RefCell<Hall<CanvasSurface>>>,
        gpu: render::GpuState,
        canvas: web::HtmlCanvasElement,
    ) -> Self {
        Self {
            hall,
            gpu,
            canvas,
            last_instant: Instant::now(),
        }
    }

    pub fn frame(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_instant).as_secs_f32();
        self.last_instant = now;

        dom::sync_canvas_backing_size(&self.canvas);
        let (w, h) = (self.canvas.width(), self.canvas.height());
        self.gpu.resize_if_needed(w, h);

        // an input handler holding the hall skips this frame
        let Ok(mut hall) = self.hall.try_borrow_mut() else {
            return;
        };
        if hall.is_torn_down() {
            return;
        }
        hall.set_viewport(w as f32, h as f32);
        hall.frame(dt);
        match self.gpu.render(&mut hall, dt) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => self.gpu.reconfigure(),
            Err(e) => log::error!("[gpu] frame error: {:?}", e),
        }
    }
}

/// Cancellable `requestAnimationFrame` loop. Dropping it stops the loop and
/// frees the frame context, which releases the GPU state. Must not be
/// stopped from inside its own callback.
pub struct FrameLoop {
    raf_id: Rc<Cell<Option<i32>>>,
    tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
}

fn request_frame(tick: &Rc<RefCell<Option<Closure<dyn FnMut()>>>>, raf_id: &Cell<Option<i32>>) {
    let Some(w) = web::window() else {
        return;
    };
    if let Some(cb) = tick.borrow().as_ref() {
        match w.request_animation_frame(cb.as_ref().unchecked_ref()) {
            Ok(id) => raf_id.set(Some(id)),
            Err(e) => log::error!("[frame] requestAnimationFrame failed: {:?}", e),
        }
    }
}

impl FrameLoop {
    pub fn start(ctx: FrameContext) -> Self {
        let raf_id: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
        let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
        let tick_clone = Rc::downgrade(&tick);
        let raf_clone = raf_id.clone();
        let mut ctx = ctx;
        *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            raf_clone.set(None);
            ctx.frame();
            // a weak handle: once the loop is dropped nothing re-arms
            if let Some(tick) = tick_clone.upgrade() {
                request_frame(&tick, &raf_clone);
            }
        }) as Box<dyn FnMut()>));
        request_frame(&tick, &raf_id);
        Self { raf_id, tick }
    }

    pub fn stop(&mut self) {
        if let (Some(id), Some(w)) = (self.raf_id.take(), web::window()) {
            _ = w.cancel_animation_frame(id);
        }
        self.tick.borrow_mut().take();
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
