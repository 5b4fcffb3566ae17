//! One hall visit: enter builds the hall behind the loading screen and starts
//! the frame loop; exit fades out and tears every piece down.

use crate::canvas2d::CanvasSurface;
use crate::constants::{ASSETS_ROOT, CANVAS_ID, EXIT_FADE_MS};
use crate::dom;
use crate::events::{keyboard, pointer, Listener};
use crate::frame::{FrameContext, FrameLoop};
use crate::media::WebAssetProbe;
use crate::modal;
use crate::overlay::{self, DomLoadingScreen, TimeoutPacer};
use crate::render::GpuState;
use hall_core::loading::run_loading;
use hall_core::{load_all_media, parse_accent, ContentDescriptor, Hall, HallConfig, HallLayout};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

pub type SharedHall = Rc<RefCell<Hall<CanvasSurface>>>;

struct Session {
    generation: u64,
    hall: SharedHall,
    canvas: web::HtmlCanvasElement,
    frame: Option<FrameLoop>,
    listeners: Vec<Listener>,
}

thread_local! {
    static SESSION: RefCell<Option<Session>> = const { RefCell::new(None) };
    static GENERATION: Cell<u64> = const { Cell::new(0) };
    static EXITING: Cell<bool> = const { Cell::new(false) };
}

fn current_generation() -> u64 {
    GENERATION.with(Cell::get)
}

fn hall_config(accent: Option<&str>) -> HallConfig {
    let mut config = HallConfig {
        assets_root: ASSETS_ROOT.to_string(),
        seed: rand::random(),
        ..HallConfig::default()
    };
    if let Some(accent) = accent.and_then(parse_accent) {
        config.accent = accent;
    }
    config
}

/// Build a fresh hall from `content_json` and show it. Any hall already
/// shown is torn down first.
pub async fn enter(content_json: &str, accent: Option<&str>) -> anyhow::Result<()> {
    teardown_now();
    let generation = GENERATION.with(|g| {
        g.set(g.get() + 1);
        g.get()
    });
    EXITING.with(|e| e.set(false));

    let content = ContentDescriptor::from_json(content_json)?;
    let document = dom::window_document().ok_or_else(|| anyhow::anyhow!("no document"))?;
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let canvas = dom::canvas_by_id(&document, CANVAS_ID)?;
    dom::set_style(&canvas, "opacity", "0");
    dom::sync_canvas_backing_size(&canvas);
    log::info!(
        "[hall] entering generation {generation}: \"{}\" ({})",
        content.title,
        content.folder().unwrap_or("no media folder")
    );

    let gpu = GpuState::new(&canvas).await?;
    if generation != current_generation() {
        log::info!("[hall] generation {generation} superseded during GPU setup");
        return Ok(());
    }

    let screen = DomLoadingScreen::new(document.clone());
    let config = hall_config(accent);
    let frame_slot: RefCell<Option<FrameLoop>> = RefCell::new(None);
    let reveal_canvas = canvas.clone();
    let hall = run_loading(
        &screen,
        &TimeoutPacer,
        || Hall::build(HallLayout::default(), config, content, generation).map(|h| Rc::new(RefCell::new(h))),
        |hall: &SharedHall| {
            let (w, h) = (reveal_canvas.width(), reveal_canvas.height());
            hall.borrow_mut().set_viewport(w as f32, h as f32);
            let ctx = FrameContext::new(hall.clone(), gpu, reveal_canvas.clone());
            *frame_slot.borrow_mut() = Some(FrameLoop::start(ctx));
            dom::set_style(&reveal_canvas, "opacity", "1");
        },
    )
    .await?;

    let mut frame = frame_slot.into_inner();
    if generation != current_generation() {
        log::info!("[hall] generation {generation} exited during loading");
        if let Some(f) = frame.as_mut() {
            f.stop();
        }
        hall.borrow_mut().teardown();
        return Ok(());
    }

    let mut listeners = keyboard::wire(&hall, &window);
    listeners.extend(pointer::wire(&hall, &canvas));

    let loader = hall.clone();
    spawn_local(async move {
        load_all_media(&loader, &WebAssetProbe).await;
        log::debug!("[media] loading pass finished");
    });

    SESSION.with(|s| {
        *s.borrow_mut() = Some(Session {
            generation,
            hall,
            canvas,
            frame,
            listeners,
        })
    });
    Ok(())
}

/// Stop the loop, drop listeners, tear the hall down and release the GPU.
/// With `only` set, a session from any other generation is left alone.
fn teardown_now_if(only: Option<u64>) {
    let taken = SESSION.with(|s| {
        let mut slot = s.borrow_mut();
        match (slot.as_ref(), only) {
            (Some(session), Some(generation)) if session.generation != generation => None,
            _ => slot.take(),
        }
    });
    let Some(mut session) = taken else {
        return;
    };
    session.listeners.clear();
    if let Some(mut frame) = session.frame.take() {
        frame.stop();
    }
    match session.hall.try_borrow_mut() {
        Ok(mut hall) => {
            hall.teardown();
        }
        Err(_) => log::warn!(
            "[hall] generation {} busy at teardown; released on drop",
            session.generation
        ),
    }
    if let Some(document) = dom::window_document() {
        overlay::clear(&document);
    }
    if modal::is_open() {
        modal::close();
    }
}

fn teardown_now() {
    teardown_now_if(None);
}

/// Fade the hall out, tear it down and tell the host.
pub async fn exit() {
    if EXITING.with(|e| e.replace(true)) {
        return;
    }
    // an enter still loading sees the bump and discards its hall
    GENERATION.with(|g| g.set(g.get() + 1));
    let shown = SESSION.with(|s| {
        s.borrow()
            .as_ref()
            .map(|s| (s.generation, s.canvas.clone()))
    });
    match shown {
        Some((generation, canvas)) => {
            overlay::fade_canvas(&canvas, false, EXIT_FADE_MS).await;
            teardown_now_if(Some(generation));
        }
        None => {
            if let Some(document) = dom::window_document() {
                overlay::clear(&document);
            }
        }
    }
    EXITING.with(|e| e.set(false));
    modal::notify_exit();
}

/// Exit from inside an event handler. Teardown drops the calling listener,
/// so it runs on a later task.
pub fn request_exit() {
    spawn_local(exit());
}
