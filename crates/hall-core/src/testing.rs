//! Headless doubles for the platform seams: a surface that records its
//! drawing calls and media handles with no element behind them.
//!
//! Compiled for this crate's tests and for dependents enabling `testing`.

use crate::error::HallError;
use crate::media::MediaSource;
use crate::surface::{Blend, Font, Paint, Rgba, Surface2d, TextStyle};
use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

/// Media handle without a platform element behind it. Clones share the
/// frame flag and the release counter.
#[derive(Clone, Debug)]
pub struct StubMedia {
    pub url: String,
    pub video: bool,
    drawable: Rc<Cell<bool>>,
    releases: Rc<Cell<u32>>,
}

impl StubMedia {
    pub fn image(url: &str) -> Self {
        Self {
            url: url.to_string(),
            video: false,
            drawable: Rc::new(Cell::new(true)),
            releases: Rc::default(),
        }
    }

    pub fn video(url: &str) -> Self {
        Self {
            video: true,
            ..Self::image(url)
        }
    }

    /// Simulate a stalled or recovered decoder.
    pub fn set_drawable(&self, drawable: bool) {
        self.drawable.set(drawable);
    }

    pub fn release_count(&self) -> u32 {
        self.releases.get()
    }
}

impl MediaSource for StubMedia {
    fn is_video(&self) -> bool {
        self.video
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn has_frame(&self) -> bool {
        self.drawable.get()
    }

    fn release(&self) {
        self.releases.set(self.releases.get() + 1);
    }
}

/// One recorded drawing call.
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceOp {
    Resize(u32, u32),
    Clear,
    Blend(Blend),
    FillRect { x: f32, y: f32, w: f32, h: f32, paint: Paint },
    FillCircle { cx: f32, cy: f32, r: f32, paint: Paint },
    FillRoundedRect { x: f32, y: f32, w: f32, h: f32, radius: f32, paint: Paint },
    StrokeCircle { cx: f32, cy: f32, r: f32, width: f32, color: Rgba },
    StrokeLine { width: f32, color: Rgba },
    DrawSource { url: String, alpha: f32 },
    FillText { text: String, x: f32, y: f32 },
}

/// Headless surface that records every call.
///
/// Clones share the same log, so a caller can keep a handle to observe a
/// surface that has been moved into a hall.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    log: Rc<RefCell<Vec<SurfaceOp>>>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            log: Rc::default(),
        }
    }

    pub fn ops(&self) -> Ref<'_, Vec<SurfaceOp>> {
        self.log.borrow()
    }

    pub fn op_count(&self) -> usize {
        self.log.borrow().len()
    }

    pub fn take_ops(&self) -> Vec<SurfaceOp> {
        std::mem::take(&mut *self.log.borrow_mut())
    }

    fn push(&self, op: SurfaceOp) {
        self.log.borrow_mut().push(op);
    }
}

/// Average glyph advance relative to the font size used for measurement.
const RECORDING_GLYPH_ADVANCE: f32 = 0.55;

impl Surface2d for RecordingSurface {
    type Source = StubMedia;

    fn create(width: u32, height: u32) -> Result<Self, HallError> {
        Ok(Self::new(width, height))
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.push(SurfaceOp::Resize(width, height));
    }

    fn clear(&mut self) {
        self.push(SurfaceOp::Clear);
    }

    fn set_blend(&mut self, blend: Blend) {
        self.push(SurfaceOp::Blend(blend));
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, paint: &Paint) {
        self.push(SurfaceOp::FillRect {
            x,
            y,
            w,
            h,
            paint: paint.clone(),
        });
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, paint: &Paint) {
        self.push(SurfaceOp::FillCircle {
            cx,
            cy,
            r,
            paint: paint.clone(),
        });
    }

    fn fill_rounded_rect(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32, paint: &Paint) {
        self.push(SurfaceOp::FillRoundedRect {
            x,
            y,
            w,
            h,
            radius,
            paint: paint.clone(),
        });
    }

    fn stroke_circle(&mut self, cx: f32, cy: f32, r: f32, line_width: f32, color: Rgba) {
        self.push(SurfaceOp::StrokeCircle {
            cx,
            cy,
            r,
            width: line_width,
            color,
        });
    }

    fn stroke_line(&mut self, _x0: f32, _y0: f32, _x1: f32, _y1: f32, line_width: f32, color: Rgba) {
        self.push(SurfaceOp::StrokeLine {
            width: line_width,
            color,
        });
    }

    fn draw_source_circle(
        &mut self,
        source: &StubMedia,
        _cx: f32,
        _cy: f32,
        _r: f32,
        alpha: f32,
    ) -> bool {
        if !source.has_frame() {
            return false;
        }
        self.push(SurfaceOp::DrawSource {
            url: source.url.clone(),
            alpha,
        });
        true
    }

    fn measure_text(&self, text: &str, font: &Font) -> f32 {
        text.chars().count() as f32 * font.size_px * RECORDING_GLYPH_ADVANCE
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, _style: &TextStyle) {
        self.push(SurfaceOp::FillText {
            text: text.to_string(),
            x,
            y,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_clones_share_log() {
        let mut a = RecordingSurface::new(8, 8);
        let observer = a.clone();
        a.clear();
        assert_eq!(observer.op_count(), 1);
    }

    #[test]
    fn stub_clones_share_release_count() {
        let a = StubMedia::image("1.jpg");
        let b = a.clone();
        b.release();
        assert_eq!(a.release_count(), 1);
    }
}
