//! Offscreen 2D canvases backing the hall's procedural and media textures.

use crate::media::{MediaElement, WebMedia};
use hall_core::surface::{Blend, Font, Paint, RadialGradient, TextStyle};
use hall_core::{HallError, MediaSource, Rgba, Surface2d};
use std::f64::consts::TAU;
use wasm_bindgen::JsCast;
use web_sys as web;

pub struct CanvasSurface {
    canvas: web::HtmlCanvasElement,
    ctx: web::CanvasRenderingContext2d,
}

impl CanvasSurface {
    /// Backing canvas, read by the renderer when uploading.
    pub fn canvas(&self) -> &web::HtmlCanvasElement {
        &self.canvas
    }

    fn gradient(&self, paint: &Paint) -> Option<web::CanvasGradient> {
        let Paint::Radial(RadialGradient {
            x0,
            y0,
            r0,
            x1,
            y1,
            r1,
            stops,
        }) = paint
        else {
            return None;
        };
        let gradient = self
            .ctx
            .create_radial_gradient(*x0 as f64, *y0 as f64, *r0 as f64, *x1 as f64, *y1 as f64, *r1 as f64)
            .ok()?;
        for (offset, color) in stops {
            _ = gradient.add_color_stop(offset.clamp(0.0, 1.0), &color.to_css());
        }
        Some(gradient)
    }

    fn set_fill(&self, paint: &Paint) {
        match paint {
            Paint::Solid(c) => self.ctx.set_fill_style_str(&c.to_css()),
            _ => match self.gradient(paint) {
                Some(g) => self.ctx.set_fill_style_canvas_gradient(&g),
                None => self.ctx.set_fill_style_str("transparent"),
            },
        }
    }
}

impl Surface2d for CanvasSurface {
    type Source = WebMedia;

    fn create(width: u32, height: u32) -> Result<Self, HallError> {
        let fail = |reason: String| HallError::Surface {
            width,
            height,
            reason,
        };
        let document = crate::dom::window_document().ok_or_else(|| fail("no document".into()))?;
        let canvas = document
            .create_element("canvas")
            .map_err(|e| fail(format!("{:?}", e)))?
            .dyn_into::<web::HtmlCanvasElement>()
            .map_err(|e| fail(format!("{:?}", e)))?;
        canvas.set_width(width);
        canvas.set_height(height);
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| fail(format!("{:?}", e)))?
            .ok_or_else(|| fail("2d context unavailable".into()))?
            .dyn_into::<web::CanvasRenderingContext2d>()
            .map_err(|e| fail(format!("{:?}", e)))?;
        Ok(Self { canvas, ctx })
    }

    fn width(&self) -> u32 {
        self.canvas.width()
    }

    fn height(&self) -> u32 {
        self.canvas.height()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn clear(&mut self) {
        self.ctx
            .clear_rect(0.0, 0.0, self.canvas.width() as f64, self.canvas.height() as f64);
    }

    fn set_blend(&mut self, blend: Blend) {
        let op = match blend {
            Blend::SourceOver => "source-over",
            Blend::Lighter => "lighter",
            Blend::DestinationOut => "destination-out",
        };
        _ = self.ctx.set_global_composite_operation(op);
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, paint: &Paint) {
        self.set_fill(paint);
        self.ctx.fill_rect(x as f64, y as f64, w as f64, h as f64);
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, paint: &Paint) {
        self.set_fill(paint);
        self.ctx.begin_path();
        _ = self.ctx.arc(cx as f64, cy as f64, r.max(0.0) as f64, 0.0, TAU);
        self.ctx.fill();
    }

    fn fill_rounded_rect(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32, paint: &Paint) {
        let (x, y, w, h) = (x as f64, y as f64, w as f64, h as f64);
        let r = (radius as f64).min(w * 0.5).min(h * 0.5).max(0.0);
        self.set_fill(paint);
        let c = &self.ctx;
        c.begin_path();
        c.move_to(x + r, y);
        _ = c.arc_to(x + w, y, x + w, y + h, r);
        _ = c.arc_to(x + w, y + h, x, y + h, r);
        _ = c.arc_to(x, y + h, x, y, r);
        _ = c.arc_to(x, y, x + w, y, r);
        c.close_path();
        c.fill();
    }

    fn stroke_circle(&mut self, cx: f32, cy: f32, r: f32, line_width: f32, color: Rgba) {
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.set_line_width(line_width as f64);
        self.ctx.begin_path();
        _ = self.ctx.arc(cx as f64, cy as f64, r.max(0.0) as f64, 0.0, TAU);
        self.ctx.stroke();
    }

    fn stroke_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, line_width: f32, color: Rgba) {
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.set_line_width(line_width as f64);
        self.ctx.begin_path();
        self.ctx.move_to(x0 as f64, y0 as f64);
        self.ctx.line_to(x1 as f64, y1 as f64);
        self.ctx.stroke();
    }

    fn draw_source_circle(&mut self, source: &WebMedia, cx: f32, cy: f32, r: f32, alpha: f32) -> bool {
        if !source.has_frame() {
            return false;
        }
        let (sw, sh) = source.natural_size();
        let (cx, cy, r) = (cx as f64, cy as f64, r as f64);
        // cover-fit the source into the circle's bounding square
        let scale = (2.0 * r / sw).max(2.0 * r / sh);
        let (dw, dh) = (sw * scale, sh * scale);
        let (dx, dy) = (cx - dw * 0.5, cy - dh * 0.5);

        let c = &self.ctx;
        c.save();
        c.begin_path();
        _ = c.arc(cx, cy, r, 0.0, TAU);
        c.clip();
        c.set_global_alpha(alpha.clamp(0.0, 1.0) as f64);
        let drawn = match source.element() {
            MediaElement::Video(v) => c.draw_image_with_html_video_element_and_dw_and_dh(v, dx, dy, dw, dh),
            MediaElement::Image(i) => c.draw_image_with_html_image_element_and_dw_and_dh(i, dx, dy, dw, dh),
        };
        c.restore();
        match drawn {
            Ok(()) => true,
            Err(e) => {
                log::warn!("[media] draw failed for {}: {:?}", source.url(), e);
                false
            }
        }
    }

    fn measure_text(&self, text: &str, font: &Font) -> f32 {
        self.ctx.set_font(&font.to_css());
        self.ctx
            .measure_text(text)
            .map(|m| m.width() as f32)
            .unwrap_or(text.chars().count() as f32 * font.size_px * 0.55)
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, style: &TextStyle) {
        let c = &self.ctx;
        c.save();
        c.set_font(&style.font.to_css());
        c.set_text_align("center");
        c.set_text_baseline("middle");
        if let Some((glow, blur)) = style.glow {
            c.set_shadow_color(&glow.to_css());
            c.set_shadow_blur(blur as f64);
        }
        c.set_fill_style_str(&style.color.to_css());
        _ = c.fill_text(text, x as f64, y as f64);
        c.restore();
    }
}
