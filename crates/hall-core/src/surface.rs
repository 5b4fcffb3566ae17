//! 2D drawing surface abstraction.
//!
//! Procedural textures and orb frames are painted through [`Surface2d`].
//! The web front-end implements it over an off-screen `<canvas>`.

use crate::error::HallError;
use crate::media::MediaSource;
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_hex(hex: u32) -> Self {
        Self::new(
            ((hex >> 16) & 0xff) as f32 / 255.0,
            ((hex >> 8) & 0xff) as f32 / 255.0,
            (hex & 0xff) as f32 / 255.0,
            1.0,
        )
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_css(self) -> String {
        let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "rgba({},{},{},{:.3})",
            c(self.r),
            c(self.g),
            c(self.b),
            self.a.clamp(0.0, 1.0)
        )
    }
}

pub type ColorStops = SmallVec<[(f32, Rgba); 4]>;

/// Two-circle radial gradient, as in the 2D canvas API.
#[derive(Clone, Debug, PartialEq)]
pub struct RadialGradient {
    pub x0: f32,
    pub y0: f32,
    pub r0: f32,
    pub x1: f32,
    pub y1: f32,
    pub r1: f32,
    pub stops: ColorStops,
}

impl RadialGradient {
    /// Concentric gradient centred on `(x, y)` from radius 0 to `r`.
    pub fn centered(x: f32, y: f32, r: f32, stops: &[(f32, Rgba)]) -> Self {
        Self {
            x0: x,
            y0: y,
            r0: 0.0,
            x1: x,
            y1: y,
            r1: r,
            stops: stops.iter().copied().collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    Solid(Rgba),
    Radial(RadialGradient),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Blend {
    SourceOver,
    Lighter,
    DestinationOut,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Font {
    pub size_px: f32,
    pub weight: u16,
    pub family: &'static str,
}

impl Font {
    pub const fn new(size_px: f32, weight: u16) -> Self {
        Self {
            size_px,
            weight,
            family: "'Segoe UI', system-ui, sans-serif",
        }
    }

    pub fn to_css(&self) -> String {
        format!("{} {}px {}", self.weight, self.size_px, self.family)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub font: Font,
    pub color: Rgba,
    /// Optional glow drawn as a text shadow: color and blur radius in pixels.
    pub glow: Option<(Rgba, f32)>,
}

pub trait Surface2d {
    type Source: MediaSource;

    fn create(width: u32, height: u32) -> Result<Self, HallError>
    where
        Self: Sized;

    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Resize the backing store. Clears the contents.
    fn resize(&mut self, width: u32, height: u32);
    fn clear(&mut self);
    fn set_blend(&mut self, blend: Blend);

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, paint: &Paint);
    fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, paint: &Paint);
    fn fill_rounded_rect(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32, paint: &Paint);
    fn stroke_circle(&mut self, cx: f32, cy: f32, r: f32, line_width: f32, color: Rgba);
    fn stroke_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, line_width: f32, color: Rgba);

    /// Draw `source` cover-fitted into the circle at `(cx, cy, r)`, clipped to
    /// it. Returns false when the source has no drawable frame yet.
    fn draw_source_circle(&mut self, source: &Self::Source, cx: f32, cy: f32, r: f32, alpha: f32)
        -> bool;

    fn measure_text(&self, text: &str, font: &Font) -> f32;
    /// Draw `text` centred on `(x, y)`.
    fn fill_text(&mut self, text: &str, x: f32, y: f32, style: &TextStyle);

    /// Drop the backing store. The surface must not be drawn to afterwards.
    fn dispose(&mut self) {
        self.resize(0, 0);
    }
}
