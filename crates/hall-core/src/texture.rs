//! Procedural texture painting.
//!
//! Every painter draws onto a caller-supplied [`Surface2d`] and keeps no state
//! between calls. Randomised textures take an explicit seed.

use crate::constants::*;
use crate::error::HallError;
use crate::media::MediaSource;
use crate::surface::{Blend, Font, Paint, RadialGradient, Rgba, Surface2d, TextStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const NEBULA_SIZE: u32 = 512;
pub const STAR_GLOW_SIZE: u32 = 64;
pub const PARTICLE_GLOW_SIZE: u32 = 32;
pub const MOON_SIZE: u32 = 256;
pub const TITLE_FONT_PX: f32 = 96.0;
const TITLE_PADDING_PX: f32 = 32.0;
const NEBULA_CLOUDS: usize = 14;
const NEBULA_SPECKS: usize = 220;
const NEBULA_FILAMENTS: usize = 6;

/// What to paint. Text kinds size their surface to the measured text.
#[derive(Clone, Debug, PartialEq)]
pub enum TextureKind {
    NebulaFloor { seed: u64, accent: Rgba },
    StarGlow,
    ParticleGlow(Rgba),
    Fallback(Rgba),
    Caption { text: String, accent: Rgba },
    Title { text: String, accent: Rgba },
    Moon,
}

/// Allocate a surface and paint `kind` onto it.
pub fn synthesize<S: Surface2d>(kind: &TextureKind) -> Result<S, HallError> {
    let mut surface = match kind {
        TextureKind::NebulaFloor { .. } => S::create(NEBULA_SIZE, NEBULA_SIZE)?,
        TextureKind::StarGlow => S::create(STAR_GLOW_SIZE, STAR_GLOW_SIZE)?,
        TextureKind::ParticleGlow(_) => S::create(PARTICLE_GLOW_SIZE, PARTICLE_GLOW_SIZE)?,
        TextureKind::Fallback(_) => S::create(ORB_CANVAS_SIZE, ORB_CANVAS_SIZE)?,
        TextureKind::Moon => S::create(MOON_SIZE, MOON_SIZE)?,
        // resized once the text is measured
        TextureKind::Caption { .. } | TextureKind::Title { .. } => S::create(1, 1)?,
    };
    match kind {
        TextureKind::NebulaFloor { seed, accent } => paint_nebula(&mut surface, *seed, *accent),
        TextureKind::StarGlow => paint_soft_glow(&mut surface, Rgba::WHITE),
        TextureKind::ParticleGlow(color) => paint_soft_glow(&mut surface, *color),
        TextureKind::Fallback(color) => paint_fallback(&mut surface, *color),
        TextureKind::Caption { text, accent } => {
            paint_caption(&mut surface, text, *accent);
        }
        TextureKind::Title { text, accent } => {
            paint_title(&mut surface, text, *accent);
        }
        TextureKind::Moon => paint_moon(&mut surface),
    }
    Ok(surface)
}

pub fn paint_nebula<S: Surface2d>(s: &mut S, seed: u64, accent: Rgba) {
    let mut rng = StdRng::seed_from_u64(seed);
    let (w, h) = (s.width() as f32, s.height() as f32);
    let palette = [accent, Rgba::from_hex(0x3a1c71), Rgba::from_hex(0x1f4e8c)];

    s.set_blend(Blend::SourceOver);
    s.fill_rect(0.0, 0.0, w, h, &Paint::Solid(Rgba::from_hex(0x05030f)));

    s.set_blend(Blend::Lighter);
    for _ in 0..NEBULA_CLOUDS {
        let x = rng.gen_range(0.0..w);
        let y = rng.gen_range(0.0..h);
        let r = rng.gen_range(0.15..0.45) * w;
        let color = palette[rng.gen_range(0..palette.len())];
        let alpha = rng.gen_range(0.08..0.2);
        let gradient = RadialGradient::centered(
            x,
            y,
            r,
            &[(0.0, color.with_alpha(alpha)), (1.0, Rgba::TRANSPARENT)],
        );
        s.fill_circle(x, y, r, &Paint::Radial(gradient));
    }
    for _ in 0..NEBULA_FILAMENTS {
        let (x0, y0) = (rng.gen_range(0.0..w), rng.gen_range(0.0..h));
        let (x1, y1) = (rng.gen_range(0.0..w), rng.gen_range(0.0..h));
        s.stroke_line(x0, y0, x1, y1, rng.gen_range(1.0..3.0), accent.with_alpha(0.08));
    }
    for _ in 0..NEBULA_SPECKS {
        let (x, y) = (rng.gen_range(0.0..w), rng.gen_range(0.0..h));
        let r = rng.gen_range(0.4..1.6);
        let alpha = rng.gen_range(0.2..0.8);
        s.fill_circle(x, y, r, &Paint::Solid(Rgba::WHITE.with_alpha(alpha)));
    }
    s.set_blend(Blend::SourceOver);
}

/// White-hot centre fading to transparent, tinted by `color`.
pub fn paint_soft_glow<S: Surface2d>(s: &mut S, color: Rgba) {
    let c = s.width() as f32 * 0.5;
    s.clear();
    let gradient = RadialGradient::centered(
        c,
        c,
        c,
        &[
            (0.0, Rgba::WHITE),
            (0.25, color.with_alpha(0.8)),
            (1.0, Rgba::TRANSPARENT),
        ],
    );
    s.fill_circle(c, c, c, &Paint::Radial(gradient));
}

#[inline]
fn orb_geometry<S: Surface2d>(s: &S) -> (f32, f32) {
    let c = s.width() as f32 * 0.5;
    (c, c - ORB_RING_WIDTH)
}

/// Tint, rim vignette, highlight and ring drawn over every orb frame.
fn paint_orb_overlays<S: Surface2d>(s: &mut S, color: Rgba) {
    let (c, r) = orb_geometry(s);
    s.fill_circle(c, c, r, &Paint::Solid(color.with_alpha(ORB_TINT_ALPHA)));

    let vignette = RadialGradient::centered(
        c,
        c,
        r,
        &[
            (0.0, Rgba::TRANSPARENT),
            (0.65, Rgba::BLACK.with_alpha(0.1)),
            (1.0, Rgba::BLACK.with_alpha(0.6)),
        ],
    );
    s.fill_circle(c, c, r, &Paint::Radial(vignette));

    let (hx, hy) = (c - r * 0.35, c - r * 0.35);
    let highlight = RadialGradient {
        x0: hx,
        y0: hy,
        r0: 0.0,
        x1: hx,
        y1: hy,
        r1: r * 0.6,
        stops: [
            (0.0, Rgba::WHITE.with_alpha(0.35)),
            (1.0, Rgba::TRANSPARENT),
        ]
        .into_iter()
        .collect(),
    };
    s.fill_circle(c, c, r, &Paint::Radial(highlight));

    s.stroke_circle(c, c, r - ORB_RING_WIDTH * 0.5, ORB_RING_WIDTH, color);
}

/// Compose one orb frame from `source`. Returns false, leaving the previous
/// frame untouched, when the source has nothing to draw.
pub fn compose_orb_frame<S: Surface2d>(s: &mut S, source: &S::Source, color: Rgba) -> bool {
    if !source.has_frame() {
        return false;
    }
    let (c, r) = orb_geometry(s);
    s.set_blend(Blend::SourceOver);
    s.clear();
    s.draw_source_circle(source, c, c, r, 1.0);
    paint_orb_overlays(s, color);
    true
}

/// Compose a crossfade step: `from` fading out under `to` at `alpha`.
pub fn compose_crossfade<S: Surface2d>(
    s: &mut S,
    from: &S::Source,
    to: &S::Source,
    alpha: f32,
    color: Rgba,
) {
    let (c, r) = orb_geometry(s);
    let alpha = alpha.clamp(0.0, 1.0);
    s.set_blend(Blend::SourceOver);
    s.clear();
    s.draw_source_circle(from, c, c, r, 1.0 - alpha);
    s.draw_source_circle(to, c, c, r, alpha);
    paint_orb_overlays(s, color);
}

/// Orb face used when no media was found.
pub fn paint_fallback<S: Surface2d>(s: &mut S, color: Rgba) {
    let (c, r) = orb_geometry(s);
    let dark = Rgba::new(color.r * 0.25, color.g * 0.25, color.b * 0.25, 1.0);
    s.set_blend(Blend::SourceOver);
    s.clear();
    let body = RadialGradient::centered(
        c,
        c,
        r,
        &[(0.0, color.with_alpha(0.9)), (0.7, color.with_alpha(0.5)), (1.0, dark)],
    );
    s.fill_circle(c, c, r, &Paint::Radial(body));
    paint_orb_overlays(s, color);
}

/// Caption on a rounded dark plate. Returns the painted size in pixels.
pub fn paint_caption<S: Surface2d>(s: &mut S, text: &str, accent: Rgba) -> (u32, u32) {
    let font = Font::new(CAPTION_FONT_PX, 600);
    let text_w = s.measure_text(text, &font);
    let w = (text_w + 2.0 * CAPTION_PADDING_PX).ceil().max(1.0) as u32;
    let h = (CAPTION_FONT_PX + CAPTION_PADDING_PX * 1.5).ceil() as u32;
    s.resize(w, h);
    let (wf, hf) = (w as f32, h as f32);
    s.fill_rounded_rect(
        0.0,
        0.0,
        wf,
        hf,
        hf * 0.35,
        &Paint::Solid(Rgba::new(0.02, 0.02, 0.06, 0.7)),
    );
    s.fill_text(
        text,
        wf * 0.5,
        hf * 0.5,
        &TextStyle {
            font,
            color: Rgba::WHITE,
            glow: Some((accent, 8.0)),
        },
    );
    (w, h)
}

/// Large glowing title text. Returns the painted size in pixels.
pub fn paint_title<S: Surface2d>(s: &mut S, text: &str, accent: Rgba) -> (u32, u32) {
    let font = Font::new(TITLE_FONT_PX, 800);
    let text_w = s.measure_text(text, &font);
    let w = (text_w + 2.0 * TITLE_PADDING_PX).ceil().max(1.0) as u32;
    let h = (TITLE_FONT_PX + 2.0 * TITLE_PADDING_PX).ceil() as u32;
    s.resize(w, h);
    s.fill_text(
        text,
        w as f32 * 0.5,
        h as f32 * 0.5,
        &TextStyle {
            font,
            color: Rgba::WHITE,
            glow: Some((accent, 24.0)),
        },
    );
    (w, h)
}

/// Crescent moon with a warm halo.
pub fn paint_moon<S: Surface2d>(s: &mut S) {
    let c = s.width() as f32 * 0.5;
    let disk = c * 0.55;
    s.set_blend(Blend::SourceOver);
    s.clear();
    let halo = RadialGradient::centered(
        c,
        c,
        c,
        &[
            (0.0, Rgba::from_hex(0xfff4d6).with_alpha(0.35)),
            (1.0, Rgba::TRANSPARENT),
        ],
    );
    s.fill_circle(c, c, c, &Paint::Radial(halo));
    s.fill_circle(c, c, disk, &Paint::Solid(Rgba::from_hex(0xfff4d6)));
    s.set_blend(Blend::DestinationOut);
    s.fill_circle(c + disk * 0.45, c - disk * 0.2, disk * 0.9, &Paint::Solid(Rgba::BLACK));
    s.set_blend(Blend::SourceOver);
}

/// Ease-in-out quadratic on [0, 1].
#[inline]
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingSurface, StubMedia, SurfaceOp};

    fn kinds(ops: &[SurfaceOp]) -> Vec<&'static str> {
        ops.iter()
            .map(|op| match op {
                SurfaceOp::Resize(..) => "resize",
                SurfaceOp::Clear => "clear",
                SurfaceOp::Blend(_) => "blend",
                SurfaceOp::FillRect { .. } => "rect",
                SurfaceOp::FillCircle { .. } => "circle",
                SurfaceOp::FillRoundedRect { .. } => "rounded",
                SurfaceOp::StrokeCircle { .. } => "ring",
                SurfaceOp::StrokeLine { .. } => "line",
                SurfaceOp::DrawSource { .. } => "source",
                SurfaceOp::FillText { .. } => "text",
            })
            .collect()
    }

    #[test]
    fn orb_frame_layers_in_order() {
        let mut s = RecordingSurface::new(ORB_CANVAS_SIZE, ORB_CANVAS_SIZE);
        let img = StubMedia::image("a.jpg");
        assert!(compose_orb_frame(&mut s, &img, Rgba::from_hex(0x66ccff)));
        let ops = s.ops();
        assert_eq!(
            kinds(&ops),
            ["blend", "clear", "source", "circle", "circle", "circle", "ring"]
        );
        match &ops[3] {
            SurfaceOp::FillCircle {
                paint: Paint::Solid(c),
                ..
            } => assert_eq!(c.a, ORB_TINT_ALPHA),
            other => panic!("expected tint, got {other:?}"),
        }
    }

    #[test]
    fn stalled_source_keeps_last_frame() {
        let mut s = RecordingSurface::new(ORB_CANVAS_SIZE, ORB_CANVAS_SIZE);
        let video = StubMedia::video("v.mp4");
        video.set_drawable(false);
        assert!(!compose_orb_frame(&mut s, &video, Rgba::WHITE));
        assert_eq!(s.op_count(), 0);
    }

    #[test]
    fn crossfade_draws_both_sources() {
        let mut s = RecordingSurface::new(ORB_CANVAS_SIZE, ORB_CANVAS_SIZE);
        let (a, b) = (StubMedia::image("1.jpg"), StubMedia::image("2.jpg"));
        compose_crossfade(&mut s, &a, &b, 0.25, Rgba::WHITE);
        let sources: Vec<(String, f32)> = s
            .ops()
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::DrawSource { url, alpha } => Some((url.clone(), *alpha)),
                _ => None,
            })
            .collect();
        assert_eq!(sources, vec![("1.jpg".into(), 0.75), ("2.jpg".into(), 0.25)]);
    }

    #[test]
    fn caption_fits_measured_text() {
        let long = "A considerably longer caption than usual";
        let s: RecordingSurface = synthesize(&TextureKind::Caption {
            text: long.into(),
            accent: Rgba::WHITE,
        })
        .unwrap();
        let font = Font::new(CAPTION_FONT_PX, 600);
        assert!(s.width() as f32 >= s.measure_text(long, &font) + 2.0 * CAPTION_PADDING_PX);

        let short: RecordingSurface = synthesize(&TextureKind::Caption {
            text: "Hi".into(),
            accent: Rgba::WHITE,
        })
        .unwrap();
        assert!(short.width() < s.width());
    }

    #[test]
    fn nebula_is_deterministic_per_seed() {
        let paint = |seed| {
            let s: RecordingSurface = synthesize(&TextureKind::NebulaFloor {
                seed,
                accent: Rgba::from_hex(0x8a2be2),
            })
            .unwrap();
            s.take_ops()
        };
        assert_eq!(paint(7), paint(7));
        assert_ne!(paint(7), paint(8));
    }

    #[test]
    fn moon_cuts_crescent() {
        let s: RecordingSurface = synthesize(&TextureKind::Moon).unwrap();
        assert!(s.ops().contains(&SurfaceOp::Blend(Blend::DestinationOut)));
        assert_eq!(s.ops().last(), Some(&SurfaceOp::Blend(Blend::SourceOver)));
    }

    #[test]
    fn easing_is_symmetric() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert_eq!(ease_in_out(1.0), 1.0);
        assert!((ease_in_out(0.5) - 0.5).abs() < 1e-6);
        assert!((ease_in_out(0.2) + ease_in_out(0.8) - 1.0).abs() < 1e-6);
    }
}
