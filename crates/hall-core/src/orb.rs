//! Memory orbs: per-orb media state, slideshow crossfades and video redraws.

use crate::builders::Platform;
use crate::constants::*;
use crate::hall::{OrbTimer, TimerEvent};
use crate::layout::WallSlot;
use crate::media::{MediaRef, MediaSource, ResolveStage, ResolvedMedia};
use crate::scene::{NodeId, SceneGraph, TextureId};
use crate::surface::{Rgba, Surface2d};
use crate::texture::{compose_crossfade, compose_orb_frame, ease_in_out, paint_fallback};
use crate::timers::{TimerId, Timers};
use glam::Vec3;

/// Orb colours, assigned by slot index.
pub const ORB_PALETTE: [u32; 9] = [
    0x66ccff, 0xff77aa, 0x9d7bff, 0x5cffc8, 0xffc857, 0xff8a5c, 0x7bd3ff, 0xc77dff, 0x8cff66,
];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorProfile {
    pub rgb: Rgba,
    pub hex: u32,
}

impl ColorProfile {
    pub fn from_hex(hex: u32) -> Self {
        Self {
            rgb: Rgba::from_hex(hex),
            hex,
        }
    }

    pub fn for_slot(index: usize) -> Self {
        Self::from_hex(ORB_PALETTE[index % ORB_PALETTE.len()])
    }

    pub fn rgb3(&self) -> [f32; 3] {
        [self.rgb.r, self.rgb.g, self.rgb.b]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaState {
    Empty,
    LoadingVideo,
    PlayingVideo,
    /// Probing the image sequence; carries the number found so far.
    LoadingSlideshow(usize),
    SlideshowPlaying { index: usize, crossfading: bool },
    Fallback,
}

impl MediaState {
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            MediaState::Empty | MediaState::LoadingVideo | MediaState::LoadingSlideshow(_)
        )
    }
}

#[derive(Debug)]
enum OrbMedia<M> {
    None,
    Video(M),
    Images(Vec<M>),
}

#[derive(Clone, Copy, Debug)]
struct Crossfade {
    from: usize,
    to: usize,
    started_ms: f64,
    /// Last step drawn, in 0..=CROSSFADE_STEPS.
    step: u32,
    timer: TimerId,
}

/// Quantised crossfade step reached `elapsed_ms` into the fade.
fn crossfade_step(elapsed_ms: f64) -> u32 {
    let progress = (elapsed_ms / CROSSFADE_DURATION_MS).clamp(0.0, 1.0);
    (progress * CROSSFADE_STEPS as f64).floor() as u32
}

/// Scene nodes owned by one orb.
#[derive(Clone, Copy, Debug)]
pub struct OrbNodes {
    pub sprite: NodeId,
    pub glow: NodeId,
    pub light: NodeId,
    pub caption: NodeId,
}

pub struct Orb<M> {
    pub index: usize,
    pub slot_key: &'static str,
    pub caption: String,
    pub slot: WallSlot,
    pub color: ColorProfile,
    pub phase: f32,
    pub state: MediaState,
    pub texture: TextureId,
    pub caption_texture: TextureId,
    pub nodes: OrbNodes,
    pub platform: Platform,
    media: OrbMedia<M>,
    crossfade: Option<Crossfade>,
    slideshow_timer: Option<TimerId>,
    redraw_timer: Option<TimerId>,
    released: bool,
}

impl<M: MediaSource> Orb<M> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        index: usize,
        slot_key: &'static str,
        caption: String,
        slot: WallSlot,
        texture: TextureId,
        caption_texture: TextureId,
        nodes: OrbNodes,
        platform: Platform,
    ) -> Self {
        Self {
            index,
            slot_key,
            caption,
            slot,
            color: ColorProfile::for_slot(index),
            phase: index as f32 * 0.7,
            state: MediaState::Empty,
            texture,
            caption_texture,
            nodes,
            platform,
            media: OrbMedia::None,
            crossfade: None,
            slideshow_timer: None,
            redraw_timer: None,
            released: false,
        }
    }

    /// Orb centre at time `t` seconds.
    pub fn bobbed_position(&self, t: f32) -> Vec3 {
        let y = self.slot.position.y + (t * ORB_BOB_SPEED + self.phase).sin() * ORB_BOB_AMPLITUDE;
        Vec3::new(self.slot.position.x, y, self.slot.position.z)
    }

    pub fn image_count(&self) -> usize {
        match &self.media {
            OrbMedia::Images(list) => list.len(),
            _ => 0,
        }
    }

    pub fn has_slideshow_timer(&self) -> bool {
        self.slideshow_timer.is_some()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn media_refs(&self) -> Vec<MediaRef> {
        match &self.media {
            OrbMedia::None => Vec::new(),
            OrbMedia::Video(v) => vec![MediaRef::of(v)],
            OrbMedia::Images(list) => list.iter().map(MediaRef::of).collect(),
        }
    }

    pub fn note_stage(&mut self, stage: ResolveStage) {
        if self.released || !self.state.is_loading() {
            return;
        }
        self.state = match stage {
            ResolveStage::Video => MediaState::LoadingVideo,
            ResolveStage::Images(n) => MediaState::LoadingSlideshow(n),
        };
    }

    /// Paint the fallback face; used when no folder is configured or nothing
    /// was found.
    pub fn show_fallback<S>(&mut self, scene: &mut SceneGraph<S>)
    where
        S: Surface2d<Source = M>,
    {
        if let Some(surface) = scene.texture_mut(self.texture) {
            paint_fallback(surface, self.color.rgb);
        }
        self.state = MediaState::Fallback;
    }

    /// Take ownership of resolved media and start presenting it.
    pub fn attach<S>(
        &mut self,
        resolved: ResolvedMedia<M>,
        scene: &mut SceneGraph<S>,
        timers: &mut Timers<TimerEvent>,
    ) where
        S: Surface2d<Source = M>,
    {
        if self.released || !self.state.is_loading() {
            resolved.release();
            return;
        }
        let index = self.index;
        let event = move |kind| TimerEvent::Orb { index, kind };
        match resolved {
            ResolvedMedia::Video(video) => {
                log::info!("[orb] {} playing {}", self.slot_key, video.url());
                self.media = OrbMedia::Video(video);
                self.state = MediaState::PlayingVideo;
                self.redraw(scene);
                self.redraw_timer = Some(
                    timers.schedule_interval(VIDEO_REDRAW_INTERVAL_MS, event(OrbTimer::VideoRedraw)),
                );
            }
            ResolvedMedia::Images(images) => {
                let count = images.len();
                log::info!("[orb] {} slideshow of {}", self.slot_key, count);
                self.media = OrbMedia::Images(images);
                self.state = MediaState::SlideshowPlaying {
                    index: 0,
                    crossfading: false,
                };
                self.redraw(scene);
                if count > 1 {
                    self.slideshow_timer = Some(
                        timers.schedule_interval(SLIDESHOW_INTERVAL_MS, event(OrbTimer::Slideshow)),
                    );
                }
            }
            ResolvedMedia::Nothing => self.show_fallback(scene),
        }
    }

    /// Redraw the current frame from the attached media.
    pub fn redraw<S>(&self, scene: &mut SceneGraph<S>)
    where
        S: Surface2d<Source = M>,
    {
        let source = match (&self.media, self.state) {
            (OrbMedia::Video(v), _) => v,
            (OrbMedia::Images(list), MediaState::SlideshowPlaying { index, .. }) => match list.get(index) {
                Some(img) => img,
                None => return,
            },
            _ => return,
        };
        if !source.has_frame() {
            return;
        }
        if let Some(surface) = scene.texture_mut(self.texture) {
            compose_orb_frame(surface, source, self.color.rgb);
        }
    }

    pub fn on_timer<S>(&mut self, kind: OrbTimer, scene: &mut SceneGraph<S>, timers: &mut Timers<TimerEvent>)
    where
        S: Surface2d<Source = M>,
    {
        if self.released {
            return;
        }
        match kind {
            OrbTimer::VideoRedraw => self.redraw(scene),
            OrbTimer::Slideshow => self.begin_crossfade(timers),
            OrbTimer::CrossfadeStep => self.step_crossfade(scene, timers),
        }
    }

    /// Start fading to the next image. A crossfade still in flight is
    /// finished instantly and its step timer cancelled first.
    pub fn begin_crossfade(&mut self, timers: &mut Timers<TimerEvent>) {
        let count = self.image_count();
        if count < 2 {
            return;
        }
        let mut current = match self.state {
            MediaState::SlideshowPlaying { index, .. } => index,
            _ => return,
        };
        if let Some(previous) = self.crossfade.take() {
            timers.cancel(previous.timer);
            current = previous.to;
        }
        let step_ms = CROSSFADE_DURATION_MS / CROSSFADE_STEPS as f64;
        let timer = timers.schedule_interval(
            step_ms,
            TimerEvent::Orb {
                index: self.index,
                kind: OrbTimer::CrossfadeStep,
            },
        );
        self.crossfade = Some(Crossfade {
            from: current,
            to: (current + 1) % count,
            started_ms: timers.now_ms(),
            step: 0,
            timer,
        });
        self.state = MediaState::SlideshowPlaying {
            index: current,
            crossfading: true,
        };
    }

    fn step_crossfade<S>(&mut self, scene: &mut SceneGraph<S>, timers: &mut Timers<TimerEvent>)
    where
        S: Surface2d<Source = M>,
    {
        let Some(mut fade) = self.crossfade else {
            return;
        };
        // the step timer only sets the redraw cadence; progress follows the
        // clock so slow frames cannot stretch the fade
        let step = crossfade_step(timers.now_ms() - fade.started_ms);
        if step == fade.step {
            return;
        }
        fade.step = step;
        let alpha = ease_in_out(fade.step as f32 / CROSSFADE_STEPS as f32);
        if let OrbMedia::Images(list) = &self.media {
            if let (Some(from), Some(to)) = (list.get(fade.from), list.get(fade.to)) {
                if let Some(surface) = scene.texture_mut(self.texture) {
                    compose_crossfade(surface, from, to, alpha, self.color.rgb);
                }
            }
        }
        if fade.step >= CROSSFADE_STEPS {
            timers.cancel(fade.timer);
            self.crossfade = None;
            self.state = MediaState::SlideshowPlaying {
                index: fade.to,
                crossfading: false,
            };
        } else {
            self.crossfade = Some(fade);
        }
    }

    /// Cancel timers and release media. Safe to call more than once.
    pub fn release(&mut self, timers: &mut Timers<TimerEvent>) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        let fade_timer = self.crossfade.take().map(|c| c.timer);
        for id in [self.slideshow_timer.take(), self.redraw_timer.take(), fade_timer]
            .into_iter()
            .flatten()
        {
            timers.cancel(id);
        }
        match std::mem::replace(&mut self.media, OrbMedia::None) {
            OrbMedia::Video(v) => v.release(),
            OrbMedia::Images(list) => list.iter().for_each(MediaSource::release),
            OrbMedia::None => {}
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{build_platform, PlatformGeometry};
    use crate::layout::HallLayout;
    use crate::scene::{Node, NodeKind, Transform};
    use crate::testing::{RecordingSurface, StubMedia, SurfaceOp};

    fn orb_fixture() -> (Orb<StubMedia>, SceneGraph<RecordingSurface>, RecordingSurface) {
        let mut scene = SceneGraph::new();
        let surface = RecordingSurface::new(ORB_CANVAS_SIZE, ORB_CANVAS_SIZE);
        let observer = surface.clone();
        let texture = scene.add_texture(surface);
        let caption_texture = scene.add_texture(RecordingSurface::new(1, 1));
        let slot = HallLayout::default().wall_slots()[0];
        let light = scene.add_node(Node::new(
            NodeKind::PointLight {
                color: [1.0; 3],
                intensity: 1.0,
                distance: 10.0,
            },
            Transform::at(slot.position),
        ));
        let nodes = OrbNodes {
            sprite: light,
            glow: light,
            light,
            caption: light,
        };
        let shared = PlatformGeometry::new(&mut scene);
        let platform = build_platform(&mut scene, shared, texture, slot.position, [1.0; 3], 1);
        let orb = Orb::new(
            0,
            "overview",
            "Overview".into(),
            slot,
            texture,
            caption_texture,
            nodes,
            platform,
        );
        (orb, scene, observer)
    }

    fn images(n: usize) -> Vec<StubMedia> {
        (1..=n).map(|i| StubMedia::image(&format!("{i}.jpg"))).collect()
    }

    #[test]
    fn single_image_has_no_slideshow() {
        let (mut orb, mut scene, _) = orb_fixture();
        let mut timers = Timers::new(0.0);
        orb.attach(ResolvedMedia::Images(images(1)), &mut scene, &mut timers);
        assert!(!orb.has_slideshow_timer());
        assert_eq!(timers.outstanding(), 0);
        assert_eq!(
            orb.state,
            MediaState::SlideshowPlaying {
                index: 0,
                crossfading: false
            }
        );
    }

    #[test]
    fn overlapping_crossfades_collapse_to_one() {
        let (mut orb, mut scene, _) = orb_fixture();
        let mut timers = Timers::new(0.0);
        orb.attach(ResolvedMedia::Images(images(3)), &mut scene, &mut timers);
        assert_eq!(timers.outstanding(), 1);

        orb.begin_crossfade(&mut timers);
        orb.begin_crossfade(&mut timers);
        // slideshow interval plus exactly one crossfade stepper
        assert_eq!(timers.outstanding(), 2);
        assert_eq!(
            orb.state,
            MediaState::SlideshowPlaying {
                index: 1,
                crossfading: true
            }
        );

        timers.advance(CROSSFADE_DURATION_MS);
        orb.on_timer(OrbTimer::CrossfadeStep, &mut scene, &mut timers);
        assert_eq!(
            orb.state,
            MediaState::SlideshowPlaying {
                index: 2,
                crossfading: false
            }
        );
        assert_eq!(timers.outstanding(), 1);
    }

    #[test]
    fn crossfade_steps_follow_elapsed_time() {
        let step_ms = CROSSFADE_DURATION_MS / CROSSFADE_STEPS as f64;
        assert_eq!(crossfade_step(-5.0), 0);
        assert_eq!(crossfade_step(step_ms * 0.5), 0);
        assert_eq!(crossfade_step(step_ms * 3.5), 3);
        assert_eq!(crossfade_step(CROSSFADE_DURATION_MS), CROSSFADE_STEPS);
        assert_eq!(crossfade_step(CROSSFADE_DURATION_MS * 4.0), CROSSFADE_STEPS);
    }

    #[test]
    fn late_step_jumps_ahead_instead_of_lagging() {
        let (mut orb, mut scene, observer) = orb_fixture();
        let mut timers = Timers::new(0.0);
        orb.attach(ResolvedMedia::Images(images(2)), &mut scene, &mut timers);
        orb.begin_crossfade(&mut timers);
        observer.take_ops();

        // one step fired half-way through the fade draws the half-way blend
        timers.advance(CROSSFADE_DURATION_MS * 0.5);
        orb.on_timer(OrbTimer::CrossfadeStep, &mut scene, &mut timers);
        let alphas: Vec<f32> = observer
            .take_ops()
            .into_iter()
            .filter_map(|op| match op {
                SurfaceOp::DrawSource { alpha, .. } => Some(alpha),
                _ => None,
            })
            .collect();
        assert_eq!(alphas.len(), 2);
        assert!((alphas[1] - 0.5).abs() < 1e-6, "{alphas:?}");

        // a repeat at the same time draws nothing new
        orb.on_timer(OrbTimer::CrossfadeStep, &mut scene, &mut timers);
        assert_eq!(observer.op_count(), 0);
    }

    #[test]
    fn stalled_video_keeps_last_frame() {
        let (mut orb, mut scene, observer) = orb_fixture();
        let mut timers = Timers::new(0.0);
        let video = StubMedia::video("1.mp4");
        orb.attach(ResolvedMedia::Video(video.clone()), &mut scene, &mut timers);
        let painted = observer.op_count();
        assert!(painted > 0);
        video.set_drawable(false);
        orb.on_timer(OrbTimer::VideoRedraw, &mut scene, &mut timers);
        assert_eq!(observer.op_count(), painted);
        assert_eq!(orb.state, MediaState::PlayingVideo);
    }

    #[test]
    fn release_is_idempotent() {
        let (mut orb, mut scene, _) = orb_fixture();
        let mut timers = Timers::new(0.0);
        let list = images(2);
        orb.attach(ResolvedMedia::Images(list.clone()), &mut scene, &mut timers);
        orb.begin_crossfade(&mut timers);
        assert!(orb.release(&mut timers));
        assert!(!orb.release(&mut timers));
        assert_eq!(timers.outstanding(), 0);
        assert!(list.iter().all(|m| m.release_count() == 1));

        let late = StubMedia::video("late.mp4");
        orb.attach(ResolvedMedia::Video(late.clone()), &mut scene, &mut timers);
        assert_eq!(late.release_count(), 1);
        assert_eq!(timers.outstanding(), 0);
    }
}
