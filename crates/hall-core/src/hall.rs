//! The hall director.
//!
//! A [`Hall`] owns the scene graph, the orbs, the navigation state and every
//! timer. It is built once, driven by [`Hall::frame`] from the animation-frame
//! loop, and torn down exactly once (explicitly or on drop). Media arrives
//! asynchronously through [`Hall::attach_media`]; completions from an older
//! generation or for a torn-down hall are released and ignored.

use crate::builders::*;
use crate::camera::{ray_sphere, Camera};
use crate::constants::*;
use crate::content::{ContentDescriptor, HallConfig, SLOT_KEYS};
use crate::error::HallError;
use crate::layout::{HallLayout, WallSlot};
use crate::media::{resolve_media, AssetPaths, AssetProbe, MediaRef, ResolveStage, ResolvedMedia};
use crate::navigation::{NavigationState, PointerRelease};
use crate::orb::{ColorProfile, MediaState, Orb, OrbNodes};
use crate::particles::ParticleEmitter;
use crate::scene::{BlendMode, Material, Node, NodeId, NodeKind, SceneGraph, TextureId, Transform};
use crate::sky::Sky;
use crate::surface::Surface2d;
use crate::texture::{paint_caption, paint_title, synthesize, TextureKind};
use crate::timers::Timers;
use crate::title::TitleBanner;
use futures::future::join_all;
use glam::{Vec2, Vec3};
use std::cell::RefCell;

const MAX_FRAME_DT: f32 = 0.1;
const DEFAULT_TITLE: &str = "Memory Hall";
const EDGE_PHASE_STEP: f32 = 0.6;
const ORB_GLOW_OFFSET: f32 = 0.2;
const ORB_LIGHT_OFFSET: f32 = 1.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrbTimer {
    VideoRedraw,
    Slideshow,
    CrossfadeStep,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    Orb { index: usize, kind: OrbTimer },
    EdgePulse,
}

/// What a click on an orb resolves to, ready for the media modal.
#[derive(Clone, Debug, PartialEq)]
pub struct PickTarget {
    pub index: usize,
    pub slot_key: &'static str,
    pub title: String,
    pub media: Vec<MediaRef>,
    /// Set when nothing is cached yet and the media should be probed for the
    /// modal.
    pub probe: Option<AssetPaths>,
}

pub struct Hall<S: Surface2d> {
    generation: u64,
    layout: HallLayout,
    config: HallConfig,
    content: ContentDescriptor,
    scene: SceneGraph<S>,
    nav: NavigationState,
    timers: Timers<TimerEvent>,
    orbs: Vec<Orb<S::Source>>,
    edges: Vec<GlowTrim>,
    arc: Option<GlowTrim>,
    flows: Vec<(NodeId, ParticleEmitter)>,
    sky: Option<Sky>,
    title: Option<TitleBanner>,
    clock_ms: f64,
    viewport: Vec2,
    torn_down: bool,
}

impl<S: Surface2d> Hall<S> {
    /// Build the whole scene. On failure everything allocated so far is
    /// released before the error is returned.
    pub fn build(
        layout: HallLayout,
        config: HallConfig,
        content: ContentDescriptor,
        generation: u64,
    ) -> Result<Self, HallError> {
        let mut hall = Self {
            generation,
            nav: NavigationState::new(layout.spawn_point()),
            layout,
            config,
            content,
            scene: SceneGraph::new(),
            timers: Timers::new(0.0),
            orbs: Vec::with_capacity(ORB_COUNT),
            edges: Vec::new(),
            arc: None,
            flows: Vec::new(),
            sky: None,
            title: None,
            clock_ms: 0.0,
            viewport: Vec2::new(1.0, 1.0),
            torn_down: false,
        };
        match hall.populate() {
            Ok(()) => {
                log::info!(
                    "[hall] generation {} built: {} nodes, {} resources",
                    generation,
                    hall.scene.node_count(),
                    hall.scene.ledger().live_count()
                );
                Ok(hall)
            }
            Err(e) => {
                log::error!("[hall] build failed, releasing partial scene: {e}");
                hall.teardown();
                Err(e)
            }
        }
    }

    fn populate(&mut self) -> Result<(), HallError> {
        let accent = self.config.accent;
        let accent3 = [accent.r, accent.g, accent.b];
        let seed = self.config.seed;
        self.scene.ambient = [0.08, 0.07, 0.12];
        self.scene.clear_color = [0.01, 0.01, 0.03];

        let floor_tex = self.add_texture(&TextureKind::NebulaFloor { seed, accent })?;
        build_floor(&mut self.scene, &self.layout, floor_tex);
        let star_tex = self.add_texture(&TextureKind::StarGlow)?;
        let glow_tex = self.add_texture(&TextureKind::ParticleGlow(accent))?;
        let moon_tex = self.add_texture(&TextureKind::Moon)?;

        self.edges = build_edges(&mut self.scene, &self.layout, accent3);
        build_corner_lights(&mut self.scene, &self.layout, accent3);

        let arc = build_arc(&mut self.scene, &self.layout, accent3);
        for emitter in entrance_flows(&self.layout, &arc.curve, seed) {
            let node = points_node(&mut self.scene, &emitter, glow_tex, 0.15);
            self.flows.push((node, emitter));
        }
        self.arc = Some(arc.trim);

        let shared = PlatformGeometry::new(&mut self.scene);
        for (index, slot) in self.layout.wall_slots().into_iter().enumerate() {
            let orb = self.build_orb(index, slot, shared, glow_tex)?;
            self.orbs.push(orb);
        }

        self.sky = Some(Sky::build(&mut self.scene, seed.rotate_left(17), star_tex, moon_tex));

        let text = match self.content.title.trim() {
            "" => DEFAULT_TITLE.to_string(),
            t => t.to_string(),
        };
        let mut surface = S::create(1, 1)?;
        let px = paint_title(&mut surface, &text, accent);
        let title_tex = self.scene.add_texture(surface);
        self.title = Some(TitleBanner::build(
            &mut self.scene,
            title_tex,
            px,
            self.layout.back_z() + 2.0,
            accent3,
        ));

        self.timers
            .schedule_interval(EDGE_PULSE_INTERVAL_MS, TimerEvent::EdgePulse);
        Ok(())
    }

    fn add_texture(&mut self, kind: &TextureKind) -> Result<TextureId, HallError> {
        let surface: S = synthesize(kind)?;
        Ok(self.scene.add_texture(surface))
    }

    fn build_orb(
        &mut self,
        index: usize,
        slot: WallSlot,
        shared: PlatformGeometry,
        glow_tex: TextureId,
    ) -> Result<Orb<S::Source>, HallError> {
        let slot_key = SLOT_KEYS[index];
        let caption = self.content.caption(slot_key).to_string();
        let color = ColorProfile::for_slot(index);
        let rgb = color.rgb3();
        let normal = slot.normal();

        let face = self
            .scene
            .add_texture(S::create(ORB_CANVAS_SIZE, ORB_CANVAS_SIZE)?);
        let mut caption_surface = S::create(1, 1)?;
        let (cw, ch) = paint_caption(&mut caption_surface, &caption, color.rgb);
        let caption_tex = self.scene.add_texture(caption_surface);

        let sprite = self.scene.add_node(Node::new(
            NodeKind::Sprite {
                size: Vec2::splat(ORB_SCALE),
                material: Material {
                    emissive: 1.2,
                    ..Material::textured(face, BlendMode::Alpha)
                },
            },
            Transform::at(slot.position),
        ));
        let glow = self.scene.add_node(Node::new(
            NodeKind::Sprite {
                size: Vec2::splat(ORB_GLOW_SCALE),
                material: Material {
                    color: [rgb[0], rgb[1], rgb[2], 0.55],
                    emissive: 1.6,
                    ..Material::textured(glow_tex, BlendMode::Additive)
                },
            },
            Transform::at(slot.position - normal * ORB_GLOW_OFFSET),
        ));
        let light = self.scene.add_node(Node::new(
            NodeKind::PointLight {
                color: rgb,
                intensity: ORB_LIGHT_INTENSITY,
                distance: ORB_LIGHT_DISTANCE,
            },
            Transform::at(slot.position + normal * ORB_LIGHT_OFFSET),
        ));
        let caption_node = self.scene.add_node(Node::new(
            NodeKind::Sprite {
                size: Vec2::new(CAPTION_HEIGHT * cw as f32 / ch.max(1) as f32, CAPTION_HEIGHT),
                material: Material::textured(caption_tex, BlendMode::Alpha),
            },
            Transform::at(slot.position + Vec3::Y * CAPTION_OFFSET_Y),
        ));
        let platform = build_platform(
            &mut self.scene,
            shared,
            glow_tex,
            slot.position,
            rgb,
            self.config.seed ^ (index as u64 + 1),
        );

        let mut orb = Orb::new(
            index,
            slot_key,
            caption,
            slot,
            face,
            caption_tex,
            OrbNodes {
                sprite,
                glow,
                light,
                caption: caption_node,
            },
            platform,
        );
        if self.content.folder().is_none() {
            orb.show_fallback(&mut self.scene);
        }
        Ok(orb)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn layout(&self) -> &HallLayout {
        &self.layout
    }

    pub fn content(&self) -> &ContentDescriptor {
        &self.content
    }

    pub fn scene(&self) -> &SceneGraph<S> {
        &self.scene
    }

    /// Mutable scene access for the renderer (draining released resources).
    pub fn scene_mut(&mut self) -> &mut SceneGraph<S> {
        &mut self.scene
    }

    pub fn orbs(&self) -> &[Orb<S::Source>] {
        &self.orbs
    }

    pub fn orb_state(&self, index: usize) -> Option<MediaState> {
        self.orbs.get(index).map(|o| o.state)
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.nav
    }

    pub fn navigation_mut(&mut self) -> &mut NavigationState {
        &mut self.nav
    }

    pub fn outstanding_timers(&self) -> usize {
        self.timers.outstanding()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Seconds of hall time.
    pub fn elapsed(&self) -> f32 {
        (self.clock_ms / 1000.0) as f32
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width.max(1.0), height.max(1.0));
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn camera(&self) -> Camera {
        self.nav.camera(self.viewport.x / self.viewport.y)
    }

    /// Advance one frame: navigation, timers, then animations.
    pub fn frame(&mut self, dt: f32) {
        if self.torn_down {
            return;
        }
        let dt = dt.clamp(0.0, MAX_FRAME_DT);
        self.nav.update(dt, &self.layout);

        self.clock_ms += dt as f64 * 1000.0;
        for (_, event) in self.timers.advance(self.clock_ms) {
            self.dispatch(event);
        }

        let t = self.elapsed();
        self.animate_orbs(t, dt);
        for (node, emitter) in self.flows.iter_mut() {
            emitter.update(dt);
            write_points(&mut self.scene, *node, emitter);
        }
        if let Some(sky) = &self.sky {
            sky.update(&mut self.scene, t);
        }
        if let Some(title) = &self.title {
            title.update(&mut self.scene, t);
        }
    }

    fn dispatch(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::EdgePulse => self.pulse_edges(),
            TimerEvent::Orb { index, kind } => {
                if let Some(orb) = self.orbs.get_mut(index) {
                    orb.on_timer(kind, &mut self.scene, &mut self.timers);
                }
            }
        }
    }

    /// Shared sine with a per-edge phase offset.
    fn pulse_edges(&mut self) {
        let t = self.elapsed();
        let level = |phase: f32| EDGE_GLOW_BASE + EDGE_GLOW_SPAN * (t * EDGE_PULSE_SPEED + phase).sin();
        for (i, edge) in self.edges.iter().enumerate() {
            edge.set_glow(&mut self.scene, level(i as f32 * EDGE_PHASE_STEP));
        }
        if let Some(arc) = &self.arc {
            arc.set_glow(&mut self.scene, level(0.0) + EDGE_GLOW_SPAN);
        }
    }

    fn animate_orbs(&mut self, t: f32, dt: f32) {
        for orb in self.orbs.iter_mut() {
            let p = orb.bobbed_position(t);
            let n = orb.slot.normal();
            self.scene.set_translation(orb.nodes.sprite, p);
            self.scene.set_translation(orb.nodes.glow, p - n * ORB_GLOW_OFFSET);
            self.scene.set_translation(orb.nodes.light, p + n * ORB_LIGHT_OFFSET);
            self.scene
                .set_translation(orb.nodes.caption, p + Vec3::Y * CAPTION_OFFSET_Y);
            orb.platform.emitter.update(dt);
            write_points(&mut self.scene, orb.platform.points, &orb.platform.emitter);
        }
    }

    /// Nearest orb under a viewport pixel.
    pub fn pick(&self, screen: Vec2) -> Option<usize> {
        if self.torn_down {
            return None;
        }
        let (origin, dir) = self
            .camera()
            .screen_ray(screen.x, screen.y, self.viewport.x, self.viewport.y);
        let t = self.elapsed();
        self.orbs
            .iter()
            .filter_map(|orb| {
                ray_sphere(origin, dir, orb.bobbed_position(t), ORB_PICK_RADIUS).map(|d| (d, orb.index))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, index)| index)
    }

    pub fn hover(&self, screen: Vec2) -> bool {
        self.pick(screen).is_some()
    }

    pub fn click(&self, screen: Vec2) -> Option<PickTarget> {
        let index = self.pick(screen)?;
        let orb = &self.orbs[index];
        let media = orb.media_refs();
        let probe = if media.is_empty() {
            self.media_paths(index)
        } else {
            None
        };
        log::info!("[hall] picked {} ({} cached media)", orb.slot_key, media.len());
        Some(PickTarget {
            index,
            slot_key: orb.slot_key,
            title: orb.caption.clone(),
            media,
            probe,
        })
    }

    pub fn pointer_down(&mut self, screen: Vec2) {
        if !self.torn_down {
            self.nav.pointer_down(screen);
        }
    }

    pub fn pointer_move(&mut self, screen: Vec2) -> bool {
        !self.torn_down && self.nav.pointer_move(screen)
    }

    /// End a drag; a click resolves to the orb under the pointer, if any.
    pub fn pointer_up(&mut self, screen: Vec2) -> Option<PickTarget> {
        if self.torn_down {
            return None;
        }
        match self.nav.pointer_up(screen)? {
            PointerRelease::Click(at) => self.click(at),
            PointerRelease::Drag => None,
        }
    }

    pub fn media_paths(&self, index: usize) -> Option<AssetPaths> {
        let folder = self.content.folder()?;
        let orb = self.orbs.get(index)?;
        Some(AssetPaths::new(&self.config.assets_root, folder, orb.slot_key))
    }

    /// Orbs still waiting for media, with where to look for it.
    pub fn pending_media(&self) -> Vec<(usize, AssetPaths)> {
        if self.torn_down {
            return Vec::new();
        }
        self.orbs
            .iter()
            .filter(|orb| orb.state == MediaState::Empty)
            .filter_map(|orb| Some((orb.index, self.media_paths(orb.index)?)))
            .collect()
    }

    /// Record a loader's progress. Returns false once the loader should stop:
    /// the hall is torn down, superseded, or the orb no longer wants media.
    pub fn note_media_stage(&mut self, generation: u64, index: usize, stage: ResolveStage) -> bool {
        if self.torn_down || generation != self.generation {
            return false;
        }
        match self.orbs.get_mut(index) {
            Some(orb) if orb.state.is_loading() => {
                orb.note_stage(stage);
                true
            }
            _ => false,
        }
    }

    /// Hand resolved media to an orb. Returns false, after releasing the
    /// media, when the completion is stale.
    pub fn attach_media(
        &mut self,
        generation: u64,
        index: usize,
        resolved: ResolvedMedia<S::Source>,
    ) -> bool {
        if self.torn_down || generation != self.generation {
            log::debug!(
                "[media] discarding completion for generation {generation} (current {}, torn down: {})",
                self.generation,
                self.torn_down
            );
            resolved.release();
            return false;
        }
        match self.orbs.get_mut(index) {
            Some(orb) => {
                orb.attach(resolved, &mut self.scene, &mut self.timers);
                true
            }
            None => {
                resolved.release();
                false
            }
        }
    }

    /// Cancel timers, release media, remove every node and release every
    /// resource. Returns false when already torn down.
    pub fn teardown(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        self.torn_down = true;
        self.timers.clear();
        for orb in self.orbs.iter_mut() {
            orb.release(&mut self.timers);
        }
        self.edges.clear();
        self.arc = None;
        self.flows.clear();
        self.sky = None;
        self.title = None;
        let surfaces = self.scene.clear();
        let disposed = surfaces.len();
        for mut surface in surfaces {
            surface.dispose();
        }
        log::info!(
            "[hall] generation {} torn down, {} surfaces disposed",
            self.generation,
            disposed
        );
        true
    }
}

impl<S: Surface2d> Drop for Hall<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn write_points<T>(scene: &mut SceneGraph<T>, node: NodeId, emitter: &ParticleEmitter) {
    if let Some(Node {
        kind: NodeKind::Points { cloud, .. },
        ..
    }) = scene.node_mut(node)
    {
        emitter.write_into(cloud);
    }
}

/// Resolve one orb's media and attach it. The hall is only borrowed between
/// awaits, never across one, and is checked before every request so a torn
/// down or rebuilt hall stops the loader.
pub async fn load_orb_media<S, P>(
    hall: &RefCell<Hall<S>>,
    probe: &P,
    generation: u64,
    index: usize,
    paths: AssetPaths,
) where
    S: Surface2d,
    P: AssetProbe<Source = S::Source>,
{
    let resolved = resolve_media(probe, &paths, |stage| match hall.try_borrow_mut() {
        Ok(mut h) => h.note_media_stage(generation, index, stage),
        // held by a frame or an input handler; the hall is still live
        Err(_) => true,
    })
    .await;
    match hall.try_borrow_mut() {
        Ok(mut h) => {
            h.attach_media(generation, index, resolved);
        }
        Err(_) => {
            log::warn!("[media] hall busy, dropping media for orb {index}");
            resolved.release();
        }
    }
}

/// Resolve every pending orb concurrently; completions attach in whatever
/// order they arrive.
pub async fn load_all_media<S, P>(hall: &RefCell<Hall<S>>, probe: &P)
where
    S: Surface2d,
    P: AssetProbe<Source = S::Source>,
{
    let (generation, jobs) = {
        let h = hall.borrow();
        (h.generation(), h.pending_media())
    };
    join_all(
        jobs.into_iter()
            .map(|(index, paths)| load_orb_media(hall, probe, generation, index, paths)),
    )
    .await;
}
