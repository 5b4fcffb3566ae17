use glam::{Vec2, Vec3};
use hall_core::builders::build_floor;
use hall_core::constants::*;
use hall_core::media::AssetProbe;
use hall_core::navigation::{NavigationState, StepOutcome};
use hall_core::scene::{NodeKind, SceneGraph};
use hall_core::testing::{RecordingSurface, StubMedia, SurfaceOp};
use hall_core::{
    load_all_media, ContentDescriptor, Hall, HallConfig, HallLayout, MediaKind, MediaState,
    ResolvedMedia,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::collections::HashSet;
use std::f32::consts::FRAC_PI_2;
use std::task::Poll;

struct FakeProbe {
    present: HashSet<String>,
    handed_out: RefCell<Vec<StubMedia>>,
}

impl FakeProbe {
    fn new(present: &[&str]) -> Self {
        Self {
            present: present.iter().map(|s| s.to_string()).collect(),
            handed_out: RefCell::default(),
        }
    }

    fn hand_out(&self, media: StubMedia) -> StubMedia {
        self.handed_out.borrow_mut().push(media.clone());
        media
    }
}

impl AssetProbe for FakeProbe {
    type Source = StubMedia;

    async fn load_video(&self, url: &str) -> Option<StubMedia> {
        self.present
            .contains(url)
            .then(|| self.hand_out(StubMedia::video(url)))
    }

    async fn load_image(&self, url: &str) -> Option<StubMedia> {
        self.present
            .contains(url)
            .then(|| self.hand_out(StubMedia::image(url)))
    }
}

/// Returns to the executor once before answering, like a network fetch.
async fn yield_once() {
    let mut yielded = false;
    futures::future::poll_fn(move |cx| {
        if yielded {
            Poll::Ready(())
        } else {
            yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    })
    .await
}

/// Every request yields first and is logged in issue order.
struct SlowLoader {
    present: HashSet<String>,
    requested: RefCell<Vec<String>>,
}

impl SlowLoader {
    fn new(present: impl IntoIterator<Item = String>) -> Self {
        Self {
            present: present.into_iter().collect(),
            requested: RefCell::default(),
        }
    }

    async fn answer(&self, url: &str, video: bool) -> Option<StubMedia> {
        self.requested.borrow_mut().push(url.to_string());
        yield_once().await;
        self.present.contains(url).then(|| {
            if video {
                StubMedia::video(url)
            } else {
                StubMedia::image(url)
            }
        })
    }
}

impl AssetProbe for SlowLoader {
    type Source = StubMedia;

    async fn load_video(&self, url: &str) -> Option<StubMedia> {
        self.answer(url, true).await
    }

    async fn load_image(&self, url: &str) -> Option<StubMedia> {
        self.answer(url, false).await
    }
}

/// Tears the hall down when the first request arrives, then counts what
/// else is asked for.
struct TeardownLoader<'a> {
    hall: &'a RefCell<Hall<RecordingSurface>>,
    requested: RefCell<Vec<String>>,
}

impl TeardownLoader<'_> {
    fn note(&self, url: &str) {
        let first = self.requested.borrow().is_empty();
        self.requested.borrow_mut().push(url.to_string());
        if first {
            self.hall.borrow_mut().teardown();
        }
    }
}

impl AssetProbe for TeardownLoader<'_> {
    type Source = StubMedia;

    async fn load_video(&self, url: &str) -> Option<StubMedia> {
        self.note(url);
        None
    }

    async fn load_image(&self, url: &str) -> Option<StubMedia> {
        self.note(url);
        Some(StubMedia::image(url))
    }
}

fn demo_content() -> ContentDescriptor {
    ContentDescriptor::from_json(
        r#"{"title":"Demo","folder":"demo","cardTitles":{"overview":"Overview","gallery":"Gallery"}}"#,
    )
    .unwrap()
}

fn config() -> HallConfig {
    HallConfig {
        assets_root: "assets".into(),
        ..HallConfig::default()
    }
}

fn build(content: ContentDescriptor, generation: u64) -> Hall<RecordingSurface> {
    let mut hall = Hall::build(HallLayout::default(), config(), content, generation).unwrap();
    hall.set_viewport(800.0, 600.0);
    hall
}

fn assert_floor_matches_boundary(layout: &HallLayout, rng: &mut StdRng, samples: usize) {
    let mut scene: SceneGraph<()> = SceneGraph::new();
    let tex = scene.add_texture(());
    let floor = build_floor(&mut scene, layout, tex);
    let bounds: Vec<(Vec2, Vec2)> = floor
        .iter()
        .map(|id| match scene.node(*id).unwrap().kind {
            NodeKind::Mesh { geometry, .. } => scene.geometry(geometry).unwrap().xz_bounds().unwrap(),
            _ => panic!("floor node must be a mesh"),
        })
        .collect();

    let reach_x = layout.bar_half_width() + 5.0;
    let (near_z, far_z) = (layout.outer_z() + 5.0, layout.back_z() - 5.0);
    for _ in 0..samples {
        let x = rng.gen_range(-reach_x..reach_x);
        let z = rng.gen_range(far_z..near_z);
        let on_mesh = bounds
            .iter()
            .any(|(lo, hi)| x >= lo.x && x <= hi.x && z >= lo.y && z <= hi.y);
        assert_eq!(layout.is_walkable(x, z), on_mesh, "({x}, {z}) in {layout:?}");
    }
}

#[test]
fn boundary_matches_floor_meshes() {
    let mut rng = StdRng::seed_from_u64(42);
    assert_floor_matches_boundary(&HallLayout::default(), &mut rng, 20_000);
}

#[test]
fn boundary_matches_floor_meshes_for_any_layout() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..40 {
        let corridor_width = rng.gen_range(6.0..30.0);
        let layout = HallLayout::new(
            corridor_width,
            rng.gen_range(20.0..160.0),
            corridor_width + rng.gen_range(0.0..80.0),
            rng.gen_range(6.0..40.0),
            rng.gen_range(4.0..50.0),
        )
        .unwrap();
        assert_floor_matches_boundary(&layout, &mut rng, 2_000);
    }
}

#[test]
fn diagonal_into_wall_slides_along_it() {
    let layout = HallLayout::default();
    let hw = layout.half_width();
    let mut nav = NavigationState::new(Vec3::new(-hw + 0.01, CAMERA_START_Y, -30.0));
    nav.velocity = Vec3::new(-6.0, 0.0, -6.0);
    let outcome = nav.update(1.0 / 60.0, &layout);
    assert_eq!(outcome, StepOutcome::SlidZ);
    assert_eq!(nav.position.x, -hw + 0.01);
    assert!(nav.position.z < -30.0);
    assert_eq!(nav.velocity.x, 0.0);
    assert!(nav.velocity.z < 0.0);
}

#[test]
fn no_folder_means_every_orb_falls_back() {
    let content = ContentDescriptor::from_json(r#"{"title":"Plain","folder":null}"#).unwrap();
    let hall = build(content, 1);
    assert_eq!(hall.orbs().len(), ORB_COUNT);
    assert!(hall.orbs().iter().all(|o| o.state == MediaState::Fallback));
    assert!(hall.pending_media().is_empty());
    assert!(hall.orbs().iter().all(|o| o.caption == DEFAULT_CAPTION));
}

#[test]
fn demo_overview_two_images_start_a_slideshow() {
    let probe = FakeProbe::new(&["assets/demo/overview/1.jpg", "assets/demo/overview/2.jpg"]);
    let hall = RefCell::new(build(demo_content(), 1));
    let before = hall.borrow().outstanding_timers();
    pollster::block_on(load_all_media(&hall, &probe));

    let h = hall.borrow();
    let overview = &h.orbs()[0];
    assert_eq!(overview.slot_key, "overview");
    assert_eq!(overview.image_count(), 2);
    assert!(overview.has_slideshow_timer());
    assert_eq!(
        overview.state,
        MediaState::SlideshowPlaying {
            index: 0,
            crossfading: false
        }
    );
    // the only new timer is the overview slideshow
    assert_eq!(h.outstanding_timers(), before + 1);
    assert!(h.orbs()[1..].iter().all(|o| o.state == MediaState::Fallback));
}

#[test]
fn single_image_does_not_schedule_a_slideshow() {
    let probe = FakeProbe::new(&["assets/demo/gallery/1.jpg", "assets/demo/gallery/3.jpg"]);
    let hall = RefCell::new(build(demo_content(), 1));
    let before = hall.borrow().outstanding_timers();
    pollster::block_on(load_all_media(&hall, &probe));
    let h = hall.borrow();
    assert_eq!(h.orbs()[1].image_count(), 1);
    assert!(!h.orbs()[1].has_slideshow_timer());
    assert_eq!(h.outstanding_timers(), before);
}

#[test]
fn video_is_preferred_and_redrawn() {
    let probe = FakeProbe::new(&["assets/demo/details/1.mp4", "assets/demo/details/1.jpg"]);
    let hall = RefCell::new(build(demo_content(), 1));
    pollster::block_on(load_all_media(&hall, &probe));
    let mut h = hall.borrow_mut();
    assert_eq!(h.orb_state(3), Some(MediaState::PlayingVideo));

    let face = h.orbs()[3].texture;
    let observer = h.scene().texture(face).unwrap().payload.clone();
    observer.take_ops();
    for _ in 0..60 {
        h.frame(1.0 / 60.0);
    }
    let redraws = observer
        .ops()
        .iter()
        .filter(|op| matches!(op, SurfaceOp::DrawSource { .. }))
        .count();
    // one second at ~20 redraws per second
    assert!((18..=21).contains(&redraws), "{redraws} redraws");
}

#[test]
fn slideshow_crossfades_to_the_next_image() {
    let probe = FakeProbe::new(&["assets/demo/overview/1.jpg", "assets/demo/overview/2.jpg"]);
    let hall = RefCell::new(build(demo_content(), 1));
    pollster::block_on(load_all_media(&hall, &probe));
    let mut h = hall.borrow_mut();

    let mut seen = Vec::new();
    for _ in 0..300 {
        h.frame(1.0 / 60.0);
        let state = h.orb_state(0).unwrap();
        if seen.last() != Some(&state) {
            seen.push(state);
        }
    }
    let crossfading = MediaState::SlideshowPlaying {
        index: 0,
        crossfading: true,
    };
    let settled = MediaState::SlideshowPlaying {
        index: 1,
        crossfading: false,
    };
    let a = seen.iter().position(|s| *s == crossfading).expect("crossfade started");
    let b = seen.iter().position(|s| *s == settled).expect("crossfade finished");
    assert!(a < b);
}

#[test]
fn crossfade_lasts_one_second_at_low_frame_rates() {
    let probe = FakeProbe::new(&["assets/demo/overview/1.jpg", "assets/demo/overview/2.jpg"]);
    let hall = RefCell::new(build(demo_content(), 1));
    pollster::block_on(load_all_media(&hall, &probe));
    let mut h = hall.borrow_mut();

    let crossfading = MediaState::SlideshowPlaying {
        index: 0,
        crossfading: true,
    };
    let settled = MediaState::SlideshowPlaying {
        index: 1,
        crossfading: false,
    };
    let (mut started, mut finished) = (None, None);
    for _ in 0..120 {
        h.frame(1.0 / 20.0);
        match h.orb_state(0) {
            Some(s) if s == crossfading && started.is_none() => started = Some(h.elapsed()),
            Some(s) if s == settled && finished.is_none() => finished = Some(h.elapsed()),
            _ => {}
        }
    }
    let took = finished.expect("crossfade finished") - started.expect("crossfade started");
    let expected = (CROSSFADE_DURATION_MS / 1000.0) as f32;
    assert!(took >= expected - 1e-3, "crossfade took {took}s");
    assert!(took <= expected + 1.0 / 20.0 + 1e-3, "crossfade took {took}s");
}

#[test]
fn orbs_load_independently() {
    let overview = (1..=20).map(|i| format!("assets/demo/overview/{i}.jpg"));
    let probe = SlowLoader::new(overview);
    let hall = RefCell::new(build(demo_content(), 1));
    pollster::block_on(load_all_media(&hall, &probe));

    let requested = probe.requested.borrow();
    // every orb asks for its video before any orb moves on to images
    assert!(requested[..ORB_COUNT].iter().all(|url| url.ends_with("/1.mp4")));
    let gallery = requested
        .iter()
        .position(|url| url.contains("/gallery/"))
        .unwrap();
    assert!(gallery < ORB_COUNT, "first gallery request at {gallery}");
    assert_eq!(hall.borrow().orbs()[0].image_count(), 20);
}

#[test]
fn loader_stops_once_the_hall_is_torn_down() {
    let hall = RefCell::new(build(demo_content(), 1));
    let probe = TeardownLoader {
        hall: &hall,
        requested: RefCell::default(),
    };
    pollster::block_on(load_all_media(&hall, &probe));
    let requested = probe.requested.borrow();
    assert_eq!(*requested, ["assets/demo/overview/1.mp4"]);
    assert!(hall.borrow().is_torn_down());
}

#[test]
fn click_opens_orb_and_drag_does_not() {
    let probe = FakeProbe::new(&["assets/demo/overview/1.jpg", "assets/demo/overview/2.jpg"]);
    let hall = RefCell::new(build(demo_content(), 1));
    pollster::block_on(load_all_media(&hall, &probe));
    let mut h = hall.borrow_mut();

    let slot = h.orbs()[0].slot;
    {
        let nav = h.navigation_mut();
        nav.position = Vec3::new(0.0, slot.position.y, slot.position.z);
        nav.yaw = -FRAC_PI_2;
        nav.pitch = 0.0;
    }
    let center = Vec2::new(400.0, 300.0);
    assert!(h.hover(center));

    h.pointer_down(center);
    let target = h.pointer_up(center + Vec2::new(3.0, 0.0)).expect("click hits overview");
    assert_eq!(target.slot_key, "overview");
    assert_eq!(target.title, "Overview");
    assert_eq!(target.media.len(), 2);
    assert!(target.media.iter().all(|m| m.kind == MediaKind::Image));
    assert!(target.probe.is_none());

    h.pointer_down(center);
    assert!(h.pointer_up(center + Vec2::new(5.0, 0.0)).is_none());
}

#[test]
fn uncached_orb_asks_for_a_probe() {
    let hall = build(demo_content(), 1);
    let mut hall = hall;
    let slot = hall.orbs()[1].slot;
    {
        let nav = hall.navigation_mut();
        nav.position = Vec3::new(0.0, slot.position.y, slot.position.z);
        nav.yaw = FRAC_PI_2;
        nav.pitch = 0.0;
    }
    let target = hall.click(Vec2::new(400.0, 300.0)).expect("gallery orb");
    assert_eq!(target.slot_key, "gallery");
    assert!(target.media.is_empty());
    let paths = target.probe.expect("probe paths");
    assert_eq!(paths.image_url(1), "assets/demo/gallery/1.jpg");
}

#[test]
fn stale_generation_is_released_and_ignored() {
    let mut hall = build(demo_content(), 2);
    let late = StubMedia::video("assets/demo/overview/1.mp4");
    assert!(!hall.attach_media(1, 0, ResolvedMedia::Video(late.clone())));
    assert_eq!(late.release_count(), 1);
    assert_eq!(hall.orb_state(0), Some(MediaState::Empty));
}

#[test]
fn teardown_leaves_nothing_behind() {
    let probe = FakeProbe::new(&[
        "assets/demo/overview/1.jpg",
        "assets/demo/overview/2.jpg",
        "assets/demo/overview/3.jpg",
        "assets/demo/gallery/1.mp4",
    ]);
    let hall = RefCell::new(build(demo_content(), 1));
    pollster::block_on(load_all_media(&hall, &probe));
    let mut h = hall.borrow_mut();
    for _ in 0..240 {
        h.frame(1.0 / 60.0);
    }

    let observers: Vec<RecordingSurface> = h
        .orbs()
        .iter()
        .map(|o| h.scene().texture(o.texture).unwrap().payload.clone())
        .collect();

    assert!(h.teardown());
    assert!(!h.teardown());
    assert_eq!(h.outstanding_timers(), 0);
    assert_eq!(h.scene().node_count(), 0);
    assert_eq!(h.scene().ledger().live_count(), 0);
    assert!(probe.handed_out.borrow().iter().all(|m| m.release_count() == 1));

    let counts: Vec<usize> = observers.iter().map(RecordingSurface::op_count).collect();
    for _ in 0..600 {
        h.frame(1.0 / 60.0);
    }
    let late = StubMedia::image("assets/demo/links/1.jpg");
    assert!(!h.attach_media(1, 4, ResolvedMedia::Images(vec![late.clone()])));
    assert_eq!(late.release_count(), 1);
    let after: Vec<usize> = observers.iter().map(RecordingSurface::op_count).collect();
    assert_eq!(counts, after, "no surface writes after teardown");
    assert!(h.pick(Vec2::new(400.0, 300.0)).is_none());
}

#[test]
fn released_resources_are_queued_once_for_the_renderer() {
    let mut hall = build(demo_content(), 1);
    let live = hall.scene().ledger().live_count();
    assert!(live > 0);
    hall.scene_mut().drain_released();
    hall.teardown();
    let drained = hall.scene_mut().drain_released();
    assert_eq!(drained.len(), live);
    assert!(hall.scene_mut().drain_released().is_empty());
}
