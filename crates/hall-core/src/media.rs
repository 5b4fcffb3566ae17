//! Orb media resolution: video first, then a numbered image sequence.
//!
//! The probe itself is platform code (HTML media elements on the web); this
//! module only fixes the path convention and the order of attempts.

use crate::constants::MAX_IMAGE_PROBES;

/// A loaded image or video that can be drawn onto a surface.
pub trait MediaSource {
    fn is_video(&self) -> bool;
    fn url(&self) -> &str;
    /// Whether a frame can be drawn right now. A stalled video keeps the last
    /// composed frame on its orb.
    fn has_frame(&self) -> bool {
        true
    }
    /// Stop playback and detach the element's resource. Called once when the
    /// owning orb is torn down.
    fn release(&self);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// Media reference handed to the media modal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaRef {
    pub kind: MediaKind,
    pub url: String,
}

impl MediaRef {
    pub fn of<S: MediaSource>(source: &S) -> Self {
        Self {
            kind: if source.is_video() {
                MediaKind::Video
            } else {
                MediaKind::Image
            },
            url: source.url().to_string(),
        }
    }
}

/// Platform media loader.
#[allow(async_fn_in_trait)]
pub trait AssetProbe {
    type Source: MediaSource;

    /// Resolve a looping, muted video. `None` when missing or not playable.
    async fn load_video(&self, url: &str) -> Option<Self::Source>;

    /// Resolve a decoded image. `None` when missing or broken.
    async fn load_image(&self, url: &str) -> Option<Self::Source>;
}

/// Where one orb's assets live: `<root>/<folder>/<slot>/`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetPaths {
    pub root: String,
    pub folder: String,
    pub slot: String,
}

impl AssetPaths {
    pub fn new(root: &str, folder: &str, slot: &str) -> Self {
        Self {
            root: root.trim_end_matches('/').to_string(),
            folder: folder.trim_matches('/').to_string(),
            slot: slot.to_string(),
        }
    }

    fn base(&self) -> String {
        if self.root.is_empty() {
            format!("{}/{}", self.folder, self.slot)
        } else {
            format!("{}/{}/{}", self.root, self.folder, self.slot)
        }
    }

    pub fn video_url(&self) -> String {
        format!("{}/1.mp4", self.base())
    }

    /// Image URL for a 1-based index.
    pub fn image_url(&self, index: u32) -> String {
        format!("{}/{}.jpg", self.base(), index)
    }
}

/// Progress notifications emitted while resolving.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolveStage {
    Video,
    Images(usize),
}

#[derive(Debug)]
pub enum ResolvedMedia<S> {
    Video(S),
    Images(Vec<S>),
    Nothing,
}

impl<S: MediaSource> ResolvedMedia<S> {
    pub fn refs(&self) -> Vec<MediaRef> {
        match self {
            ResolvedMedia::Video(v) => vec![MediaRef::of(v)],
            ResolvedMedia::Images(list) => list.iter().map(MediaRef::of).collect(),
            ResolvedMedia::Nothing => Vec::new(),
        }
    }

    pub fn release(&self) {
        match self {
            ResolvedMedia::Video(v) => v.release(),
            ResolvedMedia::Images(list) => list.iter().for_each(MediaSource::release),
            ResolvedMedia::Nothing => {}
        }
    }
}

/// Resolve one orb's media. Missing media is an expected outcome, not an error.
///
/// `on_stage` runs before every request; returning false abandons the
/// resolve with nothing issued after it.
pub async fn resolve_media<P, F>(probe: &P, paths: &AssetPaths, mut on_stage: F) -> ResolvedMedia<P::Source>
where
    P: AssetProbe,
    F: FnMut(ResolveStage) -> bool,
{
    if !on_stage(ResolveStage::Video) {
        return ResolvedMedia::Nothing;
    }
    let video_url = paths.video_url();
    if let Some(video) = probe.load_video(&video_url).await {
        log::debug!("[media] video ready {}", video_url);
        return ResolvedMedia::Video(video);
    }
    log::debug!("[media] no video at {}, probing images", video_url);

    let images = probe_images(probe, paths, MAX_IMAGE_PROBES, &mut on_stage).await;
    if images.is_empty() {
        log::debug!("[media] nothing found for {}", paths.slot);
        ResolvedMedia::Nothing
    } else {
        ResolvedMedia::Images(images)
    }
}

/// Load `1.jpg, 2.jpg, …` in order, stopping at the first gap or at `max`.
/// An abandoned probe releases what it found and returns nothing.
pub async fn probe_images<P, F>(
    probe: &P,
    paths: &AssetPaths,
    max: u32,
    on_stage: &mut F,
) -> Vec<P::Source>
where
    P: AssetProbe,
    F: FnMut(ResolveStage) -> bool,
{
    let mut found = Vec::new();
    for index in 1..=max {
        if !on_stage(ResolveStage::Images(found.len())) {
            found.iter().for_each(MediaSource::release);
            return Vec::new();
        }
        match probe.load_image(&paths.image_url(index)).await {
            Some(image) => found.push(image),
            None => break,
        }
    }
    found
}

/// Re-probe an orb's media for the modal when nothing is cached. The modal
/// loads by url, so the probed elements are released straight away.
pub async fn probe_media_refs<P: AssetProbe>(probe: &P, paths: &AssetPaths) -> Vec<MediaRef> {
    let resolved = resolve_media(probe, paths, |_| true).await;
    let refs = resolved.refs();
    resolved.release();
    refs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubMedia;
    use std::collections::HashSet;

    struct FakeProbe {
        present: HashSet<String>,
        requested: std::cell::RefCell<Vec<String>>,
    }

    impl FakeProbe {
        fn new(present: &[&str]) -> Self {
            Self {
                present: present.iter().map(|s| s.to_string()).collect(),
                requested: Default::default(),
            }
        }
    }

    impl AssetProbe for FakeProbe {
        type Source = StubMedia;

        async fn load_video(&self, url: &str) -> Option<StubMedia> {
            self.requested.borrow_mut().push(url.to_string());
            self.present.contains(url).then(|| StubMedia::video(url))
        }

        async fn load_image(&self, url: &str) -> Option<StubMedia> {
            self.requested.borrow_mut().push(url.to_string());
            self.present.contains(url).then(|| StubMedia::image(url))
        }
    }

    #[test]
    fn paths_follow_convention() {
        let p = AssetPaths::new("assets/", "demo", "overview");
        assert_eq!(p.video_url(), "assets/demo/overview/1.mp4");
        assert_eq!(p.image_url(3), "assets/demo/overview/3.jpg");
    }

    #[test]
    fn probe_stops_at_first_gap() {
        let probe = FakeProbe::new(&[
            "a/demo/overview/1.jpg",
            "a/demo/overview/2.jpg",
            "a/demo/overview/3.jpg",
            "a/demo/overview/5.jpg",
        ]);
        let paths = AssetPaths::new("a", "demo", "overview");
        for cap in [4, 10, 50] {
            let found = pollster::block_on(probe_images(&probe, &paths, cap, &mut |_| true));
            assert_eq!(found.len(), 3);
        }
    }

    #[test]
    fn probe_respects_cap() {
        let probe = FakeProbe::new(&["a/f/s/1.jpg", "a/f/s/2.jpg", "a/f/s/3.jpg"]);
        let paths = AssetPaths::new("a", "f", "s");
        let found = pollster::block_on(probe_images(&probe, &paths, 2, &mut |_| true));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn video_wins_over_images() {
        let probe = FakeProbe::new(&["a/f/s/1.mp4", "a/f/s/1.jpg"]);
        let paths = AssetPaths::new("a", "f", "s");
        let resolved = pollster::block_on(resolve_media(&probe, &paths, |_| true));
        assert!(matches!(resolved, ResolvedMedia::Video(_)));
        assert_eq!(probe.requested.borrow().len(), 1);
    }

    #[test]
    fn missing_everything_resolves_to_nothing() {
        let probe = FakeProbe::new(&[]);
        let paths = AssetPaths::new("a", "f", "s");
        let mut stages = Vec::new();
        let resolved = pollster::block_on(resolve_media(&probe, &paths, |s| {
            stages.push(s);
            true
        }));
        assert!(matches!(resolved, ResolvedMedia::Nothing));
        assert_eq!(stages, vec![ResolveStage::Video, ResolveStage::Images(0)]);
    }

    #[test]
    fn modal_refs_list_images_in_order() {
        let probe = FakeProbe::new(&["a/f/s/1.jpg", "a/f/s/2.jpg"]);
        let paths = AssetPaths::new("a", "f", "s");
        let refs = pollster::block_on(probe_media_refs(&probe, &paths));
        let urls: Vec<&str> = refs.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, ["a/f/s/1.jpg", "a/f/s/2.jpg"]);
        assert!(refs.iter().all(|r| r.kind == MediaKind::Image));
    }

    #[test]
    fn abandoned_resolve_releases_and_stops() {
        let probe = FakeProbe::new(&["a/f/s/1.jpg", "a/f/s/2.jpg", "a/f/s/3.jpg"]);
        let paths = AssetPaths::new("a", "f", "s");
        let mut allowed = 3;
        let resolved = pollster::block_on(resolve_media(&probe, &paths, |_| {
            allowed -= 1;
            allowed >= 0
        }));
        assert!(matches!(resolved, ResolvedMedia::Nothing));
        // video, 1.jpg, 2.jpg; nothing after the refusal
        assert_eq!(probe.requested.borrow().len(), 3);
    }

    #[test]
    fn refused_before_video_issues_nothing() {
        let probe = FakeProbe::new(&["a/f/s/1.mp4"]);
        let paths = AssetPaths::new("a", "f", "s");
        let resolved = pollster::block_on(resolve_media(&probe, &paths, |_| false));
        assert!(matches!(resolved, ResolvedMedia::Nothing));
        assert!(probe.requested.borrow().is_empty());
    }
}
