pub mod builders;
pub mod camera;
pub mod constants;
pub mod content;
pub mod error;
pub mod geometry;
pub mod hall;
pub mod layout;
pub mod loading;
pub mod media;
pub mod navigation;
pub mod orb;
pub mod particles;
pub mod scene;
pub mod sky;
pub mod surface;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod texture;
pub mod timers;
pub mod title;

pub static SCENE_WGSL: &str = include_str!("../shaders/scene.wgsl");
pub static POST_WGSL: &str = include_str!("../shaders/post.wgsl");

pub use camera::Camera;
pub use content::{parse_accent, ContentDescriptor, HallConfig, SLOT_KEYS};
pub use error::HallError;
pub use hall::{load_all_media, load_orb_media, Hall, PickTarget};
pub use layout::{FloorRect, HallLayout, WallSlot};
pub use media::{AssetPaths, AssetProbe, MediaKind, MediaRef, MediaSource, ResolvedMedia};
pub use navigation::{Direction, NavigationState, PointerRelease};
pub use orb::MediaState;
pub use surface::{Rgba, Surface2d};
