// Web front-end tuning: DOM ids, fades and renderer limits.
// Hall geometry and timing constants live in `hall_core::constants`.

// Host page elements
pub const CANVAS_ID: &str = "hall-canvas";
pub const LOADING_ID: &str = "hall-loading";
pub const LOADING_BAR_ID: &str = "hall-loading-bar";
pub const BLACKOUT_ID: &str = "hall-blackout";

// Where `<folder>/<slot>/…` media is served from
pub const ASSETS_ROOT: &str = "assets";

// CSS opacity transitions (milliseconds)
pub const LOADING_FADE_MS: u32 = 600;
pub const BLACKOUT_FADE_MS: u32 = 800;
pub const EXIT_FADE_MS: u32 = 500;

// Renderer limits
pub const MAX_LIGHTS: usize = 16; // must match MAX_LIGHTS in scene.wgsl
pub const DRAW_UNIFORM_STRIDE: u64 = 256; // minUniformBufferOffsetAlignment
pub const INITIAL_DRAW_CAPACITY: u64 = 512;
pub const MIN_POINT_CAPACITY: u64 = 64;

// Post-processing defaults
pub const BLOOM_STRENGTH: f32 = 0.9;
pub const BLOOM_THRESHOLD: f32 = 0.75;

// HTMLMediaElement.HAVE_CURRENT_DATA
pub const VIDEO_HAVE_CURRENT_DATA: u16 = 2;
