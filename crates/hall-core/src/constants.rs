// Shared tuning constants for the hall. The web front-end re-exports the
// ones it needs for DOM wiring.

// Hall layout (default corridor scalars)
pub const CORRIDOR_WIDTH: f32 = 16.0;
pub const CORRIDOR_LENGTH: f32 = 80.0;
pub const BAR_WIDTH: f32 = 70.0;
pub const BAR_LENGTH: f32 = 12.0;
pub const ENTRANCE_EXTENSION: f32 = 35.0;
pub const ENTRANCE_Z: f32 = 10.0; // z of the entrance plane (arc position)

// Navigation
pub const LOOK_SENSITIVITY: f32 = 0.003; // radians per pixel of drag
pub const MOVE_SPEED: f32 = 60.0; // velocity gained per second of held input
pub const FRICTION: f32 = 0.92; // multiplicative, applied once per frame
pub const CLICK_THRESHOLD_PX: f32 = 5.0; // release below this is a click
pub const CAMERA_MIN_Y: f32 = 2.0;
pub const CAMERA_MAX_Y: f32 = 8.0;
pub const CAMERA_START_Y: f32 = 4.0;
pub const CAMERA_START_BACKOFF: f32 = 25.0; // start distance past the entrance plane
pub const VELOCITY_EPSILON: f32 = 1e-4;

// Camera projection
pub const CAMERA_FOVY_DEG: f32 = 70.0;
pub const CAMERA_ZNEAR: f32 = 0.1;
pub const CAMERA_ZFAR: f32 = 1000.0;

// Orbs
pub const ORB_COUNT: usize = 27;
pub const ORB_HEIGHT: f32 = 4.5; // base y of the orb center
pub const ORB_WALL_INSET: f32 = 1.5; // distance from the floor edge towards the walkway
pub const ORB_SCALE: f32 = 3.2; // sprite size in world units
pub const ORB_GLOW_SCALE: f32 = 5.6; // glow ring sprite drawn behind the orb
pub const ORB_PICK_RADIUS: f32 = 1.6;
pub const ORB_BOB_AMPLITUDE: f32 = 0.25;
pub const ORB_BOB_SPEED: f32 = 1.2;
pub const ORB_LIGHT_INTENSITY: f32 = 1.6;
pub const ORB_LIGHT_DISTANCE: f32 = 12.0;
pub const ORB_CANVAS_SIZE: u32 = 256;
pub const ORB_TINT_ALPHA: f32 = 0.18;
pub const ORB_RING_WIDTH: f32 = 3.0;
pub const CAPTION_OFFSET_Y: f32 = -2.6; // caption below orb center
pub const CAPTION_HEIGHT: f32 = 0.7; // world height of the caption plane
pub const CAPTION_FONT_PX: f32 = 28.0;
pub const CAPTION_PADDING_PX: f32 = 18.0;
pub const DEFAULT_CAPTION: &str = "Memory";

// Media timing
pub const MAX_IMAGE_PROBES: u32 = 20;
pub const VIDEO_REDRAW_INTERVAL_MS: f64 = 50.0; // ~20 updates per second
pub const SLIDESHOW_INTERVAL_MS: f64 = 3000.0;
pub const CROSSFADE_DURATION_MS: f64 = 1000.0;
pub const CROSSFADE_STEPS: u32 = 30;

// Particles
pub const PLATFORM_PARTICLES: usize = 50;
pub const PLATFORM_RADIUS: f32 = 1.4;
pub const PLATFORM_RISE_HEIGHT: f32 = 3.0;
pub const ARC_PARTICLES: usize = 80;
pub const DOOR_PARTICLES: usize = 60;
pub const FLOW_FADE_EDGE: f32 = 0.1; // progress band faded at each end of a loop

// Arc / entrance
pub const ARC_HEIGHT: f32 = 12.0;
pub const ARC_TUBE_RADIUS: f32 = 0.18;
pub const ARC_GLOW_RADIUS: f32 = 0.55;

// Edges
pub const EDGE_CORE_RADIUS: f32 = 0.06;
pub const EDGE_GLOW_RADIUS: f32 = 0.25;
pub const EDGE_PULSE_INTERVAL_MS: f64 = 50.0;
pub const EDGE_PULSE_SPEED: f32 = 1.5;
pub const EDGE_GLOW_BASE: f32 = 0.35;
pub const EDGE_GLOW_SPAN: f32 = 0.2;

// Sky
pub const STAR_COUNT: usize = 600;
pub const SKY_RADIUS: f32 = 400.0;

// Title banner
pub const TITLE_LAYERS: usize = 8;
pub const TITLE_LAYER_SPACING: f32 = 0.06;
pub const TITLE_HEIGHT: f32 = 14.0;
pub const TITLE_WORLD_HEIGHT: f32 = 4.0;
pub const TITLE_BOB_AMPLITUDE: f32 = 0.4;
pub const TITLE_BOB_SPEED: f32 = 0.8;

// Loading handshake pacing (milliseconds)
pub const LOADING_PACE_MS: u32 = 400;
pub const LOADING_PROGRESS_TICK_MS: u32 = 50;
pub const LOADING_BLACK_HOLD_MS: u32 = 300;
