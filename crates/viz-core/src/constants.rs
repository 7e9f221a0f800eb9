// Shared layout and tuning constants used by the core and the native frontend.

// Ensemble
pub const NUM_INSTRUMENTS: usize = 8; // instruments in the ensemble, fixed for a session

// Control points
// Maximum authored points per pair. The shader loop is bounded by the same value.
pub const MAX_CONTROL_POINTS: usize = 50;
// Packed texture rows: one count header, MAX_CONTROL_POINTS - 1 authored points and two endpoints
pub const CONTROL_POINT_ROWS: usize = 2 + MAX_CONTROL_POINTS;

// Control points scattered per pair by the native `C` key
pub const SCATTER_POINTS_PER_PAIR: usize = 3;
pub const SCATTER_SPREAD: f32 = 0.35; // max perpendicular offset from the straight path

// Particles
pub const NUM_PARTICLES: usize = 30_000;
pub const RANDOMS_PER_PARTICLE: usize = 9;
// Max rows of the random-seed texture before wrapping into the next column set.
// Must stay below the device texture limit (8192 on some laptops, 16384 on most).
pub const TEXTURE_ROW_SIZE: usize = 8_000;
pub const DEFAULT_RANDOM_SEED: u64 = 42;

// Connection overlay
pub const CONNECTION_WIDTH_SCALE: f32 = 15.0; // line width per unit of connection strength
pub const CONNECTION_ALPHA_SCALE: f32 = 0.5; // alpha at full (clamped) width

// Random state
pub const MAX_RANDOM_NOTES: usize = 5;
pub const RANDOM_NOTE_MAX_AGE_SEC: f32 = 30.0;

// Rotation step for keyboard control (radians per key press)
pub const ROTATION_STEP: f32 = std::f32::consts::PI / 36.0;
