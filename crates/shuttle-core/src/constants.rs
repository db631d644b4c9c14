//! Engine constants and tuning parameters.

/// Nominal frame rate of the host render loop (Hz).
pub const FRAME_RATE: u32 = 60;

/// Seconds per frame at the nominal frame rate.
pub const FRAME_DT: f64 = 1.0 / FRAME_RATE as f64;

// --- Court ---

/// Net height at the posts (meters).
pub const NET_HEIGHT: f64 = 1.55;

// --- Flight ---

/// Required margin above the net tape at the crossing point (meters).
pub const MIN_NET_CLEARANCE: f64 = 0.20;

/// Increment applied to the arc coefficient while searching for clearance.
pub const ARC_HEIGHT_STEP: f64 = 0.05;

/// Highest arc coefficient the clearance search will try.
pub const ARC_HEIGHT_CEILING: f64 = 0.5;

/// Arc coefficient used when a segment does not configure one.
pub const DEFAULT_ARC_HEIGHT: f64 = 0.15;

/// Shuttle speed used when a segment does not configure one (m/s).
pub const DEFAULT_FLIGHT_SPEED: f64 = 3.0;

/// Height of a rally point authored without one (meters).
pub const DEFAULT_POINT_HEIGHT: f64 = 1.7;

/// Number of segments a flight curve is discretized into.
/// A curve yields `FLIGHT_PATH_SAMPLES + 1` points.
pub const FLIGHT_PATH_SAMPLES: usize = 60;

/// Segments shorter than this (horizontal meters) are flown instantly.
pub const MIN_SEGMENT_DISTANCE: f64 = 1e-6;

// --- Actors ---

/// Distance below which an actor is considered to have arrived (meters).
pub const ARRIVAL_EPSILON: f64 = 0.01;

/// Walking speed for formation changes outside a rally (m/s).
pub const DEFAULT_ACTOR_SPEED: f64 = 7.0;

/// Time the first hitter takes to reach the first rally point (seconds).
pub const HITTER_APPROACH_SECS: f64 = 1.0;

/// Time all actors take to walk back to their base formation (seconds).
pub const RETURN_TO_BASE_SECS: f64 = 2.0;

/// Colour palette for player visuals, indexed by `(id - 1) % len`.
pub const PLAYER_COLORS: [u32; 4] = [0x4287f5, 0xf5d442, 0xff69b4, 0x808080];

// --- Preview ---

/// Offset of an ordinal label from its marker on x and y (meters).
pub const MARKER_LABEL_OFFSET: f64 = 0.15;

/// Lifetime of a preview highlight decoration (seconds).
pub const HIGHLIGHT_DURATION_SECS: f64 = 1.5;
