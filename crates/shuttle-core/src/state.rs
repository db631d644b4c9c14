//! Engine state snapshot, produced after every frame.

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::events::RallyEvent;
use crate::types::{ActorId, CourtPoint, FrameTime, Point3, RallyId};

/// Complete visible state after a frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RallySnapshot {
    pub time: FrameTime,
    pub phase: RallyPhase,
    pub match_type: MatchType,
    pub rally: Option<RallyView>,
    pub actors: Vec<ActorView>,
    pub shuttle: Option<ShuttleView>,
    /// Points of the visible flight-path line (empty when hidden).
    pub flight_path: Vec<Point3>,
    pub preview: Vec<MarkerView>,
    pub highlight: Option<usize>,
    pub active_loops: Vec<LoopKind>,
    /// Number of transient artifacts currently registered.
    pub artifact_count: usize,
    pub events: Vec<RallyEvent>,
}

/// Progress of the rally in play.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RallyView {
    pub rally_id: RallyId,
    /// Segment being flown (or about to be flown during the approach).
    pub segment_index: usize,
    pub segment_count: usize,
    /// 0..=1 progress of the shuttle along the current segment.
    pub progress: f64,
}

/// A player for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorView {
    pub id: ActorId,
    pub position: Point3,
    pub facing: f64,
    pub is_moving: bool,
    pub target: Option<CourtPoint>,
}

/// The shuttlecock for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShuttleView {
    pub position: Point3,
    /// Unit tangent of the flight curve at the shuttle's position.
    pub direction: Point3,
}

/// A preview marker for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerView {
    pub ordinal: usize,
    pub position: Point3,
}
