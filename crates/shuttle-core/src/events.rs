//! Events emitted by the engine for UI feedback and logging.

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::{ActorId, RallyId};

/// Something noteworthy that happened during a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RallyEvent {
    /// Sequencer state transition.
    PhaseChanged { from: RallyPhase, to: RallyPhase },
    /// A `play` request was accepted.
    RallyStarted {
        rally_id: RallyId,
        segment_count: usize,
    },
    /// The shuttle left the segment's start point.
    SegmentStarted {
        rally_id: RallyId,
        index: usize,
        duration_secs: f64,
        arc_height: f64,
    },
    /// The shuttle reached the segment's end point.
    SegmentCompleted { rally_id: RallyId, index: usize },
    /// The clearance search hit its ceiling without clearing the net.
    NetClearanceExhausted {
        rally_id: RallyId,
        index: usize,
        arc_height: f64,
        height_at_net: f64,
    },
    /// Terminal notification, exactly once per accepted `play`.
    RallyFinished {
        rally_id: RallyId,
        outcome: RallyOutcome,
    },
    /// The roster was rebuilt.
    RosterChanged {
        match_type: MatchType,
        actors: Vec<ActorId>,
    },
    /// Free-form notice (configuration gaps and similar).
    Notice {
        level: NoticeLevel,
        message: String,
        frame: u64,
    },
}
