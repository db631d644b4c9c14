//! Commands sent by the UI layer to the engine.
//!
//! Commands are queued and processed at the next frame boundary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{RallyPlan, RallyPoint};
use crate::enums::MatchType;
use crate::types::{ActorId, CourtPoint};

/// All operations exposed to collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RallyCommand {
    /// Replace the roster for a new match type.
    InitRoster { match_type: MatchType },
    /// Play a rally, superseding any rally in progress.
    Play { plan: RallyPlan },
    /// Stop the current rally and return to idle.
    Cancel,
    /// Show static markers for the given points.
    PreviewPoints { points: Vec<RallyPoint> },
    /// Remove preview markers.
    ClearPreview,
    /// Briefly decorate one preview marker.
    HighlightPreviewPoint { index: usize },
    /// Change base positions for the current match type.
    UpdateBasePositions {
        positions: BTreeMap<ActorId, CourtPoint>,
    },
    /// Show or hide the flight-path line.
    SetFlightPathVisible { visible: bool },
    /// Release all transient artifacts and stop every loop.
    Cleanup,
    /// Cleanup, then respawn the roster at the base formation.
    Reset,
}
