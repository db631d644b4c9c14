//! Enumeration types used throughout the engine.

use serde::{Deserialize, Serialize};

/// Match format; decides how many actors make up the roster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchType {
    /// No players, shuttle only.
    #[default]
    #[serde(alias = "none")]
    None,
    /// Two players.
    #[serde(alias = "singles")]
    Singles,
    /// Four players.
    #[serde(alias = "doubles")]
    Doubles,
}

impl MatchType {
    /// Number of actors spawned for this match type.
    pub fn roster_size(self) -> usize {
        match self {
            MatchType::None => 0,
            MatchType::Singles => 2,
            MatchType::Doubles => 4,
        }
    }
}

/// Rally sequencer state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RallyPhase {
    /// No rally running.
    #[default]
    Idle,
    /// First hitter walking to the first rally point.
    HitterApproach,
    /// Shuttle airborne on the current segment.
    FlightInProgress,
    /// Rally over, actors walking back to the base formation.
    ReturningToBase,
}

impl RallyPhase {
    pub fn is_playing(self) -> bool {
        !matches!(self, RallyPhase::Idle)
    }
}

/// Independently cancellable animation loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LoopKind {
    /// Hitter approach and shuttle flight.
    Rally,
    /// Post-rally walk back to the base formation.
    ReturnToBase,
    /// Walk to updated base positions while idle.
    Formation,
    /// Timed highlight on a preview marker.
    Highlight,
}

/// Transient visual artifacts owned by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    Shuttlecock,
    FlightPath,
    PreviewMarker,
    MarkerLabel,
    Highlight,
}

impl ArtifactKind {
    /// Artifacts that belong to a rally in flight.
    pub fn is_flight(self) -> bool {
        matches!(self, ArtifactKind::Shuttlecock | ArtifactKind::FlightPath)
    }

    /// Artifacts that belong to preview mode.
    pub fn is_preview(self) -> bool {
        matches!(
            self,
            ArtifactKind::PreviewMarker | ArtifactKind::MarkerLabel | ArtifactKind::Highlight
        )
    }
}

/// Player gender, used for visual parameters only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
}

/// Half of the court relative to the net.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CourtSide {
    /// z < 0.
    Near,
    /// z > 0.
    Far,
}

impl CourtSide {
    /// Side of a baseline coordinate. `None` on the net plane itself.
    pub fn of(z: f64) -> Option<CourtSide> {
        if z < 0.0 {
            Some(CourtSide::Near)
        } else if z > 0.0 {
            Some(CourtSide::Far)
        } else {
            None
        }
    }
}

/// How a rally ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RallyOutcome {
    /// Every segment flown and every actor back at base.
    Completed,
    /// Stopped by `cancel`, preview, reset or a match type change.
    Canceled,
    /// Replaced by a newer `play` request.
    Superseded,
}

/// Notice severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NoticeLevel {
    Info,
    Warning,
}
