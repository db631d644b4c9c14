//! Rally definitions and match configuration.
//!
//! Everything the engine needs is passed in explicitly through these types;
//! there are no global tables.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::enums::{Gender, MatchType};
use crate::error::RallyError;
use crate::types::{ActorId, CourtPoint, Point3};

/// A named point where the shuttle is struck or lands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RallyPoint {
    pub name: String,
    pub position: Point3,
}

impl RallyPoint {
    pub fn new(name: impl Into<String>, position: Point3) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

/// Flight and choreography for one segment (point `i` to point `i + 1`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Shuttle speed over the ground (m/s).
    pub speed: f64,
    /// Arc coefficient: extra peak height per meter of horizontal distance.
    pub arc_height: f64,
    /// Actor striking the shuttle at the segment's start point.
    pub hitter_id: Option<ActorId>,
    /// Where the hitter retreats to while the shuttle is in the air.
    pub hitter_return_point: Option<CourtPoint>,
    /// Where the hitter's partner stands while the hitter strikes (doubles).
    pub partner_stand_point: Option<CourtPoint>,
    /// Where the partner moves once the shuttle is struck (doubles).
    pub partner_return_point: Option<CourtPoint>,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            speed: DEFAULT_FLIGHT_SPEED,
            arc_height: DEFAULT_ARC_HEIGHT,
            hitter_id: None,
            hitter_return_point: None,
            partner_stand_point: None,
            partner_return_point: None,
        }
    }
}

/// Everything `play` needs: the ordered points, per-segment configs and
/// whether the flight path should be drawn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RallyPlan {
    pub points: Vec<RallyPoint>,
    /// Keyed by segment index (0 = first point to second point).
    pub segments: BTreeMap<usize, SegmentConfig>,
    pub show_flight_path: bool,
}

impl RallyPlan {
    pub fn new(
        points: Vec<RallyPoint>,
        segments: BTreeMap<usize, SegmentConfig>,
        show_flight_path: bool,
    ) -> Self {
        Self {
            points,
            segments,
            show_flight_path,
        }
    }

    /// Number of segments (points - 1).
    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    pub fn segment(&self, index: usize) -> Option<&SegmentConfig> {
        self.segments.get(&index)
    }

    /// Segment indices that have no config.
    pub fn missing_segments(&self) -> Vec<usize> {
        (0..self.segment_count())
            .filter(|i| !self.segments.contains_key(i))
            .collect()
    }

    /// Reject plans the engine cannot fly at all.
    pub fn validate(&self) -> Result<(), RallyError> {
        if self.points.len() < 2 {
            return Err(RallyError::TooFewPoints {
                count: self.points.len(),
            });
        }
        if let Some(index) = self.points.iter().position(|p| !p.position.is_finite()) {
            return Err(RallyError::NonFinitePoint { index });
        }
        for (&index, segment) in &self.segments {
            if segment.speed.is_nan() || segment.speed < 0.0 {
                return Err(RallyError::InvalidSpeed {
                    index,
                    speed: segment.speed,
                });
            }
            if !segment.arc_height.is_finite() || segment.arc_height < 0.0 {
                return Err(RallyError::InvalidArcHeight {
                    index,
                    arc_height: segment.arc_height,
                });
            }
        }
        Ok(())
    }
}

/// Per-player visual profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub id: ActorId,
    #[serde(default)]
    pub gender: Gender,
}

/// Canonical standing positions per match type, keyed by actor id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseFormation {
    pub singles: BTreeMap<ActorId, CourtPoint>,
    pub doubles: BTreeMap<ActorId, CourtPoint>,
}

impl Default for BaseFormation {
    fn default() -> Self {
        Self {
            singles: BTreeMap::from([
                (1, CourtPoint::new(0.0, -4.0)),
                (2, CourtPoint::new(0.0, 4.0)),
            ]),
            doubles: BTreeMap::from([
                (1, CourtPoint::new(1.5, -4.0)),
                (2, CourtPoint::new(1.5, 4.0)),
                (3, CourtPoint::new(-1.5, -4.0)),
                (4, CourtPoint::new(-1.5, 4.0)),
            ]),
        }
    }
}

impl BaseFormation {
    /// Base position table for a match type. `None` has no players.
    pub fn table(&self, match_type: MatchType) -> Option<&BTreeMap<ActorId, CourtPoint>> {
        match match_type {
            MatchType::None => None,
            MatchType::Singles => Some(&self.singles),
            MatchType::Doubles => Some(&self.doubles),
        }
    }

    pub fn position(&self, match_type: MatchType, id: ActorId) -> Option<CourtPoint> {
        self.table(match_type).and_then(|t| t.get(&id)).copied()
    }

    /// Merge new positions into the table for `match_type`.
    /// Non-finite positions are skipped. Returns the ids actually updated.
    pub fn update(
        &mut self,
        match_type: MatchType,
        positions: &BTreeMap<ActorId, CourtPoint>,
    ) -> Vec<ActorId> {
        let table = match match_type {
            MatchType::None => return Vec::new(),
            MatchType::Singles => &mut self.singles,
            MatchType::Doubles => &mut self.doubles,
        };
        let mut updated = Vec::new();
        for (&id, &pos) in positions {
            if pos.is_finite() {
                table.insert(id, pos);
                updated.push(id);
            }
        }
        updated
    }
}

/// A rally point as stored in rally JSON files.
///
/// The optional fields configure the segment that starts at this point;
/// they are ignored on the last point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub x: f64,
    #[serde(default = "default_point_height")]
    pub y: f64,
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arc_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hitter_id: Option<ActorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hitter_return_point: Option<CourtPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_stand_point: Option<CourtPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_return_point: Option<CourtPoint>,
}

fn default_point_height() -> f64 {
    DEFAULT_POINT_HEIGHT
}

/// A rally as authored by the UI: a JSON array of points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RallyDefinition {
    pub points: Vec<StoredPoint>,
}

impl RallyDefinition {
    pub fn from_json(json: &str) -> Result<Self, RallyError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, RallyError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, RallyError> {
        Ok(serde_json::to_string_pretty(&self.points)?)
    }

    /// Convert into a validated plan. Points without a name become `P1`, `P2`, ...
    pub fn into_plan(self, show_flight_path: bool) -> Result<RallyPlan, RallyError> {
        let segment_count = self.points.len().saturating_sub(1);
        let mut points = Vec::with_capacity(self.points.len());
        let mut segments = BTreeMap::new();

        for (i, stored) in self.points.into_iter().enumerate() {
            let name = stored.name.unwrap_or_else(|| format!("P{}", i + 1));
            points.push(RallyPoint::new(
                name,
                Point3::new(stored.x, stored.y, stored.z),
            ));
            if i < segment_count {
                segments.insert(
                    i,
                    SegmentConfig {
                        speed: stored.speed.unwrap_or(DEFAULT_FLIGHT_SPEED),
                        arc_height: stored.arc_height.unwrap_or(DEFAULT_ARC_HEIGHT),
                        hitter_id: stored.hitter_id,
                        hitter_return_point: stored.hitter_return_point,
                        partner_stand_point: stored.partner_stand_point,
                        partner_return_point: stored.partner_return_point,
                    },
                );
            }
        }

        let plan = RallyPlan::new(points, segments, show_flight_path);
        plan.validate()?;
        Ok(plan)
    }

    /// Flatten a plan back into the stored form.
    pub fn from_plan(plan: &RallyPlan) -> Self {
        let points = plan
            .points
            .iter()
            .enumerate()
            .map(|(i, point)| {
                let segment = plan.segment(i);
                StoredPoint {
                    name: Some(point.name.clone()),
                    x: point.position.x,
                    y: point.position.y,
                    z: point.position.z,
                    speed: segment.map(|s| s.speed),
                    arc_height: segment.map(|s| s.arc_height),
                    hitter_id: segment.and_then(|s| s.hitter_id),
                    hitter_return_point: segment.and_then(|s| s.hitter_return_point),
                    partner_stand_point: segment.and_then(|s| s.partner_stand_point),
                    partner_return_point: segment.and_then(|s| s.partner_return_point),
                }
            })
            .collect();
        Self { points }
    }
}
