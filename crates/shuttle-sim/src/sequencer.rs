//! Rally state and the choreography issued at each phase boundary.
//!
//! The engine drives the state machine; this module holds the data it
//! carries between frames and the actor commands for each transition.

use std::collections::BTreeSet;

use hecs::{Entity, World};

use shuttle_core::config::{BaseFormation, RallyPlan, SegmentConfig};
use shuttle_core::enums::{MatchType, NoticeLevel};
use shuttle_core::events::RallyEvent;
use shuttle_core::scene::SceneHost;
use shuttle_core::types::{ActorId, Point3, RallyId};
use shuttle_kinematics::flight::{ArcResolution, FlightCurve};

use crate::artifacts;
use crate::roster;
use crate::scheduler::LoopId;

/// A rally accepted by `play` and not yet finished.
#[derive(Debug, Clone)]
pub struct ActiveRally {
    pub id: RallyId,
    pub plan: RallyPlan,
    /// Segment being flown, or about to be flown during the approach.
    pub segment_index: usize,
    /// Actor the approach waits for. `None` lets the flight start at once.
    pub approach_hitter: Option<ActorId>,
    pub flight: Option<SegmentFlight>,
    /// Actors still walking back to base.
    pub pending_return: BTreeSet<ActorId>,
    pub return_loop: Option<LoopId>,
}

impl ActiveRally {
    pub fn new(id: RallyId, plan: RallyPlan) -> Self {
        Self {
            id,
            plan,
            segment_index: 0,
            approach_hitter: None,
            flight: None,
            pending_return: BTreeSet::new(),
            return_loop: None,
        }
    }

    pub fn segment_count(&self) -> usize {
        self.plan.segment_count()
    }

    /// Start and end of segment `index`.
    pub fn endpoints(&self, index: usize) -> Option<(Point3, Point3)> {
        let start = self.plan.points.get(index)?.position;
        let end = self.plan.points.get(index + 1)?.position;
        Some((start, end))
    }

    pub fn progress(&self) -> f64 {
        self.flight.as_ref().map_or(0.0, SegmentFlight::progress)
    }
}

/// The shuttle's flight over one segment.
#[derive(Debug, Clone)]
pub struct SegmentFlight {
    pub curve: FlightCurve,
    pub resolution: ArcResolution,
    pub duration_secs: f64,
    pub elapsed_secs: f64,
    /// Samples in the flight-path line currently drawn (0 = none).
    pub drawn_samples: usize,
}

impl SegmentFlight {
    pub fn new(curve: FlightCurve, resolution: ArcResolution, duration_secs: f64) -> Self {
        Self {
            curve,
            resolution,
            duration_secs,
            elapsed_secs: 0.0,
            drawn_samples: 0,
        }
    }

    /// 0..=1 along the segment. Zero-duration segments are complete at once.
    pub fn progress(&self) -> f64 {
        if self.duration_secs <= 0.0 {
            return 1.0;
        }
        (self.elapsed_secs / self.duration_secs).clamp(0.0, 1.0)
    }

    pub fn is_landed(&self) -> bool {
        self.progress() >= 1.0
    }

    /// Points of the drawn flight-path line.
    pub fn drawn_path(&self) -> Vec<Point3> {
        let mut curve = self.curve.clone();
        curve.restart();
        curve.take(self.drawn_samples).collect()
    }
}

/// The shuttle token and the flight-path line. At most one of each exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlightArtifacts {
    pub shuttle: Option<Entity>,
    pub path: Option<Entity>,
}

impl FlightArtifacts {
    pub fn release<S: SceneHost>(&mut self, world: &mut World, scene: &mut S) {
        if let Some(shuttle) = self.shuttle.take() {
            artifacts::release(world, scene, shuttle);
        }
        self.release_path(world, scene);
    }

    pub fn release_path<S: SceneHost>(&mut self, world: &mut World, scene: &mut S) {
        if let Some(path) = self.path.take() {
            artifacts::release(world, scene, path);
        }
    }
}

/// Log a notice and queue it for the next snapshot.
pub fn notice(events: &mut Vec<RallyEvent>, frame: u64, level: NoticeLevel, message: String) {
    match level {
        NoticeLevel::Info => log::info!("{message}"),
        NoticeLevel::Warning => log::warn!("{message}"),
    }
    events.push(RallyEvent::Notice {
        level,
        message,
        frame,
    });
}

/// Approach: the first hitter walks to the first rally point while its
/// partner walks to the stand point. Returns the hitter to wait for.
pub fn approach_moves(
    world: &mut World,
    plan: &RallyPlan,
    formation: &BaseFormation,
    match_type: MatchType,
    duration_secs: f64,
    events: &mut Vec<RallyEvent>,
    frame: u64,
) -> Option<ActorId> {
    let config = plan.segment(0)?;
    let hitter = config.hitter_id?;
    if roster::find_actor(world, hitter).is_none() {
        notice(
            events,
            frame,
            NoticeLevel::Warning,
            format!("hitter {hitter} is not on the roster, skipping the approach"),
        );
        return None;
    }
    let first = plan.points.first()?.position.court_point();
    roster::move_actor_within(world, hitter, Some(first), duration_secs);

    if let Some(partner) = roster::partner_of(world, formation, match_type, hitter) {
        roster::move_actor_within(world, partner, config.partner_stand_point, duration_secs);
    }
    Some(hitter)
}

/// Moves that run alongside the flight of segment `index`, issued in order:
/// the hitter recovers, then its partner repositions. Needs the segment's
/// own config.
#[allow(clippy::too_many_arguments)]
pub fn segment_moves(
    world: &mut World,
    index: usize,
    config: &SegmentConfig,
    formation: &BaseFormation,
    match_type: MatchType,
    duration_secs: f64,
    events: &mut Vec<RallyEvent>,
    frame: u64,
) {
    let Some(hitter) = config.hitter_id else {
        return;
    };
    if roster::find_actor(world, hitter).is_none() {
        notice(
            events,
            frame,
            NoticeLevel::Warning,
            format!("segment {index}: hitter {hitter} is not on the roster"),
        );
        return;
    }
    roster::move_actor_within(world, hitter, config.hitter_return_point, duration_secs);
    if let Some(partner) = roster::partner_of(world, formation, match_type, hitter) {
        let target = config.partner_return_point.or(config.partner_stand_point);
        roster::move_actor_within(world, partner, target, duration_secs);
    }
}

/// Send the hitter of segment `index + 1` to the landing point of segment
/// `index`. Driven by the next segment's config only, and issued after
/// `segment_moves` so it wins over a partner move for the same actor.
pub fn next_hitter_move(
    world: &mut World,
    plan: &RallyPlan,
    index: usize,
    duration_secs: f64,
) -> Option<ActorId> {
    let next = plan.segment(index + 1)?.hitter_id?;
    let landing = plan.points.get(index + 1)?.position.court_point();
    roster::move_actor_within(world, next, Some(landing), duration_secs);
    Some(next)
}

/// Send every actor back to its base position. Returns the actors that have
/// to walk; those without a base position are done immediately.
pub fn return_moves(
    world: &mut World,
    formation: &BaseFormation,
    match_type: MatchType,
    duration_secs: f64,
) -> BTreeSet<ActorId> {
    let mut pending = BTreeSet::new();
    for id in roster::actor_ids(world) {
        let Some(base) = formation.position(match_type, id) else {
            log::debug!("actor {id}: no base position, counted as returned");
            continue;
        };
        if roster::move_actor_within(world, id, Some(base), duration_secs) {
            pending.insert(id);
        }
    }
    pending
}
