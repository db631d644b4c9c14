//! Snapshot system: reads the world and rally state into a `RallySnapshot`.
//!
//! Read-only; it never modifies the world.

use hecs::World;

use shuttle_core::components::{Actor, Artifact, PreviewOrdinal};
use shuttle_core::enums::*;
use shuttle_core::events::RallyEvent;
use shuttle_core::state::*;
use shuttle_core::types::{FrameTime, Point3};

use crate::artifacts;
use crate::scheduler::Scheduler;
use crate::sequencer::{ActiveRally, FlightArtifacts};

/// Build a complete snapshot of what the host should be showing.
#[allow(clippy::too_many_arguments)]
pub fn build_snapshot(
    world: &World,
    time: &FrameTime,
    phase: RallyPhase,
    match_type: MatchType,
    rally: Option<&ActiveRally>,
    flight_artifacts: &FlightArtifacts,
    scheduler: &Scheduler,
    highlight: Option<usize>,
    events: Vec<RallyEvent>,
) -> RallySnapshot {
    RallySnapshot {
        time: *time,
        phase,
        match_type,
        rally: rally.map(build_rally),
        actors: build_actors(world),
        shuttle: build_shuttle(world, rally, flight_artifacts),
        flight_path: build_flight_path(rally, flight_artifacts),
        preview: build_preview(world),
        highlight,
        active_loops: scheduler.active_kinds(),
        artifact_count: artifacts::count(world),
        events,
    }
}

fn build_rally(rally: &ActiveRally) -> RallyView {
    RallyView {
        rally_id: rally.id,
        segment_index: rally.segment_index,
        segment_count: rally.segment_count(),
        progress: rally.progress(),
    }
}

/// Actors sorted by id.
fn build_actors(world: &World) -> Vec<ActorView> {
    let mut actors: Vec<ActorView> = world
        .query::<(&Actor, &Point3)>()
        .iter()
        .map(|(_, (actor, position))| ActorView {
            id: actor.id,
            position: *position,
            facing: actor.facing,
            is_moving: actor.is_moving,
            target: actor.target,
        })
        .collect();
    actors.sort_by_key(|a| a.id);
    actors
}

fn build_shuttle(
    world: &World,
    rally: Option<&ActiveRally>,
    flight_artifacts: &FlightArtifacts,
) -> Option<ShuttleView> {
    let entity = flight_artifacts.shuttle?;
    let position = world.get::<&Point3>(entity).ok().map(|p| *p)?;
    let direction = rally
        .and_then(|r| r.flight.as_ref())
        .and_then(|f| f.curve.direction_at(f.progress()))
        .map(Point3::from)
        .unwrap_or_default();
    Some(ShuttleView {
        position,
        direction,
    })
}

fn build_flight_path(rally: Option<&ActiveRally>, flight_artifacts: &FlightArtifacts) -> Vec<Point3> {
    if flight_artifacts.path.is_none() {
        return Vec::new();
    }
    rally
        .and_then(|r| r.flight.as_ref())
        .map(|f| f.drawn_path())
        .unwrap_or_default()
}

/// Preview markers sorted by ordinal.
fn build_preview(world: &World) -> Vec<MarkerView> {
    let mut markers: Vec<MarkerView> = world
        .query::<(&Artifact, &PreviewOrdinal, &Point3)>()
        .iter()
        .filter(|(_, (artifact, _, _))| artifact.kind == ArtifactKind::PreviewMarker)
        .map(|(_, (_, ordinal, position))| MarkerView {
            ordinal: ordinal.0,
            position: *position,
        })
        .collect();
    markers.sort_by_key(|m| m.ordinal);
    markers
}
