//! Shuttle flight system: moves the token along the current curve and keeps
//! the trailing flight-path line in step with it.

use hecs::World;

use shuttle_core::scene::{SceneHost, Visual};

use crate::artifacts;
use crate::sequencer::{FlightArtifacts, SegmentFlight};

/// Advance the flight by `dt`. Returns `true` once the shuttle has landed.
pub fn run<S: SceneHost>(
    world: &mut World,
    scene: &mut S,
    flight: &mut SegmentFlight,
    flight_artifacts: &mut FlightArtifacts,
    show_path: bool,
    dt: f64,
) -> bool {
    flight.elapsed_secs += dt;
    let progress = flight.progress();

    if let Some(shuttle) = flight_artifacts.shuttle {
        let position = flight.curve.point_at(progress);
        let facing = flight.curve.direction_at(progress);
        artifacts::place(world, scene, shuttle, position, facing);
    }

    if show_path {
        redraw_path(world, scene, flight, flight_artifacts, progress);
    } else if flight_artifacts.path.is_some() {
        flight_artifacts.release_path(world, scene);
        flight.drawn_samples = 0;
    }

    flight.is_landed()
}

/// Replace the path line when the number of covered samples changed.
/// A line needs at least two points; shorter trails draw nothing.
fn redraw_path<S: SceneHost>(
    world: &mut World,
    scene: &mut S,
    flight: &mut SegmentFlight,
    flight_artifacts: &mut FlightArtifacts,
    progress: f64,
) {
    let visible = flight.curve.visible_samples(progress);
    if visible < 2 || (visible == flight.drawn_samples && flight_artifacts.path.is_some()) {
        return;
    }

    flight_artifacts.release_path(world, scene);
    let points = flight.curve.trail(progress);
    let tip = points.last().copied().unwrap_or_else(|| flight.curve.start());
    flight_artifacts.path = artifacts::spawn_artifact(world, scene, &Visual::FlightPath { points }, tip);
    flight.drawn_samples = visible;
}
