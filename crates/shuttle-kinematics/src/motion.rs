//! Actor motion: constant-speed seek toward a floor target.
//!
//! `move_to` sets the goal, `update` advances by `speed × dt` each frame.
//! The latest `move_to` always wins; there is no queue.

use glam::DVec2;

use shuttle_core::components::Actor;
use shuttle_core::constants::ARRIVAL_EPSILON;
use shuttle_core::geometry::{direction_xz, yaw_of};
use shuttle_core::types::{CourtPoint, Point3};

/// What a single `update` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionStep {
    /// Not moving; nothing changed.
    Idle,
    /// Moved, target not reached yet.
    Moving,
    /// Reached the target during this call.
    Arrived,
}

/// Start seeking `target` at `speed` m/s, overriding any unmet target.
///
/// An undefined target (`None` or non-finite coordinates) or an invalid speed
/// is logged and ignored. Returns whether the command took effect.
/// An infinite speed makes the actor snap onto the target on its next update.
pub fn move_to(actor: &mut Actor, target: Option<CourtPoint>, speed: f64) -> bool {
    let Some(target) = target.filter(CourtPoint::is_finite) else {
        log::debug!("actor {}: move ignored, no target", actor.id);
        return false;
    };
    if speed.is_nan() || speed < 0.0 {
        log::warn!("actor {}: move ignored, invalid speed {speed}", actor.id);
        return false;
    }

    actor.target = Some(target);
    actor.speed = speed;
    actor.is_moving = true;
    true
}

/// Stop immediately without finishing the seek.
pub fn halt(actor: &mut Actor) {
    actor.target = None;
    actor.is_moving = false;
}

/// Advance one frame. A no-op once the actor has arrived.
pub fn update(actor: &mut Actor, position: &mut Point3, dt: f64) -> MotionStep {
    if !actor.is_moving {
        return MotionStep::Idle;
    }
    let Some(target) = actor.target else {
        actor.is_moving = false;
        return MotionStep::Idle;
    };

    let current = position.court_point();
    let remaining = current.distance_to(&target);
    let Some(direction) = direction_xz(&current, &target).filter(|_| remaining >= ARRIVAL_EPSILON)
    else {
        arrive(actor, position, target);
        return MotionStep::Arrived;
    };

    actor.facing = yaw_of(direction);

    let step = if actor.speed.is_finite() {
        actor.speed * dt.max(0.0)
    } else {
        f64::INFINITY
    };
    let advance = step.min(remaining);
    if remaining - advance < ARRIVAL_EPSILON {
        arrive(actor, position, target);
        return MotionStep::Arrived;
    }

    let next = DVec2::from(current) + direction * advance;
    position.x = next.x;
    position.z = next.y;
    MotionStep::Moving
}

/// Snap exactly onto the target so no residual drift remains.
fn arrive(actor: &mut Actor, position: &mut Point3, target: CourtPoint) {
    position.x = target.x;
    position.z = target.z;
    actor.target = None;
    actor.is_moving = false;
}

/// Speed needed to cover `distance` in `duration_secs`.
/// A non-positive duration means "instantly" (infinite speed).
pub fn speed_for(distance: f64, duration_secs: f64) -> f64 {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return f64::INFINITY;
    }
    distance.max(0.0) / duration_secs
}
