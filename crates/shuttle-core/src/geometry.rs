//! Pure geometric helpers shared by the flight solver and the motion model.

use glam::{DVec2, DVec3};

use crate::types::{CourtPoint, Point3};

/// Directions shorter than this are treated as "no direction".
const MIN_DIRECTION_LENGTH: f64 = 1e-9;

/// Scalar linear interpolation.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Component-wise linear interpolation between two points.
pub fn lerp_point(a: &Point3, b: &Point3, t: f64) -> Point3 {
    DVec3::from(*a).lerp(DVec3::from(*b), t).into()
}

/// Horizontal (x/z) distance between two points.
pub fn horizontal_distance(a: &Point3, b: &Point3) -> f64 {
    a.horizontal_distance_to(b)
}

/// Unit direction from `from` to `to` on the court floor.
/// Returns `None` when the two points coincide.
pub fn direction_xz(from: &CourtPoint, to: &CourtPoint) -> Option<DVec2> {
    let delta = DVec2::from(*to) - DVec2::from(*from);
    let length = delta.length();
    if length < MIN_DIRECTION_LENGTH {
        return None;
    }
    Some(delta / length)
}

/// Yaw (radians) of a floor direction, given as (x, z).
/// 0 faces +z; PI/2 faces +x.
pub fn yaw_of(direction: DVec2) -> f64 {
    direction.x.atan2(direction.y)
}

/// Yaw that faces the net from a floor position: players on the far side
/// (z > 0) turn around.
pub fn yaw_facing_net(position: &CourtPoint) -> f64 {
    if position.z > 0.0 {
        std::f64::consts::PI
    } else {
        0.0
    }
}

/// Whether a segment between two baseline coordinates crosses the net plane.
pub fn crosses_net(start_z: f64, end_z: f64) -> bool {
    start_z * end_z < 0.0
}
