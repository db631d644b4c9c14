//! Fundamental geometric and timing types.

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

/// 1-based player number within a roster.
pub type ActorId = u32;

/// Identifier handed out for every accepted `play` request.
pub type RallyId = u32;

/// 3D position in court space (meters).
/// x = sideline axis, y = height above the court surface, z = baseline axis.
/// The net plane sits at z = 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A position on the court floor. Players only move in this plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CourtPoint {
    pub x: f64,
    pub z: f64,
}

/// Frame clock driven by the host's render loop.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FrameTime {
    /// Frame number (increments by 1 each tick).
    pub frame: u64,
    /// Accumulated wall-clock time in seconds.
    pub elapsed_secs: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// A point on the court surface (y = 0).
    pub fn on_floor(x: f64, z: f64) -> Self {
        Self { x, y: 0.0, z }
    }

    /// Straight-line distance to another point in meters.
    pub fn distance_to(&self, other: &Point3) -> f64 {
        DVec3::from(*self).distance(DVec3::from(*other))
    }

    /// Distance in the x/z plane, ignoring height.
    pub fn horizontal_distance_to(&self, other: &Point3) -> f64 {
        self.court_point().distance_to(&other.court_point())
    }

    /// Projection onto the court floor.
    pub fn court_point(&self) -> CourtPoint {
        CourtPoint::new(self.x, self.z)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl CourtPoint {
    pub fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    pub fn distance_to(&self, other: &CourtPoint) -> f64 {
        DVec2::from(*self).distance(DVec2::from(*other))
    }

    /// Lift onto the given height.
    pub fn at_height(&self, y: f64) -> Point3 {
        Point3::new(self.x, y, self.z)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.z.is_finite()
    }
}

impl FrameTime {
    /// Advance by one frame of `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        self.frame += 1;
        self.elapsed_secs += dt;
    }
}

impl From<Point3> for DVec3 {
    fn from(p: Point3) -> Self {
        DVec3::new(p.x, p.y, p.z)
    }
}

impl From<DVec3> for Point3 {
    fn from(v: DVec3) -> Self {
        Point3::new(v.x, v.y, v.z)
    }
}

// Court points map to glam's 2D vectors as (x, z).
impl From<CourtPoint> for DVec2 {
    fn from(p: CourtPoint) -> Self {
        DVec2::new(p.x, p.z)
    }
}

impl From<DVec2> for CourtPoint {
    fn from(v: DVec2) -> Self {
        CourtPoint::new(v.x, v.y)
    }
}
