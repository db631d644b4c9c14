//! Flight-path solver.
//!
//! A segment's curve interpolates x and z linearly in `t ∈ [0, 1]`. Height is
//! the linear blend of the endpoint heights plus a sine bulge whose apex rises
//! `horizontal_distance × arc_height` above the higher endpoint, so longer
//! shots arc higher. Net-crossing segments can have their coefficient raised
//! until the curve clears the net.

use std::f64::consts::PI;

use glam::DVec3;

use shuttle_core::constants::*;
use shuttle_core::geometry::{crosses_net, horizontal_distance, lerp};
use shuttle_core::types::Point3;

/// Point on the flight curve at progress `t` (clamped to `[0, 1]`).
///
/// Returns the exact endpoints at `t = 0` and `t = 1`. An `arc_height` of 0
/// is a straight line.
pub fn parabolic_point(start: &Point3, end: &Point3, t: f64, arc_height: f64) -> Point3 {
    if t <= 0.0 {
        return *start;
    }
    if t >= 1.0 {
        return *end;
    }

    let x = lerp(start.x, end.x, t);
    let z = lerp(start.z, end.z, t);
    let linear_y = lerp(start.y, end.y, t);

    if arc_height == 0.0 {
        return Point3::new(x, linear_y, z);
    }

    let bulge = (PI * t).sin() * arc_rise(start, end, arc_height);
    Point3::new(x, linear_y + bulge, z)
}

/// Height of the arc's apex above the higher endpoint.
pub fn arc_rise(start: &Point3, end: &Point3, arc_height: f64) -> f64 {
    horizontal_distance(start, end) * arc_height
}

/// Nominal maximum height: `max(start.y, end.y) + arc_rise`.
pub fn max_height(start: &Point3, end: &Point3, arc_height: f64) -> f64 {
    start.y.max(end.y) + arc_rise(start, end, arc_height)
}

/// Unit tangent of the curve at progress `t` (direction of travel).
pub fn flight_direction(start: &Point3, end: &Point3, t: f64, arc_height: f64) -> Option<DVec3> {
    let t = t.clamp(0.0, 1.0);
    let rise = if arc_height == 0.0 {
        0.0
    } else {
        arc_rise(start, end, arc_height)
    };
    DVec3::new(
        end.x - start.x,
        (end.y - start.y) + PI * (PI * t).cos() * rise,
        end.z - start.z,
    )
    .try_normalize()
}

/// Time the shuttle needs to cover the segment's horizontal distance.
/// Degenerate segments (no distance, no speed) are instantaneous.
pub fn flight_duration(start: &Point3, end: &Point3, speed: f64) -> f64 {
    let distance = horizontal_distance(start, end);
    if distance < MIN_SEGMENT_DISTANCE || !speed.is_finite() || speed <= 0.0 {
        return 0.0;
    }
    distance / speed
}

/// Discretized flight curve.
///
/// A lazy, finite iterator over `samples + 1` points from `start` to `end`.
/// Cloning or calling `restart` replays the identical sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightCurve {
    start: Point3,
    end: Point3,
    arc_height: f64,
    samples: usize,
    next: usize,
}

impl FlightCurve {
    pub fn new(start: Point3, end: Point3, arc_height: f64, samples: usize) -> Self {
        Self {
            start,
            end,
            arc_height,
            samples: samples.max(1),
            next: 0,
        }
    }

    pub fn start(&self) -> Point3 {
        self.start
    }

    pub fn end(&self) -> Point3 {
        self.end
    }

    pub fn arc_height(&self) -> f64 {
        self.arc_height
    }

    /// Number of segments the curve is divided into.
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Point at arbitrary progress `t`.
    pub fn point_at(&self, t: f64) -> Point3 {
        parabolic_point(&self.start, &self.end, t, self.arc_height)
    }

    /// The `index`-th sample, `0..=samples`.
    pub fn sample(&self, index: usize) -> Point3 {
        self.point_at(index as f64 / self.samples as f64)
    }

    /// Tangent at progress `t`.
    pub fn direction_at(&self, t: f64) -> Option<DVec3> {
        flight_direction(&self.start, &self.end, t, self.arc_height)
    }

    /// Number of samples covered once the shuttle has reached `progress`.
    pub fn visible_samples(&self, progress: f64) -> usize {
        let progress = progress.clamp(0.0, 1.0);
        (self.samples as f64 * progress).floor() as usize + 1
    }

    /// Samples up to `progress`, for drawing the path behind the shuttle.
    pub fn trail(&self, progress: f64) -> Vec<Point3> {
        let mut curve = self.clone();
        curve.restart();
        curve.take(self.visible_samples(progress)).collect()
    }

    /// Rewind to the first sample.
    pub fn restart(&mut self) {
        self.next = 0;
    }
}

impl Iterator for FlightCurve {
    type Item = Point3;

    fn next(&mut self) -> Option<Point3> {
        if self.next > self.samples {
            return None;
        }
        let point = self.sample(self.next);
        self.next += 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.samples + 1).saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for FlightCurve {}

/// Solve a segment with the default sample count.
pub fn solve_segment(start: Point3, end: Point3, arc_height: f64) -> FlightCurve {
    FlightCurve::new(start, end, arc_height, FLIGHT_PATH_SAMPLES)
}

/// Result of the net clearance search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcResolution {
    /// Coefficient to fly with.
    pub arc_height: f64,
    /// Progress at which the segment crosses the net, if it does.
    pub net_progress: Option<f64>,
    /// Curve height at `net_progress` with the resolved coefficient.
    pub height_at_net: Option<f64>,
    /// Whether the coefficient was raised.
    pub adjusted: bool,
    /// Ceiling reached without clearing the net.
    pub exhausted: bool,
}

/// Progress at which the segment crosses the net plane (z = 0).
pub fn net_progress(start: &Point3, end: &Point3) -> Option<f64> {
    if !crosses_net(start.z, end.z) {
        return None;
    }
    Some(-start.z / (end.z - start.z))
}

/// Height the curve has when it passes over the net, if it crosses it.
pub fn height_at_net(start: &Point3, end: &Point3, arc_height: f64) -> Option<f64> {
    net_progress(start, end).map(|t| parabolic_point(start, end, t, arc_height).y)
}

/// Raise `base_arc_height` in `ARC_HEIGHT_STEP` increments (up to
/// `ARC_HEIGHT_CEILING`) until the curve passes at least
/// `NET_HEIGHT + MIN_NET_CLEARANCE` over the net.
///
/// Segments that stay on one side of the net, and flat drives
/// (`base_arc_height == 0`), are returned unmodified. Deterministic.
pub fn resolve_arc_height(start: &Point3, end: &Point3, base_arc_height: f64) -> ArcResolution {
    let unmodified = ArcResolution {
        arc_height: base_arc_height,
        net_progress: None,
        height_at_net: None,
        adjusted: false,
        exhausted: false,
    };

    if base_arc_height == 0.0 || !base_arc_height.is_finite() {
        return unmodified;
    }
    let Some(t_net) = net_progress(start, end) else {
        return unmodified;
    };

    let required = NET_HEIGHT + MIN_NET_CLEARANCE;
    let mut arc_height = base_arc_height;
    let mut height = parabolic_point(start, end, t_net, arc_height).y;

    // Candidates are base + k * STEP, clamped to the ceiling. A negative base
    // skips straight to the candidates around zero, so the search is bounded
    // by CEILING / STEP iterations whatever the base.
    let mut steps = ((base_arc_height.max(0.0) - base_arc_height) / ARC_HEIGHT_STEP).floor();
    while height < required && arc_height < ARC_HEIGHT_CEILING {
        steps += 1.0;
        arc_height = (base_arc_height + steps * ARC_HEIGHT_STEP).min(ARC_HEIGHT_CEILING);
        height = parabolic_point(start, end, t_net, arc_height).y;
    }

    ArcResolution {
        arc_height,
        net_progress: Some(t_net),
        height_at_net: Some(height),
        adjusted: arc_height != base_arc_height,
        exhausted: height < required,
    }
}

/// Resolve the coefficient, then solve the curve with it.
pub fn solve_with_clearance(
    start: Point3,
    end: Point3,
    base_arc_height: f64,
) -> (FlightCurve, ArcResolution) {
    let resolution = resolve_arc_height(&start, &end, base_arc_height);
    (solve_segment(start, end, resolution.arc_height), resolution)
}
