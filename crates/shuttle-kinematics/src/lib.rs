//! Kinematics for the shuttle rally engine.
//!
//! Flight-path solving (parabolic curves, net clearance search) and
//! per-actor seek motion. Pure functions on plain data with no ECS dependency.

pub mod flight;
pub mod motion;

pub use shuttle_core as core;
