//! Rally engine for the shuttle visualizer.
//!
//! Owns the hecs world of actors and transient artifacts, sequences rallies
//! frame by frame and produces `RallySnapshot`s for the host.

pub mod artifacts;
pub mod engine;
pub mod headless;
pub mod roster;
pub mod scheduler;
pub mod sequencer;
pub mod systems;

pub use engine::{EngineConfig, RallyEngine};
pub use headless::HeadlessScene;
pub use shuttle_core as core;

#[cfg(test)]
mod tests;
