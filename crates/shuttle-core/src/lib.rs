//! Core types and definitions for the shuttle rally engine.
//!
//! This crate defines the vocabulary shared across all other crates:
//! geometry, components, configuration, commands, events, state snapshots,
//! the scene-host contract and constants. It has no dependency on any
//! renderer or runtime framework.

pub mod commands;
pub mod components;
pub mod config;
pub mod constants;
pub mod enums;
pub mod error;
pub mod events;
pub mod geometry;
pub mod scene;
pub mod state;
pub mod types;
