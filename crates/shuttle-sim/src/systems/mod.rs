//! Per-frame systems over the rally world.
//!
//! Systems are free functions over `&mut World` (or `&World` for read-only).
//! Rally progress lives in the engine; everything visible lives in components.

pub mod cleanup;
pub mod flight;
pub mod motion;
pub mod snapshot;
