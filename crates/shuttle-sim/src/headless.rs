//! In-memory scene host for tests and the headless player.
//!
//! Tracks every handle through its lifecycle so callers can check that
//! nothing leaks.

use std::collections::{BTreeMap, BTreeSet};

use glam::DVec3;

use shuttle_core::enums::ArtifactKind;
use shuttle_core::scene::{SceneHandle, SceneHost, Visual};
use shuttle_core::types::Point3;

/// Last placement received for a handle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Point3,
    pub facing: Option<DVec3>,
}

#[derive(Debug, Default)]
pub struct HeadlessScene {
    next_handle: u64,
    live: BTreeMap<SceneHandle, Visual>,
    attached: BTreeSet<SceneHandle>,
    placements: BTreeMap<SceneHandle, Placement>,
    created_total: usize,
    disposed_total: usize,
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles created and not yet disposed.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }

    /// Live handles whose visual is of the given artifact kind.
    pub fn live_of_kind(&self, kind: ArtifactKind) -> usize {
        self.live
            .values()
            .filter(|visual| visual.artifact_kind() == Some(kind))
            .count()
    }

    /// Live actor bodies.
    pub fn live_actors(&self) -> usize {
        self.live
            .values()
            .filter(|visual| matches!(visual, Visual::Actor { .. }))
            .count()
    }

    /// Visuals of every live handle, in creation order.
    pub fn visuals(&self) -> impl Iterator<Item = &Visual> {
        self.live.values()
    }

    /// Live visuals paired with the last placement each received.
    pub fn placements(&self) -> impl Iterator<Item = (&Visual, Placement)> + '_ {
        self.placements
            .iter()
            .filter_map(|(handle, placement)| Some((self.live.get(handle)?, *placement)))
    }

    pub fn created_total(&self) -> usize {
        self.created_total
    }

    pub fn disposed_total(&self) -> usize {
        self.disposed_total
    }
}

impl SceneHost for HeadlessScene {
    fn create(&mut self, visual: &Visual) -> SceneHandle {
        self.next_handle += 1;
        let handle = SceneHandle(self.next_handle);
        self.live.insert(handle, visual.clone());
        self.created_total += 1;
        handle
    }

    fn attach(&mut self, handle: SceneHandle) {
        if self.live.contains_key(&handle) {
            self.attached.insert(handle);
        }
    }

    fn place(&mut self, handle: SceneHandle, position: Point3, facing: Option<DVec3>) {
        if self.attached.contains(&handle) {
            self.placements.insert(handle, Placement { position, facing });
        }
    }

    fn detach(&mut self, handle: SceneHandle) {
        self.attached.remove(&handle);
    }

    fn dispose(&mut self, handle: SceneHandle) {
        self.attached.remove(&handle);
        self.placements.remove(&handle);
        if self.live.remove(&handle).is_some() {
            self.disposed_total += 1;
        }
    }
}
