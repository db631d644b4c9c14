//! Cleanup system: releases transient artifacts by kind.

use hecs::{Entity, World};

use shuttle_core::components::Artifact;
use shuttle_core::enums::ArtifactKind;
use shuttle_core::scene::SceneHost;

use crate::artifacts;

/// Release every artifact whose kind matches `filter`.
/// Uses a caller-owned buffer to avoid per-call allocation.
pub fn run<S: SceneHost>(
    world: &mut World,
    scene: &mut S,
    despawn_buffer: &mut Vec<Entity>,
    filter: impl Fn(ArtifactKind) -> bool,
) -> usize {
    despawn_buffer.clear();
    despawn_buffer.extend(
        world
            .query::<&Artifact>()
            .iter()
            .filter(|(_, artifact)| filter(artifact.kind))
            .map(|(entity, _)| entity),
    );

    let mut released = 0;
    for entity in despawn_buffer.drain(..) {
        if artifacts::release(world, scene, entity) {
            released += 1;
        }
    }
    released
}

/// Release every transient artifact.
pub fn release_all<S: SceneHost>(
    world: &mut World,
    scene: &mut S,
    despawn_buffer: &mut Vec<Entity>,
) -> usize {
    run(world, scene, despawn_buffer, |_| true)
}
