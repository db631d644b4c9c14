//! Registry of scene-backed entities.
//!
//! Every transient visual is an entity carrying an `Artifact` and the
//! `SceneObject` handle it was created with. Releasing despawns the entity
//! first and only then detaches and disposes the handle, so releasing twice
//! never reaches the scene host a second time.

use glam::DVec3;
use hecs::{Entity, World};

use shuttle_core::components::{Artifact, SceneObject};
use shuttle_core::scene::{SceneHost, Visual};
use shuttle_core::types::Point3;

/// Create a visual in the scene and register it as a transient artifact.
/// Returns `None` for visuals that are not artifacts (actor bodies).
pub fn spawn_artifact<S: SceneHost>(
    world: &mut World,
    scene: &mut S,
    visual: &Visual,
    position: Point3,
) -> Option<Entity> {
    let Some(kind) = visual.artifact_kind() else {
        log::warn!("refusing to register an actor body as an artifact");
        return None;
    };
    let handle = scene.create(visual);
    scene.attach(handle);
    Some(world.spawn((Artifact { kind }, SceneObject { handle }, position)))
}

/// Release a scene-backed entity (artifact or actor).
/// Returns `false` if it was already gone.
pub fn release<S: SceneHost>(world: &mut World, scene: &mut S, entity: Entity) -> bool {
    let Ok(object) = world.get::<&SceneObject>(entity).map(|o| *o) else {
        return false;
    };
    let _ = world.despawn(entity);
    scene.detach(object.handle);
    scene.dispose(object.handle);
    true
}

/// Move an artifact and forward the placement to the scene host.
pub fn place<S: SceneHost>(
    world: &mut World,
    scene: &mut S,
    entity: Entity,
    position: Point3,
    facing: Option<DVec3>,
) {
    let Ok((stored, object)) = world.query_one_mut::<(&mut Point3, &SceneObject)>(entity) else {
        return;
    };
    *stored = position;
    scene.place(object.handle, position, facing);
}

/// Number of live transient artifacts.
pub fn count(world: &World) -> usize {
    world.query::<&Artifact>().iter().count()
}
