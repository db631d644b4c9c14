//! Actor motion system: advances every moving actor by the frame's `dt`.

use glam::DVec3;
use hecs::World;

use shuttle_core::components::{Actor, SceneObject};
use shuttle_core::scene::SceneHost;
use shuttle_core::types::{ActorId, Point3};
use shuttle_kinematics::motion::{self, MotionStep};

/// Step all actors and forward new placements to the scene host.
/// Returns the ids that arrived this frame.
pub fn run<S: SceneHost>(world: &mut World, scene: &mut S, dt: f64) -> Vec<ActorId> {
    let mut arrived = Vec::new();
    for (_entity, (actor, position, object)) in
        world.query_mut::<(&mut Actor, &mut Point3, &SceneObject)>()
    {
        let step = motion::update(actor, position, dt);
        if step == MotionStep::Idle {
            continue;
        }
        scene.place(object.handle, *position, Some(facing_vector(actor.facing)));
        if step == MotionStep::Arrived {
            arrived.push(actor.id);
        }
    }
    arrived.sort_unstable();
    arrived
}

/// Unit floor vector for a yaw (0 faces +z).
pub fn facing_vector(yaw: f64) -> DVec3 {
    DVec3::new(yaw.sin(), 0.0, yaw.cos())
}
