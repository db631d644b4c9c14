//! Actor spawn factories and roster queries.
//!
//! The roster is whatever `Actor` entities live in the world; it is rebuilt
//! wholesale on every match-type change.

use hecs::{Entity, World};

use shuttle_core::components::{Actor, SceneObject};
use shuttle_core::config::{BaseFormation, PlayerProfile};
use shuttle_core::constants::PLAYER_COLORS;
use shuttle_core::enums::{CourtSide, Gender, MatchType};
use shuttle_core::geometry::yaw_facing_net;
use shuttle_core::scene::{SceneHost, Visual};
use shuttle_core::types::{ActorId, CourtPoint, Point3};
use shuttle_kinematics::motion;

use crate::artifacts;

/// Spawn the roster for `match_type` at its base formation, facing the net.
/// Returns the spawned ids in order.
pub fn spawn_roster<S: SceneHost>(
    world: &mut World,
    scene: &mut S,
    match_type: MatchType,
    formation: &BaseFormation,
    players: &[PlayerProfile],
) -> Vec<ActorId> {
    let mut ids = Vec::with_capacity(match_type.roster_size());
    for id in 1..=match_type.roster_size() as ActorId {
        let base = formation.position(match_type, id).unwrap_or_else(|| {
            log::warn!("actor {id}: no base position for {match_type:?}, spawning at center");
            CourtPoint::default()
        });
        let gender = players
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.gender)
            .unwrap_or_default();
        spawn_actor(world, scene, id, gender, base);
        ids.push(id);
    }
    ids
}

/// Spawn one actor on the floor at `base`.
pub fn spawn_actor<S: SceneHost>(
    world: &mut World,
    scene: &mut S,
    id: ActorId,
    gender: Gender,
    base: CourtPoint,
) -> Entity {
    let position = base.at_height(0.0);
    let facing = yaw_facing_net(&base);
    let handle = scene.create(&Visual::Actor {
        id,
        gender,
        color: color_for(id),
        position,
        facing,
    });
    scene.attach(handle);

    world.spawn((
        Actor {
            id,
            speed: 0.0,
            target: None,
            is_moving: false,
            facing,
        },
        position,
        SceneObject { handle },
    ))
}

/// Release every actor. Returns how many were removed.
pub fn despawn_roster<S: SceneHost>(world: &mut World, scene: &mut S) -> usize {
    let entities: Vec<Entity> = world
        .query::<&Actor>()
        .iter()
        .map(|(entity, _)| entity)
        .collect();
    entities
        .into_iter()
        .filter(|&entity| artifacts::release(world, scene, entity))
        .count()
}

/// Palette colour for an actor, cycling after the fourth player.
pub fn color_for(id: ActorId) -> u32 {
    let index = (id.max(1) - 1) as usize % PLAYER_COLORS.len();
    PLAYER_COLORS[index]
}

pub fn find_actor(world: &World, id: ActorId) -> Option<Entity> {
    world
        .query::<&Actor>()
        .iter()
        .find(|(_, actor)| actor.id == id)
        .map(|(entity, _)| entity)
}

/// Ids on the roster, ascending.
pub fn actor_ids(world: &World) -> Vec<ActorId> {
    let mut ids: Vec<ActorId> = world.query::<&Actor>().iter().map(|(_, a)| a.id).collect();
    ids.sort_unstable();
    ids
}

pub fn actor_position(world: &World, id: ActorId) -> Option<Point3> {
    let entity = find_actor(world, id)?;
    world.get::<&Point3>(entity).ok().map(|p| *p)
}

/// Court side an actor plays on: its base position's side, or its current
/// position's side when it has no base.
pub fn side_of(
    world: &World,
    formation: &BaseFormation,
    match_type: MatchType,
    id: ActorId,
) -> Option<CourtSide> {
    formation
        .position(match_type, id)
        .and_then(|base| CourtSide::of(base.z))
        .or_else(|| actor_position(world, id).and_then(|p| CourtSide::of(p.z)))
}

/// The other actor on the hitter's side of the net, lowest id first.
pub fn partner_of(
    world: &World,
    formation: &BaseFormation,
    match_type: MatchType,
    hitter: ActorId,
) -> Option<ActorId> {
    let side = side_of(world, formation, match_type, hitter)?;
    actor_ids(world)
        .into_iter()
        .filter(|&id| id != hitter)
        .find(|&id| side_of(world, formation, match_type, id) == Some(side))
}

/// Send an actor toward `target` at `speed`. Returns whether it took effect.
pub fn move_actor(world: &mut World, id: ActorId, target: Option<CourtPoint>, speed: f64) -> bool {
    let Some(entity) = find_actor(world, id) else {
        log::warn!("actor {id}: not on the roster, move ignored");
        return false;
    };
    match world.get::<&mut Actor>(entity) {
        Ok(mut actor) => motion::move_to(&mut actor, target, speed),
        Err(_) => false,
    }
}

/// Send an actor toward `target` so that it arrives after `duration_secs`.
pub fn move_actor_within(
    world: &mut World,
    id: ActorId,
    target: Option<CourtPoint>,
    duration_secs: f64,
) -> bool {
    let distance = match (target, actor_position(world, id)) {
        (Some(target), Some(position)) => position.court_point().distance_to(&target),
        _ => 0.0,
    };
    move_actor(world, id, target, motion::speed_for(distance, duration_secs))
}

/// Stop every actor where it stands.
pub fn halt_all(world: &mut World) {
    for (_entity, actor) in world.query_mut::<&mut Actor>() {
        motion::halt(actor);
    }
}

pub fn is_moving(world: &World, id: ActorId) -> bool {
    find_actor(world, id)
        .and_then(|entity| world.get::<&Actor>(entity).ok().map(|a| a.is_moving))
        .unwrap_or(false)
}

pub fn all_idle(world: &World) -> bool {
    world.query::<&Actor>().iter().all(|(_, actor)| !actor.is_moving)
}
