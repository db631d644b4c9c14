//! ECS components for hecs entities.
//!
//! Components are plain data structs with no methods.
//! Motion logic lives in `shuttle-kinematics`, orchestration in `shuttle-sim`.

use serde::{Deserialize, Serialize};

use crate::enums::ArtifactKind;
use crate::scene::SceneHandle;
use crate::types::{ActorId, CourtPoint};

/// A player on court. Its position is the entity's `Point3` component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    /// 1-based player number.
    pub id: ActorId,
    /// Current seek speed (m/s). Infinite means "snap on next update".
    pub speed: f64,
    /// Where the actor is heading, if anywhere.
    pub target: Option<CourtPoint>,
    pub is_moving: bool,
    /// Yaw in radians (0 = facing +z).
    pub facing: f64,
}

/// A transient visual owned by the engine (shuttle, flight path, markers).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
}

/// The scene-host handle backing an entity's visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneObject {
    pub handle: SceneHandle,
}

/// Zero-based index of a preview marker (its label shows `ordinal + 1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewOrdinal(pub usize);
