//! Contract with the scene host (the renderer).
//!
//! The engine never assumes a rendering API: it describes what to show with
//! a `Visual`, receives an opaque `SceneHandle`, and drives the handle
//! through create → attach → (place)* → detach → dispose.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::enums::{ArtifactKind, Gender};
use crate::types::{ActorId, Point3};

/// Opaque handle to an object living in the host's scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SceneHandle(pub u64);

/// Description of something the host should draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Visual {
    Actor {
        id: ActorId,
        gender: Gender,
        color: u32,
        position: Point3,
        facing: f64,
    },
    Shuttlecock {
        position: Point3,
    },
    /// Dashed line through the given points.
    FlightPath {
        points: Vec<Point3>,
    },
    Marker {
        position: Point3,
        ordinal: usize,
    },
    Label {
        position: Point3,
        text: String,
    },
    Highlight {
        position: Point3,
    },
}

impl Visual {
    /// The transient artifact kind, or `None` for actor bodies.
    pub fn artifact_kind(&self) -> Option<ArtifactKind> {
        match self {
            Visual::Actor { .. } => None,
            Visual::Shuttlecock { .. } => Some(ArtifactKind::Shuttlecock),
            Visual::FlightPath { .. } => Some(ArtifactKind::FlightPath),
            Visual::Marker { .. } => Some(ArtifactKind::PreviewMarker),
            Visual::Label { .. } => Some(ArtifactKind::MarkerLabel),
            Visual::Highlight { .. } => Some(ArtifactKind::Highlight),
        }
    }
}

/// Capabilities the engine consumes from the renderer.
///
/// `detach` and `dispose` must tolerate handles that were already released.
pub trait SceneHost {
    /// Build the object (GPU buffers, materials, ...) without showing it.
    fn create(&mut self, visual: &Visual) -> SceneHandle;

    /// Add the object to the scene graph.
    fn attach(&mut self, handle: SceneHandle);

    /// Move an attached object. `facing` is a unit direction when known.
    fn place(&mut self, _handle: SceneHandle, _position: Point3, _facing: Option<DVec3>) {}

    /// Remove the object from the scene graph.
    fn detach(&mut self, handle: SceneHandle);

    /// Release the object's resources.
    fn dispose(&mut self, handle: SceneHandle);
}
