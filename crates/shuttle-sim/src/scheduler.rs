//! Animation loop handles.
//!
//! Every animation phase runs under its own handle, keyed by `LoopKind`.
//! Starting a kind that is already running replaces its handle; cancelling
//! one kind never touches another.

use std::collections::BTreeMap;

use shuttle_core::enums::LoopKind;

pub type LoopId = u64;

/// A live animation loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopHandle {
    pub id: LoopId,
    pub kind: LoopKind,
    pub started_frame: u64,
    /// Seconds left for timed loops. `None` runs until cancelled.
    pub remaining_secs: Option<f64>,
}

/// Owner of all loop handles. The engine consults it once per frame.
#[derive(Debug, Default)]
pub struct Scheduler {
    next_id: LoopId,
    loops: BTreeMap<LoopKind, LoopHandle>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a loop of `kind`, replacing any handle of the same kind.
    pub fn start(&mut self, kind: LoopKind, frame: u64, duration_secs: Option<f64>) -> LoopHandle {
        self.next_id += 1;
        let handle = LoopHandle {
            id: self.next_id,
            kind,
            started_frame: frame,
            remaining_secs: duration_secs.map(|d| d.max(0.0)),
        };
        if let Some(previous) = self.loops.insert(kind, handle) {
            log::debug!("{kind:?} loop #{} replaced by #{}", previous.id, handle.id);
        }
        handle
    }

    /// Stop the loop of `kind`, if any, and hand back its handle.
    pub fn cancel(&mut self, kind: LoopKind) -> Option<LoopHandle> {
        self.loops.remove(&kind)
    }

    /// End a loop only if `id` still owns its kind. Stale handles are a no-op.
    pub fn finish(&mut self, kind: LoopKind, id: LoopId) -> bool {
        match self.loops.get(&kind) {
            Some(handle) if handle.id == id => {
                self.loops.remove(&kind);
                true
            }
            _ => false,
        }
    }

    pub fn cancel_all(&mut self) {
        self.loops.clear();
    }

    pub fn is_active(&self, kind: LoopKind) -> bool {
        self.loops.contains_key(&kind)
    }

    pub fn handle(&self, kind: LoopKind) -> Option<&LoopHandle> {
        self.loops.get(&kind)
    }

    /// Kinds with a live handle, in `LoopKind` order.
    pub fn active_kinds(&self) -> Vec<LoopKind> {
        self.loops.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    /// Count down timed loops by `dt`. Expired loops are removed and returned.
    pub fn advance(&mut self, dt: f64) -> Vec<LoopHandle> {
        let mut expired = Vec::new();
        for handle in self.loops.values_mut() {
            if let Some(remaining) = handle.remaining_secs.as_mut() {
                *remaining -= dt;
                if *remaining <= 0.0 {
                    expired.push(*handle);
                }
            }
        }
        for handle in &expired {
            self.loops.remove(&handle.kind);
        }
        expired
    }
}
