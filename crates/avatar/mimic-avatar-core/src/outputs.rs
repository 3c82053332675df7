#![allow(dead_code)]
//! Output contract from the pose controller.
//!
//! A `PoseFrame` carries the rotations written this tick, one entry per bound
//! slot that a layer (or a reset) touched. Adapters apply them to the host
//! scene by handle.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::ids::NodeHandle;
use crate::slots::BoneSlot;

/// One bone rotation to apply this tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoneWrite {
    pub slot: BoneSlot,
    pub handle: NodeHandle,
    /// Local rotation (radians, XYZ Euler).
    pub rotation: Vec3,
}

/// Writes returned by `PoseController::update()` / `reset()`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PoseFrame {
    #[serde(default)]
    pub writes: Vec<BoneWrite>,
}

impl PoseFrame {
    #[inline]
    pub fn clear(&mut self) {
        self.writes.clear();
    }

    #[inline]
    pub fn push(&mut self, write: BoneWrite) {
        self.writes.push(write);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Rotation written for `slot` this tick, if any.
    pub fn get(&self, slot: BoneSlot) -> Option<Vec3> {
        self.writes
            .iter()
            .find_map(|w| if w.slot == slot { Some(w.rotation) } else { None })
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoneWrite> {
        self.writes.iter()
    }
}
