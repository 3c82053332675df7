//! Procedural pose layers.
//!
//! Each layer is a pure function of time and its own small state, producing
//! per-slot rotation offsets. The controller sums them into a `LayerOffsets`
//! buffer and writes `rest + offset` for every bound slot a layer touched.

pub mod blink;
pub mod breathing;
pub mod talk;

pub use blink::{blink_curve, eyelid_offsets, sample_interval, BlinkPhase, BlinkState};
pub use breathing::{breathing_offsets, breathing_phase, SHOULDER_COUNTER_WEIGHT, SPINE_WEIGHTS};
pub use talk::TalkState;

use glam::Vec3;

use crate::slots::BoneSlot;

/// Fixed-size per-slot accumulator reused across ticks.
#[derive(Clone, Debug)]
pub struct LayerOffsets {
    offsets: [Vec3; BoneSlot::COUNT],
    touched: [bool; BoneSlot::COUNT],
}

impl Default for LayerOffsets {
    fn default() -> Self {
        Self {
            offsets: [Vec3::ZERO; BoneSlot::COUNT],
            touched: [false; BoneSlot::COUNT],
        }
    }
}

impl LayerOffsets {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Accumulate `offset` onto `slot` and mark it touched.
    #[inline]
    pub fn add(&mut self, slot: BoneSlot, offset: Vec3) {
        let i = slot.index();
        self.offsets[i] += offset;
        self.touched[i] = true;
    }

    pub fn extend<I>(&mut self, offsets: I)
    where
        I: IntoIterator<Item = (BoneSlot, Vec3)>,
    {
        for (slot, offset) in offsets {
            self.add(slot, offset);
        }
    }

    #[inline]
    pub fn get(&self, slot: BoneSlot) -> Option<Vec3> {
        let i = slot.index();
        self.touched[i].then_some(self.offsets[i])
    }

    /// Touched slots in `BoneSlot::ALL` order.
    pub fn iter(&self) -> impl Iterator<Item = (BoneSlot, Vec3)> + '_ {
        BoneSlot::ALL
            .into_iter()
            .filter_map(move |slot| self.get(slot).map(|o| (slot, o)))
    }
}
