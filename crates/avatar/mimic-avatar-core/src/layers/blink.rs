//! Blink state machine: Idle → Closing → Opening → Idle.
//!
//! Progress `p = (time - start) / duration`. The lids close over the first 40%
//! of the blink and reopen over the remaining 60%.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::slots::BoneSlot;

/// Fraction of the blink spent closing.
const CLOSE_FRACTION: f32 = 0.4;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum BlinkPhase {
    #[default]
    Idle,
    Closing,
    Opening,
}

/// Lid closure in `[0, 1]` at blink progress `p`.
#[inline]
pub fn blink_curve(p: f32) -> f32 {
    let v = if p < CLOSE_FRACTION {
        p / CLOSE_FRACTION
    } else {
        1.0 - (p - CLOSE_FRACTION) / (1.0 - CLOSE_FRACTION)
    };
    v.clamp(0.0, 1.0)
}

/// Uniform draw from `[min, max)`; a degenerate range yields `min`.
pub fn sample_interval<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if min.is_finite() && max.is_finite() && max > min {
        rng.gen_range(min..max)
    } else {
        min
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BlinkState {
    pub phase: BlinkPhase,
    pub next_blink_time: f32,
    pub blink_start_time: f32,
    pub value: f32,
}

impl BlinkState {
    pub fn new(next_blink_time: f32) -> Self {
        Self {
            next_blink_time,
            ..Self::default()
        }
    }

    #[inline]
    pub fn is_blinking(&self) -> bool {
        self.phase != BlinkPhase::Idle
    }

    /// Enter Closing at `time`. Returns false if a blink is already running.
    pub fn start(&mut self, time: f32) -> bool {
        if self.is_blinking() {
            return false;
        }
        self.phase = BlinkPhase::Closing;
        self.blink_start_time = time;
        true
    }

    /// Advance to `time`. `next_interval` is drawn only when a blink completes.
    pub fn step(&mut self, time: f32, duration: f32, next_interval: impl FnOnce() -> f32) -> f32 {
        if !self.is_blinking() && time >= self.next_blink_time {
            self.start(time);
        }
        if !self.is_blinking() {
            return self.value;
        }

        let p = if duration > 0.0 {
            (time - self.blink_start_time) / duration
        } else {
            1.0
        };
        if p >= 1.0 {
            self.value = 0.0;
            self.phase = BlinkPhase::Idle;
            self.next_blink_time = time + next_interval();
            log::trace!("blink finished, next at {:.2}s", self.next_blink_time);
        } else {
            self.value = blink_curve(p.max(0.0));
            self.phase = if p < CLOSE_FRACTION {
                BlinkPhase::Closing
            } else {
                BlinkPhase::Opening
            };
        }
        self.value
    }
}

/// Eyelid offsets for lid closure `value`: upper lids close on +X, lower lids
/// travel `lower_lid_ratio` of that in the opposite sense.
pub fn eyelid_offsets(value: f32, close_angle: f32, lower_lid_ratio: f32) -> [(BoneSlot, Vec3); 4] {
    let upper = Vec3::new(value * close_angle, 0.0, 0.0);
    let lower = Vec3::new(-value * close_angle * lower_lid_ratio, 0.0, 0.0);
    [
        (BoneSlot::EyelidUpperL, upper),
        (BoneSlot::EyelidUpperR, upper),
        (BoneSlot::EyelidLowerL, lower),
        (BoneSlot::EyelidLowerR, lower),
    ]
}
