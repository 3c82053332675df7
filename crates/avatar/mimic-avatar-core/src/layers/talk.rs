//! Talking: head/neck nod while speaking and a smoothed jaw.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::ControllerConfig;
use crate::slots::BoneSlot;

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Current talk offsets (X rotation, radians).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TalkState {
    pub head: f32,
    pub neck: f32,
    pub jaw: f32,
}

impl TalkState {
    pub fn step(
        &mut self,
        time: f32,
        delta: f32,
        is_speaking: bool,
        mouth_open: f32,
        cfg: &ControllerConfig,
    ) {
        if is_speaking {
            self.head = (time * cfg.nod_frequency).sin() * cfg.head_nod_amount;
            self.neck = self.head * 0.5;
        } else {
            let t = (delta * cfg.talk_return_rate).min(1.0);
            self.head = lerp(self.head, 0.0, t);
            self.neck = lerp(self.neck, 0.0, t);
        }

        if cfg.jaw_open_amount != 0.0 {
            let target = mouth_open.clamp(0.0, 1.0) * cfg.jaw_open_amount;
            let t = (delta * cfg.jaw_response_rate).min(1.0);
            self.jaw = lerp(self.jaw, target, t);
        }
    }

    /// Head and neck offsets, plus the jaw unless it is externally driven.
    pub fn offsets(&self, jaw_enabled: bool) -> impl Iterator<Item = (BoneSlot, Vec3)> {
        let head = (BoneSlot::Head, Vec3::new(self.head, 0.0, 0.0));
        let neck = (BoneSlot::Neck, Vec3::new(self.neck, 0.0, 0.0));
        let jaw = jaw_enabled.then_some((BoneSlot::Jaw, Vec3::new(self.jaw, 0.0, 0.0)));
        [head, neck].into_iter().chain(jaw)
    }
}
