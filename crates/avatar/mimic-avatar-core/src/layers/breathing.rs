//! Breathing: a single sinusoid lifting the spine chain with shoulder counter-motion.

use glam::Vec3;

use crate::slots::BoneSlot;

/// X-axis weights for `BoneSlot::SPINE_CHAIN`, increasing toward the chest.
pub const SPINE_WEIGHTS: [f32; 3] = [0.3, 0.6, 1.0];

/// Shoulder Z counter-rotation as a fraction of `breath_amount`.
pub const SHOULDER_COUNTER_WEIGHT: f32 = 0.3;

/// Breathing phase in `[0, 1]`.
#[inline]
pub fn breathing_phase(time: f32, breath_speed: f32) -> f32 {
    ((time * breath_speed).sin() + 1.0) * 0.5
}

/// Offsets for the spine chain (lowest first) followed by both shoulders.
pub fn breathing_offsets(time: f32, breath_speed: f32, breath_amount: f32) -> [(BoneSlot, Vec3); 5] {
    let lift = breathing_phase(time, breath_speed) * breath_amount;
    let [spine, spine1, chest] = BoneSlot::SPINE_CHAIN;
    let [w0, w1, w2] = SPINE_WEIGHTS;
    let shoulder = lift * SHOULDER_COUNTER_WEIGHT;
    [
        (spine, Vec3::new(lift * w0, 0.0, 0.0)),
        (spine1, Vec3::new(lift * w1, 0.0, 0.0)),
        (chest, Vec3::new(lift * w2, 0.0, 0.0)),
        (BoneSlot::ShoulderL, Vec3::new(0.0, 0.0, -shoulder)),
        (BoneSlot::ShoulderR, Vec3::new(0.0, 0.0, shoulder)),
    ]
}
