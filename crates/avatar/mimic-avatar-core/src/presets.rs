//! Pose preset catalog: named target poses as per-slot rotation offsets.
//!
//! Presets are static data. The controller applies `idle` once at bind time;
//! the rest are exposed for external expression switchers, which read the
//! offsets and `transition_duration` and run their own blending.

use glam::Vec3;
use hashbrown::HashMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::PresetError;
use crate::slots::BoneSlot;

/// Rotation offset (radians, XYZ Euler) for one slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoneOffset {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Replace the base rotation instead of adding to it.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub absolute: bool,
}

impl BoneOffset {
    pub const fn relative(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            absolute: false,
        }
    }

    pub const fn absolute(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            absolute: true,
        }
    }

    #[inline]
    pub fn as_vec3(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Resulting rotation when this offset is applied on top of `base`.
    #[inline]
    pub fn apply_to(&self, base: Vec3) -> Vec3 {
        if self.absolute {
            self.as_vec3()
        } else {
            base + self.as_vec3()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosePreset {
    pub name: String,
    pub bones: HashMap<BoneSlot, BoneOffset>,
    /// Seconds an expression switcher should take to blend into this pose.
    pub transition_duration: f32,
}

pub const PRESET_NAMES: [&str; 7] = [
    "idle",
    "thinking",
    "excited",
    "attentive",
    "listening",
    "speaking",
    "thinkingDeep",
];

static CATALOG: Lazy<Vec<PosePreset>> = Lazy::new(build_catalog);

fn preset(name: &str, transition_duration: f32, bones: &[(BoneSlot, BoneOffset)]) -> PosePreset {
    PosePreset {
        name: name.to_string(),
        bones: bones.iter().copied().collect(),
        transition_duration,
    }
}

fn build_catalog() -> Vec<PosePreset> {
    use BoneSlot::*;

    vec![
        preset(
            "idle",
            0.5,
            &[
                (Spine, BoneOffset::relative(0.02, 0.0, 0.0)),
                (Chest, BoneOffset::relative(-0.02, 0.0, 0.0)),
                (Head, BoneOffset::relative(0.03, 0.0, 0.0)),
                (ShoulderL, BoneOffset::relative(0.0, 0.0, -0.05)),
                (ShoulderR, BoneOffset::relative(0.0, 0.0, 0.05)),
                (UpperArmL, BoneOffset::relative(0.05, 0.0, 0.08)),
                (UpperArmR, BoneOffset::relative(0.05, 0.0, -0.08)),
                (LowerArmL, BoneOffset::relative(0.0, 0.15, 0.0)),
                (LowerArmR, BoneOffset::relative(0.0, -0.15, 0.0)),
                (HandL, BoneOffset::relative(0.0, 0.0, 0.05)),
                (HandR, BoneOffset::relative(0.0, 0.0, -0.05)),
            ],
        ),
        preset(
            "thinking",
            0.8,
            &[
                (Head, BoneOffset::relative(0.1, -0.15, 0.08)),
                (Neck, BoneOffset::relative(0.03, -0.05, 0.0)),
                (UpperArmR, BoneOffset::relative(-0.4, 0.0, -0.2)),
                (LowerArmR, BoneOffset::relative(0.0, -1.2, 0.0)),
                (HandR, BoneOffset::relative(0.3, 0.0, 0.0)),
            ],
        ),
        preset(
            "excited",
            0.3,
            &[
                (Spine, BoneOffset::relative(-0.05, 0.0, 0.0)),
                (Chest, BoneOffset::relative(-0.08, 0.0, 0.0)),
                (Head, BoneOffset::relative(-0.1, 0.0, 0.0)),
                (UpperArmL, BoneOffset::relative(0.0, 0.0, 0.2)),
                (UpperArmR, BoneOffset::relative(0.0, 0.0, -0.2)),
                (LowerArmL, BoneOffset::relative(0.0, 0.4, 0.0)),
                (LowerArmR, BoneOffset::relative(0.0, -0.4, 0.0)),
            ],
        ),
        preset(
            "attentive",
            0.4,
            &[
                (Spine, BoneOffset::relative(0.03, 0.0, 0.0)),
                (Neck, BoneOffset::relative(-0.03, 0.0, 0.0)),
                (Head, BoneOffset::relative(-0.05, 0.0, 0.0)),
            ],
        ),
        preset(
            "listening",
            0.6,
            &[
                (Head, BoneOffset::relative(0.0, 0.05, 0.1)),
                (Neck, BoneOffset::relative(0.0, 0.0, 0.04)),
                (Chest, BoneOffset::relative(0.02, 0.0, 0.0)),
            ],
        ),
        preset(
            "speaking",
            0.4,
            &[
                (Chest, BoneOffset::relative(-0.02, 0.0, 0.0)),
                (Head, BoneOffset::relative(0.02, 0.0, 0.0)),
                (UpperArmL, BoneOffset::relative(0.1, 0.0, 0.0)),
                (UpperArmR, BoneOffset::relative(0.1, 0.0, 0.0)),
                (LowerArmL, BoneOffset::relative(0.0, 0.3, 0.0)),
                (LowerArmR, BoneOffset::relative(0.0, -0.3, 0.0)),
            ],
        ),
        preset(
            "thinkingDeep",
            1.0,
            &[
                (Head, BoneOffset::relative(0.18, -0.2, 0.1)),
                (Neck, BoneOffset::relative(0.08, -0.05, 0.0)),
                (Spine, BoneOffset::relative(0.04, 0.0, 0.0)),
                (UpperArmR, BoneOffset::relative(-0.6, 0.0, -0.25)),
                (LowerArmR, BoneOffset::relative(0.0, -1.6, 0.0)),
                (HandR, BoneOffset::relative(0.4, 0.0, 0.1)),
                (EyeL, BoneOffset::absolute(-0.15, 0.2, 0.0)),
                (EyeR, BoneOffset::absolute(-0.15, 0.2, 0.0)),
            ],
        ),
    ]
}

impl PosePreset {
    /// Look up a catalog preset by name.
    pub fn get(name: &str) -> Option<&'static PosePreset> {
        CATALOG.iter().find(|p| p.name == name)
    }

    pub fn get_required(name: &str) -> Result<&'static PosePreset, PresetError> {
        Self::get(name).ok_or_else(|| PresetError::Unknown(name.to_string()))
    }

    pub fn all() -> &'static [PosePreset] {
        CATALOG.as_slice()
    }

    #[inline]
    pub fn offset(&self, slot: BoneSlot) -> Option<&BoneOffset> {
        self.bones.get(&slot)
    }
}
