//! Logical bone slots: model-independent animation targets resolved to real
//! skeleton nodes at bind time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BoneSlot {
    Hips,
    Spine,
    Spine1,
    Chest,
    Neck,
    Head,
    Jaw,
    ShoulderL,
    ShoulderR,
    UpperArmL,
    UpperArmR,
    LowerArmL,
    LowerArmR,
    HandL,
    HandR,
    EyeL,
    EyeR,
    EyelidUpperL,
    EyelidUpperR,
    EyelidLowerL,
    EyelidLowerR,
}

impl BoneSlot {
    pub const COUNT: usize = 21;

    pub const ALL: [BoneSlot; BoneSlot::COUNT] = [
        BoneSlot::Hips,
        BoneSlot::Spine,
        BoneSlot::Spine1,
        BoneSlot::Chest,
        BoneSlot::Neck,
        BoneSlot::Head,
        BoneSlot::Jaw,
        BoneSlot::ShoulderL,
        BoneSlot::ShoulderR,
        BoneSlot::UpperArmL,
        BoneSlot::UpperArmR,
        BoneSlot::LowerArmL,
        BoneSlot::LowerArmR,
        BoneSlot::HandL,
        BoneSlot::HandR,
        BoneSlot::EyeL,
        BoneSlot::EyeR,
        BoneSlot::EyelidUpperL,
        BoneSlot::EyelidUpperR,
        BoneSlot::EyelidLowerL,
        BoneSlot::EyelidLowerR,
    ];

    /// Spine chain from the lowest segment up to the chest.
    pub const SPINE_CHAIN: [BoneSlot; 3] = [BoneSlot::Spine, BoneSlot::Spine1, BoneSlot::Chest];

    /// Dense index into `ALL`, used for fixed-size per-slot buffers.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BoneSlot::Hips => "hips",
            BoneSlot::Spine => "spine",
            BoneSlot::Spine1 => "spine1",
            BoneSlot::Chest => "chest",
            BoneSlot::Neck => "neck",
            BoneSlot::Head => "head",
            BoneSlot::Jaw => "jaw",
            BoneSlot::ShoulderL => "shoulderL",
            BoneSlot::ShoulderR => "shoulderR",
            BoneSlot::UpperArmL => "upperArmL",
            BoneSlot::UpperArmR => "upperArmR",
            BoneSlot::LowerArmL => "lowerArmL",
            BoneSlot::LowerArmR => "lowerArmR",
            BoneSlot::HandL => "handL",
            BoneSlot::HandR => "handR",
            BoneSlot::EyeL => "eyeL",
            BoneSlot::EyeR => "eyeR",
            BoneSlot::EyelidUpperL => "eyelidUpperL",
            BoneSlot::EyelidUpperR => "eyelidUpperR",
            BoneSlot::EyelidLowerL => "eyelidLowerL",
            BoneSlot::EyelidLowerR => "eyelidLowerR",
        }
    }

    /// Eyes keep their as-loaded rotation; no corrective or idle rebasing.
    #[inline]
    pub fn is_eye(self) -> bool {
        matches!(self, BoneSlot::EyeL | BoneSlot::EyeR)
    }
}

impl fmt::Display for BoneSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoneSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BoneSlot::ALL
            .iter()
            .copied()
            .find(|slot| slot.as_str() == s)
            .ok_or_else(|| format!("unknown bone slot '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_position_in_all() {
        for (i, slot) in BoneSlot::ALL.iter().enumerate() {
            assert_eq!(slot.index(), i, "slot {slot}");
        }
    }

    #[test]
    fn names_round_trip_through_from_str_and_serde() {
        for slot in BoneSlot::ALL {
            assert_eq!(slot.as_str().parse::<BoneSlot>().unwrap(), slot);
            let json = serde_json::to_string(&slot).unwrap();
            assert_eq!(json, format!("\"{}\"", slot.as_str()));
        }
        assert!("tail".parse::<BoneSlot>().is_err());
    }
}
