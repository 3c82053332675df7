//! Slot binding: matching logical bone slots against scene node names.
//!
//! `SlotPatterns` is the configurable slot → ordered name-matcher table. It is
//! compiled once per initialize into a `SlotMatcher` (lower-cased, pure) and
//! run over the traversal-ordered node list. The first node that matches a slot
//! wins; later candidates for a bound slot are ignored, and a node binds at most
//! one slot (the first unbound slot in table order whose patterns match it).

use glam::Vec3;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::ids::NodeHandle;
use crate::slots::BoneSlot;

/// One node of the host scene, as seen by the binder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub handle: NodeHandle,
    pub name: String,
    /// Current local rotation (radians, XYZ Euler).
    #[serde(default)]
    pub rotation: Vec3,
}

impl SceneNode {
    pub fn new(handle: NodeHandle, name: impl Into<String>, rotation: Vec3) -> Self {
        Self {
            handle,
            name: name.into(),
            rotation,
        }
    }
}

/// Case-insensitive node name matcher.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "pattern", rename_all = "lowercase")]
pub enum NameMatcher {
    Exact(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
}

impl NameMatcher {
    fn lowered(&self) -> NameMatcher {
        match self {
            NameMatcher::Exact(p) => NameMatcher::Exact(p.to_lowercase()),
            NameMatcher::Prefix(p) => NameMatcher::Prefix(p.to_lowercase()),
            NameMatcher::Suffix(p) => NameMatcher::Suffix(p.to_lowercase()),
            NameMatcher::Contains(p) => NameMatcher::Contains(p.to_lowercase()),
        }
    }

    /// `name` must already be lower-cased and the matcher compiled.
    fn matches_lowered(&self, name: &str) -> bool {
        match self {
            NameMatcher::Exact(p) => name == p,
            NameMatcher::Prefix(p) => name.starts_with(p.as_str()),
            NameMatcher::Suffix(p) => name.ends_with(p.as_str()),
            NameMatcher::Contains(p) => name.contains(p.as_str()),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.lowered().matches_lowered(&name.to_lowercase())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlotPattern {
    pub slot: BoneSlot,
    pub matchers: Vec<NameMatcher>,
}

/// Ordered slot → matcher table. Order is significant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotPatterns {
    pub entries: Vec<SlotPattern>,
}

fn entry(slot: BoneSlot, matchers: &[NameMatcher]) -> SlotPattern {
    SlotPattern {
        slot,
        matchers: matchers.to_vec(),
    }
}

fn exact(p: &str) -> NameMatcher {
    NameMatcher::Exact(p.to_string())
}

fn suffix(p: &str) -> NameMatcher {
    NameMatcher::Suffix(p.to_string())
}

fn contains(p: &str) -> NameMatcher {
    NameMatcher::Contains(p.to_string())
}

impl Default for SlotPatterns {
    /// Covers Mixamo (`mixamorig:LeftArm`), VRM (`J_Bip_L_UpperArm`) and
    /// Blender-style (`upper_arm.L`) naming.
    fn default() -> Self {
        use BoneSlot::*;

        Self {
            entries: vec![
                entry(Hips, &[suffix("hips"), exact("pelvis")]),
                entry(Spine, &[suffix("spine")]),
                entry(Spine1, &[suffix("spine1"), suffix("_c_chest"), suffix("spine.001")]),
                entry(
                    Chest,
                    &[suffix("spine2"), suffix("upperchest"), suffix("spine.002"), exact("chest")],
                ),
                entry(Neck, &[suffix("neck")]),
                entry(Head, &[suffix("head")]),
                entry(Jaw, &[contains("jaw")]),
                entry(ShoulderL, &[suffix("leftshoulder"), suffix("_l_shoulder"), exact("shoulder.l")]),
                entry(ShoulderR, &[suffix("rightshoulder"), suffix("_r_shoulder"), exact("shoulder.r")]),
                entry(UpperArmL, &[suffix("leftarm"), suffix("_l_upperarm"), exact("upper_arm.l")]),
                entry(UpperArmR, &[suffix("rightarm"), suffix("_r_upperarm"), exact("upper_arm.r")]),
                entry(LowerArmL, &[suffix("leftforearm"), suffix("_l_lowerarm"), exact("forearm.l")]),
                entry(LowerArmR, &[suffix("rightforearm"), suffix("_r_lowerarm"), exact("forearm.r")]),
                entry(HandL, &[suffix("lefthand"), suffix("_l_hand"), exact("hand.l")]),
                entry(HandR, &[suffix("righthand"), suffix("_r_hand"), exact("hand.r")]),
                entry(
                    EyelidUpperL,
                    &[contains("eyelid_upper_l"), contains("upperlid_l"), exact("lid.t.l")],
                ),
                entry(
                    EyelidUpperR,
                    &[contains("eyelid_upper_r"), contains("upperlid_r"), exact("lid.t.r")],
                ),
                entry(
                    EyelidLowerL,
                    &[contains("eyelid_lower_l"), contains("lowerlid_l"), exact("lid.b.l")],
                ),
                entry(
                    EyelidLowerR,
                    &[contains("eyelid_lower_r"), contains("lowerlid_r"), exact("lid.b.r")],
                ),
                entry(EyeL, &[suffix("lefteye"), suffix("_l_faceeye"), exact("eye.l")]),
                entry(EyeR, &[suffix("righteye"), suffix("_r_faceeye"), exact("eye.r")]),
            ],
        }
    }
}

/// Compiled, lower-cased form of `SlotPatterns`.
#[derive(Clone, Debug)]
pub struct SlotMatcher {
    entries: Vec<(BoneSlot, Vec<NameMatcher>)>,
}

impl SlotMatcher {
    pub fn compile(patterns: &SlotPatterns) -> Self {
        Self {
            entries: patterns
                .entries
                .iter()
                .map(|e| (e.slot, e.matchers.iter().map(NameMatcher::lowered).collect()))
                .collect(),
        }
    }

    /// Slots whose patterns match `name`, in table order.
    pub fn candidates<'a>(&'a self, name: &str) -> impl Iterator<Item = BoneSlot> + 'a {
        let lowered = name.to_lowercase();
        self.entries.iter().filter_map(move |(slot, matchers)| {
            matchers
                .iter()
                .any(|m| m.matches_lowered(&lowered))
                .then_some(*slot)
        })
    }

    /// Bind slots against traversal-ordered nodes.
    pub fn bind(&self, nodes: &[SceneNode]) -> SlotBindings {
        let mut bindings = SlotBindings::new();
        for node in nodes {
            let slot = self
                .candidates(&node.name)
                .find(|slot| !bindings.contains(*slot));
            if let Some(slot) = slot {
                bindings.bind_once(slot, node);
            }
        }
        bindings
    }
}

/// A slot's resolved node and the node's rotation at bind time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundBone {
    pub handle: NodeHandle,
    pub bind_rotation: Vec3,
}

/// Slot → node table. Rows are only ever inserted, never replaced.
#[derive(Clone, Debug, Default)]
pub struct SlotBindings {
    rows: HashMap<BoneSlot, BoundBone>,
}

impl SlotBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `slot` to `node` unless it is already bound. Returns whether the
    /// binding was recorded.
    pub fn bind_once(&mut self, slot: BoneSlot, node: &SceneNode) -> bool {
        if self.rows.contains_key(&slot) {
            return false;
        }
        self.rows.insert(
            slot,
            BoundBone {
                handle: node.handle,
                bind_rotation: node.rotation,
            },
        );
        true
    }

    #[inline]
    pub fn get(&self, slot: BoneSlot) -> Option<&BoundBone> {
        self.rows.get(&slot)
    }

    #[inline]
    pub fn contains(&self, slot: BoneSlot) -> bool {
        self.rows.contains_key(&slot)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Bound slots in `BoneSlot::ALL` order.
    pub fn iter(&self) -> impl Iterator<Item = (BoneSlot, &BoundBone)> + '_ {
        BoneSlot::ALL
            .into_iter()
            .filter_map(move |slot| self.rows.get(&slot).map(|b| (slot, b)))
    }

    /// Slots without a node, in `BoneSlot::ALL` order.
    pub fn missing(&self) -> Vec<BoneSlot> {
        BoneSlot::ALL
            .into_iter()
            .filter(|slot| !self.rows.contains_key(slot))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: u64, name: &str) -> SceneNode {
        SceneNode::new(NodeHandle(id), name, Vec3::ZERO)
    }

    #[test]
    fn matchers_ignore_case() {
        assert!(NameMatcher::Suffix("LeftArm".into()).matches("mixamorig:LEFTARM"));
        assert!(NameMatcher::Exact("upper_arm.L".into()).matches("Upper_Arm.l"));
        assert!(!NameMatcher::Prefix("spine".into()).matches("Hips"));
        assert!(NameMatcher::Contains("jaw".into()).matches("Jaw_01"));
    }

    #[test]
    fn first_matching_node_wins_and_later_duplicates_are_ignored() {
        let matcher = SlotMatcher::compile(&SlotPatterns::default());
        let nodes = vec![node(1, "mixamorig:Head"), node(2, "Head")];
        let b = matcher.bind(&nodes);
        assert_eq!(b.get(BoneSlot::Head).unwrap().handle, NodeHandle(1));
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn spine_chain_binds_in_order_for_mixamo_and_vrm() {
        let matcher = SlotMatcher::compile(&SlotPatterns::default());

        let mixamo = vec![
            node(1, "mixamorig:Spine"),
            node(2, "mixamorig:Spine1"),
            node(3, "mixamorig:Spine2"),
        ];
        let b = matcher.bind(&mixamo);
        assert_eq!(b.get(BoneSlot::Spine).unwrap().handle, NodeHandle(1));
        assert_eq!(b.get(BoneSlot::Spine1).unwrap().handle, NodeHandle(2));
        assert_eq!(b.get(BoneSlot::Chest).unwrap().handle, NodeHandle(3));

        let vrm = vec![
            node(1, "J_Bip_C_Spine"),
            node(2, "J_Bip_C_Chest"),
            node(3, "J_Bip_C_UpperChest"),
        ];
        let b = matcher.bind(&vrm);
        assert_eq!(b.get(BoneSlot::Spine).unwrap().handle, NodeHandle(1));
        assert_eq!(b.get(BoneSlot::Spine1).unwrap().handle, NodeHandle(2));
        assert_eq!(b.get(BoneSlot::Chest).unwrap().handle, NodeHandle(3));
    }

    #[test]
    fn bind_once_keeps_the_original_row() {
        let mut b = SlotBindings::new();
        assert!(b.bind_once(BoneSlot::Neck, &node(7, "Neck")));
        assert!(!b.bind_once(BoneSlot::Neck, &node(8, "Neck")));
        assert_eq!(b.get(BoneSlot::Neck).unwrap().handle, NodeHandle(7));
    }

    #[test]
    fn custom_table_order_decides_between_overlapping_slots() {
        let patterns = SlotPatterns {
            entries: vec![
                SlotPattern {
                    slot: BoneSlot::Chest,
                    matchers: vec![NameMatcher::Prefix("torso".into())],
                },
                SlotPattern {
                    slot: BoneSlot::Spine,
                    matchers: vec![NameMatcher::Prefix("torso".into())],
                },
            ],
        };
        let matcher = SlotMatcher::compile(&patterns);
        let b = matcher.bind(&[node(1, "torso_a"), node(2, "torso_b")]);
        assert_eq!(b.get(BoneSlot::Chest).unwrap().handle, NodeHandle(1));
        assert_eq!(b.get(BoneSlot::Spine).unwrap().handle, NodeHandle(2));
    }

    #[test]
    fn missing_lists_unbound_slots() {
        let matcher = SlotMatcher::compile(&SlotPatterns::default());
        let b = matcher.bind(&[node(1, "Head")]);
        let missing = b.missing();
        assert_eq!(missing.len(), BoneSlot::COUNT - 1);
        assert!(!missing.contains(&BoneSlot::Head));
    }

    #[test]
    fn patterns_serialize_as_tagged_matchers() {
        let patterns = SlotPatterns {
            entries: vec![SlotPattern {
                slot: BoneSlot::Jaw,
                matchers: vec![NameMatcher::Contains("jaw".into())],
            }],
        };
        let json = serde_json::to_value(&patterns).unwrap();
        assert_eq!(json[0]["slot"], "jaw");
        assert_eq!(json[0]["matchers"][0]["kind"], "contains");
        assert_eq!(json[0]["matchers"][0]["pattern"], "jaw");
    }
}
