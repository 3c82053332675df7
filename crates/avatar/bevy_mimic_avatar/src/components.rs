use bevy::prelude::*;
use mimic_avatar_core::BoneSlot;

/// Marker component designating the root of an avatar hierarchy.
/// The binding system walks descendants of the first entity with this marker.
#[derive(Component)]
pub struct AvatarRoot;

/// Inserted on every entity bound to a logical bone slot.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvatarBone {
    pub slot: BoneSlot,
}
