use bevy::prelude::*;
use hashbrown::HashMap;
use mimic_avatar_core::{MouthDrive, NodeHandle, PoseFrame, SceneNode};

use crate::components::{AvatarBone, AvatarRoot};
use crate::resources::{AvatarController, AvatarMouth, AvatarSpeech, AvatarVisemes, BoneIndex};

fn euler_of(rotation: Quat) -> Vec3 {
    let (x, y, z) = rotation.to_euler(EulerRot::XYZ);
    Vec3::new(x, y, z)
}

/// Write controller output onto bound transforms.
fn apply_frame(frame: &PoseFrame, index: &BoneIndex, transforms: &mut Query<&mut Transform>) {
    for write in frame.iter() {
        let Some(&entity) = index.map.get(&write.handle) else {
            continue;
        };
        if let Ok(mut tf) = transforms.get_mut(entity) {
            let r = write.rotation;
            tf.rotation = Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z);
        }
    }
}

/// Walks descendants of the `AvatarRoot` depth-first, binds the controller
/// once, and applies the rebased rest pose.
pub fn bind_avatar_system(
    mut commands: Commands,
    roots: Query<Entity, With<AvatarRoot>>,
    children: Query<&Children>,
    names: Query<&Name>,
    mut transforms: Query<&mut Transform>,
    mut controller: ResMut<AvatarController>,
    mut index: ResMut<BoneIndex>,
) {
    if controller.0.is_initialized() {
        return;
    }
    let Some(root) = roots.iter().next() else {
        return;
    };

    fn walk(
        e: Entity,
        nodes: &mut Vec<SceneNode>,
        map: &mut HashMap<NodeHandle, Entity>,
        names: &Query<&Name>,
        children: &Query<&Children>,
        transforms: &Query<&mut Transform>,
    ) {
        if let (Ok(name), Ok(tf)) = (names.get(e), transforms.get(e)) {
            let handle = NodeHandle(e.to_bits());
            map.insert(handle, e);
            nodes.push(SceneNode::new(handle, name.as_str(), euler_of(tf.rotation)));
        }
        if let Ok(cs) = children.get(e) {
            for &c in cs.iter() {
                walk(c, nodes, map, names, children, transforms);
            }
        }
    }

    let mut nodes = Vec::new();
    let mut map = HashMap::new();
    walk(root, &mut nodes, &mut map, &names, &children, &transforms);

    controller.0.initialize(&nodes);
    for (slot, bone) in controller.0.bindings().iter() {
        if let Some(&entity) = map.get(&bone.handle) {
            commands.entity(entity).insert(AvatarBone { slot });
        }
    }
    index.map = map;
    debug!(
        "avatar bound: {} nodes scanned, {} slots missing",
        nodes.len(),
        controller.0.missing_slots().len()
    );

    apply_frame(controller.0.frame(), &index, &mut transforms);
}

/// Advance the pose controller and write bone rotations.
pub fn tick_controller_system(
    time: Res<Time>,
    speech: Res<AvatarSpeech>,
    mut controller: ResMut<AvatarController>,
    index: Res<BoneIndex>,
    mut transforms: Query<&mut Transform>,
) {
    let dt = time.delta_seconds();
    let frame = controller
        .0
        .update(dt, speech.is_speaking, speech.amplitude);
    apply_frame(frame, &index, &mut transforms);
}

/// Advance the viseme timeline and publish the mouth drive.
pub fn tick_visemes_system(
    time: Res<Time>,
    visemes: Res<AvatarVisemes>,
    speech: Res<AvatarSpeech>,
    mut mouth: ResMut<AvatarMouth>,
) {
    let state = visemes.0.update(time.delta_seconds());
    mouth.0 = MouthDrive::from_state(&state, speech.amplitude);
}
