use bevy::prelude::*;
use hashbrown::HashMap;
use mimic_avatar_core::{BridgeRegistry, MouthDrive, NodeHandle, PoseController, SharedVisemeDriver};

/// The pose controller driving the bound avatar.
#[derive(Resource)]
pub struct AvatarController(pub PoseController);

/// Handle to the viseme driver. Clone the inner handle to feed it from a
/// streaming task.
#[derive(Resource, Clone)]
pub struct AvatarVisemes(pub SharedVisemeDriver);

/// Registry a speech pipeline looks the active driver up in.
#[derive(Resource, Default)]
pub struct AvatarBridge(pub BridgeRegistry);

/// Speech inputs for this frame, set by the audio side of the app.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct AvatarSpeech {
    pub is_speaking: bool,
    /// Normalized mouth opening / audio amplitude in `[0, 1]`.
    pub amplitude: f32,
}

/// What the mouth applier should follow this frame.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct AvatarMouth(pub MouthDrive);

impl Default for AvatarMouth {
    fn default() -> Self {
        Self(MouthDrive::Amplitude(0.0))
    }
}

/// Node handle → entity, populated when the avatar is bound.
#[derive(Resource, Default)]
pub struct BoneIndex {
    pub map: HashMap<NodeHandle, Entity>,
}
