//! Bevy adapter for the Mimic avatar core.
//!
//! Add `MimicAvatarPlugin`, tag the avatar's scene root with `AvatarRoot`, and
//! set `AvatarSpeech` from the audio side. The plugin binds the hierarchy on
//! the first frame it finds a root, animates bone `Transform`s every `Update`,
//! and publishes the mouth drive in `AvatarMouth`.

use bevy::prelude::*;
use mimic_avatar_core::{
    AvatarConfig, AvatarError, BridgeRegistry, GraphemeMapper, PoseController, SharedVisemeDriver,
    VisemeDriver,
};

pub mod components;
pub mod resources;
pub mod systems;

pub use components::{AvatarBone, AvatarRoot};
pub use resources::{
    AvatarBridge, AvatarController, AvatarMouth, AvatarSpeech, AvatarVisemes, BoneIndex,
};

#[derive(Default)]
pub struct MimicAvatarPlugin {
    pub config: AvatarConfig,
}

impl MimicAvatarPlugin {
    pub fn new(config: AvatarConfig) -> Self {
        Self { config }
    }

    pub fn from_json(json: &str) -> Result<Self, AvatarError> {
        Ok(Self::new(AvatarConfig::from_json(json)?))
    }
}

impl Plugin for MimicAvatarPlugin {
    fn build(&self, app: &mut App) {
        let cfg = self.config.clone();
        let controller =
            PoseController::new(cfg.controller).with_patterns(cfg.slot_patterns);
        let visemes = SharedVisemeDriver::new(VisemeDriver::new(
            cfg.driver,
            GraphemeMapper::new(cfg.phonemes),
        ));
        let mut bridge = BridgeRegistry::new();
        bridge.register(visemes.clone());

        app.insert_resource(AvatarController(controller))
            .insert_resource(AvatarVisemes(visemes))
            .insert_resource(AvatarBridge(bridge))
            .insert_resource(AvatarSpeech::default())
            .insert_resource(AvatarMouth::default())
            .insert_resource(BoneIndex::default())
            .add_systems(
                Update,
                (
                    (systems::bind_avatar_system, systems::tick_controller_system).chain(),
                    systems::tick_visemes_system,
                ),
            );
    }
}
