#![allow(dead_code)]
//! Mimic Avatar Core (engine-agnostic)
//!
//! Procedural pose animation for humanoid avatars and viseme timing for
//! lip-sync. This crate defines bone slots and name-based binding, the pose
//! preset catalog, the `PoseController` (rest pose + breathing/blink/talk
//! layers), the `VisemeDriver` (text timeline rescaled against streamed audio
//! duration) and the bridge handle a streaming pipeline pushes through.
//! Adapters (Bevy/WASM) own the scene graph and apply the outputs.

pub mod binding;
pub mod bridge;
pub mod config;
pub mod controller;
pub mod error;
pub mod ids;
pub mod layers;
pub mod outputs;
pub mod presets;
pub mod slots;
pub mod viseme;

// Re-exports for consumers (adapters)
pub use binding::{
    BoundBone, NameMatcher, SceneNode, SlotBindings, SlotMatcher, SlotPattern, SlotPatterns,
};
pub use bridge::{BridgeRegistry, SharedVisemeDriver, SpeechSink};
pub use config::{AvatarConfig, ControllerConfig, ControllerConfigPatch, DriverConfig};
pub use controller::PoseController;
pub use error::{AvatarError, ConfigError, PresetError};
pub use ids::NodeHandle;
pub use layers::{BlinkPhase, BlinkState, TalkState};
pub use outputs::{BoneWrite, PoseFrame};
pub use presets::{BoneOffset, PosePreset, PRESET_NAMES};
pub use slots::BoneSlot;
pub use viseme::{
    blend, GraphemeConfig, GraphemeMapper, MouthChannel, MouthDrive, Phoneme, PhonemeMapper,
    PhonemeSpec, Viseme, VisemeDriver, VisemeState, VisemeWeights, SILENCE_HOLD_TIME,
    VISEME_SHAPES, VISEME_TRANSITION_TIME,
};
pub use glam::Vec3;
