//! PoseController: binding, rest-pose capture and per-frame layer composition.
//!
//! Lifecycle:
//! - `initialize(nodes)` binds slots, captures the rest pose, applies the
//!   T-pose correction and the idle preset, rebasing the rest pose after each.
//! - `update(delta, is_speaking, mouth_open)` writes `rest + breathing + blink
//!   + talk` for every bound slot a layer touches.
//! - `reset()` writes the rest pose back and restarts the animation clock.

use glam::Vec3;
use hashbrown::HashMap;
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::binding::{BoundBone, SceneNode, SlotBindings, SlotMatcher, SlotPatterns};
use crate::config::{ControllerConfig, ControllerConfigPatch};
use crate::error::ConfigError;
use crate::layers::{
    breathing_offsets, eyelid_offsets, sample_interval, BlinkState, LayerOffsets, TalkState,
};
use crate::outputs::{BoneWrite, PoseFrame};
use crate::presets::PosePreset;
use crate::slots::BoneSlot;

#[derive(Debug)]
pub struct PoseController {
    cfg: ControllerConfig,
    patterns: SlotPatterns,

    // Bind-time state
    bindings: SlotBindings,
    rest: HashMap<BoneSlot, Vec3>,
    missing: Vec<BoneSlot>,
    initialized: bool,

    // Animation state
    time: f32,
    blink: BlinkState,
    talk: TalkState,
    rng: StdRng,

    // Per-tick scratch and outputs
    layers: LayerOffsets,
    frame: PoseFrame,
}

impl Default for PoseController {
    fn default() -> Self {
        Self::new(ControllerConfig::default())
    }
}

impl PoseController {
    pub fn new(cfg: ControllerConfig) -> Self {
        Self::with_rng(cfg, StdRng::from_entropy())
    }

    /// Controller with a reproducible blink schedule.
    pub fn with_seed(cfg: ControllerConfig, seed: u64) -> Self {
        Self::with_rng(cfg, StdRng::seed_from_u64(seed))
    }

    fn with_rng(cfg: ControllerConfig, mut rng: StdRng) -> Self {
        let first_blink = sample_interval(&mut rng, cfg.blink_interval_min, cfg.blink_interval_max);
        Self {
            cfg,
            patterns: SlotPatterns::default(),
            bindings: SlotBindings::new(),
            rest: HashMap::new(),
            missing: Vec::new(),
            initialized: false,
            time: 0.0,
            blink: BlinkState::new(first_blink),
            talk: TalkState::default(),
            rng,
            layers: LayerOffsets::new(),
            frame: PoseFrame::default(),
        }
    }

    /// Replace the slot → name-matcher table used by the next `initialize`.
    pub fn with_patterns(mut self, patterns: SlotPatterns) -> Self {
        self.patterns = patterns;
        self
    }

    /// Bind slots against traversal-ordered scene nodes and capture the rest
    /// pose. Returns false (and does nothing) if already initialized.
    ///
    /// The frame afterwards holds the rebased rest pose for every bound slot so
    /// adapters can apply the corrected stance immediately.
    pub fn initialize(&mut self, nodes: &[SceneNode]) -> bool {
        if self.initialized {
            return false;
        }

        let matcher = SlotMatcher::compile(&self.patterns);
        self.bindings = matcher.bind(nodes);
        self.rest = self
            .bindings
            .iter()
            .map(|(slot, bone)| (slot, bone.bind_rotation))
            .collect();
        self.missing = self.bindings.missing();

        debug!(
            "pose controller bound {}/{} slots",
            self.bindings.len(),
            BoneSlot::COUNT
        );
        if !self.missing.is_empty() {
            debug!("unbound slots: {:?}", self.missing);
        }

        self.correct_tpose();
        self.apply_idle_preset();
        self.initialized = true;
        self.write_rest_pose();
        true
    }

    fn correct_tpose(&mut self) {
        let (Some(left), Some(right)) = (
            self.rest.get(&BoneSlot::UpperArmL).copied(),
            self.rest.get(&BoneSlot::UpperArmR).copied(),
        ) else {
            warn!("upper arms not bound; skipping T-pose correction");
            return;
        };

        let threshold = self.cfg.tpose_threshold;
        if left.z.abs() < threshold && right.z.abs() < threshold {
            let angle = self.cfg.arm_down_angle;
            self.rest
                .insert(BoneSlot::UpperArmL, left - Vec3::new(0.0, 0.0, angle));
            self.rest
                .insert(BoneSlot::UpperArmR, right + Vec3::new(0.0, 0.0, angle));
            debug!("T-pose detected; lowered upper arms by {angle:.3} rad");
        }
    }

    fn apply_idle_preset(&mut self) {
        let Some(preset) = PosePreset::get(&self.cfg.idle_preset) else {
            warn!(
                "idle preset '{}' not found; keeping bind pose",
                self.cfg.idle_preset
            );
            return;
        };
        for (slot, rest) in self.rest.iter_mut() {
            if slot.is_eye() {
                continue;
            }
            if let Some(offset) = preset.offset(*slot) {
                *rest = offset.apply_to(*rest);
            }
        }
    }

    fn write_rest_pose(&mut self) {
        self.frame.clear();
        for (slot, bone) in self.bindings.iter() {
            if let Some(rest) = self.rest.get(&slot) {
                self.frame.push(BoneWrite {
                    slot,
                    handle: bone.handle,
                    rotation: *rest,
                });
            }
        }
    }

    /// Advance by `delta` seconds and compose the procedural layers.
    /// Before `initialize` this returns an empty frame.
    pub fn update(&mut self, delta: f32, is_speaking: bool, mouth_open: f32) -> &PoseFrame {
        self.frame.clear();
        if !self.initialized {
            return &self.frame;
        }

        self.time += delta;
        let time = self.time;
        self.layers.clear();

        self.layers.extend(breathing_offsets(
            time,
            self.cfg.breath_speed,
            self.cfg.breath_amount,
        ));

        let (min, max) = (self.cfg.blink_interval_min, self.cfg.blink_interval_max);
        let rng = &mut self.rng;
        let value = self
            .blink
            .step(time, self.cfg.blink_duration, || sample_interval(rng, min, max));
        self.layers.extend(eyelid_offsets(
            value,
            self.cfg.eyelid_close_angle,
            self.cfg.lower_lid_ratio,
        ));

        self.talk
            .step(time, delta, is_speaking, mouth_open, &self.cfg);
        self.layers
            .extend(self.talk.offsets(self.cfg.jaw_open_amount != 0.0));

        for (slot, offset) in self.layers.iter() {
            let (Some(bone), Some(rest)) = (self.bindings.get(slot), self.rest.get(&slot)) else {
                continue;
            };
            self.frame.push(BoneWrite {
                slot,
                handle: bone.handle,
                rotation: *rest + offset,
            });
        }
        &self.frame
    }

    /// Start a blink now unless one is already running.
    pub fn trigger_blink(&mut self) {
        if self.blink.start(self.time) {
            log::trace!("blink triggered at {:.2}s", self.time);
        }
    }

    /// Write every bound slot's rest pose and restart the animation state.
    pub fn reset(&mut self) -> &PoseFrame {
        self.time = 0.0;
        let next = sample_interval(
            &mut self.rng,
            self.cfg.blink_interval_min,
            self.cfg.blink_interval_max,
        );
        self.blink = BlinkState::new(next);
        self.talk = TalkState::default();
        if self.initialized {
            self.write_rest_pose();
        } else {
            self.frame.clear();
        }
        &self.frame
    }

    /// Merge tunables; bindings and rest pose are untouched.
    ///
    /// The merged config is validated first. On error the live config is left
    /// as it was.
    pub fn set_config(&mut self, patch: &ControllerConfigPatch) -> Result<(), ConfigError> {
        let mut next = self.cfg.clone();
        next.apply_patch(patch);
        next.validate()?;
        self.cfg = next;
        Ok(())
    }

    // Accessors

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn binding(&self, slot: BoneSlot) -> Option<&BoundBone> {
        self.bindings.get(slot)
    }

    pub fn bindings(&self) -> &SlotBindings {
        &self.bindings
    }

    pub fn rest_pose(&self, slot: BoneSlot) -> Option<Vec3> {
        self.rest.get(&slot).copied()
    }

    pub fn missing_slots(&self) -> &[BoneSlot] {
        &self.missing
    }

    pub fn blink_value(&self) -> f32 {
        self.blink.value
    }

    pub fn is_blinking(&self) -> bool {
        self.blink.is_blinking()
    }

    pub fn next_blink_time(&self) -> f32 {
        self.blink.next_blink_time
    }

    pub fn blink_state(&self) -> &BlinkState {
        &self.blink
    }

    pub fn talk_state(&self) -> &TalkState {
        &self.talk
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.cfg
    }

    pub fn frame(&self) -> &PoseFrame {
        &self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::NodeHandle;

    fn node(id: u64, name: &str, rotation: Vec3) -> SceneNode {
        SceneNode::new(NodeHandle(id), name, rotation)
    }

    #[test]
    fn update_before_initialize_is_empty() {
        let mut c = PoseController::with_seed(ControllerConfig::default(), 1);
        assert!(c.update(0.016, true, 1.0).is_empty());
        assert_eq!(c.time(), 0.0);
    }

    #[test]
    fn initialize_is_idempotent() {
        let mut c = PoseController::with_seed(ControllerConfig::default(), 1);
        assert!(c.initialize(&[node(1, "Head", Vec3::ZERO)]));
        assert!(!c.initialize(&[node(2, "Neck", Vec3::ZERO)]));
        assert!(c.binding(BoneSlot::Neck).is_none());
        assert_eq!(c.binding(BoneSlot::Head).unwrap().handle, NodeHandle(1));
    }

    #[test]
    fn tpose_arms_are_lowered_then_idle_is_added() {
        let mut c = PoseController::with_seed(ControllerConfig::default(), 1);
        c.initialize(&[
            node(1, "mixamorig:LeftArm", Vec3::ZERO),
            node(2, "mixamorig:RightArm", Vec3::ZERO),
        ]);
        let idle = PosePreset::get("idle").unwrap();
        let down = std::f32::consts::FRAC_PI_2;

        let left = c.rest_pose(BoneSlot::UpperArmL).unwrap();
        let expected = idle
            .offset(BoneSlot::UpperArmL)
            .unwrap()
            .apply_to(Vec3::new(0.0, 0.0, -down));
        assert!((left - expected).length() < 1e-6);

        let right = c.rest_pose(BoneSlot::UpperArmR).unwrap();
        assert!(right.z > 1.0);
    }

    #[test]
    fn relaxed_arms_are_not_corrected() {
        let mut c = PoseController::with_seed(ControllerConfig::default(), 1);
        let relaxed = Vec3::new(0.0, 0.0, -1.2);
        c.initialize(&[
            node(1, "upper_arm.L", relaxed),
            node(2, "upper_arm.R", -relaxed),
        ]);
        let idle = PosePreset::get("idle").unwrap();
        let expected = idle.offset(BoneSlot::UpperArmL).unwrap().apply_to(relaxed);
        assert!((c.rest_pose(BoneSlot::UpperArmL).unwrap() - expected).length() < 1e-6);
    }

    #[test]
    fn eyes_keep_their_loaded_rotation() {
        let mut c = PoseController::with_seed(ControllerConfig::default(), 1);
        let look = Vec3::new(0.1, -0.05, 0.0);
        c.initialize(&[node(1, "mixamorig:LeftEye", look)]);
        assert_eq!(c.rest_pose(BoneSlot::EyeL), Some(look));
    }

    #[test]
    fn trigger_blink_is_noop_mid_blink() {
        let mut c = PoseController::with_seed(ControllerConfig::default(), 1);
        c.initialize(&[]);
        c.update(0.01, false, 0.0);
        c.trigger_blink();
        let start = c.blink_state().blink_start_time;
        c.update(0.01, false, 0.0);
        c.trigger_blink();
        assert!(c.is_blinking());
        assert_eq!(c.blink_state().blink_start_time, start);
    }

    #[test]
    fn seeded_controllers_schedule_identically() {
        let a = PoseController::with_seed(ControllerConfig::default(), 42);
        let b = PoseController::with_seed(ControllerConfig::default(), 42);
        assert_eq!(a.next_blink_time(), b.next_blink_time());
        assert!((2.0..6.0).contains(&a.next_blink_time()));
    }
}
