//! Tunable configuration for the pose controller and the viseme driver.
//!
//! All structs deserialize with `#[serde(default)]`, so partial JSON objects
//! fill in the documented defaults.

use serde::{Deserialize, Serialize};

use crate::binding::SlotPatterns;
use crate::error::{AvatarError, ConfigError};
use crate::presets::PosePreset;
use crate::viseme::{GraphemeConfig, SILENCE_HOLD_TIME, VISEME_TRANSITION_TIME};

/// Live tunables for `PoseController`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Angular frequency of the breathing sinusoid (rad/s).
    pub breath_speed: f32,
    /// Peak chest rotation from breathing (radians).
    pub breath_amount: f32,
    pub blink_interval_min: f32,
    pub blink_interval_max: f32,
    pub blink_duration: f32,
    /// Peak head nod while speaking (radians).
    pub head_nod_amount: f32,
    /// Jaw rotation at full mouth opening. Zero hands the jaw to an external driver.
    pub jaw_open_amount: f32,

    /// Arms whose |z| rotation is below this are treated as a T-pose.
    pub tpose_threshold: f32,
    /// Z rotation applied to each upper arm by the T-pose correction.
    pub arm_down_angle: f32,
    /// Upper eyelid rotation at a full blink.
    pub eyelid_close_angle: f32,
    /// Lower lid travel as a fraction of the upper lid's.
    pub lower_lid_ratio: f32,
    /// Angular frequency of the speaking nod (rad/s).
    pub nod_frequency: f32,
    /// Rate (1/s) at which head and neck settle back to rest after speaking.
    pub talk_return_rate: f32,
    /// Rate (1/s) at which the jaw follows its target.
    pub jaw_response_rate: f32,
    /// Preset baked into the rest pose at initialize.
    pub idle_preset: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            breath_speed: 1.5,
            breath_amount: 0.02,
            blink_interval_min: 2.0,
            blink_interval_max: 6.0,
            blink_duration: 0.15,
            head_nod_amount: 0.03,
            jaw_open_amount: 0.25,
            tpose_threshold: 0.3,
            arm_down_angle: std::f32::consts::FRAC_PI_2,
            eyelid_close_angle: 0.5,
            lower_lid_ratio: 0.3,
            nod_frequency: 4.0,
            talk_return_rate: 5.0,
            jaw_response_rate: 15.0,
            idle_preset: "idle".to_string(),
        }
    }
}

/// Partial update for `ControllerConfig`; `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfigPatch {
    pub breath_speed: Option<f32>,
    pub breath_amount: Option<f32>,
    pub blink_interval_min: Option<f32>,
    pub blink_interval_max: Option<f32>,
    pub blink_duration: Option<f32>,
    pub head_nod_amount: Option<f32>,
    pub jaw_open_amount: Option<f32>,
    pub eyelid_close_angle: Option<f32>,
    pub lower_lid_ratio: Option<f32>,
    pub nod_frequency: Option<f32>,
    pub talk_return_rate: Option<f32>,
    pub jaw_response_rate: Option<f32>,
}

fn finite(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("expected a finite value, got {v}")))
    }
}

fn non_negative(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("expected a finite value >= 0, got {v}")))
    }
}

impl ControllerConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("breath_speed", self.breath_speed)?;
        non_negative("breath_amount", self.breath_amount)?;
        non_negative("blink_interval_min", self.blink_interval_min)?;
        non_negative("blink_interval_max", self.blink_interval_max)?;
        if self.blink_interval_min > self.blink_interval_max {
            return Err(ConfigError::invalid(
                "blink_interval_min",
                format!(
                    "{} exceeds blink_interval_max {}",
                    self.blink_interval_min, self.blink_interval_max
                ),
            ));
        }
        if !(self.blink_duration.is_finite() && self.blink_duration > 0.0) {
            return Err(ConfigError::invalid(
                "blink_duration",
                format!("expected a positive duration, got {}", self.blink_duration),
            ));
        }
        non_negative("head_nod_amount", self.head_nod_amount)?;
        non_negative("jaw_open_amount", self.jaw_open_amount)?;
        non_negative("tpose_threshold", self.tpose_threshold)?;
        non_negative("talk_return_rate", self.talk_return_rate)?;
        non_negative("jaw_response_rate", self.jaw_response_rate)?;
        finite("arm_down_angle", self.arm_down_angle)?;
        finite("eyelid_close_angle", self.eyelid_close_angle)?;
        finite("lower_lid_ratio", self.lower_lid_ratio)?;
        finite("nod_frequency", self.nod_frequency)?;
        if PosePreset::get(&self.idle_preset).is_none() {
            return Err(ConfigError::invalid(
                "idle_preset",
                format!("no pose preset named '{}'", self.idle_preset),
            ));
        }
        Ok(())
    }

    /// Merge the `Some` fields of `patch` into this config.
    pub fn apply_patch(&mut self, patch: &ControllerConfigPatch) {
        let ControllerConfigPatch {
            breath_speed,
            breath_amount,
            blink_interval_min,
            blink_interval_max,
            blink_duration,
            head_nod_amount,
            jaw_open_amount,
            eyelid_close_angle,
            lower_lid_ratio,
            nod_frequency,
            talk_return_rate,
            jaw_response_rate,
        } = *patch;

        let fields = [
            (&mut self.breath_speed, breath_speed),
            (&mut self.breath_amount, breath_amount),
            (&mut self.blink_interval_min, blink_interval_min),
            (&mut self.blink_interval_max, blink_interval_max),
            (&mut self.blink_duration, blink_duration),
            (&mut self.head_nod_amount, head_nod_amount),
            (&mut self.jaw_open_amount, jaw_open_amount),
            (&mut self.eyelid_close_angle, eyelid_close_angle),
            (&mut self.lower_lid_ratio, lower_lid_ratio),
            (&mut self.nod_frequency, nod_frequency),
            (&mut self.talk_return_rate, talk_return_rate),
            (&mut self.jaw_response_rate, jaw_response_rate),
        ];
        for (slot, value) in fields {
            if let Some(v) = value {
                *slot = v;
            }
        }
    }
}

/// Tunables for `VisemeDriver`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Trailing window of each phoneme spent blending into the next (seconds).
    pub transition_time: f32,
    /// Time to fade the last shape to silence once no phoneme covers the timeline.
    pub silence_hold_time: f32,
    /// Fixed lookahead blend toward the next shape while holding a phoneme.
    pub coarticulation: f32,
    /// Elapsed phonemes stay queued until the timeline is this far past their end.
    pub prune_buffer: f32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            transition_time: VISEME_TRANSITION_TIME,
            silence_hold_time: SILENCE_HOLD_TIME,
            coarticulation: 0.25,
            prune_buffer: VISEME_TRANSITION_TIME,
        }
    }
}

impl DriverConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("transition_time", self.transition_time)?;
        non_negative("silence_hold_time", self.silence_hold_time)?;
        non_negative("prune_buffer", self.prune_buffer)?;
        if !(0.0..=1.0).contains(&self.coarticulation) {
            return Err(ConfigError::invalid(
                "coarticulation",
                format!("expected a blend factor in [0, 1], got {}", self.coarticulation),
            ));
        }
        Ok(())
    }
}

/// Everything an adapter needs to stand up a controller and a driver.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    pub controller: ControllerConfig,
    pub driver: DriverConfig,
    pub phonemes: GraphemeConfig,
    pub slot_patterns: SlotPatterns,
}

impl AvatarConfig {
    pub fn from_json(json: &str) -> Result<Self, AvatarError> {
        let cfg: Self = serde_json::from_str(json).map_err(ConfigError::from)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), AvatarError> {
        self.controller.validate()?;
        self.driver.validate()?;
        self.phonemes.validate()?;
        PosePreset::get_required(&self.controller.idle_preset)?;
        Ok(())
    }
}
