use js_sys::Array;
use serde::Serialize;
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;

use mimic_avatar_core::{
    ControllerConfig, ControllerConfigPatch, DriverConfig, GraphemeConfig, GraphemeMapper,
    PoseController, PosePreset, SceneNode, SlotPatterns, VisemeDriver, PRESET_NAMES,
};

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

/// Parse an optional JS object, falling back to `T::default()`.
fn from_optional<T>(value: JsValue, what: &str) -> Result<T, JsError>
where
    T: Default + serde::de::DeserializeOwned,
{
    if jsvalue_is_undefined_or_null(&value) {
        Ok(T::default())
    } else {
        swb::from_value(value).map_err(|e| JsError::new(&format!("{what} error: {e}")))
    }
}

/// Serialize as plain JS objects (maps become objects, not `Map`).
fn to_js<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<JsValue, JsError> {
    let serializer = swb::Serializer::json_compatible();
    value
        .serialize(&serializer)
        .map_err(|e| JsError::new(&format!("{what} error: {e}")))
}

#[wasm_bindgen]
pub struct MimicPose {
    core: PoseController,
}

#[wasm_bindgen]
impl MimicPose {
    /// Create a pose controller. Both arguments are optional:
    ///   new MimicPose({ breath_amount: 0.03 }, [{ slot: "head", matchers: [...] }])
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue, slot_patterns: JsValue) -> Result<MimicPose, JsError> {
        console_error_panic_hook::set_once();

        let cfg: ControllerConfig = from_optional(config, "config")?;
        cfg.validate()
            .map_err(|e| JsError::new(&format!("config error: {e}")))?;
        let patterns: SlotPatterns = from_optional(slot_patterns, "slot patterns")?;

        Ok(MimicPose {
            core: PoseController::new(cfg).with_patterns(patterns),
        })
    }

    /// Bind against a traversal-ordered node list
    /// (`[{ handle: number, name: string, rotation: [x, y, z] }]`).
    /// Returns false if already initialized.
    #[wasm_bindgen]
    pub fn initialize(&mut self, nodes: JsValue) -> Result<bool, JsError> {
        let nodes: Vec<SceneNode> = swb::from_value(nodes)
            .map_err(|e| JsError::new(&format!("initialize nodes error: {e}")))?;
        Ok(self.core.initialize(&nodes))
    }

    /// Writes produced by the last `initialize`/`update`/`reset`.
    #[wasm_bindgen]
    pub fn frame(&self) -> Result<JsValue, JsError> {
        to_js(self.core.frame(), "frame")
    }

    /// Step by dt seconds. Returns `{ writes: [{ slot, handle, rotation }] }`.
    #[wasm_bindgen]
    pub fn update(&mut self, dt: f32, is_speaking: bool, mouth_open: f32) -> Result<JsValue, JsError> {
        let frame = self.core.update(dt, is_speaking, mouth_open);
        to_js(frame, "frame")
    }

    #[wasm_bindgen(js_name = trigger_blink)]
    pub fn trigger_blink(&mut self) {
        self.core.trigger_blink();
    }

    /// Restore the rest pose; returns the rest-pose writes.
    #[wasm_bindgen]
    pub fn reset(&mut self) -> Result<JsValue, JsError> {
        let frame = self.core.reset();
        to_js(frame, "frame")
    }

    /// Merge a partial config (`{ jaw_open_amount: 0 }`). Rejected patches leave
    /// the live config unchanged.
    #[wasm_bindgen(js_name = set_config)]
    pub fn set_config(&mut self, patch: JsValue) -> Result<(), JsError> {
        let patch: ControllerConfigPatch = swb::from_value(patch)
            .map_err(|e| JsError::new(&format!("config patch error: {e}")))?;
        self.core
            .set_config(&patch)
            .map_err(|e| JsError::new(&format!("config patch error: {e}")))
    }

    #[wasm_bindgen(js_name = is_initialized)]
    pub fn is_initialized(&self) -> bool {
        self.core.is_initialized()
    }

    /// Names of slots with no matching node.
    #[wasm_bindgen(js_name = missing_slots)]
    pub fn missing_slots(&self) -> Array {
        self.core
            .missing_slots()
            .iter()
            .map(|s| JsValue::from_str(s.as_str()))
            .collect()
    }

    #[wasm_bindgen(js_name = blink_value)]
    pub fn blink_value(&self) -> f32 {
        self.core.blink_value()
    }
}

#[wasm_bindgen]
pub struct MimicVisemes {
    core: VisemeDriver,
}

#[wasm_bindgen]
impl MimicVisemes {
    /// Create a viseme driver. Both arguments are optional JSON objects
    /// (driver timing and grapheme mapper durations).
    #[wasm_bindgen(constructor)]
    pub fn new(driver_config: JsValue, phoneme_config: JsValue) -> Result<MimicVisemes, JsError> {
        console_error_panic_hook::set_once();

        let driver: DriverConfig = from_optional(driver_config, "driver config")?;
        driver
            .validate()
            .map_err(|e| JsError::new(&format!("driver config error: {e}")))?;
        let phonemes: GraphemeConfig = from_optional(phoneme_config, "phoneme config")?;
        phonemes
            .validate()
            .map_err(|e| JsError::new(&format!("phoneme config error: {e}")))?;

        Ok(MimicVisemes {
            core: VisemeDriver::new(driver, GraphemeMapper::new(phonemes)),
        })
    }

    /// Append transcript text. Returns the number of phonemes queued.
    #[wasm_bindgen(js_name = push_text)]
    pub fn push_text(&mut self, text: &str) -> u32 {
        self.core.push_text(text) as u32
    }

    #[wasm_bindgen(js_name = push_audio_duration)]
    pub fn push_audio_duration(&mut self, seconds: f32) {
        self.core.push_audio_duration(seconds);
    }

    /// Step by dt seconds. Returns `{ weights, is_active, current_viseme }`;
    /// `weights` is null when the caller should drive the mouth from amplitude.
    #[wasm_bindgen]
    pub fn update(&mut self, dt: f32) -> Result<JsValue, JsError> {
        let state = self.core.update(dt);
        to_js(&state, "viseme state")
    }

    #[wasm_bindgen]
    pub fn state(&self) -> Result<JsValue, JsError> {
        to_js(&self.core.state(), "viseme state")
    }

    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.core.reset();
    }

    #[wasm_bindgen(js_name = is_active)]
    pub fn is_active(&self) -> bool {
        self.core.is_active()
    }

    #[wasm_bindgen(js_name = timeline_position)]
    pub fn timeline_position(&self) -> f32 {
        self.core.timeline_position()
    }
}

/// Preset by name as `{ name, bones, transitionDuration }`.
#[wasm_bindgen(js_name = pose_preset)]
pub fn pose_preset(name: &str) -> Result<JsValue, JsError> {
    let preset = PosePreset::get_required(name).map_err(|e| JsError::new(&e.to_string()))?;
    to_js(preset, "preset")
}

#[wasm_bindgen(js_name = pose_preset_names)]
pub fn pose_preset_names() -> Array {
    PRESET_NAMES.iter().map(|n| JsValue::from_str(n)).collect()
}

/// ABI version for the JS wrapper to check.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}
