//! VisemeDriver: phoneme timeline rescaled against streamed audio duration.
//!
//! Text arrives ahead of audio and is laid out on a provisional "text clock".
//! Every `update` rescales the playback speed to `total_text / total_audio`
//! so the timeline lands where audio playback actually is, then blends the
//! covering phoneme's shape toward the next one.

use std::collections::VecDeque;
use std::fmt;

use log::{trace, warn};
use serde::{Deserialize, Serialize};

use crate::config::DriverConfig;
use crate::viseme::phonemes::{GraphemeMapper, PhonemeMapper};
use crate::viseme::shapes::{blend, shape, Viseme, VisemeWeights};

/// A phoneme placed on the text clock.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Phoneme {
    pub viseme: Viseme,
    pub start_time: f32,
    pub duration: f32,
}

impl Phoneme {
    #[inline]
    pub fn end_time(&self) -> f32 {
        self.start_time + self.duration
    }

    /// Half-open `[start, end)` containment.
    #[inline]
    pub fn contains(&self, t: f32) -> bool {
        self.start_time <= t && t < self.end_time()
    }
}

/// Read-only snapshot returned by `VisemeDriver::state()`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VisemeState {
    pub weights: Option<VisemeWeights>,
    pub is_active: bool,
    pub current_viseme: Option<Viseme>,
}

/// What the mouth applier should follow this frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "lowercase")]
pub enum MouthDrive {
    Visemes(VisemeWeights),
    /// No timeline coverage; drive the mouth from audio amplitude alone.
    Amplitude(f32),
}

impl MouthDrive {
    pub fn from_state(state: &VisemeState, amplitude: f32) -> Self {
        match &state.weights {
            Some(w) => MouthDrive::Visemes(w.clone()),
            None => MouthDrive::Amplitude(amplitude.clamp(0.0, 1.0)),
        }
    }
}

pub struct VisemeDriver {
    cfg: DriverConfig,
    mapper: Box<dyn PhonemeMapper>,

    queue: VecDeque<Phoneme>,
    timeline: f32,
    speed: f32,
    total_audio: f32,
    total_text: f32,
    pending: String,

    weights: Option<VisemeWeights>,
    current: Option<Viseme>,
    /// Weights held when the current silence began; the fade runs from here.
    fade_origin: Option<VisemeWeights>,
    active: bool,
    silence_timer: f32,
}

impl Default for VisemeDriver {
    fn default() -> Self {
        Self::new(DriverConfig::default(), GraphemeMapper::default())
    }
}

impl fmt::Debug for VisemeDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisemeDriver")
            .field("cfg", &self.cfg)
            .field("queue_len", &self.queue.len())
            .field("timeline", &self.timeline)
            .field("speed", &self.speed)
            .field("total_audio", &self.total_audio)
            .field("total_text", &self.total_text)
            .field("current", &self.current)
            .field("active", &self.active)
            .field("silence_timer", &self.silence_timer)
            .finish_non_exhaustive()
    }
}

impl VisemeDriver {
    pub fn new(cfg: DriverConfig, mapper: impl PhonemeMapper + 'static) -> Self {
        Self {
            cfg,
            mapper: Box::new(mapper),
            queue: VecDeque::new(),
            timeline: 0.0,
            speed: 1.0,
            total_audio: 0.0,
            total_text: 0.0,
            pending: String::new(),
            weights: None,
            current: None,
            fade_origin: None,
            active: false,
            silence_timer: 0.0,
        }
    }

    /// Default config with a custom mapper.
    pub fn with_mapper(mapper: impl PhonemeMapper + 'static) -> Self {
        Self::new(DriverConfig::default(), mapper)
    }

    /// Append transcript text and queue whatever the pending buffer maps to.
    ///
    /// Returns the number of phonemes queued. The pending buffer is cleared after
    /// every conversion; when nothing maps, no other state changes.
    ///
    /// Phonemes are placed on the text clock, which keeps running across
    /// utterances. The timeline stops where it was when the driver went idle, so
    /// a new utterance starts behind it and its leading phonemes are skipped.
    /// Call `reset()` between utterances to play one from its first phoneme.
    pub fn push_text(&mut self, text: &str) -> usize {
        self.pending.push_str(text);
        let mapped = self.mapper.text_to_phonemes(&self.pending);
        self.pending.clear();
        if mapped.is_empty() {
            return 0;
        }

        let mut queued = 0;
        for spec in mapped {
            if !(spec.duration.is_finite() && spec.duration > 0.0) {
                trace!("dropping phoneme {} with duration {}", spec.viseme, spec.duration);
                continue;
            }
            self.queue.push_back(Phoneme {
                viseme: spec.viseme,
                start_time: self.total_text,
                duration: spec.duration,
            });
            self.total_text += spec.duration;
            queued += 1;
        }
        if queued > 0 {
            self.active = true;
        }
        queued
    }

    /// Account for another chunk of audio. Negative or non-finite chunks are ignored.
    pub fn push_audio_duration(&mut self, seconds: f32) {
        if !(seconds.is_finite() && seconds >= 0.0) {
            warn!("ignoring audio chunk with invalid duration {seconds}");
            return;
        }
        self.total_audio += seconds;
    }

    fn clear_output(&mut self) {
        self.weights = None;
        self.current = None;
        self.fade_origin = None;
    }

    /// Speed that maps the text clock onto audio time; 1.0 until both are known.
    fn compute_speed(&self) -> f32 {
        if self.total_text > 0.0 && self.total_audio > 0.0 {
            self.total_text / self.total_audio
        } else {
            1.0
        }
    }

    pub fn update(&mut self, delta: f32) -> VisemeState {
        self.step(delta);
        self.state()
    }

    /// Advance the timeline by `delta` seconds of wall time.
    pub fn step(&mut self, delta: f32) {
        if !self.active && self.queue.is_empty() {
            self.clear_output();
            return;
        }

        self.speed = self.compute_speed();
        self.timeline += delta * self.speed;
        let position = self.timeline;

        let buffer = self.cfg.prune_buffer;
        while self
            .queue
            .front()
            .is_some_and(|p| p.end_time() + buffer < position)
        {
            self.queue.pop_front();
        }

        match self.queue.iter().position(|p| p.contains(position)) {
            Some(i) => {
                self.silence_timer = 0.0;
                self.fade_origin = None;

                let cur = self.queue[i];
                let next = self.queue.get(i + 1).copied();
                let weights = match next {
                    Some(next) => {
                        let elapsed = position - cur.start_time;
                        let window = self.cfg.transition_time.min(cur.duration);
                        let t = if window > 0.0 && elapsed > cur.duration - window {
                            ((elapsed - (cur.duration - window)) / window).clamp(0.0, 1.0)
                        } else {
                            self.cfg.coarticulation
                        };
                        blend(shape(cur.viseme), shape(next.viseme), t)
                    }
                    None => shape(cur.viseme).clone(),
                };
                if self.current != Some(cur.viseme) {
                    trace!("viseme {} at {:.3}", cur.viseme, position);
                }
                self.weights = Some(weights);
                self.current = Some(cur.viseme);
            }
            None => {
                self.silence_timer += delta;
                let hold = self.cfg.silence_hold_time;

                if let Some(held) = self.weights.as_ref() {
                    let origin = self.fade_origin.get_or_insert_with(|| held.clone());
                    let fade_t = if hold > 0.0 {
                        (self.silence_timer / hold).min(1.0)
                    } else {
                        1.0
                    };
                    if fade_t >= 1.0 {
                        self.clear_output();
                    } else {
                        self.weights = Some(blend(origin, shape(Viseme::Sil), fade_t));
                    }
                }

                if self.queue.is_empty() && self.silence_timer > hold {
                    trace!("viseme driver idle after {:.3}s of silence", self.silence_timer);
                    self.active = false;
                    self.clear_output();
                }
            }
        }
    }

    pub fn state(&self) -> VisemeState {
        VisemeState {
            weights: self.weights.clone(),
            is_active: self.active,
            current_viseme: self.current,
        }
    }

    /// Back to a freshly constructed driver; config and mapper are kept.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.timeline = 0.0;
        self.speed = 1.0;
        self.total_audio = 0.0;
        self.total_text = 0.0;
        self.pending.clear();
        self.active = false;
        self.silence_timer = 0.0;
        self.clear_output();
    }

    pub fn set_config(&mut self, cfg: DriverConfig) {
        self.cfg = cfg;
    }

    // Accessors

    pub fn config(&self) -> &DriverConfig {
        &self.cfg
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn timeline_position(&self) -> f32 {
        self.timeline
    }

    /// Speed used by the last `update`.
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn queue(&self) -> &VecDeque<Phoneme> {
        &self.queue
    }

    pub fn total_text_duration(&self) -> f32 {
        self.total_text
    }

    pub fn total_audio_duration(&self) -> f32 {
        self.total_audio
    }

    pub fn silence_timer(&self) -> f32 {
        self.silence_timer
    }

    pub fn pending_text(&self) -> &str {
        &self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viseme::phonemes::PhonemeSpec;
    use crate::viseme::shapes::MouthChannel;

    fn fixed(specs: Vec<PhonemeSpec>) -> impl Fn(&str) -> Vec<PhonemeSpec> + Send {
        move |text: &str| if text.is_empty() { Vec::new() } else { specs.clone() }
    }

    #[test]
    fn phonemes_are_laid_out_on_the_text_clock() {
        let mut d = VisemeDriver::with_mapper(fixed(vec![
            PhonemeSpec::new(Viseme::AA, 0.2),
            PhonemeSpec::new(Viseme::O, 0.3),
        ]));
        assert_eq!(d.push_text("a"), 2);
        assert_eq!(d.push_text("b"), 2);
        let starts: Vec<f32> = d.queue().iter().map(|p| p.start_time).collect();
        for (got, want) in starts.iter().zip([0.0, 0.2, 0.5, 0.7]) {
            assert!((got - want).abs() < 1e-6, "{starts:?}");
        }
        assert_eq!(starts.len(), 4);
        assert!((d.total_text_duration() - 1.0).abs() < 1e-6);
        assert!(d.is_active());
    }

    #[test]
    fn unmappable_text_is_dropped() {
        let mut d = VisemeDriver::default();
        for _ in 0..3 {
            assert_eq!(d.push_text("... "), 0);
        }
        assert_eq!(d.pending_text(), "");
        assert!(!d.is_active());
        assert!(d.queue().is_empty());
        assert_eq!(d.total_text_duration(), 0.0);
        assert_eq!(d.push_text("i"), 1);
        assert_eq!(d.pending_text(), "");
    }

    #[test]
    fn invalid_audio_chunks_are_ignored() {
        let mut d = VisemeDriver::default();
        d.push_audio_duration(1.0);
        d.push_audio_duration(-2.0);
        d.push_audio_duration(f32::NAN);
        assert_eq!(d.total_audio_duration(), 1.0);
    }

    #[test]
    fn mid_hold_leans_toward_next_shape() {
        let mut d = VisemeDriver::with_mapper(fixed(vec![
            PhonemeSpec::new(Viseme::AA, 1.0),
            PhonemeSpec::new(Viseme::O, 1.0),
        ]));
        d.push_text("x");
        let state = d.update(0.5);
        let w = state.weights.unwrap();
        assert!((w.get(MouthChannel::Aa) - 0.75).abs() < 1e-6);
        assert!((w.get(MouthChannel::Oh) - 0.25).abs() < 1e-6);
        assert_eq!(state.current_viseme, Some(Viseme::AA));
    }

    #[test]
    fn trailing_window_blends_linearly_to_next() {
        let mut d = VisemeDriver::with_mapper(fixed(vec![
            PhonemeSpec::new(Viseme::AA, 1.0),
            PhonemeSpec::new(Viseme::O, 1.0),
        ]));
        d.push_text("x");
        // window is [0.92, 1.0); 0.96 is halfway through it
        let w = d.update(0.96).weights.unwrap();
        assert!((w.get(MouthChannel::Aa) - 0.5).abs() < 1e-4);
        assert!((w.get(MouthChannel::Oh) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn last_phoneme_is_unblended() {
        let mut d = VisemeDriver::with_mapper(fixed(vec![PhonemeSpec::new(Viseme::U, 1.0)]));
        d.push_text("x");
        let w = d.update(0.99).weights.unwrap();
        assert_eq!(&w, shape(Viseme::U));
    }

    #[test]
    fn silence_fades_from_held_weights() {
        let mut d = VisemeDriver::with_mapper(fixed(vec![PhonemeSpec::new(Viseme::AA, 0.1)]));
        d.push_text("x");
        d.update(0.05);
        let w = d.update(0.1).weights.unwrap();
        // 0.1s into a 0.3s fade
        assert!((w.get(MouthChannel::Aa) - (1.0 - 0.1 / 0.3)).abs() < 1e-4);
        let w = d.update(0.1).weights.unwrap();
        assert!((w.get(MouthChannel::Aa) - (1.0 - 0.2 / 0.3)).abs() < 1e-4);
        let state = d.update(0.2);
        assert!(state.weights.is_none());
        assert!(state.current_viseme.is_none());
    }

    #[test]
    fn speed_falls_back_to_one_without_audio() {
        let mut d = VisemeDriver::with_mapper(fixed(vec![PhonemeSpec::new(Viseme::AA, 4.0)]));
        d.push_text("x");
        d.update(0.5);
        assert_eq!(d.speed(), 1.0);
        assert_eq!(d.timeline_position(), 0.5);
    }
}
