//! Viseme timing: text → phoneme timeline, drift correction against audio
//! duration, and per-frame mouth-shape blending.

pub mod driver;
pub mod phonemes;
pub mod shapes;

pub use driver::{MouthDrive, Phoneme, VisemeDriver, VisemeState};
pub use phonemes::{GraphemeConfig, GraphemeMapper, PhonemeMapper, PhonemeSpec};
pub use shapes::{blend, shape, MouthChannel, Viseme, VisemeWeights, VISEME_SHAPES};

/// Trailing window of each phoneme spent blending into the next (seconds).
pub const VISEME_TRANSITION_TIME: f32 = 0.08;

/// Time to fade the last mouth shape to silence (seconds).
pub const SILENCE_HOLD_TIME: f32 = 0.3;
