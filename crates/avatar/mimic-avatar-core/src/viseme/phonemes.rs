//! Text → phoneme conversion.
//!
//! `PhonemeMapper` is the seam the driver converts text through. The bundled
//! `GraphemeMapper` is a letter-level heuristic: it is good enough to move a
//! mouth convincingly and makes no claim to linguistic accuracy.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::viseme::shapes::Viseme;

/// One mapped phoneme before it is placed on the timeline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhonemeSpec {
    pub viseme: Viseme,
    /// Seconds on the text clock.
    pub duration: f32,
}

impl PhonemeSpec {
    pub const fn new(viseme: Viseme, duration: f32) -> Self {
        Self { viseme, duration }
    }
}

/// Converts transcript text into an ordered phoneme sequence.
pub trait PhonemeMapper: Send {
    fn text_to_phonemes(&self, text: &str) -> Vec<PhonemeSpec>;
}

impl<F> PhonemeMapper for F
where
    F: Fn(&str) -> Vec<PhonemeSpec> + Send,
{
    fn text_to_phonemes(&self, text: &str) -> Vec<PhonemeSpec> {
        self(text)
    }
}

/// Durations used by `GraphemeMapper` (seconds).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphemeConfig {
    pub vowel_duration: f32,
    pub consonant_duration: f32,
    /// Silence between words.
    pub word_gap: f32,
    /// Silence at `, . ! ? ; :`.
    pub pause_duration: f32,
}

impl Default for GraphemeConfig {
    fn default() -> Self {
        Self {
            vowel_duration: 0.12,
            consonant_duration: 0.08,
            word_gap: 0.06,
            pause_duration: 0.2,
        }
    }
}

impl GraphemeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("vowel_duration", self.vowel_duration),
            ("consonant_duration", self.consonant_duration),
        ];
        for (field, v) in positive {
            if !(v.is_finite() && v > 0.0) {
                return Err(ConfigError::invalid(
                    field,
                    format!("expected a positive duration, got {v}"),
                ));
            }
        }
        let non_negative = [
            ("word_gap", self.word_gap),
            ("pause_duration", self.pause_duration),
        ];
        for (field, v) in non_negative {
            if !(v.is_finite() && v >= 0.0) {
                return Err(ConfigError::invalid(
                    field,
                    format!("expected a finite value >= 0, got {v}"),
                ));
            }
        }
        Ok(())
    }
}

fn digraph(a: char, b: char) -> Option<Viseme> {
    let v = match (a, b) {
        ('t', 'h') => Viseme::TH,
        ('s', 'h') | ('c', 'h') => Viseme::CH,
        ('p', 'h') => Viseme::FF,
        ('n', 'g') => Viseme::NN,
        ('e', 'e') | ('e', 'a') => Viseme::I,
        ('o', 'o') | ('o', 'u') => Viseme::U,
        ('o', 'w') => Viseme::O,
        ('a', 'i') | ('a', 'y') => Viseme::E,
        _ => return None,
    };
    Some(v)
}

/// Single-letter mapping; `None` for silent letters (`h`) and non-ASCII.
fn letter(c: char) -> Option<Viseme> {
    let v = match c {
        'a' => Viseme::AA,
        'e' => Viseme::E,
        'i' | 'y' => Viseme::I,
        'o' => Viseme::O,
        'u' | 'w' => Viseme::U,
        'b' | 'm' | 'p' => Viseme::PP,
        'f' | 'v' => Viseme::FF,
        'd' | 't' => Viseme::DD,
        'c' | 'g' | 'k' | 'q' | 'x' => Viseme::KK,
        'j' => Viseme::CH,
        's' | 'z' => Viseme::SS,
        'l' | 'n' => Viseme::NN,
        'r' => Viseme::RR,
        _ => return None,
    };
    Some(v)
}

#[inline]
fn is_pause(c: char) -> bool {
    matches!(c, ',' | '.' | '!' | '?' | ';' | ':')
}

/// Letter-level heuristic mapper.
///
/// Lower-cases the text, reads digraphs before single letters, collapses
/// doubled letters and merges adjacent identical visemes. Whitespace becomes
/// a short silence, punctuation a longer one; leading and trailing silence is
/// trimmed, so text without letters maps to nothing.
#[derive(Clone, Debug, Default)]
pub struct GraphemeMapper {
    cfg: GraphemeConfig,
}

impl GraphemeMapper {
    pub fn new(cfg: GraphemeConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &GraphemeConfig {
        &self.cfg
    }

    fn duration_for(&self, viseme: Viseme) -> f32 {
        if viseme.is_vowel() {
            self.cfg.vowel_duration
        } else {
            self.cfg.consonant_duration
        }
    }

    fn push_sound(&self, out: &mut Vec<PhonemeSpec>, viseme: Viseme) {
        let duration = self.duration_for(viseme);
        match out.last_mut() {
            Some(last) if last.viseme == viseme => last.duration += duration,
            _ => out.push(PhonemeSpec::new(viseme, duration)),
        }
    }

    fn push_silence(out: &mut Vec<PhonemeSpec>, duration: f32) {
        match out.last_mut() {
            None => {}
            Some(last) if last.viseme == Viseme::Sil => last.duration = last.duration.max(duration),
            Some(_) if duration > 0.0 => out.push(PhonemeSpec::new(Viseme::Sil, duration)),
            Some(_) => {}
        }
    }
}

impl PhonemeMapper for GraphemeMapper {
    fn text_to_phonemes(&self, text: &str) -> Vec<PhonemeSpec> {
        let chars: Vec<char> = text.to_lowercase().chars().collect();
        let mut out = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            if c.is_alphabetic() {
                if let Some(v) = chars.get(i + 1).and_then(|&n| digraph(c, n)) {
                    self.push_sound(&mut out, v);
                    i += 2;
                    continue;
                }
                if let Some(v) = letter(c) {
                    self.push_sound(&mut out, v);
                }
                i += 1;
                while chars.get(i) == Some(&c) {
                    i += 1;
                }
            } else {
                if is_pause(c) {
                    Self::push_silence(&mut out, self.cfg.pause_duration);
                } else if c.is_whitespace() {
                    Self::push_silence(&mut out, self.cfg.word_gap);
                }
                i += 1;
            }
        }

        if out.last().map(|p| p.viseme) == Some(Viseme::Sil) {
            out.pop();
        }
        out
    }
}
