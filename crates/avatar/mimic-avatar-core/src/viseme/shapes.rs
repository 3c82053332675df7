//! Viseme alphabet and mouth shapes.

use std::fmt;

use hashbrown::HashMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Phoneme-level mouth shape classes.
#[allow(clippy::upper_case_acronyms)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Viseme {
    #[default]
    #[serde(rename = "sil")]
    Sil,
    PP, // p, b, m
    FF, // f, v
    TH,
    DD, // d, t
    #[serde(rename = "kk")]
    KK, // k, g, c, q, x
    CH, // ch, sh, j
    SS, // s, z
    #[serde(rename = "nn")]
    NN, // n, l, ng
    RR,
    #[serde(rename = "aa")]
    AA,
    E,
    I,
    O,
    U,
}

impl Viseme {
    pub const ALL: [Viseme; 15] = [
        Viseme::Sil,
        Viseme::PP,
        Viseme::FF,
        Viseme::TH,
        Viseme::DD,
        Viseme::KK,
        Viseme::CH,
        Viseme::SS,
        Viseme::NN,
        Viseme::RR,
        Viseme::AA,
        Viseme::E,
        Viseme::I,
        Viseme::O,
        Viseme::U,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Viseme::Sil => "sil",
            Viseme::PP => "PP",
            Viseme::FF => "FF",
            Viseme::TH => "TH",
            Viseme::DD => "DD",
            Viseme::KK => "kk",
            Viseme::CH => "CH",
            Viseme::SS => "SS",
            Viseme::NN => "nn",
            Viseme::RR => "RR",
            Viseme::AA => "aa",
            Viseme::E => "E",
            Viseme::I => "I",
            Viseme::O => "O",
            Viseme::U => "U",
        }
    }

    #[inline]
    pub fn is_vowel(self) -> bool {
        matches!(self, Viseme::AA | Viseme::E | Viseme::I | Viseme::O | Viseme::U)
    }
}

impl fmt::Display for Viseme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Avatar mouth blend-shape channels.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouthChannel {
    Aa,
    Ih,
    Ou,
    Ee,
    Oh,
}

impl MouthChannel {
    pub const ALL: [MouthChannel; 5] = [
        MouthChannel::Aa,
        MouthChannel::Ih,
        MouthChannel::Ou,
        MouthChannel::Ee,
        MouthChannel::Oh,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MouthChannel::Aa => "aa",
            MouthChannel::Ih => "ih",
            MouthChannel::Ou => "ou",
            MouthChannel::Ee => "ee",
            MouthChannel::Oh => "oh",
        }
    }
}

/// Mouth channel → weight. Channels are independent; weights are not normalized.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisemeWeights {
    weights: HashMap<MouthChannel, f32>,
}

impl VisemeWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: &[(MouthChannel, f32)]) -> Self {
        Self {
            weights: pairs.iter().copied().collect(),
        }
    }

    /// Weight for `channel`; missing channels read as 0.
    #[inline]
    pub fn get(&self, channel: MouthChannel) -> f32 {
        self.weights.get(&channel).copied().unwrap_or(0.0)
    }

    #[inline]
    pub fn set(&mut self, channel: MouthChannel, weight: f32) {
        self.weights.insert(channel, weight);
    }

    /// All channels in `MouthChannel::ALL` order, missing ones as 0.
    pub fn iter(&self) -> impl Iterator<Item = (MouthChannel, f32)> + '_ {
        MouthChannel::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    /// Largest absolute channel weight.
    pub fn peak(&self) -> f32 {
        self.weights.values().fold(0.0, |m, w| m.max(w.abs()))
    }
}

/// Per-channel `lerp(a, b, t)` over the whole channel alphabet.
pub fn blend(a: &VisemeWeights, b: &VisemeWeights, t: f32) -> VisemeWeights {
    let weights = MouthChannel::ALL
        .into_iter()
        .map(|c| {
            let (x, y) = (a.get(c), b.get(c));
            (c, x + (y - x) * t)
        })
        .collect();
    VisemeWeights { weights }
}

/// Mouth shape for every viseme; `sil` is all zeros.
pub static VISEME_SHAPES: Lazy<HashMap<Viseme, VisemeWeights>> = Lazy::new(|| {
    use MouthChannel::*;

    let table: [(Viseme, &[(MouthChannel, f32)]); 15] = [
        (Viseme::Sil, &[]),
        (Viseme::PP, &[(Aa, 0.05)]),
        (Viseme::FF, &[(Aa, 0.1), (Ih, 0.2)]),
        (Viseme::TH, &[(Aa, 0.2), (Ih, 0.2)]),
        (Viseme::DD, &[(Aa, 0.3), (Ih, 0.2)]),
        (Viseme::KK, &[(Aa, 0.35), (Ih, 0.15)]),
        (Viseme::CH, &[(Ih, 0.3), (Ou, 0.4)]),
        (Viseme::SS, &[(Ih, 0.5), (Ee, 0.2)]),
        (Viseme::NN, &[(Aa, 0.2), (Ih, 0.2)]),
        (Viseme::RR, &[(Ou, 0.4), (Oh, 0.2)]),
        (Viseme::AA, &[(Aa, 1.0)]),
        (Viseme::E, &[(Ih, 0.2), (Ee, 0.8)]),
        (Viseme::I, &[(Ih, 1.0)]),
        (Viseme::O, &[(Oh, 1.0)]),
        (Viseme::U, &[(Ou, 1.0)]),
    ];
    table
        .into_iter()
        .map(|(v, pairs)| (v, VisemeWeights::from_pairs(pairs)))
        .collect()
});

static SILENCE: Lazy<VisemeWeights> = Lazy::new(VisemeWeights::new);

/// Shape for `viseme` (silence if the table has no entry).
pub fn shape(viseme: Viseme) -> &'static VisemeWeights {
    VISEME_SHAPES.get(&viseme).unwrap_or(&*SILENCE)
}
