//! Syllable-based name generation
//!
//! Each culture carries its own small language: a fixed syllable
//! inventory drawn once from consonant and vowel pools. Names are a few
//! syllables joined and capitalized, so every culture's names share a
//! recognizable sound.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const CONSONANTS: &[&str] = &[
    "b", "d", "f", "g", "h", "k", "l", "m", "n", "p", "r", "s", "t", "v", "z", "th", "sh", "ch",
    "kh", "br", "dr", "gr", "tr", "st",
];
const VOWELS: &[&str] = &["a", "e", "i", "o", "u", "ae", "ai", "ea", "ia", "ou"];
const CODAS: &[&str] = &["n", "r", "l", "s", "th", "nd", "rk", "st"];

/// Syllables kept per language
const SYLLABLE_COUNT: usize = 16;
/// Chance a syllable carries a closing consonant
const CODA_CHANCE: f64 = 0.3;

/// A culture's naming language
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct Language {
    syllables: Vec<String>,
}

impl Language {
    /// Draw a fresh syllable inventory
    pub fn generate(rng: &mut ChaCha8Rng) -> Self {
        let mut syllables = Vec::with_capacity(SYLLABLE_COUNT);
        for _ in 0..SYLLABLE_COUNT {
            let mut s = String::new();
            s.push_str(CONSONANTS[rng.gen_range(0..CONSONANTS.len())]);
            s.push_str(VOWELS[rng.gen_range(0..VOWELS.len())]);
            if rng.gen_bool(CODA_CHANCE) {
                s.push_str(CODAS[rng.gen_range(0..CODAS.len())]);
            }
            syllables.push(s);
        }
        Self { syllables }
    }

    /// A lowercase word of 2 or 3 syllables
    pub fn make_word(&self, rng: &mut ChaCha8Rng) -> String {
        let count = rng.gen_range(2..=3);
        let mut word = String::new();
        for _ in 0..count {
            word.push_str(&self.syllables[rng.gen_range(0..self.syllables.len())]);
        }
        word
    }

    /// A capitalized proper name
    pub fn make_name(&self, rng: &mut ChaCha8Rng) -> String {
        let word = self.make_word(rng);
        let mut chars = word.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => word,
        }
    }
}

/// Pick from a weighted table; weights need not sum to anything
pub(crate) fn weighted_pick<'a, T>(rng: &mut ChaCha8Rng, table: &'a [(T, f64)]) -> &'a T {
    let total: f64 = table.iter().map(|(_, w)| w).sum();
    let mut roll = rng.gen_range(0.0..total);
    for (item, w) in table {
        if roll < *w {
            return item;
        }
        roll -= w;
    }
    &table[table.len() - 1].0
}
