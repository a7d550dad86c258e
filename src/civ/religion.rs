//! Religions: a folk faith per culture, an organized one per empire

use rand_chacha::ChaCha8Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::civ::names::weighted_pick;
use crate::civ::Civilization;

/// Whether a faith grew out of a culture or was codified by an empire
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReligionKind {
    Folk,
    Organized,
}

const FOLK_FORMS: &[(&str, f64)] = &[
    ("Shamanism", 2.0),
    ("Animism", 2.0),
    ("Ancestor Worship", 1.0),
    ("Polytheism", 2.0),
    ("Totemism", 1.0),
    ("Nature Worship", 1.0),
];

const ORGANIZED_FORMS: &[(&str, f64)] = &[
    ("Polytheism", 5.0),
    ("Dualism", 1.0),
    ("Monotheism", 4.0),
    ("Pantheism", 1.0),
    ("Cult", 1.0),
];

/// How an organized religion gets its name
enum NameMethod {
    RandomWord,
    SupremeIsm,
    FaithOfSupreme,
    PlaceIsm,
    CultureIsm,
}

const NAME_METHODS: &[(NameMethod, f64)] = &[
    (NameMethod::RandomWord, 3.0),
    (NameMethod::SupremeIsm, 1.0),
    (NameMethod::FaithOfSupreme, 1.0),
    (NameMethod::PlaceIsm, 2.0),
    (NameMethod::CultureIsm, 2.0),
];

/// A faith and where it took root
#[derive(Debug, Clone)]
pub struct Religion {
    pub name: String,
    pub kind: ReligionKind,
    /// Doctrinal form, e.g. "Polytheism"
    pub form: &'static str,
    /// Index into the culture list
    pub culture: u32,
    pub origin: u32,
}

/// Strip a trailing vowel so "-ism" attaches cleanly
fn ism(word: &str) -> String {
    let stem = word.trim_end_matches(|c| "aeiou".contains(c));
    if stem.len() >= 2 {
        format!("{}ism", stem)
    } else {
        format!("{}ism", word)
    }
}

impl Civilization {
    /// Found a folk religion per culture and an organized one per empire
    pub(crate) fn found_religions(&mut self, rng: &mut ChaCha8Rng) {
        for id in 0..self.cultures.len() as u32 {
            let form = *weighted_pick(rng, FOLK_FORMS);
            let culture = &self.cultures[id as usize];
            self.religions.push(Religion {
                name: format!("{} {}", culture.name, form),
                kind: ReligionKind::Folk,
                form,
                culture: id,
                origin: culture.origin,
            });
        }

        for empire_id in 0..self.empires.len() {
            let empire = &self.empires[empire_id];
            let capital = &self.cities[empire.capital_city as usize];
            let culture_id = capital.culture;
            let language = self.cultures[culture_id as usize].language().clone();
            let form = *weighted_pick(rng, ORGANIZED_FORMS);
            let name = match weighted_pick(rng, NAME_METHODS) {
                NameMethod::RandomWord => format!("{} {}", language.make_name(rng), form),
                NameMethod::SupremeIsm => ism(&language.make_name(rng)),
                NameMethod::FaithOfSupreme => format!("Faith of {}", language.make_name(rng)),
                NameMethod::PlaceIsm => ism(&capital.name),
                NameMethod::CultureIsm => ism(&self.cultures[culture_id as usize].name),
            };
            self.religions.push(Religion {
                name,
                kind: ReligionKind::Organized,
                form,
                culture: culture_id,
                origin: empire.capital_region,
            });
        }
    }
}
