//! Cultures: seeding, type selection and cost-based expansion

use rand::Rng;
use rand_chacha::ChaCha8Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::base::BaseWorld;
use crate::civ::names::Language;
use crate::civ::Civilization;
use crate::geometry::great_arc;
use crate::queue::MinHeap;
use crate::regions::Biome;

/// Accumulated expansion cost beyond which land stays unclaimed
const NEUTRAL_CUTOFF: f64 = 50.0;
/// Scales great-arc distance into the same range as biome penalties
const ARC_COST_SCALE: f64 = 30.0;
/// Cost per unit of elevation gained on a step
const CLIMB_COST_SCALE: f64 = 10.0;

/// What kind of terrain a culture is adapted to
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CultureType {
    Wildland,
    Generic,
    Lake,
    Naval,
    River,
    Nomadic,
    Hunting,
    Highland,
}

impl CultureType {
    /// How aggressively this type expands before the random factor
    pub fn base_expansionism(self) -> f64 {
        match self {
            CultureType::Wildland => 0.2,
            CultureType::Generic => 1.0,
            CultureType::Lake => 0.8,
            CultureType::Naval => 1.4,
            CultureType::River => 0.9,
            CultureType::Nomadic => 1.5,
            CultureType::Hunting => 0.7,
            CultureType::Highland => 0.6,
        }
    }

    /// Cost of entering a biome; infinite refuses entry outright
    pub(crate) fn biome_penalty(self, biome: Biome) -> f64 {
        use Biome::*;
        match biome {
            Ocean => match self {
                CultureType::Naval => 4.0,
                _ => f64::INFINITY,
            },
            Lake => match self {
                CultureType::Lake => 0.5,
                CultureType::Naval => 1.0,
                _ => 6.0,
            },
            Glacier => 12.0,
            Tundra => match self {
                CultureType::Hunting => 3.0,
                _ => 6.0,
            },
            BorealForest => match self {
                CultureType::Hunting => 2.0,
                _ => 4.0,
            },
            TemperateGrassland => match self {
                CultureType::Nomadic => 0.5,
                _ => 1.5,
            },
            WoodlandShrubland => 2.0,
            TemperateSeasonalForest => match self {
                CultureType::Hunting => 1.0,
                _ => 2.0,
            },
            TemperateRainforest => 3.0,
            SubtropicalDesert => match self {
                CultureType::Nomadic => 2.0,
                _ => 8.0,
            },
            TropicalSeasonalForest => 3.0,
            TropicalRainforest => match self {
                CultureType::Hunting => 3.0,
                _ => 5.0,
            },
        }
    }
}

/// A culture anchored at its origin region
#[derive(Debug, Clone)]
pub struct Culture {
    pub name: String,
    pub origin: u32,
    pub culture_type: CultureType,
    /// Inversely scales expansion costs; higher spreads further
    pub expansionism: f64,
    pub(crate) language: Language,
}

impl Culture {
    /// The culture's naming language
    pub fn language(&self) -> &Language {
        &self.language
    }
}

/// Pick a culture type from the terrain around an origin region
pub(crate) fn decide_culture_type(base: &BaseWorld, r: u32) -> CultureType {
    let i = r as usize;
    let biome = base.r_biome[i];
    if biome.habitability() < 0.05 && !biome.is_water() {
        return CultureType::Wildland;
    }
    let lake_nearby = base
        .mesh()
        .neighbors(r)
        .iter()
        .any(|&nb| base.r_waterpool[nb as usize] > 0.0);
    if lake_nearby {
        return CultureType::Lake;
    }
    if base.r_dist_coast[i] == 0.0 {
        return CultureType::Naval;
    }
    if base.r_flux[i] > 10.0 * base.r_rainfall[i].max(1e-9) {
        return CultureType::River;
    }
    if matches!(biome, Biome::SubtropicalDesert | Biome::TemperateGrassland) {
        return CultureType::Nomadic;
    }
    if biome.is_forest() || biome == Biome::Tundra {
        return CultureType::Hunting;
    }
    if base.r_elevation[i] > 0.5 {
        return CultureType::Highland;
    }
    CultureType::Generic
}

impl Civilization {
    /// Pick culture origins by city fitness with mutual repulsion and
    /// give each a type, a language and an expansionism factor.
    pub(crate) fn seed_cultures(
        &mut self,
        base: &BaseWorld,
        count: usize,
        rng: &mut ChaCha8Rng,
    ) {
        let mut origins: Vec<u32> = Vec::new();
        for _ in 0..count {
            let scores = base.score_with_repulsion(BaseWorld::fitness_city_default, &origins);
            let best = scores
                .iter()
                .enumerate()
                .filter(|(_, &s)| s > -1.0)
                .max_by(|(_, a), (_, b)| a.total_cmp(b))
                .map(|(r, _)| r as u32);
            match best {
                Some(r) => origins.push(r),
                None => break,
            }
        }

        for origin in origins {
            self.found_culture(base, origin, rng);
        }
    }

    /// Create one culture at an origin region and return its id
    pub(crate) fn found_culture(
        &mut self,
        base: &BaseWorld,
        origin: u32,
        rng: &mut ChaCha8Rng,
    ) -> u32 {
        let culture_type = decide_culture_type(base, origin);
        let language = Language::generate(rng);
        let name = language.make_name(rng);
        let expansionism = culture_type.base_expansionism() * rng.gen_range(0.5..1.5);
        self.cultures.push(Culture {
            name,
            origin,
            culture_type,
            expansionism,
            language,
        });
        (self.cultures.len() - 1) as u32
    }

    /// Cost for a culture to step from one region into a neighbor
    fn culture_step_cost(&self, base: &BaseWorld, culture: u32, from: u32, to: u32) -> Option<f64> {
        let c = &self.cultures[culture as usize];
        let penalty = c.culture_type.biome_penalty(base.r_biome[to as usize]);
        if !penalty.is_finite() {
            return None;
        }
        let arc = great_arc(base.mesh().position(from), base.mesh().position(to));
        let climb = (base.r_elevation[to as usize] - base.r_elevation[from as usize]).max(0.0);
        Some((penalty + ARC_COST_SCALE * arc + CLIMB_COST_SCALE * climb) / c.expansionism)
    }

    /// Assign each region to the culture reaching it at the lowest cost
    ///
    /// Multi-source Dijkstra from the culture origins. Regions whose
    /// cheapest reaching cost exceeds the neutral cutoff stay unclaimed.
    pub(crate) fn expand_cultures(&mut self, base: &BaseWorld) {
        let num = base.mesh().num_regions();
        let mut best_cost = vec![f64::INFINITY; num];
        let mut heap: MinHeap<(u32, u32)> = MinHeap::new();

        for (id, culture) in self.cultures.iter().enumerate() {
            best_cost[culture.origin as usize] = 0.0;
            self.r_culture[culture.origin as usize] = id as i32;
            heap.push(0.0, (culture.origin, id as u32));
        }

        while let Some((cost, (r, culture))) = heap.pop() {
            if cost > best_cost[r as usize] || self.r_culture[r as usize] != culture as i32 {
                continue; // superseded entry
            }
            for nb in base.mesh().neighbors(r) {
                let Some(step) = self.culture_step_cost(base, culture, r, nb) else {
                    continue;
                };
                let next = cost + step;
                if next >= NEUTRAL_CUTOFF || next >= best_cost[nb as usize] {
                    continue;
                }
                best_cost[nb as usize] = next;
                self.r_culture[nb as usize] = culture as i32;
                heap.push(next, (nb, culture));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::NO_REGION;
    use crate::civ::test_support::base_world;
    use crate::rng::{stage, stage_rng};

    fn seeded_civ(n: usize, seed: u64) -> (BaseWorld, Civilization) {
        let (base, config) = base_world(n, seed);
        let num = base.mesh().num_regions();
        let mut civ = Civilization {
            r_culture: vec![NO_REGION; num],
            r_city: vec![NO_REGION; num],
            r_city_state: vec![NO_REGION; num],
            r_empire: vec![NO_REGION; num],
            r_route_endpoints: vec![Vec::new(); num],
            ..Civilization::default()
        };
        let mut rng = stage_rng(seed, stage::CULTURES);
        civ.seed_cultures(&base, config.num_cultures, &mut rng);
        civ.expand_cultures(&base);
        (base, civ)
    }

    #[test]
    fn test_cultures_have_land_origins() {
        let (base, civ) = seeded_civ(2000, 1);
        assert!(!civ.cultures.is_empty());
        for culture in &civ.cultures {
            assert!(!base.is_water(culture.origin));
        }
    }

    #[test]
    fn test_origins_own_their_culture() {
        let (_, civ) = seeded_civ(2000, 2);
        for (id, culture) in civ.cultures.iter().enumerate() {
            assert_eq!(civ.r_culture[culture.origin as usize], id as i32);
        }
    }

    #[test]
    fn test_expansion_claims_some_regions() {
        let (base, civ) = seeded_civ(2000, 3);
        let claimed = civ.r_culture.iter().filter(|&&c| c >= 0).count();
        assert!(claimed > civ.cultures.len(), "expansion must spread");
        // Non-naval cultures never claim open ocean.
        for r in 0..base.mesh().num_regions() {
            let c = civ.r_culture[r];
            if c >= 0 && base.r_biome[r] == Biome::Ocean {
                assert_eq!(
                    civ.cultures[c as usize].culture_type,
                    CultureType::Naval
                );
            }
        }
    }

    #[test]
    fn test_expansionism_within_bounds() {
        let (_, civ) = seeded_civ(1500, 4);
        for culture in &civ.cultures {
            let base = culture.culture_type.base_expansionism();
            assert!(culture.expansionism >= base * 0.5);
            assert!(culture.expansionism <= base * 1.5);
        }
    }
}
