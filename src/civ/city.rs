//! City placement by fitness and same-type repulsion

use rand_chacha::ChaCha8Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::base::BaseWorld;
use crate::civ::Civilization;
use crate::config::CityCounts;
use crate::regions::Biome;

/// What a city was founded for
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CityType {
    Default,
    Trading,
    Mining,
    Farming,
    DesertOasis,
}

impl CityType {
    /// Placement order; earlier types get the pick of the map
    pub const ALL: [CityType; 5] = [
        CityType::Default,
        CityType::Trading,
        CityType::Mining,
        CityType::Farming,
        CityType::DesertOasis,
    ];
}

/// A founded city
#[derive(Debug, Clone)]
pub struct City {
    pub name: String,
    pub region: u32,
    pub city_type: CityType,
    /// Placement fitness at founding time
    pub score: f64,
    /// Index into the culture list
    pub culture: u32,
}

/// Coastal trading post: requires the shore, likes river mouths
fn fitness_city_trading(base: &BaseWorld, r: u32) -> f64 {
    if base.is_water(r) || base.r_dist_coast[r as usize] > 0.0 {
        return -1.0;
    }
    let i = r as usize;
    let river = base.r_flux[i] / (base.r_flux[i] + 1.0);
    let flat = 1.0 - base.steepness(r);
    let score = 0.5 + 0.3 * river + 0.2 * flat;
    2.0 * score.clamp(0.0, 1.0) - 1.0
}

/// Mining town: steep mineral-bearing mountains
fn fitness_city_mining(base: &BaseWorld, r: u32) -> f64 {
    let mountain = base.fitness_steep_mountains(r);
    if mountain <= -1.0 {
        return -1.0;
    }
    let wealth = (base.resource_value(r) as f64 / 16.0).min(1.0);
    let score = 0.5 * (mountain + 1.0) / 2.0 + 0.5 * wealth;
    2.0 * score.clamp(0.0, 1.0) - 1.0
}

/// Desert oasis: a desert region touching standing water
fn fitness_city_oasis(base: &BaseWorld, r: u32) -> f64 {
    if base.r_biome[r as usize] != Biome::SubtropicalDesert {
        return -1.0;
    }
    let watered = base
        .mesh()
        .neighbors(r)
        .iter()
        .any(|&nb| base.is_water(nb))
        || base.r_flux[r as usize] > base.r_rainfall[r as usize] * 2.0;
    if !watered {
        return -1.0;
    }
    let flat = 1.0 - base.steepness(r);
    2.0 * (0.6 + 0.4 * flat).clamp(0.0, 1.0) - 1.0
}

fn fitness_for(city_type: CityType) -> fn(&BaseWorld, u32) -> f64 {
    match city_type {
        CityType::Default => BaseWorld::fitness_city_default,
        CityType::Trading => fitness_city_trading,
        CityType::Mining => fitness_city_mining,
        CityType::Farming => BaseWorld::fitness_arable_land,
        CityType::DesertOasis => fitness_city_oasis,
    }
}

impl Civilization {
    /// Place all cities type by type
    ///
    /// Each new city takes the highest fitness-times-repulsion score
    /// among regions not already holding a city; a type with no valid
    /// region left simply places fewer cities. A city landing outside
    /// every culture founds one of its own.
    pub(crate) fn place_cities(
        &mut self,
        base: &BaseWorld,
        counts: &CityCounts,
        rng: &mut ChaCha8Rng,
    ) {
        for city_type in CityType::ALL {
            let count = match city_type {
                CityType::Default => counts.default,
                CityType::Trading => counts.trading,
                CityType::Mining => counts.mining,
                CityType::Farming => counts.farming,
                CityType::DesertOasis => counts.desert_oasis,
            };
            let fitness = fitness_for(city_type);

            for _ in 0..count {
                let same_type: Vec<u32> = self
                    .cities
                    .iter()
                    .filter(|c| c.city_type == city_type)
                    .map(|c| c.region)
                    .collect();
                let scores = base.score_with_repulsion(fitness, &same_type);
                let best = scores
                    .iter()
                    .enumerate()
                    .filter(|(r, &s)| s > -1.0 && self.r_city_site_free(*r as u32))
                    .max_by(|(_, a), (_, b)| a.total_cmp(b));
                let Some((region, &score)) = best else {
                    break; // no valid site left for this type
                };
                if score < 0.0 && !same_type.is_empty() {
                    break; // only poor, crowded sites remain
                }
                self.found_city(base, region as u32, city_type, score, rng);
            }
        }
    }

    /// True when no city occupies the region yet
    fn r_city_site_free(&self, r: u32) -> bool {
        self.cities.iter().all(|c| c.region != r)
    }

    fn found_city(
        &mut self,
        base: &BaseWorld,
        region: u32,
        city_type: CityType,
        score: f64,
        rng: &mut ChaCha8Rng,
    ) {
        let culture = match self.r_culture[region as usize] {
            c if c >= 0 => c as u32,
            _ => {
                // Beyond every culture's reach: the city brings its own.
                let id = self.found_culture(base, region, rng);
                self.r_culture[region as usize] = id as i32;
                id
            }
        };
        let name = self.cultures[culture as usize].language.make_name(rng);
        self.cities.push(City {
            name,
            region,
            city_type,
            score,
            culture,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::NO_REGION;
    use crate::civ::test_support::base_world;
    use crate::rng::{stage, stage_rng};

    fn placed(n: usize, seed: u64) -> (BaseWorld, Civilization) {
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
        let mut culture_rng = stage_rng(seed, stage::CULTURES);
        civ.seed_cultures(&base, config.num_cultures, &mut culture_rng);
        civ.expand_cultures(&base);
        let mut city_rng = stage_rng(seed, stage::CITIES);
        civ.place_cities(&base, &config.cities, &mut city_rng);
        (base, civ)
    }

    #[test]
    fn test_cities_on_dry_land_with_unique_sites() {
        let (base, civ) = placed(2500, 1);
        assert!(!civ.cities.is_empty());
        let mut sites: Vec<u32> = civ.cities.iter().map(|c| c.region).collect();
        sites.sort_unstable();
        let before = sites.len();
        sites.dedup();
        assert_eq!(sites.len(), before, "one city per region");
        for city in &civ.cities {
            assert!(base.r_elevation[city.region as usize] > 0.0);
        }
    }

    #[test]
    fn test_every_city_has_a_culture_and_name() {
        let (_, civ) = placed(2500, 2);
        for city in &civ.cities {
            assert!((city.culture as usize) < civ.cultures.len());
            assert!(!city.name.is_empty());
        }
    }

    #[test]
    fn test_trading_cities_sit_on_the_coast() {
        let (base, civ) = placed(2500, 3);
        for city in &civ.cities {
            if city.city_type == CityType::Trading {
                assert_eq!(base.r_dist_coast[city.region as usize], 0.0);
            }
        }
    }

    #[test]
    fn test_oasis_cities_are_in_deserts() {
        let (base, civ) = placed(2500, 4);
        for city in &civ.cities {
            if city.city_type == CityType::DesertOasis {
                assert_eq!(base.r_biome[city.region as usize], Biome::SubtropicalDesert);
            }
        }
    }
}
