//! Territory growth: city lands, city-states and empires
//!
//! All three passes are min-priority-queue frontier expansions over a
//! terrain weight. City lands never leave dry land; empire growth may
//! cross water at a stiff landing penalty so offshore islands still end
//! up owned.

use std::collections::HashMap;

use crate::base::{BaseWorld, NO_REGION};
use crate::civ::Civilization;
use crate::geometry::great_arc;
use crate::queue::MinHeap;

/// Cost multiplier for gaining elevation; descending costs a tenth of it
const UPHILL_COST: f64 = 4.0;
/// Added cost for crossing a river, approximating a natural border
const RIVER_CROSS_COST: f64 = 0.5;
/// Added cost for an empire frontier stepping between land and water
const SHORE_LANDING_COST: f64 = 2.0;

/// A city-state: the top-ranked cities and the city lands they absorb
#[derive(Debug, Clone)]
pub struct CityState {
    pub name: String,
    /// Index into the city list
    pub capital_city: u32,
    pub capital_region: u32,
    /// Index into the empire list, or −1 while independent
    pub empire: i32,
}

/// An empire anchored at a city-state capital
#[derive(Debug, Clone)]
pub struct Empire {
    pub name: String,
    pub capital_city: u32,
    pub capital_region: u32,
}

/// Weight of one land-only territory step, or `None` when refused
///
/// The ghost pole is refused too; it is a triangulation artifact, not
/// terrain.
fn territory_step(base: &BaseWorld, from: u32, to: u32) -> Option<f64> {
    let ghost = base.mesh().ghost_region();
    if from == ghost || to == ghost || base.is_water(to) || base.is_water(from) {
        return None;
    }
    let mut w = great_arc(base.mesh().position(from), base.mesh().position(to));
    let dh = base.r_elevation[to as usize] - base.r_elevation[from as usize];
    w += if dh > 0.0 {
        dh * UPHILL_COST
    } else {
        -dh * UPHILL_COST * 0.1
    };
    if base.is_riverine(to) && !base.is_riverine(from) {
        w += RIVER_CROSS_COST;
    }
    Some(w)
}

/// Weight of one empire step; water is passable but landing costs extra
fn empire_step(base: &BaseWorld, from: u32, to: u32) -> f64 {
    let arc = great_arc(base.mesh().position(from), base.mesh().position(to));
    let from_water = base.is_water(from);
    let to_water = base.is_water(to);
    if from_water != to_water {
        return arc + SHORE_LANDING_COST;
    }
    if to_water {
        return arc * 0.5; // open water moves fast
    }
    let dh = base.r_elevation[to as usize] - base.r_elevation[from as usize];
    arc + if dh > 0.0 {
        dh * UPHILL_COST
    } else {
        -dh * UPHILL_COST * 0.1
    }
}

impl Civilization {
    /// Run all three territory passes
    pub(crate) fn grow_territories(
        &mut self,
        base: &BaseWorld,
        num_territories: usize,
        num_empires: usize,
    ) {
        if self.cities.is_empty() {
            return;
        }
        self.assign_city_lands(base);
        self.form_city_states(base, num_territories);
        self.form_empires(base, num_empires);
    }

    /// Pass 1: every land region joins its cheapest-to-reach city
    fn assign_city_lands(&mut self, base: &BaseWorld) {
        let num = base.mesh().num_regions();
        let mut best = vec![f64::INFINITY; num];
        let mut heap: MinHeap<(u32, u32)> = MinHeap::new();
        for (id, city) in self.cities.iter().enumerate() {
            best[city.region as usize] = 0.0;
            self.r_city[city.region as usize] = id as i32;
            heap.push(0.0, (city.region, id as u32));
        }
        while let Some((cost, (r, city))) = heap.pop() {
            if cost > best[r as usize] || self.r_city[r as usize] != city as i32 {
                continue;
            }
            for nb in base.mesh().neighbors(r) {
                let Some(step) = territory_step(base, r, nb) else {
                    continue;
                };
                let next = cost + step;
                if next < best[nb as usize] {
                    best[nb as usize] = next;
                    self.r_city[nb as usize] = city as i32;
                    heap.push(next, (nb, city));
                }
            }
        }
    }

    /// Pass 2: the top-ranked cities absorb neighboring city lands
    ///
    /// City-states grow over the city adjacency graph rather than over
    /// regions, so their borders never split a city's land.
    fn form_city_states(&mut self, base: &BaseWorld, num_territories: usize) {
        let count = num_territories.min(self.cities.len());
        if count == 0 {
            return;
        }

        // Rank city indices by placement score, best first.
        let mut ranked: Vec<u32> = (0..self.cities.len() as u32).collect();
        ranked.sort_by(|&p, &q| {
            self.cities[q as usize]
                .score
                .total_cmp(&self.cities[p as usize].score)
        });

        for &city in ranked.iter().take(count) {
            let capital = &self.cities[city as usize];
            self.city_states.push(CityState {
                name: capital.name.clone(),
                capital_city: city,
                capital_region: capital.region,
                empire: -1,
            });
        }

        // City adjacency from the pass-1 map: two cities are neighbors
        // when their lands share a border.
        let mut adjacency: HashMap<u32, Vec<u32>> = HashMap::new();
        for r in 0..base.mesh().num_regions() as u32 {
            let a = self.r_city[r as usize];
            if a < 0 {
                continue;
            }
            for nb in base.mesh().neighbors(r) {
                let b = self.r_city[nb as usize];
                if b >= 0 && b != a {
                    let entry = adjacency.entry(a as u32).or_default();
                    if !entry.contains(&(b as u32)) {
                        entry.push(b as u32);
                    }
                }
            }
        }

        // Dijkstra over cities from the capitals.
        let mut owner = vec![-1i32; self.cities.len()];
        let mut best = vec![f64::INFINITY; self.cities.len()];
        let mut heap: MinHeap<(u32, u32)> = MinHeap::new();
        for (state_id, state) in self.city_states.iter().enumerate() {
            owner[state.capital_city as usize] = state_id as i32;
            best[state.capital_city as usize] = 0.0;
            heap.push(0.0, (state.capital_city, state_id as u32));
        }
        while let Some((cost, (city, state))) = heap.pop() {
            if cost > best[city as usize] || owner[city as usize] != state as i32 {
                continue;
            }
            let Some(neighbors) = adjacency.get(&city) else {
                continue;
            };
            for &next_city in neighbors {
                let step = great_arc(
                    base.mesh().position(self.cities[city as usize].region),
                    base.mesh().position(self.cities[next_city as usize].region),
                );
                let next = cost + step;
                if next < best[next_city as usize] {
                    best[next_city as usize] = next;
                    owner[next_city as usize] = state as i32;
                    heap.push(next, (next_city, state));
                }
            }
        }

        // Project the city ownership back onto regions.
        for r in 0..base.mesh().num_regions() {
            let city = self.r_city[r];
            if city >= 0 {
                self.r_city_state[r] = owner[city as usize];
            }
        }
    }

    /// Pass 3: empires grow from the strongest city-state capitals
    ///
    /// Capitals are ranked by placement score times their culture's
    /// expansionism. Any city-state whose capital region falls inside an
    /// empire's reach joins that empire wholesale.
    fn form_empires(&mut self, base: &BaseWorld, num_empires: usize) {
        let count = num_empires.min(self.city_states.len());
        if count == 0 {
            return;
        }

        let strength = |state: &CityState| -> f64 {
            let city = &self.cities[state.capital_city as usize];
            city.score * self.cultures[city.culture as usize].expansionism
        };
        let mut ranked: Vec<u32> = (0..self.city_states.len() as u32).collect();
        ranked.sort_by(|&p, &q| {
            strength(&self.city_states[q as usize]).total_cmp(&strength(&self.city_states[p as usize]))
        });

        for &state_id in ranked.iter().take(count) {
            let state = &self.city_states[state_id as usize];
            self.empires.push(Empire {
                name: state.name.clone(),
                capital_city: state.capital_city,
                capital_region: state.capital_region,
            });
        }

        // Region-level growth, water passable, from the empire capitals.
        let num = base.mesh().num_regions();
        let mut reach = vec![NO_REGION; num];
        let mut best = vec![f64::INFINITY; num];
        let mut heap: MinHeap<(u32, u32)> = MinHeap::new();
        for (id, empire) in self.empires.iter().enumerate() {
            best[empire.capital_region as usize] = 0.0;
            reach[empire.capital_region as usize] = id as i32;
            heap.push(0.0, (empire.capital_region, id as u32));
        }
        while let Some((cost, (r, empire))) = heap.pop() {
            if cost > best[r as usize] || reach[r as usize] != empire as i32 {
                continue;
            }
            for nb in base.mesh().neighbors(r) {
                let next = cost + empire_step(base, r, nb);
                if next < best[nb as usize] {
                    best[nb as usize] = next;
                    reach[nb as usize] = empire as i32;
                    heap.push(next, (nb, empire));
                }
            }
        }

        // City-states join the empire whose reach covers their capital.
        for state in &mut self.city_states {
            state.empire = reach[state.capital_region as usize];
        }

        // Regions follow their city-state's allegiance where one exists;
        // unorganized land keeps the raw reach.
        for r in 0..num {
            let state = self.r_city_state[r];
            self.r_empire[r] = if state >= 0 {
                self.city_states[state as usize].empire
            } else {
                reach[r]
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::civ::test_support::base_world;
    use crate::config::WorldConfig;
    use crate::rng::{stage, stage_rng};

    fn grown(n: usize, seed: u64) -> (BaseWorld, WorldConfig, Civilization) {
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
        civ.grow_territories(&base, config.num_territories, config.num_empires);
        (base, config, civ)
    }

    #[test]
    fn test_land_ownership_follows_reachability() {
        // City lands stop at the shoreline, so only landmasses that host
        // a city get any; empires cross water and claim all land.
        for seed in 0..3 {
            let (base, _, civ) = grown(2500, seed);
            let mut hosts_city = vec![false; base.landmass_size.len()];
            for city in &civ.cities {
                let lm = base.r_landmass[city.region as usize];
                if lm >= 0 {
                    hosts_city[lm as usize] = true;
                }
            }
            for r in 0..base.mesh().num_regions() as u32 {
                if base.is_water(r) || r == base.mesh().ghost_region() {
                    continue;
                }
                assert!(
                    civ.r_empire[r as usize] >= 0,
                    "seed {}: region {} has no empire",
                    seed,
                    r
                );
                let lm = base.r_landmass[r as usize];
                let reachable = lm >= 0 && hosts_city[lm as usize];
                assert_eq!(
                    civ.r_city[r as usize] >= 0,
                    reachable,
                    "seed {}: city land on region {} contradicts its landmass",
                    seed,
                    r
                );
            }
        }
    }

    #[test]
    fn test_city_lands_are_land_only() {
        let (base, _, civ) = grown(2000, 2);
        for r in 0..base.mesh().num_regions() as u32 {
            if base.is_water(r) {
                assert_eq!(civ.r_city[r as usize], NO_REGION);
                assert_eq!(civ.r_city_state[r as usize], NO_REGION);
            }
        }
    }

    #[test]
    fn test_city_state_borders_follow_city_lands() {
        let (base, _, civ) = grown(2000, 3);
        for r in 0..base.mesh().num_regions() {
            let city = civ.r_city[r];
            if city >= 0 && civ.r_city_state[r] >= 0 {
                // All of one city's land belongs to one state.
                let state_of_city = civ.r_city_state[civ.cities[city as usize].region as usize];
                assert_eq!(civ.r_city_state[r], state_of_city);
            }
        }
    }

    #[test]
    fn test_counts_respect_config() {
        let (_, config, civ) = grown(2500, 4);
        assert!(civ.city_states.len() <= config.num_territories);
        assert!(civ.empires.len() <= config.num_empires);
        assert!(!civ.empires.is_empty());
    }

    #[test]
    fn test_city_states_join_existing_empires() {
        let (_, _, civ) = grown(2500, 5);
        for state in &civ.city_states {
            assert!(state.empire >= 0);
            assert!((state.empire as usize) < civ.empires.len());
        }
    }

    #[test]
    fn test_empire_capitals_own_themselves() {
        let (_, _, civ) = grown(2500, 6);
        for (id, empire) in civ.empires.iter().enumerate() {
            assert_eq!(civ.r_empire[empire.capital_region as usize], id as i32);
        }
    }
}
