//! Trade routes between cities of the same empire
//!
//! Routes are found with A* over land regions. Edges already carried by
//! an earlier route get a steep discount, so later routes bend toward
//! shared corridors instead of cutting parallel paths.

use std::collections::{HashMap, HashSet};

use crate::base::BaseWorld;
use crate::civ::Civilization;
use crate::geometry::great_arc;
use crate::queue::MinHeap;

/// Multiplier on an edge both endpoints of an existing route share
const USED_EDGE_FACTOR: f64 = 0.25;
/// Multiplier on a fresh edge, making reuse attractive
const FRESH_EDGE_FACTOR: f64 = 4.0;
/// Slope resistance scale applied to squared steepness
const SLOPE_FACTOR: f64 = 3.0;
/// Multiplier for following the shoreline
const COAST_FACTOR: f64 = 0.75;
/// Multiplier for fording a high-flux region
const RIVER_CROSS_FACTOR: f64 = 1.4;
/// Multiplier for travelling along a river
const RIVER_ALONG_FACTOR: f64 = 0.8;
/// Flat toll for stepping across an empire border
const BORDER_TOLL: f64 = 1.2;
/// Multiplier for stepping into a city region
const CITY_FACTOR: f64 = 0.25;

/// A found overland route between two cities
#[derive(Debug, Clone)]
pub struct TradeRoute {
    /// Index into the city list
    pub from_city: u32,
    pub to_city: u32,
    /// Regions visited, endpoints included
    pub path: Vec<u32>,
}

fn undirected(a: u32, b: u32) -> (u32, u32) {
    (a.min(b), a.max(b))
}

impl Civilization {
    /// Cost of one caravan step, or `None` when the step is impassable
    fn trade_step_cost(
        &self,
        base: &BaseWorld,
        used: &HashSet<(u32, u32)>,
        from: u32,
        to: u32,
    ) -> Option<f64> {
        if base.is_water(to) {
            return None;
        }
        let arc = great_arc(base.mesh().position(from), base.mesh().position(to));
        let steep = base.steepness(to);
        let mut cost = arc * (1.0 + SLOPE_FACTOR * steep * steep);
        cost *= if used.contains(&undirected(from, to)) {
            USED_EDGE_FACTOR
        } else {
            FRESH_EDGE_FACTOR
        };
        if base.r_dist_coast[to as usize] == 0.0 {
            cost *= COAST_FACTOR;
        }
        match (base.is_riverine(from), base.is_riverine(to)) {
            (false, true) => cost *= RIVER_CROSS_FACTOR,
            (true, true) => cost *= RIVER_ALONG_FACTOR,
            _ => {}
        }
        if self.r_empire[from as usize] != self.r_empire[to as usize] {
            cost += BORDER_TOLL;
        }
        if self.r_city[to as usize] >= 0 && self.cities[self.r_city[to as usize] as usize].region == to
        {
            cost *= CITY_FACTOR;
        }
        Some(cost)
    }

    /// A* from one region to another; heuristic is the great-arc distance
    fn find_route(
        &self,
        base: &BaseWorld,
        used: &HashSet<(u32, u32)>,
        start: u32,
        goal: u32,
    ) -> Option<Vec<u32>> {
        let goal_pos = base.mesh().position(goal);
        let mut best_g: HashMap<u32, f64> = HashMap::new();
        let mut came_from: HashMap<u32, u32> = HashMap::new();
        let mut heap: MinHeap<u32> = MinHeap::new();
        best_g.insert(start, 0.0);
        heap.push(great_arc(base.mesh().position(start), goal_pos), start);

        while let Some((_, r)) = heap.pop() {
            if r == goal {
                let mut path = vec![goal];
                let mut cursor = goal;
                while let Some(&prev) = came_from.get(&cursor) {
                    path.push(prev);
                    cursor = prev;
                }
                path.reverse();
                return Some(path);
            }
            let g = best_g[&r];
            for nb in base.mesh().neighbors(r) {
                let Some(step) = self.trade_step_cost(base, used, r, nb) else {
                    continue;
                };
                let next_g = g + step;
                if best_g.get(&nb).map_or(true, |&old| next_g < old) {
                    best_g.insert(nb, next_g);
                    came_from.insert(nb, r);
                    let h = great_arc(base.mesh().position(nb), goal_pos);
                    heap.push(next_g + h, nb);
                }
            }
        }
        None
    }

    /// Connect every same-empire city pair, nearest pairs first
    ///
    /// Unreachable pairs, e.g. cities split across islands, are skipped.
    pub(crate) fn build_trade_routes(&mut self, base: &BaseWorld) {
        let mut used: HashSet<(u32, u32)> = HashSet::new();

        for empire_id in 0..self.empires.len() as i32 {
            let members: Vec<u32> = (0..self.cities.len() as u32)
                .filter(|&c| self.r_empire[self.cities[c as usize].region as usize] == empire_id)
                .collect();

            let mut pairs: Vec<(u32, u32)> = Vec::new();
            for (i, &a) in members.iter().enumerate() {
                for &b in &members[i + 1..] {
                    pairs.push((a, b));
                }
            }
            pairs.sort_by(|&(a1, b1), &(a2, b2)| {
                let d1 = great_arc(
                    base.mesh().position(self.cities[a1 as usize].region),
                    base.mesh().position(self.cities[b1 as usize].region),
                );
                let d2 = great_arc(
                    base.mesh().position(self.cities[a2 as usize].region),
                    base.mesh().position(self.cities[b2 as usize].region),
                );
                d1.total_cmp(&d2)
            });

            for (from_city, to_city) in pairs {
                let start = self.cities[from_city as usize].region;
                let goal = self.cities[to_city as usize].region;
                let Some(path) = self.find_route(base, &used, start, goal) else {
                    continue;
                };
                for pair in path.windows(2) {
                    used.insert(undirected(pair[0], pair[1]));
                }
                for &r in &path {
                    self.r_route_endpoints[r as usize].push((from_city, to_city));
                }
                self.trade_routes.push(TradeRoute {
                    from_city,
                    to_city,
                    path,
                });
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

    fn with_routes(n: usize, seed: u64) -> (BaseWorld, Civilization) {
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
        civ.build_trade_routes(&base);
        (base, civ)
    }

    #[test]
    fn test_routes_connect_distinct_cities_over_land() {
        let (base, civ) = with_routes(2500, 1);
        for route in &civ.trade_routes {
            assert_ne!(route.from_city, route.to_city);
            assert!(route.path.len() >= 2);
            assert_eq!(route.path[0], civ.cities[route.from_city as usize].region);
            assert_eq!(
                *route.path.last().unwrap(),
                civ.cities[route.to_city as usize].region
            );
            for &r in &route.path[1..] {
                assert!(!base.is_water(r), "route crosses water at {}", r);
            }
        }
    }

    #[test]
    fn test_route_paths_follow_mesh_adjacency() {
        let (base, civ) = with_routes(2000, 2);
        for route in &civ.trade_routes {
            for pair in route.path.windows(2) {
                assert!(
                    base.mesh().neighbors(pair[0]).contains(&pair[1]),
                    "non-adjacent step {} -> {}",
                    pair[0],
                    pair[1]
                );
            }
        }
    }

    #[test]
    fn test_route_regions_record_their_city_pairs() {
        let (_, civ) = with_routes(2000, 3);
        for route in &civ.trade_routes {
            for &r in &route.path {
                assert!(civ.r_route_endpoints[r as usize]
                    .contains(&(route.from_city, route.to_city)));
            }
        }
    }

    #[test]
    fn test_later_routes_share_corridors() {
        let (_, civ) = with_routes(2500, 4);
        if civ.trade_routes.len() < 3 {
            return; // too few cities in one empire to measure reuse
        }
        let mut edge_counts: HashMap<(u32, u32), u32> = HashMap::new();
        for route in &civ.trade_routes {
            for pair in route.path.windows(2) {
                *edge_counts.entry(undirected(pair[0], pair[1])).or_insert(0) += 1;
            }
        }
        let shared = edge_counts.values().filter(|&&c| c > 1).count();
        assert!(shared > 0, "no edge is reused by a second route");
    }
}
