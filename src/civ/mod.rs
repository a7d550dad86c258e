//! The civilization layer: cultures, cities, territories, empires,
//! religions and trade routes
//!
//! All of it derives from the finished geology; nothing here mutates the
//! base fields. Entities cross-reference each other by index so the
//! whole layer can be regenerated from the base world at any time.

pub(crate) mod city;
pub(crate) mod culture;
pub(crate) mod names;
pub(crate) mod religion;
pub(crate) mod territory;
pub(crate) mod trade;

use tracing::debug;

use crate::base::{BaseWorld, NO_REGION};
use crate::calendar::{Calendar, EventKind, History, HistoryEvent, ObjectKind, ObjectRef};
use crate::config::WorldConfig;
use crate::rng::{stage, stage_rng};

pub use city::{City, CityType};
pub use culture::{Culture, CultureType};
pub use names::Language;
pub use religion::{Religion, ReligionKind};
pub use territory::{CityState, Empire};
pub use trade::TradeRoute;

/// Everything the civilization passes produce
///
/// Per-region maps use [`NO_REGION`] for unclaimed regions.
#[derive(Debug, Clone, Default)]
pub struct Civilization {
    pub(crate) cultures: Vec<Culture>,
    pub(crate) r_culture: Vec<i32>,
    pub(crate) cities: Vec<City>,
    pub(crate) r_city: Vec<i32>,
    pub(crate) city_states: Vec<CityState>,
    pub(crate) r_city_state: Vec<i32>,
    pub(crate) empires: Vec<Empire>,
    pub(crate) r_empire: Vec<i32>,
    pub(crate) religions: Vec<Religion>,
    pub(crate) trade_routes: Vec<TradeRoute>,
    /// City pairs whose route crosses each region
    pub(crate) r_route_endpoints: Vec<Vec<(u32, u32)>>,
}

impl Civilization {
    /// Run every civilization pass over a finished base world
    pub(crate) fn generate(
        base: &BaseWorld,
        config: &WorldConfig,
        calendar: &Calendar,
        history: &mut History,
    ) -> Self {
        let num = base.mesh().num_regions();
        let mut civ = Civilization {
            r_culture: vec![NO_REGION; num],
            r_city: vec![NO_REGION; num],
            r_city_state: vec![NO_REGION; num],
            r_empire: vec![NO_REGION; num],
            r_route_endpoints: vec![Vec::new(); num],
            ..Civilization::default()
        };
        let year = calendar.year();

        let mut culture_rng = stage_rng(base.seed, stage::CULTURES);
        civ.seed_cultures(base, config.num_cultures, &mut culture_rng);
        civ.expand_cultures(base);
        for (id, culture) in civ.cultures.iter().enumerate() {
            history.record(HistoryEvent {
                year,
                kind: EventKind::CultureEmerged,
                message: format!("the {} culture emerges", culture.name),
                object: ObjectRef {
                    id: id as u32,
                    kind: ObjectKind::Culture,
                },
            });
        }

        let mut city_rng = stage_rng(base.seed, stage::CITIES);
        civ.place_cities(base, &config.cities, &mut city_rng);
        for (id, city) in civ.cities.iter().enumerate() {
            history.record(HistoryEvent {
                year,
                kind: EventKind::CityFounded,
                message: format!("{} is founded", city.name),
                object: ObjectRef {
                    id: id as u32,
                    kind: ObjectKind::City,
                },
            });
        }

        civ.grow_territories(base, config.num_territories, config.num_empires);
        for (id, state) in civ.city_states.iter().enumerate() {
            history.record(HistoryEvent {
                year,
                kind: EventKind::CityStateFormed,
                message: format!("the city-state of {} forms", state.name),
                object: ObjectRef {
                    id: id as u32,
                    kind: ObjectKind::CityState,
                },
            });
        }
        for (id, empire) in civ.empires.iter().enumerate() {
            history.record(HistoryEvent {
                year,
                kind: EventKind::EmpireFormed,
                message: format!("the empire of {} rises", empire.name),
                object: ObjectRef {
                    id: id as u32,
                    kind: ObjectKind::Empire,
                },
            });
        }

        let mut religion_rng = stage_rng(base.seed, stage::RELIGIONS);
        civ.found_religions(&mut religion_rng);
        for (id, religion) in civ.religions.iter().enumerate() {
            history.record(HistoryEvent {
                year,
                kind: EventKind::ReligionFounded,
                message: format!("{} takes root", religion.name),
                object: ObjectRef {
                    id: id as u32,
                    kind: ObjectKind::Religion,
                },
            });
        }

        civ.build_trade_routes(base);
        for (id, route) in civ.trade_routes.iter().enumerate() {
            history.record(HistoryEvent {
                year,
                kind: EventKind::RouteOpened,
                message: format!(
                    "a trade route opens between {} and {}",
                    civ.cities[route.from_city as usize].name,
                    civ.cities[route.to_city as usize].name
                ),
                object: ObjectRef {
                    id: id as u32,
                    kind: ObjectKind::TradeRoute,
                },
            });
        }

        debug!(
            cultures = civ.cultures.len(),
            cities = civ.cities.len(),
            city_states = civ.city_states.len(),
            empires = civ.empires.len(),
            religions = civ.religions.len(),
            routes = civ.trade_routes.len(),
            "civilization generated"
        );
        civ
    }

    /// All cultures, indexable by the ids in the per-region map
    pub fn cultures(&self) -> &[Culture] {
        &self.cultures
    }

    /// All cities
    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    /// All city-states
    pub fn city_states(&self) -> &[CityState] {
        &self.city_states
    }

    /// All empires
    pub fn empires(&self) -> &[Empire] {
        &self.empires
    }

    /// All religions, folk faiths first
    pub fn religions(&self) -> &[Religion] {
        &self.religions
    }

    /// All trade routes
    pub fn trade_routes(&self) -> &[TradeRoute] {
        &self.trade_routes
    }

    /// The culture claiming a region, if any
    pub fn culture_of(&self, r: u32) -> Option<&Culture> {
        let id = *self.r_culture.get(r as usize)?;
        (id >= 0).then(|| &self.cultures[id as usize])
    }

    /// The city whose lands contain a region, if any
    pub fn city_of(&self, r: u32) -> Option<&City> {
        let id = *self.r_city.get(r as usize)?;
        (id >= 0).then(|| &self.cities[id as usize])
    }

    /// The city-state a region belongs to, if any
    pub fn city_state_of(&self, r: u32) -> Option<&CityState> {
        let id = *self.r_city_state.get(r as usize)?;
        (id >= 0).then(|| &self.city_states[id as usize])
    }

    /// The empire a region belongs to, if any
    pub fn empire_of(&self, r: u32) -> Option<&Empire> {
        let id = *self.r_empire.get(r as usize)?;
        (id >= 0).then(|| &self.empires[id as usize])
    }

    /// City pairs whose trade route passes through a region
    pub fn routes_through(&self, r: u32) -> &[(u32, u32)] {
        self.r_route_endpoints
            .get(r as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::config::{ClimateOptions, WorldConfigBuilder};
    use crate::mesh::SphereMesh;
    use crate::rng::stage_rng;

    /// A small fully-generated base world for civilization tests
    pub(crate) fn base_world(n: usize, seed: u64) -> (BaseWorld, WorldConfig) {
        let config = WorldConfigBuilder::new()
            .seed(seed)
            .num_points(n)
            .num_plates(8)
            .build()
            .unwrap();
        let mesh = SphereMesh::build(n, config.jitter, seed).unwrap();
        let mut w = BaseWorld::new(mesh, seed);
        let opts = ClimateOptions::default();
        w.generate_tectonics(config.num_plates);
        w.generate_elevation();
        w.assign_temperature();
        w.assign_wind(&opts);
        w.assign_rainfall(&opts);
        let mut rng = stage_rng(seed, stage::HYDROLOGY);
        w.assign_flux();
        w.flood_lakes();
        w.fill_sinks(&mut rng);
        w.assign_flux();
        w.assign_waterbodies();
        w.assign_landmasses();
        w.assign_biomes();
        w.assign_feature_distances();
        w.assign_danger_fields();
        w.place_resources();
        (w, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_support::base_world;

    #[test]
    fn test_full_generation_produces_entities() {
        let (base, config) = base_world(2000, 5);
        let calendar = Calendar::new();
        let mut history = History::new();
        let civ = Civilization::generate(&base, &config, &calendar, &mut history);
        assert!(!civ.cultures.is_empty());
        assert!(!civ.cities.is_empty());
        assert!(!history.events().is_empty());
    }

    #[test]
    fn test_cities_sit_on_land() {
        let (base, config) = base_world(2000, 6);
        let calendar = Calendar::new();
        let mut history = History::new();
        let civ = Civilization::generate(&base, &config, &calendar, &mut history);
        for city in &civ.cities {
            assert!(base.r_elevation[city.region as usize] > 0.0);
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let run = |seed: u64| {
            let (base, config) = base_world(1500, seed);
            let calendar = Calendar::new();
            let mut history = History::new();
            let civ = Civilization::generate(&base, &config, &calendar, &mut history);
            (
                civ.cultures.iter().map(|c| c.name.clone()).collect::<Vec<_>>(),
                civ.cities.iter().map(|c| (c.name.clone(), c.region)).collect::<Vec<_>>(),
                civ.r_empire,
            )
        };
        assert_eq!(run(11), run(11));
    }
}
