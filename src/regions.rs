//! Region labeling and properties: waterbodies, landmasses, biomes,
//! feature distances, natural-hazard scores and fitness functions
//!
//! Reads: elevation, waterpool, temperature, rainfall, flux and the
//! tectonic feature lists. Writes: the label arrays, size tables, distance
//! fields and danger fields.

use std::collections::VecDeque;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::base::{BaseWorld, NO_REGION, OTHER_KIND};

/// Rainfall units to decimeters of annual precipitation
const PRECIP_DM_SCALE: f64 = 20.0;
/// Landmasses at or under this many regions count as islands
const ISLAND_MAX_REGIONS: usize = 25;
/// Downhill decay of rockslide and eruption danger per region step
const DANGER_DECAY: f64 = 0.7;
/// Flux fraction that counts as a river for the distance field
const RIVER_FLUX_FRACTION: f64 = 0.02;

/// Whittaker-style biome classes
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Biome {
    Ocean,
    Lake,
    Glacier,
    Tundra,
    BorealForest,
    TemperateGrassland,
    WoodlandShrubland,
    TemperateSeasonalForest,
    TemperateRainforest,
    SubtropicalDesert,
    TropicalSeasonalForest,
    TropicalRainforest,
}

impl Biome {
    /// Classify a land region by annual temperature (°C) and precipitation
    /// (decimeters)
    pub fn classify(temperature_c: f64, precipitation_dm: f64) -> Self {
        let t = temperature_c;
        let p = precipitation_dm;
        if t < -10.0 {
            Biome::Glacier
        } else if t < 0.0 {
            Biome::Tundra
        } else if t < 7.0 {
            if p < 2.5 {
                Biome::TemperateGrassland
            } else {
                Biome::BorealForest
            }
        } else if t < 20.0 {
            if p < 2.0 {
                Biome::TemperateGrassland
            } else if p < 5.0 {
                Biome::WoodlandShrubland
            } else if p < 12.0 {
                Biome::TemperateSeasonalForest
            } else {
                Biome::TemperateRainforest
            }
        } else if p < 4.0 {
            Biome::SubtropicalDesert
        } else if p < 16.0 {
            Biome::TropicalSeasonalForest
        } else {
            Biome::TropicalRainforest
        }
    }

    /// True for the submerged classes
    #[inline]
    pub fn is_water(&self) -> bool {
        matches!(self, Biome::Ocean | Biome::Lake)
    }

    /// True for forested classes
    #[inline]
    pub fn is_forest(&self) -> bool {
        matches!(
            self,
            Biome::BorealForest
                | Biome::TemperateSeasonalForest
                | Biome::TemperateRainforest
                | Biome::TropicalSeasonalForest
                | Biome::TropicalRainforest
        )
    }

    /// Rough habitability in [0, 1], used by fitness scoring
    pub fn habitability(&self) -> f64 {
        match self {
            Biome::Ocean | Biome::Lake => 0.0,
            Biome::Glacier => 0.02,
            Biome::Tundra => 0.15,
            Biome::SubtropicalDesert => 0.2,
            Biome::BorealForest => 0.45,
            Biome::WoodlandShrubland => 0.6,
            Biome::TemperateGrassland => 0.8,
            Biome::TropicalRainforest => 0.55,
            Biome::TropicalSeasonalForest => 0.7,
            Biome::TemperateRainforest => 0.75,
            Biome::TemperateSeasonalForest => 1.0,
        }
    }
}

/// Everything the generator knows about one region, bundled for callers
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionProperties {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    pub steepness: f64,
    pub biome: Biome,
    pub temperature_c: f64,
    pub rainfall: f64,
    pub flux: f64,
    pub waterpool: f64,
    pub distance_to_coast: f64,
    pub distance_to_mountain: f64,
    pub distance_to_river: f64,
    pub distance_to_volcano: f64,
    pub distance_to_faultline: f64,
    pub danger_rockslide: f64,
    pub danger_earthquake: f64,
    pub danger_volcano: f64,
    pub danger_flood: f64,
    pub is_valley: bool,
    pub is_island: bool,
}

impl BaseWorld {
    /// Label connected components among `member` regions
    ///
    /// Members of the same component share a label counting up from 0 in
    /// scan order, which makes labeling stable across runs; non-members
    /// get [`OTHER_KIND`]. Returns the labels and per-component sizes.
    fn label_components(&self, member: impl Fn(u32) -> bool) -> (Vec<i32>, Vec<usize>) {
        let num = self.mesh.num_regions();
        let mut labels = vec![OTHER_KIND; num];
        let mut sizes = Vec::new();
        let mut queue = VecDeque::new();

        for start in 0..num as u32 {
            if !member(start) || labels[start as usize] != OTHER_KIND {
                continue;
            }
            let label = sizes.len() as i32;
            labels[start as usize] = label;
            let mut count = 1usize;
            queue.push_back(start);
            while let Some(r) = queue.pop_front() {
                for nb in self.mesh.neighbors(r) {
                    if member(nb) && labels[nb as usize] == OTHER_KIND {
                        labels[nb as usize] = label;
                        count += 1;
                        queue.push_back(nb);
                    }
                }
            }
            sizes.push(count);
        }
        (labels, sizes)
    }

    /// Label waterbodies (connected water components)
    ///
    /// The ghost pole is excluded from both this and the landmass
    /// labeling, so the two size tables together cover exactly the real
    /// regions.
    pub(crate) fn assign_waterbodies(&mut self) {
        let ghost = self.mesh.ghost_region();
        let (labels, sizes) = self.label_components(|r| r != ghost && self.is_water(r));
        self.r_waterbody = labels;
        self.waterbody_size = sizes;
    }

    /// Label landmasses (connected land components)
    pub(crate) fn assign_landmasses(&mut self) {
        let ghost = self.mesh.ghost_region();
        let (labels, sizes) = self.label_components(|r| r != ghost && !self.is_water(r));
        self.r_landmass = labels;
        self.landmass_size = sizes;
        debug!(
            landmasses = self.landmass_size.len(),
            waterbodies = self.waterbody_size.len(),
            "component labeling"
        );
    }

    /// Classify every region's biome, then label same-biome components
    pub(crate) fn assign_biomes(&mut self) {
        for r in 0..self.mesh.num_regions() as u32 {
            let i = r as usize;
            self.r_biome[i] = if self.r_elevation[i] < 0.0 {
                Biome::Ocean
            } else if self.r_waterpool[i] > 0.0 {
                Biome::Lake
            } else {
                Biome::classify(self.r_temperature[i], self.r_rainfall[i] * PRECIP_DM_SCALE)
            };
        }

        // Same-biome connected components; every region belongs to one.
        let num = self.mesh.num_regions();
        let mut labels = vec![NO_REGION; num];
        let mut sizes = Vec::new();
        let mut queue = VecDeque::new();
        for start in 0..num as u32 {
            if labels[start as usize] != NO_REGION {
                continue;
            }
            let label = sizes.len() as i32;
            let biome = self.r_biome[start as usize];
            labels[start as usize] = label;
            let mut count = 1usize;
            queue.push_back(start);
            while let Some(r) = queue.pop_front() {
                for nb in self.mesh.neighbors(r) {
                    if labels[nb as usize] == NO_REGION && self.r_biome[nb as usize] == biome {
                        labels[nb as usize] = label;
                        count += 1;
                        queue.push_back(nb);
                    }
                }
            }
            sizes.push(count);
        }
        self.r_biome_region = labels;
        self.biome_region_size = sizes;
    }

    /// Land regions that border water
    pub(crate) fn coast_regions(&self) -> Vec<u32> {
        (0..self.mesh.num_regions() as u32)
            .filter(|&r| {
                !self.is_water(r) && self.mesh.neighbors(r).iter().any(|&nb| self.is_water(nb))
            })
            .collect()
    }

    /// BFS distances from every region to the nearest feature of each kind
    pub(crate) fn assign_feature_distances(&mut self) {
        let coast = self.coast_regions();
        self.r_dist_coast = self.distance_field(&coast, |_| false, false, None);

        let mountains = self.mountain_regions.clone();
        self.r_dist_mountain = self.distance_field(&mountains, |_| false, false, None);

        let max_flux = self.r_flux.iter().cloned().fold(0.0f64, f64::max);
        let river_regions: Vec<u32> = self
            .trace_rivers(RIVER_FLUX_FRACTION * max_flux)
            .into_iter()
            .flatten()
            .collect();
        self.r_dist_river = self.distance_field(&river_regions, |_| false, false, None);

        let volcanoes = self.volcano_regions.clone();
        self.r_dist_volcano = self.distance_field(&volcanoes, |_| false, false, None);

        let faults = self.faultline_regions.clone();
        self.r_dist_fault = self.distance_field(&faults, |_| false, false, None);
    }

    /// Natural-hazard scores per region, all in [0, 1]
    ///
    /// Earthquake danger is fault proximity times compression. Rockslide
    /// and eruption danger start at their sources (steep mountains,
    /// volcanoes) and decay down the downhill graph, so the hazard runs
    /// out into the valleys below. Flood danger is flux on flat ground.
    pub(crate) fn assign_danger_fields(&mut self) {
        let num = self.mesh.num_regions();

        let max_compression = self
            .r_compression
            .iter()
            .fold(0.0f64, |m, &c| m.max(c.abs()))
            .max(1e-12);
        for r in 0..num {
            let proximity = 1.0 / (1.0 + self.r_dist_fault[r]);
            let intensity = (self.r_compression[r].abs() / max_compression).min(1.0);
            self.r_danger_earthquake[r] = proximity * intensity;
        }

        let mut rockslide = vec![0.0f64; num];
        for &m in &self.mountain_regions {
            rockslide[m as usize] = self.steepness(m);
        }
        let mut eruption = vec![0.0f64; num];
        for &v in &self.volcano_regions {
            eruption[v as usize] = 1.0;
        }
        // Descending elevation order lets a single sweep carry each source
        // all the way down its drainage path.
        let mut order: Vec<u32> = (0..num as u32).collect();
        order.sort_by(|&p, &q| {
            self.r_elevation[q as usize].total_cmp(&self.r_elevation[p as usize])
        });
        for &r in &order {
            let dh = self.r_downhill[r as usize];
            if dh == NO_REGION {
                continue;
            }
            let dh = dh as usize;
            rockslide[dh] = rockslide[dh].max(rockslide[r as usize] * DANGER_DECAY);
            eruption[dh] = eruption[dh].max(eruption[r as usize] * DANGER_DECAY);
        }
        self.r_danger_rockslide = rockslide;
        self.r_danger_volcano = eruption;

        let max_flux = self.r_flux.iter().cloned().fold(0.0f64, f64::max).max(1e-12);
        for r in 0..num as u32 {
            let flat = 1.0 - self.steepness(r);
            self.r_danger_flood[r as usize] =
                (self.r_flux[r as usize] / max_flux) * flat;
        }
    }

    /// A valley: flat fertile inland ground with few lower neighbors
    pub(crate) fn is_valley(&self, r: u32) -> bool {
        if self.fitness_inland_valleys(r) < 0.3 {
            return false;
        }
        let h = self.r_elevation[r as usize];
        let lower = self
            .mesh
            .neighbors(r)
            .iter()
            .filter(|&&nb| self.r_elevation[nb as usize] < h)
            .count();
        lower <= 2
    }

    /// True when the region's landmass is island-sized
    pub(crate) fn is_island(&self, r: u32) -> bool {
        let label = self.r_landmass[r as usize];
        label >= 0 && self.landmass_size[label as usize] <= ISLAND_MAX_REGIONS
    }

    // Fitness functions score regions in [−1, 1]; −1 marks an invalid
    // location. Normalizations are saturating (x / (x + k)) rather than
    // divided by a global maximum, so a single call stays O(degree).

    /// High steep terrain, for mining and metal placement
    pub(crate) fn fitness_steep_mountains(&self, r: u32) -> f64 {
        if self.is_water(r) {
            return -1.0;
        }
        let score = 0.6 * self.steepness(r) + 0.4 * self.r_elevation[r as usize].max(0.0);
        2.0 * score.clamp(0.0, 1.0) - 1.0
    }

    /// Sheltered flat inland ground with through-flowing water
    pub(crate) fn fitness_inland_valleys(&self, r: u32) -> f64 {
        if self.is_water(r) {
            return -1.0;
        }
        let i = r as usize;
        let inland = self.r_dist_coast[i] / (self.r_dist_coast[i] + 10.0);
        let flux = self.r_flux[i] / (self.r_flux[i] + 1.0);
        let score = 0.4 * (1.0 - self.steepness(r)) + 0.3 * inland + 0.3 * flux;
        2.0 * score.clamp(0.0, 1.0) - 1.0
    }

    /// Flat ground with a growing climate, for farming
    pub(crate) fn fitness_arable_land(&self, r: u32) -> f64 {
        if self.is_water(r) {
            return -1.0;
        }
        let i = r as usize;
        let temp = (1.0 - (self.r_temperature[i] - 15.0).abs() / 30.0).max(0.0);
        let rain = self.r_rainfall[i] / (self.r_rainfall[i] + 0.5);
        let score = 0.4 * temp + 0.3 * rain + 0.3 * (1.0 - self.steepness(r));
        2.0 * score.clamp(0.0, 1.0) - 1.0
    }

    /// Comfortable temperature and moisture, regardless of terrain
    pub(crate) fn fitness_climate(&self, r: u32) -> f64 {
        if self.is_water(r) {
            return -1.0;
        }
        let i = r as usize;
        let temp = (1.0 - (self.r_temperature[i] - 18.0).abs() / 35.0).max(0.0);
        let rain = self.r_rainfall[i] / (self.r_rainfall[i] + 0.5);
        let score = 0.6 * temp + 0.4 * rain;
        2.0 * score.clamp(0.0, 1.0) - 1.0
    }

    /// Default city placement: water access, river flow, flat fertile land
    pub(crate) fn fitness_city_default(&self, r: u32) -> f64 {
        if self.is_water(r) {
            return -1.0;
        }
        let i = r as usize;
        let shore = if self.mesh.neighbors(r).iter().any(|&nb| self.is_water(nb)) {
            1.0
        } else {
            0.0
        };
        let river = self.r_flux[i] / (self.r_flux[i] + 1.0);
        let fertile = self.r_biome[i].habitability();
        let score = 0.3 * shore
            + 0.25 * river
            + 0.25 * fertile
            + 0.2 * (1.0 - self.steepness(r));
        2.0 * score.clamp(0.0, 1.0) - 1.0
    }

    /// Score every region by a fitness function, repelled from a region set
    ///
    /// Valid regions are scaled by their normalized BFS distance to the
    /// repel set, pushing new placements away from existing ones. An empty
    /// repel set leaves the fitness untouched.
    pub(crate) fn score_with_repulsion(
        &self,
        fitness: impl Fn(&Self, u32) -> f64,
        repel: &[u32],
    ) -> Vec<f64> {
        let num = self.mesh.num_regions() as u32;
        if repel.is_empty() {
            return (0..num).map(|r| fitness(self, r)).collect();
        }
        let dist = self.distance_field(repel, |_| false, false, None);
        let max_dist = dist
            .iter()
            .cloned()
            .filter(|d| d.is_finite())
            .fold(0.0f64, f64::max)
            .max(1.0);
        (0..num)
            .map(|r| {
                let f = fitness(self, r);
                if f <= -1.0 {
                    return -1.0;
                }
                f * (dist[r as usize] / max_dist).min(1.0)
            })
            .collect()
    }

    /// Bundle everything known about one region
    pub(crate) fn region_properties(&self, r: u32) -> RegionProperties {
        let i = r as usize;
        let (latitude, longitude) = self.mesh.latlon(r);
        RegionProperties {
            latitude,
            longitude,
            elevation: self.r_elevation[i],
            steepness: self.steepness(r),
            biome: self.r_biome[i],
            temperature_c: self.r_temperature[i],
            rainfall: self.r_rainfall[i],
            flux: self.r_flux[i],
            waterpool: self.r_waterpool[i],
            distance_to_coast: self.r_dist_coast[i],
            distance_to_mountain: self.r_dist_mountain[i],
            distance_to_river: self.r_dist_river[i],
            distance_to_volcano: self.r_dist_volcano[i],
            distance_to_faultline: self.r_dist_fault[i],
            danger_rockslide: self.r_danger_rockslide[i],
            danger_earthquake: self.r_danger_earthquake[i],
            danger_volcano: self.r_danger_volcano[i],
            danger_flood: self.r_danger_flood[i],
            is_valley: self.is_valley(r),
            is_island: self.is_island(r),
        }
    }
}
