//! The generated world and its read-only query surface

use glam::DVec3;
use tracing::debug;

use crate::base::BaseWorld;
use crate::calendar::{Calendar, History};
use crate::civ::Civilization;
use crate::climate;
use crate::config::WorldConfig;
use crate::error::{Result, WorldGenError};
use crate::geometry::latlon_to_cartesian;
use crate::mesh::SphereMesh;
use crate::regions::{Biome, RegionProperties};
use crate::resources::{Gem, Metal, Stone};
use crate::rng::{stage, stage_rng};
#[cfg(feature = "spatial-index")]
use crate::spatial::RegionIndex;

/// Latitude/longitude window in degrees: (lat min, lat max, lon min, lon max)
pub type LatLonBounds = (f64, f64, f64, f64);

/// A fully generated world
///
/// Built once from a [`WorldConfig`] by [`World::generate`]; everything
/// afterwards is read-only queries plus [`World::tick`]. The civilization
/// layer is optional and added by [`World::generate_civilization`].
///
/// Scalar accessors such as [`World::elevation`] panic on an out-of-range
/// region index; [`World::region_properties`] validates the index and
/// returns an error instead.
pub struct World {
    base: BaseWorld,
    civ: Option<Civilization>,
    calendar: Calendar,
    history: History,
    config: WorldConfig,
    #[cfg(feature = "spatial-index")]
    index: RegionIndex,
}

impl World {
    /// Run the full geology pipeline for a configuration
    ///
    /// Stages run in a fixed order, each on its own tagged RNG stream, so
    /// the result is bit-identical for equal configurations.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for out-of-range configuration values,
    /// `MeshConstruction` when triangulation fails, `PipelineStage` when a
    /// stage produces an inconsistent result.
    pub fn generate(config: WorldConfig) -> Result<World> {
        if config.num_points < 8 {
            return Err(WorldGenError::InvalidArgument(format!(
                "num_points must be >= 8 (got {})",
                config.num_points
            )));
        }
        if config.num_plates == 0 {
            return Err(WorldGenError::InvalidArgument(
                "num_plates must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&config.jitter) {
            return Err(WorldGenError::InvalidArgument(format!(
                "jitter must be in [0, 1] (got {})",
                config.jitter
            )));
        }
        if config.erosion_amount < 0.0 {
            return Err(WorldGenError::InvalidArgument(format!(
                "erosion amount must be >= 0 (got {})",
                config.erosion_amount
            )));
        }

        let seed = config.seed;
        debug!(seed, num_points = config.num_points, "building mesh");
        let mesh = SphereMesh::build(config.num_points, config.jitter, seed)?;
        let mut base = BaseWorld::new(mesh, seed);

        debug!(num_plates = config.num_plates, "tectonics");
        base.generate_tectonics(config.num_plates);
        base.generate_elevation();

        debug!("climate");
        base.assign_temperature();
        base.assign_wind(&config.climate);
        base.assign_rainfall(&config.climate);

        debug!(flood = config.flood_lakes, "hydrology");
        let mut hydro_rng = stage_rng(seed, stage::HYDROLOGY);
        if config.flood_lakes {
            // Flood on the raw terrain so lake volumes reflect the
            // unfilled catchments.
            base.assign_flux();
            base.flood_lakes();
        }
        base.fill_sinks(&mut hydro_rng);
        base.assign_flux();
        base.check_downhill_acyclic()?;

        // Rivers exist now; the rainfall re-pass lets them re-evaporate,
        // then the flux follows the updated rainfall.
        base.mark_river_evaporation();
        base.assign_rainfall(&config.climate);
        base.assign_flux();

        if config.erosion_amount > 0.0 {
            debug!(amount = config.erosion_amount, "erosion");
            base.erode(config.erosion_amount);
            base.fill_sinks(&mut hydro_rng);
            base.assign_flux();
            base.check_downhill_acyclic()?;
        }
        base.assign_triangle_flow();

        debug!("labeling");
        base.assign_waterbodies();
        base.assign_landmasses();
        base.assign_biomes();
        base.assign_feature_distances();
        base.assign_danger_fields();

        debug!("resources");
        base.place_resources();

        #[cfg(feature = "spatial-index")]
        let index = RegionIndex::build(base.mesh());

        Ok(World {
            base,
            civ: None,
            calendar: Calendar::new(),
            history: History::new(),
            config,
            #[cfg(feature = "spatial-index")]
            index,
        })
    }

    /// Generate the civilization layer on top of the finished geology
    ///
    /// Replaces any previous civilization; its founding events are appended
    /// to the history at the current calendar year.
    pub fn generate_civilization(&mut self) {
        self.civ = Some(Civilization::generate(
            &self.base,
            &self.config,
            &self.calendar,
            &mut self.history,
        ));
    }

    /// Advance the calendar by one day
    pub fn tick(&mut self) {
        self.calendar.advance();
    }

    /// The configuration this world was generated from
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// The world calendar
    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// The append-only event history
    pub fn history(&self) -> &History {
        &self.history
    }

    /// The dual mesh
    pub fn mesh(&self) -> &SphereMesh {
        self.base.mesh()
    }

    /// The civilization layer, when generated
    pub fn civilization(&self) -> Option<&Civilization> {
        self.civ.as_ref()
    }

    /// Number of regions, ghost pole included
    pub fn num_regions(&self) -> usize {
        self.base.mesh().num_regions()
    }

    fn check_region(&self, r: u32) -> Result<()> {
        if (r as usize) < self.num_regions() {
            Ok(())
        } else {
            Err(WorldGenError::InvalidArgument(format!(
                "region {} out of range (world has {})",
                r,
                self.num_regions()
            )))
        }
    }

    /// Everything known about one region
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the region index is out of range.
    pub fn region_properties(&self, r: u32) -> Result<RegionProperties> {
        self.check_region(r)?;
        Ok(self.base.region_properties(r))
    }

    /// Nominal elevation in [-1, 1]
    pub fn elevation(&self, r: u32) -> f64 {
        self.base.r_elevation[r as usize]
    }

    /// Mean annual temperature in °C
    pub fn temperature_c(&self, r: u32) -> f64 {
        self.base.r_temperature[r as usize]
    }

    /// Today's minimum and maximum temperature in °C
    ///
    /// Follows the calendar: seasonal swing by day of year plus the
    /// diurnal range.
    pub fn daily_temperature_c(&self, r: u32) -> (f64, f64) {
        self.temperature_on(r, self.calendar.day_of_year())
    }

    /// Minimum and maximum temperature in °C on a given day of year
    pub fn temperature_on(&self, r: u32, day_of_year: u32) -> (f64, f64) {
        let (lat, _) = self.base.mesh().latlon(r);
        climate::daily_temperature(lat, self.base.altitude_m(r), day_of_year)
    }

    /// Surface solar radiation (MJ/m²/day) on a given day of year
    pub fn solar_radiation_on(&self, r: u32, day_of_year: u32) -> f64 {
        let (lat, _) = self.base.mesh().latlon(r);
        climate::solar_radiation(lat, day_of_year)
    }

    /// Annual rainfall, nominal units
    pub fn rainfall(&self, r: u32) -> f64 {
        self.base.r_rainfall[r as usize]
    }

    /// Accumulated water flux
    pub fn flux(&self, r: u32) -> f64 {
        self.base.r_flux[r as usize]
    }

    /// Standing water depth; positive in lakes
    pub fn waterpool(&self, r: u32) -> f64 {
        self.base.r_waterpool[r as usize]
    }

    /// Biome of a region
    pub fn biome(&self, r: u32) -> Biome {
        self.base.r_biome[r as usize]
    }

    /// True for ocean and lake regions
    pub fn is_water(&self, r: u32) -> bool {
        self.base.is_water(r)
    }

    /// Waterbody label, or negative for land
    pub fn waterbody(&self, r: u32) -> i32 {
        self.base.r_waterbody[r as usize]
    }

    /// Landmass label, or negative for water
    pub fn landmass(&self, r: u32) -> i32 {
        self.base.r_landmass[r as usize]
    }

    /// Region counts per waterbody label
    pub fn waterbody_sizes(&self) -> &[usize] {
        &self.base.waterbody_size
    }

    /// Region counts per landmass label
    pub fn landmass_sizes(&self) -> &[usize] {
        &self.base.landmass_size
    }

    /// Metal deposits in a region
    pub fn metals_at(&self, r: u32) -> Vec<Metal> {
        self.base.metals_at(r)
    }

    /// Gem deposits in a region
    pub fn gems_at(&self, r: u32) -> Vec<Gem> {
        self.base.gems_at(r)
    }

    /// Notable stones in a region
    pub fn stones_at(&self, r: u32) -> Vec<Stone> {
        self.base.stones_at(r)
    }

    /// Summed value of all deposits in a region
    pub fn resource_value(&self, r: u32) -> u32 {
        self.base.resource_value(r)
    }

    /// Rivers as downhill region paths carrying at least `flux_limit`
    ///
    /// With `bounds`, only rivers touching the window are returned.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a negative flux limit or inverted bounds.
    pub fn rivers(&self, flux_limit: f64, bounds: Option<LatLonBounds>) -> Result<Vec<Vec<u32>>> {
        if !(flux_limit >= 0.0) {
            return Err(WorldGenError::InvalidArgument(format!(
                "flux limit must be >= 0 (got {})",
                flux_limit
            )));
        }
        if let Some((lat_min, lat_max, lon_min, lon_max)) = bounds {
            if lat_min >= lat_max || lon_min >= lon_max {
                return Err(WorldGenError::InvalidArgument(format!(
                    "empty bounds ({}, {}, {}, {})",
                    lat_min, lat_max, lon_min, lon_max
                )));
            }
        }
        let mut rivers = self.base.trace_rivers(flux_limit);
        if let Some((lat_min, lat_max, lon_min, lon_max)) = bounds {
            let inside = |r: u32| {
                let (lat, lon) = self.base.mesh().latlon(r);
                lat >= lat_min && lat <= lat_max && lon >= lon_min && lon <= lon_max
            };
            rivers.retain(|path| path.iter().any(|&r| inside(r)));
        }
        Ok(rivers)
    }

    /// Border polylines between differently labeled regions
    ///
    /// `label` maps each region to an arbitrary label; every mesh side
    /// whose two regions disagree contributes the segment between the
    /// adjacent triangle centers. Segments are grouped under the begin
    /// region's label and returned in ascending label order.
    pub fn region_borders(
        &self,
        label: impl Fn(u32) -> i32,
    ) -> Vec<(i32, Vec<(DVec3, DVec3)>)> {
        use std::collections::BTreeMap;
        let mesh = self.base.mesh();
        let mut groups: BTreeMap<i32, Vec<(DVec3, DVec3)>> = BTreeMap::new();
        for s in 0..mesh.num_sides() as u32 {
            let a = label(mesh.begin_region(s));
            let b = label(mesh.end_region(s));
            if a != b {
                let from = mesh.triangle_center(mesh.inner_triangle(s));
                let to = mesh.triangle_center(mesh.outer_triangle(s));
                groups.entry(a).or_default().push((from, to));
            }
        }
        groups.into_iter().collect()
    }

    /// The region containing a latitude/longitude point
    #[cfg(feature = "spatial-index")]
    pub fn region_at(&self, lat_deg: f64, lon_deg: f64) -> Result<u32> {
        if !(-90.0..=90.0).contains(&lat_deg) {
            return Err(WorldGenError::InvalidArgument(format!(
                "latitude must be in [-90, 90] (got {})",
                lat_deg
            )));
        }
        if !(-180.0..=180.0).contains(&lon_deg) {
            return Err(WorldGenError::InvalidArgument(format!(
                "longitude must be in [-180, 180] (got {})",
                lon_deg
            )));
        }
        Ok(self.index.nearest(latlon_to_cartesian(lat_deg, lon_deg)))
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("seed", &self.config.seed)
            .field("regions", &self.num_regions())
            .field("day", &self.calendar.days_elapsed())
            .field("civilization", &self.civ.is_some())
            .finish()
    }
}
