//! World generation configuration and builder
//!
//! The configuration fully determines the generated world: the same
//! `WorldConfig` always produces bit-identical field arrays.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, WorldGenError};

/// Which rainfall model to run
///
/// `Basic` is the default; the `Advanced` variant exists for experimentation
/// and is known to produce patchier output.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RainfallVariant {
    /// Pull moisture from up-wind neighbors in wind-sort order, with
    /// orographic shedding and seam-wrap iterations
    Basic,
    /// Experimental transport with selectable transfer mode and sort order
    Advanced {
        /// How moisture moves between neighboring regions
        transfer: MoistureTransfer,
        /// Traversal order for the transport sweep
        order: TransportOrder,
    },
}

/// Moisture transfer mode for the advanced rainfall model
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoistureTransfer {
    /// Push moisture to down-wind land neighbors
    Direct,
    /// Pull moisture from up-wind neighbors
    Indirect,
}

/// Traversal order for the advanced rainfall sweep
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportOrder {
    /// Regions sorted by projected dot product along the wind
    Wind,
    /// Regions sorted by graph distance to the nearest ocean
    CoastDistance,
}

/// How local winds are deflected from the global three-cell field
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindMode {
    /// Deflect by altitude gradients (default)
    Altitude,
    /// Deflect by local temperature gradients (experimental)
    Thermal,
}

/// Rainfall and wind tuning parameters
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateOptions {
    /// Rainfall model to run
    pub variant: RainfallVariant,
    /// Scales how much moisture is picked up over water
    pub raininess: f64,
    /// Fraction of excess humidity shed as orographic rainfall
    pub rain_shadow: f64,
    /// Moisture returned to the air over standing water
    pub evaporation: f64,
    /// Transport sweeps; more than one lets moisture wrap the ±180° seam
    pub rain_iterations: usize,
    /// Neighbor-averaging passes applied to the local wind field
    pub wind_smoothing: usize,
    /// Local wind deflection mode
    pub wind_mode: WindMode,
}

impl Default for ClimateOptions {
    fn default() -> Self {
        Self {
            variant: RainfallVariant::Basic,
            raininess: 0.9,
            rain_shadow: 0.5,
            evaporation: 0.5,
            rain_iterations: 4,
            wind_smoothing: 2,
            wind_mode: WindMode::Altitude,
        }
    }
}

/// How many cities of each type to place
///
/// Types are placed in declaration order; within a type, each new city is
/// repelled from the already-placed cities of the same type.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CityCounts {
    /// General-purpose settlements placed by the default city fitness
    pub default: usize,
    /// Coastal trading posts
    pub trading: usize,
    /// Mountain mining towns
    pub mining: usize,
    /// Farming villages on arable land
    pub farming: usize,
    /// Desert oases next to standing water
    pub desert_oasis: usize,
}

impl CityCounts {
    /// Total number of cities across all types
    pub fn total(&self) -> usize {
        self.default + self.trading + self.mining + self.farming + self.desert_oasis
    }
}

impl Default for CityCounts {
    fn default() -> Self {
        Self {
            default: 15,
            trading: 5,
            mining: 5,
            farming: 5,
            desert_oasis: 2,
        }
    }
}

/// Configuration for deterministic world generation
///
/// The same configuration always produces the identical world. Only the
/// configuration needs to be persisted; the world is regenerated from it.
///
/// # Example
///
/// ```rust
/// use sphere_worldgen::*;
///
/// let config = WorldConfigBuilder::new()
///     .seed(42)
///     .num_points(4000)
///     .num_plates(20)
///     .jitter(0.5).unwrap()
///     .build().unwrap();
/// assert_eq!(config.num_points, 4000);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldConfig {
    /// Random seed for the whole pipeline
    pub seed: u64,
    /// Number of surface sample points (regions, excluding the ghost pole)
    pub num_points: usize,
    /// Number of tectonic plates (clamped to `num_points` during generation)
    pub num_plates: usize,
    /// Sample jitter in [0, 1]: 0 = exact Fibonacci spiral, 1 = full
    /// cell-width perturbation
    pub jitter: f64,
    /// Wind and rainfall tuning
    pub climate: ClimateOptions,
    /// Attempt to flood sinks into lakes before the final sink fill
    pub flood_lakes: bool,
    /// Erosion strength; 0 disables the erosion pass
    pub erosion_amount: f64,
    /// Number of seeded cultures
    pub num_cultures: usize,
    /// Cities per type
    pub cities: CityCounts,
    /// Number of city-state territories grown from the top-ranked cities
    pub num_territories: usize,
    /// Number of empires grown from the top-ranked capitals
    pub num_empires: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfigBuilder::new().build_unchecked()
    }
}

/// Builder for [`WorldConfig`] with validation
///
/// # Example
///
/// ```rust
/// use sphere_worldgen::*;
///
/// let config = WorldConfigBuilder::new()
///     .seed(7)
///     .num_points(8000)
///     .num_plates(15)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct WorldConfigBuilder {
    seed: u64,
    num_points: usize,
    num_plates: usize,
    jitter: f64,
    climate: ClimateOptions,
    flood_lakes: bool,
    erosion_amount: f64,
    num_cultures: usize,
    cities: CityCounts,
    num_territories: usize,
    num_empires: usize,
}

impl WorldConfigBuilder {
    /// Create a builder with default values
    ///
    /// Defaults: seed 0, 8000 points, 12 plates, jitter 0.5, basic rainfall,
    /// lake flooding on, erosion 0.1, 6 cultures, 32 cities, 10 territories,
    /// 5 empires.
    pub fn new() -> Self {
        Self {
            seed: 0,
            num_points: 8_000,
            num_plates: 12,
            jitter: 0.5,
            climate: ClimateOptions::default(),
            flood_lakes: true,
            erosion_amount: 0.1,
            num_cultures: 6,
            cities: CityCounts::default(),
            num_territories: 10,
            num_empires: 5,
        }
    }

    /// Set the pipeline seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the number of surface sample points
    ///
    /// Validated at `build`: at least 8 points are required for a
    /// well-formed triangulation.
    pub fn num_points(mut self, n: usize) -> Self {
        self.num_points = n;
        self
    }

    /// Set the number of tectonic plates
    ///
    /// Values larger than `num_points` are accepted and clamped during
    /// generation.
    pub fn num_plates(mut self, n: usize) -> Self {
        self.num_plates = n;
        self
    }

    /// Set the sample jitter
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if jitter is outside [0, 1]
    pub fn jitter(mut self, jitter: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&jitter) {
            return Err(WorldGenError::InvalidArgument(format!(
                "jitter must be in [0, 1] (got {})",
                jitter
            )));
        }
        self.jitter = jitter;
        Ok(self)
    }

    /// Replace the climate options
    pub fn climate(mut self, climate: ClimateOptions) -> Self {
        self.climate = climate;
        self
    }

    /// Enable or disable the lake flooding pass
    pub fn flood_lakes(mut self, enabled: bool) -> Self {
        self.flood_lakes = enabled;
        self
    }

    /// Set the erosion strength
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the amount is negative
    pub fn erosion_amount(mut self, amount: f64) -> Result<Self> {
        if amount < 0.0 {
            return Err(WorldGenError::InvalidArgument(format!(
                "erosion amount must be >= 0 (got {})",
                amount
            )));
        }
        self.erosion_amount = amount;
        Ok(self)
    }

    /// Set the number of cultures to seed
    pub fn num_cultures(mut self, n: usize) -> Self {
        self.num_cultures = n;
        self
    }

    /// Replace the per-type city counts
    pub fn cities(mut self, counts: CityCounts) -> Self {
        self.cities = counts;
        self
    }

    /// Set the number of city-state territories
    pub fn num_territories(mut self, n: usize) -> Self {
        self.num_territories = n;
        self
    }

    /// Set the number of empires
    pub fn num_empires(mut self, n: usize) -> Self {
        self.num_empires = n;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `num_points < 8` or `num_plates == 0`.
    pub fn build(self) -> Result<WorldConfig> {
        if self.num_points < 8 {
            return Err(WorldGenError::InvalidArgument(format!(
                "num_points must be >= 8 (got {})",
                self.num_points
            )));
        }
        if self.num_plates == 0 {
            return Err(WorldGenError::InvalidArgument(
                "num_plates must be positive".into(),
            ));
        }
        Ok(self.build_unchecked())
    }

    fn build_unchecked(self) -> WorldConfig {
        WorldConfig {
            seed: self.seed,
            num_points: self.num_points,
            num_plates: self.num_plates,
            jitter: self.jitter,
            climate: self.climate,
            flood_lakes: self.flood_lakes,
            erosion_amount: self.erosion_amount,
            num_cultures: self.num_cultures,
            cities: self.cities,
            num_territories: self.num_territories,
            num_empires: self.num_empires,
        }
    }
}

impl Default for WorldConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = WorldConfigBuilder::new().build().unwrap();
        assert_eq!(config.num_points, 8_000);
        assert_eq!(config.climate.variant, RainfallVariant::Basic);
        assert!(config.flood_lakes);
    }

    #[test]
    fn test_tiny_point_count_rejected() {
        let result = WorldConfigBuilder::new().num_points(1).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_plates_rejected() {
        let result = WorldConfigBuilder::new().num_plates(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_excess_plates_accepted() {
        // More plates than points is clamped at generation time, not here
        let config = WorldConfigBuilder::new()
            .num_points(100)
            .num_plates(500)
            .build()
            .unwrap();
        assert_eq!(config.num_plates, 500);
    }

    #[test]
    fn test_jitter_bounds() {
        assert!(WorldConfigBuilder::new().jitter(-0.1).is_err());
        assert!(WorldConfigBuilder::new().jitter(1.1).is_err());
        let config = WorldConfigBuilder::new().jitter(1.0).unwrap().build().unwrap();
        assert_eq!(config.jitter, 1.0);
    }

    #[test]
    fn test_city_counts_total() {
        let counts = CityCounts {
            default: 3,
            trading: 2,
            mining: 1,
            farming: 1,
            desert_oasis: 0,
        };
        assert_eq!(counts.total(), 7);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_serialization() {
        let config = WorldConfigBuilder::new().seed(12345).build().unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let restored: WorldConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
    }
}
