//! Procedural spherical world generation
//!
//! A world is built from a [`WorldConfig`] in deterministic stages: a dual
//! mesh on the unit sphere, tectonic plates and elevation, temperature,
//! wind and rainfall, rivers and lakes, biome and component labeling,
//! mineral resources, and an optional civilization layer with cultures,
//! cities, city-states, empires, religions and trade routes. Equal
//! configurations always yield bit-identical worlds.
//!
//! ```rust
//! use sphere_worldgen::{World, WorldConfigBuilder};
//!
//! let config = WorldConfigBuilder::new()
//!     .seed(42)
//!     .num_points(1000)
//!     .num_plates(8)
//!     .build()
//!     .unwrap();
//! let mut world = World::generate(config).unwrap();
//! world.generate_civilization();
//!
//! let props = world.region_properties(0).unwrap();
//! assert!(props.elevation >= -1.0 && props.elevation <= 1.0);
//! ```

pub(crate) mod base;
pub mod calendar;
pub mod civ;
pub mod climate;
pub mod config;
pub mod error;
pub mod geometry;
pub(crate) mod hydrology;
pub mod mesh;
pub(crate) mod noise;
pub(crate) mod queue;
pub mod regions;
pub mod resources;
pub(crate) mod rng;
#[cfg(feature = "spatial-index")]
pub(crate) mod spatial;
pub(crate) mod tectonics;
pub mod world;

pub use calendar::{Calendar, EventKind, History, HistoryEvent, ObjectKind, ObjectRef};
pub use civ::{
    City, CityState, CityType, Civilization, Culture, CultureType, Empire, Language, Religion,
    ReligionKind, TradeRoute,
};
pub use config::{
    CityCounts, ClimateOptions, MoistureTransfer, RainfallVariant, TransportOrder, WindMode,
    WorldConfig, WorldConfigBuilder,
};
pub use error::{Result, WorldGenError};
pub use mesh::SphereMesh;
pub use regions::{Biome, RegionProperties};
pub use resources::{Gem, Metal, Stone};
pub use world::{LatLonBounds, World};
