//! Resource placement: metals, gems and stones
//!
//! Placement is a Bernoulli draw per region and resource, gated by
//! terrain fitness, with probabilities halving toward the rarer end of
//! each family. Results are stored as per-region bitmasks so a region's
//! total resource value is a sum over set bits.

use rand::Rng;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::base::BaseWorld;
use crate::rng::{stage, stage_rng};

/// Minimum steep-mountain fitness for metal veins
const METAL_FITNESS_THRESHOLD: f64 = 0.3;
/// Chance of the most common metal at a qualifying region
const METAL_BASE_P: f64 = 0.4;
/// Chance of the most common gem at a qualifying region
const GEM_BASE_P: f64 = 0.2;
/// Steepness and elevation floors for gem-bearing rock
const GEM_MIN_STEEPNESS: f64 = 0.45;
const GEM_MIN_ELEVATION: f64 = 0.45;

/// Ore metals, cheapest to rarest
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metal {
    Iron,
    Copper,
    Lead,
    Tin,
    Silver,
    Gold,
    Platinum,
}

impl Metal {
    pub const ALL: [Metal; 7] = [
        Metal::Iron,
        Metal::Copper,
        Metal::Lead,
        Metal::Tin,
        Metal::Silver,
        Metal::Gold,
        Metal::Platinum,
    ];

    /// Position in the rarity order
    #[inline]
    fn rank(self) -> u32 {
        Metal::ALL.iter().position(|&m| m == self).unwrap_or(0) as u32
    }

    /// Bit in the per-region metal mask
    #[inline]
    pub fn bit(self) -> u8 {
        1 << self.rank()
    }

    /// Trade value; doubles with each rarity step
    #[inline]
    pub fn value(self) -> u32 {
        1 << self.rank()
    }
}

/// Gemstones, cheapest to rarest
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gem {
    Amethyst,
    Topaz,
    Sapphire,
    Emerald,
    Ruby,
    Diamond,
}

impl Gem {
    pub const ALL: [Gem; 6] = [
        Gem::Amethyst,
        Gem::Topaz,
        Gem::Sapphire,
        Gem::Emerald,
        Gem::Ruby,
        Gem::Diamond,
    ];

    #[inline]
    fn rank(self) -> u32 {
        Gem::ALL.iter().position(|&g| g == self).unwrap_or(0) as u32
    }

    #[inline]
    pub fn bit(self) -> u8 {
        1 << self.rank()
    }

    /// Trade value; gems start above the metal scale
    #[inline]
    pub fn value(self) -> u32 {
        4 << self.rank()
    }
}

/// Workable stones with individual placement rules
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stone {
    Flint,
    Obsidian,
    Marble,
    Sulfur,
}

impl Stone {
    pub const ALL: [Stone; 4] = [Stone::Flint, Stone::Obsidian, Stone::Marble, Stone::Sulfur];

    #[inline]
    fn rank(self) -> u32 {
        Stone::ALL.iter().position(|&s| s == self).unwrap_or(0) as u32
    }

    #[inline]
    pub fn bit(self) -> u8 {
        1 << self.rank()
    }

    #[inline]
    pub fn value(self) -> u32 {
        match self {
            Stone::Flint => 1,
            Stone::Obsidian => 3,
            Stone::Marble => 4,
            Stone::Sulfur => 3,
        }
    }
}

impl BaseWorld {
    /// Place all resources; deterministic in the world seed
    pub(crate) fn place_resources(&mut self) {
        let mut rng = stage_rng(self.seed, stage::RESOURCES);
        let num = self.mesh.num_regions() as u32;
        let mut metal_sites = 0usize;
        let mut gem_sites = 0usize;

        for r in 0..num {
            let i = r as usize;
            self.r_metals[i] = 0;
            self.r_gems[i] = 0;
            self.r_stones[i] = 0;
            if self.is_water(r) {
                continue;
            }

            let mountain = self.fitness_steep_mountains(r);
            if mountain > METAL_FITNESS_THRESHOLD {
                for metal in Metal::ALL {
                    let p = METAL_BASE_P * 0.5f64.powi(metal.rank() as i32) * mountain;
                    if rng.gen_bool(p.clamp(0.0, 1.0)) {
                        self.r_metals[i] |= metal.bit();
                    }
                }
                if self.r_metals[i] != 0 {
                    metal_sites += 1;
                }
            }

            let steep = self.steepness(r);
            if steep > GEM_MIN_STEEPNESS && self.r_elevation[i] > GEM_MIN_ELEVATION {
                for gem in Gem::ALL {
                    let p = GEM_BASE_P * 0.5f64.powi(gem.rank() as i32);
                    if rng.gen_bool(p) {
                        self.r_gems[i] |= gem.bit();
                    }
                }
                if self.r_gems[i] != 0 {
                    gem_sites += 1;
                }
            }

            // Stones follow the terrain rather than a single fitness.
            if rng.gen_bool(0.15) {
                self.r_stones[i] |= Stone::Flint.bit();
            }
            if self.r_dist_volcano[i] <= 2.0 && rng.gen_bool(0.5) {
                self.r_stones[i] |= Stone::Obsidian.bit();
            }
            if mountain > 0.0 && rng.gen_bool(0.2) {
                self.r_stones[i] |= Stone::Marble.bit();
            }
            if (self.r_dist_volcano[i] <= 1.0 || self.r_dist_fault[i] <= 1.0)
                && rng.gen_bool(0.3)
            {
                self.r_stones[i] |= Stone::Sulfur.bit();
            }
        }

        debug!(metal_sites, gem_sites, "resources placed");
    }

    /// Metals present at a region
    pub fn metals_at(&self, r: u32) -> Vec<Metal> {
        Metal::ALL
            .into_iter()
            .filter(|m| self.r_metals[r as usize] & m.bit() != 0)
            .collect()
    }

    /// Gems present at a region
    pub fn gems_at(&self, r: u32) -> Vec<Gem> {
        Gem::ALL
            .into_iter()
            .filter(|g| self.r_gems[r as usize] & g.bit() != 0)
            .collect()
    }

    /// Stones present at a region
    pub fn stones_at(&self, r: u32) -> Vec<Stone> {
        Stone::ALL
            .into_iter()
            .filter(|s| self.r_stones[r as usize] & s.bit() != 0)
            .collect()
    }

    /// Summed trade value of everything placed at a region
    pub fn resource_value(&self, r: u32) -> u32 {
        let metals: u32 = self.metals_at(r).iter().map(|m| m.value()).sum();
        let gems: u32 = self.gems_at(r).iter().map(|g| g.value()).sum();
        let stones: u32 = self.stones_at(r).iter().map(|s| s.value()).sum();
        metals + gems + stones
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClimateOptions;
    use crate::mesh::SphereMesh;
    use crate::rng::stage_rng;

    fn resource_world(n: usize, seed: u64) -> BaseWorld {
        let mesh = SphereMesh::build(n, 0.5, seed).unwrap();
        let mut w = BaseWorld::new(mesh, seed);
        let opts = ClimateOptions::default();
        w.generate_tectonics(10);
        w.generate_elevation();
        w.assign_temperature();
        w.assign_wind(&opts);
        w.assign_rainfall(&opts);
        let mut rng = stage_rng(seed, stage::HYDROLOGY);
        w.fill_sinks(&mut rng);
        w.assign_flux();
        w.assign_waterbodies();
        w.assign_landmasses();
        w.assign_biomes();
        w.assign_feature_distances();
        w.place_resources();
        w
    }

    #[test]
    fn test_masks_fit_their_families() {
        let w = resource_world(1500, 1);
        for r in 0..w.mesh().num_regions() {
            assert_eq!(w.r_metals[r] & !0x7f, 0);
            assert_eq!(w.r_gems[r] & !0x3f, 0);
            assert_eq!(w.r_stones[r] & !0x0f, 0);
        }
    }

    #[test]
    fn test_no_resources_under_water() {
        let w = resource_world(1500, 2);
        for r in 0..w.mesh().num_regions() as u32 {
            if w.is_water(r) {
                assert_eq!(w.r_metals[r as usize], 0);
                assert_eq!(w.r_gems[r as usize], 0);
                assert_eq!(w.r_stones[r as usize], 0);
            }
        }
    }

    #[test]
    fn test_rarity_ordering_in_aggregate() {
        // Rarer metals must not outnumber the common ones.
        let w = resource_world(4000, 3);
        let count = |m: Metal| {
            (0..w.mesh().num_regions())
                .filter(|&r| w.r_metals[r] & m.bit() != 0)
                .count()
        };
        assert!(count(Metal::Iron) >= count(Metal::Silver));
        assert!(count(Metal::Silver) >= count(Metal::Platinum));
    }

    #[test]
    fn test_value_doubles_with_rarity() {
        assert_eq!(Metal::Iron.value(), 1);
        assert_eq!(Metal::Copper.value(), 2);
        assert_eq!(Metal::Platinum.value(), 64);
        assert_eq!(Gem::Diamond.value(), 4 << 5);
    }

    #[test]
    fn test_resource_value_sums_bits() {
        let mut w = resource_world(500, 4);
        let r = (0..w.mesh().num_regions() as u32)
            .find(|&r| !w.is_water(r))
            .unwrap();
        w.r_metals[r as usize] = Metal::Iron.bit() | Metal::Gold.bit();
        w.r_gems[r as usize] = Gem::Ruby.bit();
        w.r_stones[r as usize] = 0;
        assert_eq!(
            w.resource_value(r),
            Metal::Iron.value() + Metal::Gold.value() + Gem::Ruby.value()
        );
    }

    #[test]
    fn test_placement_determinism() {
        let a = resource_world(1200, 5);
        let b = resource_world(1200, 5);
        assert_eq!(a.r_metals, b.r_metals);
        assert_eq!(a.r_gems, b.r_gems);
        assert_eq!(a.r_stones, b.r_stones);
    }
}
