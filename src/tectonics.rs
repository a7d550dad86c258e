//! Plate tectonics: seeding, growth, motion, collisions, and the elevation
//! field derived from collision distance fields.
//!
//! Reads: mesh adjacency. Writes: `r_plate`, `r_compression`,
//! `r_elevation`, plate metadata and the mountain/coastline/ocean seed
//! lists.

use rand::Rng;
use tracing::debug;

use crate::base::BaseWorld;
use crate::rng::{self, stage, stage_rng, RandomFrontier};

/// Plate advance step used for collision detection
const DELTA_TIME: f64 = 1e-2;
/// A region collides when compression exceeds this fraction of Δt
const COLLISION_THRESHOLD: f64 = 0.75;
/// Distance-field smoothing epsilon in the harmonic elevation blend
const DISTANCE_EPSILON: f64 = 1e-3;
/// Noise contribution on top of the tectonic base elevation
const NOISE_AMPLITUDE: f64 = 0.15;
/// Compression percentile above which a colliding mountain hosts a volcano
const VOLCANO_PERCENTILE: f64 = 0.85;

impl BaseWorld {
    /// Seed and grow plates, assign motion vectors and ocean flags, then
    /// detect collisions along plate boundaries.
    pub(crate) fn generate_tectonics(&mut self, num_plates: usize) {
        let mut rng = stage_rng(self.seed, stage::TECTONICS);
        let num_regions = self.mesh.num_regions();

        // Seeding: distinct regions, clamped to the count of real regions.
        // The ghost pole is never a seed, so no motion vector is anchored
        // on it; it still joins a plate through growth.
        let seed_pool = self.mesh.ghost_region() as usize;
        let seeds = rng::pick_distinct_regions(&mut rng, seed_pool, num_plates);
        debug!(plates = seeds.len(), regions = num_regions, "growing plates");

        // Randomized-order BFS growth: pop a uniformly random frontier
        // element and claim its unassigned neighbors.
        const UNASSIGNED: u32 = u32::MAX;
        self.r_plate = vec![UNASSIGNED; num_regions];
        let mut frontier = RandomFrontier::with_seeds(&seeds);
        for &s in &seeds {
            self.r_plate[s as usize] = s;
        }
        while let Some(r) = frontier.pop_random(&mut rng) {
            let plate = self.r_plate[r as usize];
            for nb in self.mesh.neighbors(r) {
                if self.r_plate[nb as usize] == UNASSIGNED {
                    self.r_plate[nb as usize] = plate;
                    frontier.push(nb);
                }
            }
        }

        // Motion: a unit vector toward one circulated neighbor is roughly
        // tangent to the sphere at the seed. Ocean flags are drawn in seed
        // order so they are stable under unrelated changes.
        self.plate_seeds = seeds;
        self.plate_vector.clear();
        self.plate_is_ocean.clear();
        for &s in &self.plate_seeds {
            let nb = self.mesh.neighbors(s)[0];
            let v = (self.mesh.position(nb) - self.mesh.position(s)).normalize();
            self.plate_vector.insert(s, v);
        }
        for &s in &self.plate_seeds {
            self.plate_is_ocean.insert(s, rng.gen_bool(0.5));
        }

        self.detect_collisions();
    }

    /// True when the region sits on an ocean-tagged plate
    #[inline]
    pub(crate) fn is_ocean_plate(&self, r: u32) -> bool {
        *self
            .plate_is_ocean
            .get(&self.r_plate[r as usize])
            .unwrap_or(&false)
    }

    /// Compute per-region compression against the best cross-plate
    /// neighbor and classify boundary regions.
    fn detect_collisions(&mut self) {
        let num_regions = self.mesh.num_regions() as u32;
        self.mountain_regions.clear();
        self.coastline_regions.clear();
        self.ocean_regions.clear();
        self.faultline_regions.clear();

        for r in 0..num_regions {
            let plate_r = self.r_plate[r as usize];
            let vr = self.plate_vector[&plate_r];
            let pr = self.mesh.position(r);

            let mut best_compression = 0.0f64;
            let mut best_neighbor = None;
            for nb in self.mesh.neighbors(r) {
                let plate_n = self.r_plate[nb as usize];
                if plate_n == plate_r {
                    continue;
                }
                let vn = self.plate_vector[&plate_n];
                let pn = self.mesh.position(nb);
                let before = (pr - pn).length();
                let after = ((pr + vr * DELTA_TIME) - (pn + vn * DELTA_TIME)).length();
                let compression = before - after;
                if best_neighbor.is_none() || compression > best_compression {
                    best_compression = compression;
                    best_neighbor = Some(nb);
                }
            }

            let Some(nb) = best_neighbor else {
                self.r_compression[r as usize] = 0.0;
                continue;
            };
            self.r_compression[r as usize] = best_compression;

            let colliding = best_compression > COLLISION_THRESHOLD * DELTA_TIME;
            let drifting = best_compression < -COLLISION_THRESHOLD * DELTA_TIME;
            let r_ocean = self.is_ocean_plate(r);
            let nb_ocean = self.is_ocean_plate(nb);

            if colliding {
                self.faultline_regions.push(r);
            }
            match (r_ocean, nb_ocean) {
                (true, true) => {
                    if colliding {
                        self.coastline_regions.push(r);
                    } else {
                        // Drifting ocean floor: an ocean seed for the
                        // elevation distance fields. Magma-rift island
                        // chains are deliberately not modeled.
                        self.ocean_regions.push(r);
                    }
                }
                (false, false) => {
                    if colliding {
                        self.mountain_regions.push(r);
                    }
                }
                (true, false) | (false, true) => {
                    if colliding {
                        if !r_ocean {
                            self.mountain_regions.push(r);
                        }
                    } else if drifting {
                        self.coastline_regions.push(r);
                    }
                }
            }
        }

        // Volcanoes: the most compressed colliding mountains.
        self.volcano_regions.clear();
        let mut compressions: Vec<f64> = self
            .mountain_regions
            .iter()
            .map(|&r| self.r_compression[r as usize])
            .collect();
        if !compressions.is_empty() {
            compressions.sort_by(|a, b| a.total_cmp(b));
            let cut = compressions
                [(VOLCANO_PERCENTILE * (compressions.len() - 1) as f64).round() as usize];
            self.volcano_regions = self
                .mountain_regions
                .iter()
                .copied()
                .filter(|&r| self.r_compression[r as usize] >= cut)
                .collect();
        }

        debug!(
            mountains = self.mountain_regions.len(),
            coastlines = self.coastline_regions.len(),
            oceans = self.ocean_regions.len(),
            volcanoes = self.volcano_regions.len(),
            "collision classification"
        );
    }

    /// Base elevation from the three collision distance fields plus noise
    ///
    /// Mountain seeds end up highest, ocean seeds lowest, coastlines at
    /// the zero crossing; the harmonic blend interpolates in between.
    pub(crate) fn generate_elevation(&mut self) {
        let mut rng = stage_rng(self.seed, stage::ELEVATION);

        let mountains = self.mountain_regions.clone();
        let coastlines = self.coastline_regions.clone();
        let oceans = self.ocean_regions.clone();

        let mountain_set = as_flags(self.mesh.num_regions(), &mountains);
        let ocean_set = as_flags(self.mesh.num_regions(), &oceans);

        let dist_mountain = {
            let stop = |r: u32| self.is_ocean_plate(r);
            self.distance_field(&mountains, stop, true, Some(&mut rng))
        };
        let dist_ocean = {
            let coastline_set = as_flags(self.mesh.num_regions(), &coastlines);
            let stop = move |r: u32| coastline_set[r as usize];
            self.distance_field(&oceans, stop, true, Some(&mut rng))
        };
        let dist_coast = {
            let stop = move |r: u32| mountain_set[r as usize] || ocean_set[r as usize];
            self.distance_field(&coastlines, stop, true, Some(&mut rng))
        };

        let inv = |d: f64| if d.is_finite() { 1.0 / (d + DISTANCE_EPSILON) } else { 0.0 };
        for r in 0..self.mesh.num_regions() as u32 {
            let a = inv(dist_mountain[r as usize]);
            let b = inv(dist_ocean[r as usize]);
            let c = inv(dist_coast[r as usize]);
            let denom = a + b + c;
            let mut e = if denom > 0.0 { (a - b) / denom } else { 0.0 };
            if a == 0.0 && b == 0.0 {
                // Plate interior untouched by either field: gently raised.
                e += 0.1;
            }
            if self.is_ocean_plate(r) {
                e -= 0.1;
            }
            e += NOISE_AMPLITUDE * self.noise.sample(self.mesh.position(r));
            self.r_elevation[r as usize] = e.clamp(-1.0, 1.0);
        }

        self.t_elevation = self.interpolate_to_triangles(&self.r_elevation);
        debug!(
            land = self.r_elevation.iter().filter(|&&e| e > 0.0).count(),
            sea = self.r_elevation.iter().filter(|&&e| e <= 0.0).count(),
            "elevation assigned"
        );
    }
}

fn as_flags(len: usize, members: &[u32]) -> Vec<bool> {
    let mut flags = vec![false; len];
    for &m in members {
        flags[m as usize] = true;
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::SphereMesh;

    fn tectonic_world(n: usize, plates: usize, seed: u64) -> BaseWorld {
        let mesh = SphereMesh::build(n, 0.5, seed).unwrap();
        let mut w = BaseWorld::new(mesh, seed);
        w.generate_tectonics(plates);
        w
    }

    #[test]
    fn test_every_region_has_a_plate() {
        let w = tectonic_world(500, 5, 1);
        assert_eq!(w.plate_seeds.len(), 5);
        for r in 0..w.mesh().num_regions() as u32 {
            assert!(w.plate_seeds.contains(&w.r_plate[r as usize]));
        }
    }

    #[test]
    fn test_seed_regions_own_their_plate() {
        let w = tectonic_world(500, 8, 2);
        for &s in &w.plate_seeds {
            assert_eq!(w.r_plate[s as usize], s);
        }
    }

    #[test]
    fn test_plate_count_clamped_to_regions() {
        let w = tectonic_world(20, 500, 3);
        assert_eq!(w.plate_seeds.len(), 20, "clamped to the non-ghost count");
    }

    #[test]
    fn test_plate_seeds_skip_the_ghost() {
        for seed in 0..5 {
            // More plates than regions forces the seed pool to its limit.
            let w = tectonic_world(60, 100, seed);
            let ghost = w.mesh().ghost_region();
            assert!(!w.plate_seeds.contains(&ghost));
            assert_eq!(w.plate_seeds.len(), ghost as usize);
            assert!(
                w.plate_seeds.contains(&w.r_plate[ghost as usize]),
                "the ghost still joins a grown plate"
            );
        }
    }

    #[test]
    fn test_plates_are_connected() {
        let w = tectonic_world(400, 6, 4);
        // Flood from each seed within its own plate and count what we reach.
        for &s in &w.plate_seeds {
            let member_count = w.r_plate.iter().filter(|&&p| p == s).count();
            let dist = w.distance_field(&[s], |r| w.r_plate[r as usize] != s, false, None);
            let reached = (0..w.mesh().num_regions() as u32)
                .filter(|&r| w.r_plate[r as usize] == s && dist[r as usize].is_finite())
                .count();
            assert_eq!(reached, member_count, "plate {} must be connected", s);
        }
    }

    #[test]
    fn test_classification_on_reference_run() {
        let w = tectonic_world(4000, 20, 42);
        assert!(!w.mountain_regions.is_empty());
        assert!(!w.coastline_regions.is_empty());
        for r in &w.mountain_regions {
            assert!(
                !w.coastline_regions.contains(r),
                "a region is never both mountain and coastline"
            );
        }
    }

    #[test]
    fn test_motion_vectors_are_unit_length() {
        let w = tectonic_world(300, 10, 5);
        for &s in &w.plate_seeds {
            assert!((w.plate_vector[&s].length() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_elevation_range_and_seed_ordering() {
        let mut w = tectonic_world(2000, 12, 7);
        w.generate_elevation();
        for &e in &w.r_elevation {
            assert!((-1.0..=1.0).contains(&e));
        }
        let mean = |rs: &[u32]| -> f64 {
            rs.iter().map(|&r| w.r_elevation[r as usize]).sum::<f64>() / rs.len().max(1) as f64
        };
        if !w.mountain_regions.is_empty() && !w.ocean_regions.is_empty() {
            assert!(
                mean(&w.mountain_regions) > mean(&w.ocean_regions),
                "mountain seeds sit above ocean seeds"
            );
        }
    }

    #[test]
    fn test_determinism() {
        let mut a = tectonic_world(1000, 10, 9);
        let mut b = tectonic_world(1000, 10, 9);
        a.generate_elevation();
        b.generate_elevation();
        assert_eq!(a.r_plate, b.r_plate);
        assert_eq!(a.r_compression, b.r_compression);
        assert_eq!(a.r_elevation, b.r_elevation);
    }
}
