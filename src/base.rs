//! Per-region and per-triangle scalar fields plus the primitives the
//! pipeline stages share: downhill graph, slope and steepness, BFS
//! distance fields, and region/triangle interpolation.
//!
//! All fields are sized and zero-initialized when the mesh is built. Each
//! stage mutates them in place; downhill, flux and steepness are pure
//! functions of the current elevation array and can be recomputed after
//! any elevation mutation.

use std::collections::HashMap;
use std::collections::VecDeque;

use glam::{DVec2, DVec3};
use rand_chacha::ChaCha8Rng;

use crate::geometry::great_arc;
use crate::mesh::SphereMesh;
use crate::noise::FbmSampler;
use crate::regions::Biome;
use crate::rng::RandomFrontier;

/// Sentinel for "no region" in index fields
pub const NO_REGION: i32 = -1;
/// Sentinel in waterbody/landmass labels for "the other kind"
pub const OTHER_KIND: i32 = -2;

/// Scale from nominal elevation (1.0) to meters, used by the temperature
/// lapse and steepness conversions.
pub const MAX_ALTITUDE_M: f64 = 8_000.0;

/// Flux-over-rainfall ratio above which a region counts as riverine
pub(crate) const RIVER_FLUX_RATIO: f64 = 10.0;

/// The world's field arrays and their shared primitives
///
/// Field naming: `r_*` arrays have one entry per region, `t_*` per
/// triangle. Cross-references are indices, never pointers, so the arrays
/// can be regenerated wholesale.
#[derive(Debug, Clone)]
pub struct BaseWorld {
    pub(crate) mesh: SphereMesh,
    pub(crate) seed: u64,
    pub(crate) noise: FbmSampler,

    // Region fields.
    pub(crate) r_elevation: Vec<f64>,
    pub(crate) r_moisture: Vec<f64>,
    pub(crate) r_rainfall: Vec<f64>,
    pub(crate) r_flux: Vec<f64>,
    pub(crate) r_waterpool: Vec<f64>,
    pub(crate) r_river_evap: Vec<bool>,
    pub(crate) r_downhill: Vec<i32>,
    pub(crate) r_drainage: Vec<i32>,
    pub(crate) r_waterbody: Vec<i32>,
    pub(crate) r_landmass: Vec<i32>,
    pub(crate) r_biome: Vec<Biome>,
    pub(crate) r_biome_region: Vec<i32>,
    pub(crate) r_plate: Vec<u32>,
    pub(crate) r_compression: Vec<f64>,
    pub(crate) r_temperature: Vec<f64>,
    pub(crate) r_wind: Vec<DVec2>,
    pub(crate) r_metals: Vec<u8>,
    pub(crate) r_gems: Vec<u8>,
    pub(crate) r_stones: Vec<u8>,

    // Plate metadata, keyed by the plate's seed region.
    pub(crate) plate_seeds: Vec<u32>,
    pub(crate) plate_vector: HashMap<u32, DVec3>,
    pub(crate) plate_is_ocean: HashMap<u32, bool>,
    pub(crate) mountain_regions: Vec<u32>,
    pub(crate) coastline_regions: Vec<u32>,
    pub(crate) ocean_regions: Vec<u32>,
    pub(crate) volcano_regions: Vec<u32>,
    pub(crate) faultline_regions: Vec<u32>,

    // Triangle fields (derived, used by exporters and river tracing).
    pub(crate) t_elevation: Vec<f64>,
    pub(crate) t_moisture: Vec<f64>,
    pub(crate) t_waterpool: Vec<f64>,
    pub(crate) t_downflow_side: Vec<i32>,
    pub(crate) t_flow: Vec<f64>,
    pub(crate) t_order: Vec<u32>,

    // Connected-component sizes, indexed by label.
    pub(crate) waterbody_size: Vec<usize>,
    pub(crate) landmass_size: Vec<usize>,
    pub(crate) biome_region_size: Vec<usize>,

    // Graph distances to features (radians-equivalent BFS hops).
    pub(crate) r_dist_coast: Vec<f64>,
    pub(crate) r_dist_mountain: Vec<f64>,
    pub(crate) r_dist_river: Vec<f64>,
    pub(crate) r_dist_volcano: Vec<f64>,
    pub(crate) r_dist_fault: Vec<f64>,

    // Natural-hazard scores in [0, 1].
    pub(crate) r_danger_rockslide: Vec<f64>,
    pub(crate) r_danger_earthquake: Vec<f64>,
    pub(crate) r_danger_volcano: Vec<f64>,
    pub(crate) r_danger_flood: Vec<f64>,
}

impl BaseWorld {
    /// Allocate all fields, zero-initialized, for the given mesh
    pub fn new(mesh: SphereMesh, seed: u64) -> Self {
        let r = mesh.num_regions();
        let t = mesh.num_triangles();
        Self {
            noise: FbmSampler::new(seed),
            seed,
            r_elevation: vec![0.0; r],
            r_moisture: vec![0.0; r],
            r_rainfall: vec![0.0; r],
            r_flux: vec![0.0; r],
            r_waterpool: vec![0.0; r],
            r_river_evap: vec![false; r],
            r_downhill: vec![NO_REGION; r],
            r_drainage: vec![NO_REGION; r],
            r_waterbody: vec![OTHER_KIND; r],
            r_landmass: vec![OTHER_KIND; r],
            r_biome: vec![Biome::Ocean; r],
            r_biome_region: vec![NO_REGION; r],
            r_plate: vec![0; r],
            r_compression: vec![0.0; r],
            r_temperature: vec![0.0; r],
            r_wind: vec![DVec2::ZERO; r],
            r_metals: vec![0; r],
            r_gems: vec![0; r],
            r_stones: vec![0; r],
            plate_seeds: Vec::new(),
            plate_vector: HashMap::new(),
            plate_is_ocean: HashMap::new(),
            mountain_regions: Vec::new(),
            coastline_regions: Vec::new(),
            ocean_regions: Vec::new(),
            volcano_regions: Vec::new(),
            faultline_regions: Vec::new(),
            t_elevation: vec![0.0; t],
            t_moisture: vec![0.0; t],
            t_waterpool: vec![0.0; t],
            t_downflow_side: vec![NO_REGION; t],
            t_flow: vec![0.0; t],
            t_order: (0..t as u32).collect(),
            waterbody_size: Vec::new(),
            landmass_size: Vec::new(),
            biome_region_size: Vec::new(),
            r_dist_coast: vec![f64::INFINITY; r],
            r_dist_mountain: vec![f64::INFINITY; r],
            r_dist_river: vec![f64::INFINITY; r],
            r_dist_volcano: vec![f64::INFINITY; r],
            r_dist_fault: vec![f64::INFINITY; r],
            r_danger_rockslide: vec![0.0; r],
            r_danger_earthquake: vec![0.0; r],
            r_danger_volcano: vec![0.0; r],
            r_danger_flood: vec![0.0; r],
            mesh,
        }
    }

    /// The underlying dual mesh
    #[inline]
    pub fn mesh(&self) -> &SphereMesh {
        &self.mesh
    }

    /// Effective surface height: elevation plus standing water
    #[inline]
    pub(crate) fn surface_height(&self, r: u32) -> f64 {
        self.r_elevation[r as usize] + self.r_waterpool[r as usize]
    }

    /// True when a region is under the sea or a pooled lake
    #[inline]
    pub(crate) fn is_water(&self, r: u32) -> bool {
        self.r_elevation[r as usize] < 0.0 || self.r_waterpool[r as usize] > 0.0
    }

    /// True when a region carries river-scale flux
    #[inline]
    pub(crate) fn is_riverine(&self, r: u32) -> bool {
        self.r_flux[r as usize] > RIVER_FLUX_RATIO * self.r_rainfall[r as usize].max(1e-9)
    }

    /// Recompute the downhill neighbor of every region
    ///
    /// The downhill neighbor is the strictly lowest neighbor under
    /// `elevation` (plus `waterpool` when `use_pools` is set), or
    /// [`NO_REGION`] for a sink.
    pub(crate) fn assign_downhill(&mut self, use_pools: bool) {
        let num = self.mesh.num_regions() as u32;
        for r in 0..num {
            let h = if use_pools {
                self.surface_height(r)
            } else {
                self.r_elevation[r as usize]
            };
            let mut best = NO_REGION;
            let mut best_h = h;
            self.mesh.circulate_sides(r, |s| {
                let nb = self.mesh.end_region(s);
                let nb_h = if use_pools {
                    self.r_elevation[nb as usize] + self.r_waterpool[nb as usize]
                } else {
                    self.r_elevation[nb as usize]
                };
                if nb_h < best_h {
                    best_h = nb_h;
                    best = nb as i32;
                }
            });
            self.r_downhill[r as usize] = best;
        }
    }

    /// All regions with no strictly lower neighbor
    pub(crate) fn sinks(&self) -> Vec<u32> {
        self.r_downhill
            .iter()
            .enumerate()
            .filter(|(_, &dh)| dh == NO_REGION)
            .map(|(r, _)| r as u32)
            .collect()
    }

    /// Surface normal of the elevation polygon around a region
    ///
    /// The neighbors, lifted radially by their elevation, form a polygon;
    /// its area-weighted normal tilts away from higher ground.
    pub(crate) fn slope_vector(&self, r: u32) -> DVec3 {
        let lift = |rr: u32| {
            self.mesh.position(rr) * (1.0 + 0.1 * self.r_elevation[rr as usize])
        };
        let nbs = self.mesh.neighbors(r);
        if nbs.len() < 3 {
            return DVec3::ZERO;
        }
        let mut normal = DVec3::ZERO;
        for i in 0..nbs.len() {
            let a = lift(nbs[i]);
            let b = lift(nbs[(i + 1) % nbs.len()]);
            normal += a.cross(b);
        }
        // Tangential component only; the radial part is just "up".
        let up = self.mesh.position(r);
        let normal = normal.normalize_or_zero();
        normal - up * normal.dot(up)
    }

    /// Steepness of a region in [0, 1)
    ///
    /// `atan(Δh / arc) · 2/π` against the steepest neighbor, with Δh taken
    /// in the same arc-radian scale as the distance.
    pub(crate) fn steepness(&self, r: u32) -> f64 {
        let mut max_grade: f64 = 0.0;
        let pos = self.mesh.position(r);
        let h = self.r_elevation[r as usize];
        for nb in self.mesh.neighbors(r) {
            let dist = great_arc(pos, self.mesh.position(nb));
            if dist <= 0.0 {
                continue;
            }
            let dh = (h - self.r_elevation[nb as usize]).abs();
            max_grade = max_grade.max(dh / dist);
        }
        max_grade.atan() * std::f64::consts::FRAC_2_PI
    }

    /// BFS distance field from a set of seed regions
    ///
    /// Distances count weighted steps. `stop` marks regions the front must
    /// not expand through (they still receive a distance when entered).
    /// With `compression_weighted`, a step into a compressed region is
    /// cheaper, letting mountain chains reach further. A supplied RNG
    /// switches the frontier to uniformly random expansion order, which
    /// roughens the field edges the way plate growth does.
    pub(crate) fn distance_field(
        &self,
        seeds: &[u32],
        stop: impl Fn(u32) -> bool,
        compression_weighted: bool,
        mut rng: Option<&mut ChaCha8Rng>,
    ) -> Vec<f64> {
        let num = self.mesh.num_regions();
        let mut dist = vec![f64::INFINITY; num];

        let max_compression = self
            .r_compression
            .iter()
            .fold(0.0f64, |m, &c| m.max(c.abs()))
            .max(1e-12);
        let step_weight = |nb: u32| -> f64 {
            if !compression_weighted {
                return 1.0;
            }
            let c = (self.r_compression[nb as usize] / max_compression).clamp(-1.0, 1.0);
            (1.0 - 0.5 * c).max(0.25)
        };

        let mut fifo: VecDeque<u32> = VecDeque::new();
        let mut random = RandomFrontier::new();
        for &s in seeds {
            if dist[s as usize].is_finite() {
                continue;
            }
            dist[s as usize] = 0.0;
            if rng.is_some() {
                random.push(s);
            } else {
                fifo.push_back(s);
            }
        }

        loop {
            let r = match rng.as_deref_mut() {
                Some(rng) => random.pop_random(rng),
                None => fifo.pop_front(),
            };
            let Some(r) = r else { break };
            if stop(r) && dist[r as usize] > 0.0 {
                continue;
            }
            for nb in self.mesh.neighbors(r) {
                if dist[nb as usize].is_finite() {
                    continue;
                }
                dist[nb as usize] = dist[r as usize] + step_weight(nb);
                if rng.is_some() {
                    random.push(nb);
                } else {
                    fifo.push_back(nb);
                }
            }
        }
        dist
    }

    /// Average a region field onto triangles
    pub(crate) fn interpolate_to_triangles(&self, field: &[f64]) -> Vec<f64> {
        (0..self.mesh.num_triangles())
            .map(|t| {
                let [a, b, c] = self.mesh.triangle_regions(t);
                (field[a as usize] + field[b as usize] + field[c as usize]) / 3.0
            })
            .collect()
    }

    /// Average a triangle field back onto regions
    pub(crate) fn interpolate_to_regions(&self, field: &[f64]) -> Vec<f64> {
        (0..self.mesh.num_regions() as u32)
            .map(|r| {
                let tris = self.mesh.incident_triangles(r);
                if tris.is_empty() {
                    return 0.0;
                }
                tris.iter().map(|&t| field[t]).sum::<f64>() / tris.len() as f64
            })
            .collect()
    }

    /// The fBm sampler seeded for this world
    #[inline]
    pub(crate) fn fbm(&self) -> &FbmSampler {
        &self.noise
    }
}
