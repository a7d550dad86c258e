//! Dual mesh of the sphere surface
//!
//! Primary cells are *regions* (one per sample point plus the ghost south
//! pole); their dual are Delaunay *triangles*; directed edges between
//! regions are *sides* (half-edges, three per triangle). Every side has a
//! twin after pole stitching, so circulation never needs a boundary check.

pub(crate) mod sampling;
pub(crate) mod triangulation;

use glam::DVec3;

use crate::error::{Result, WorldGenError};
use crate::geometry::cartesian_to_latlon;
use crate::rng::{stage, stage_rng};

/// The dual (Delaunay/Voronoi) mesh on the unit sphere
///
/// Indices: regions `0..num_regions`, triangles `0..num_triangles`, sides
/// `0..num_sides` with `num_sides = 3 · num_triangles`. The last region is
/// the synthetic south pole; triangles at or past
/// `first_ghost_triangle()` are the fan closing the hull around it.
#[derive(Debug, Clone)]
pub struct SphereMesh {
    positions: Vec<DVec3>,
    latlon: Vec<(f64, f64)>,
    triangles: Vec<u32>,
    halfedges: Vec<u32>,
    region_side: Vec<u32>,
    triangle_centers: Vec<DVec3>,
    first_ghost_triangle: usize,
}

impl SphereMesh {
    /// Sample `num_points` regions and build the stitched dual mesh
    ///
    /// Deterministic in `(num_points, jitter, seed)`. The resulting mesh
    /// has `num_points + 1` regions (the ghost pole is appended last).
    ///
    /// # Errors
    ///
    /// `MeshConstruction` when triangulation or stitching fails.
    pub fn build(num_points: usize, jitter: f64, seed: u64) -> Result<Self> {
        let mut rng = stage_rng(seed, stage::MESH);
        let mut positions = sampling::fibonacci_sphere(num_points, jitter, &mut rng);
        let edges = triangulation::triangulate_with_pole(&positions)?;

        // Ghost south-pole region.
        positions.push(DVec3::new(0.0, 0.0, 1.0));

        let latlon: Vec<(f64, f64)> = positions.iter().map(|&p| cartesian_to_latlon(p)).collect();

        // One incident outgoing side per region. First occurrence in side
        // order keeps the table deterministic.
        let num_regions = positions.len();
        let mut region_side = vec![u32::MAX; num_regions];
        for s in 0..edges.triangles.len() {
            let r = edges.triangles[s] as usize;
            if region_side[r] == u32::MAX {
                region_side[r] = s as u32;
            }
        }
        if let Some(orphan) = region_side.iter().position(|&s| s == u32::MAX) {
            return Err(WorldGenError::MeshConstruction(format!(
                "region {} has no incident side",
                orphan
            )));
        }

        let num_triangles = edges.triangles.len() / 3;
        let mut triangle_centers = Vec::with_capacity(num_triangles);
        for t in 0..num_triangles {
            let a = positions[edges.triangles[3 * t] as usize];
            let b = positions[edges.triangles[3 * t + 1] as usize];
            let c = positions[edges.triangles[3 * t + 2] as usize];
            // Mean of the corners projected back to the sphere. Ghost
            // triangles include the pole corner, which offsets their
            // centroid outward past the unpaired side they cover.
            let m = (a + b + c) / 3.0;
            triangle_centers.push(if m.length_squared() > 0.0 {
                m.normalize()
            } else {
                a
            });
        }

        Ok(Self {
            positions,
            latlon,
            triangles: edges.triangles,
            halfedges: edges.halfedges,
            region_side,
            triangle_centers,
            first_ghost_triangle: edges.first_ghost_triangle,
        })
    }

    /// Number of regions, ghost pole included
    #[inline]
    pub fn num_regions(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles, ghost fan included
    #[inline]
    pub fn num_triangles(&self) -> usize {
        self.triangles.len() / 3
    }

    /// Number of sides (`3 · num_triangles`)
    #[inline]
    pub fn num_sides(&self) -> usize {
        self.triangles.len()
    }

    /// The synthetic south-pole region
    #[inline]
    pub fn ghost_region(&self) -> u32 {
        (self.positions.len() - 1) as u32
    }

    /// True for the ghost pole region
    #[inline]
    pub fn is_ghost_region(&self, r: u32) -> bool {
        r == self.ghost_region()
    }

    /// Index of the first ghost (fan) triangle
    #[inline]
    pub fn first_ghost_triangle(&self) -> usize {
        self.first_ghost_triangle
    }

    /// True for triangles of the pole fan
    #[inline]
    pub fn is_ghost_triangle(&self, t: usize) -> bool {
        t >= self.first_ghost_triangle
    }

    /// Unit-sphere position of a region
    #[inline]
    pub fn position(&self, r: u32) -> DVec3 {
        self.positions[r as usize]
    }

    /// All region positions
    #[inline]
    pub fn positions(&self) -> &[DVec3] {
        &self.positions
    }

    /// (latitude, longitude) of a region in degrees
    #[inline]
    pub fn latlon(&self, r: u32) -> (f64, f64) {
        self.latlon[r as usize]
    }

    /// Centroid of a triangle, on the sphere
    #[inline]
    pub fn triangle_center(&self, t: usize) -> DVec3 {
        self.triangle_centers[t]
    }

    /// Next side within the same triangle
    #[inline]
    pub fn next_side(&self, s: u32) -> u32 {
        s - s % 3 + (s + 1) % 3
    }

    /// Previous side within the same triangle
    #[inline]
    pub fn prev_side(&self, s: u32) -> u32 {
        s - s % 3 + (s + 2) % 3
    }

    /// Twin of a side
    #[inline]
    pub fn opposite(&self, s: u32) -> u32 {
        self.halfedges[s as usize]
    }

    /// Region a side starts at
    #[inline]
    pub fn begin_region(&self, s: u32) -> u32 {
        self.triangles[s as usize]
    }

    /// Region a side ends at
    #[inline]
    pub fn end_region(&self, s: u32) -> u32 {
        self.triangles[self.next_side(s) as usize]
    }

    /// Triangle a side belongs to
    #[inline]
    pub fn inner_triangle(&self, s: u32) -> usize {
        (s / 3) as usize
    }

    /// Triangle on the other side of a side
    #[inline]
    pub fn outer_triangle(&self, s: u32) -> usize {
        (self.opposite(s) / 3) as usize
    }

    /// The three corner regions of a triangle
    #[inline]
    pub fn triangle_regions(&self, t: usize) -> [u32; 3] {
        [
            self.triangles[3 * t],
            self.triangles[3 * t + 1],
            self.triangles[3 * t + 2],
        ]
    }

    /// The three sides of a triangle
    #[inline]
    pub fn triangle_sides(&self, t: usize) -> [u32; 3] {
        [(3 * t) as u32, (3 * t + 1) as u32, (3 * t + 2) as u32]
    }

    /// One outgoing side of a region
    #[inline]
    pub fn incident_side(&self, r: u32) -> u32 {
        self.region_side[r as usize]
    }

    /// Visit every outgoing side of a region, in rotation order
    pub fn circulate_sides(&self, r: u32, mut visit: impl FnMut(u32)) {
        let start = self.incident_side(r);
        let mut s = start;
        loop {
            debug_assert_eq!(self.begin_region(s), r);
            visit(s);
            s = self.next_side(self.opposite(s));
            if s == start {
                break;
            }
        }
    }

    /// Neighboring regions, in rotation order
    pub fn neighbors(&self, r: u32) -> Vec<u32> {
        let mut out = Vec::with_capacity(6);
        self.circulate_sides(r, |s| out.push(self.end_region(s)));
        out
    }

    /// Triangles incident to a region, in rotation order
    pub fn incident_triangles(&self, r: u32) -> Vec<usize> {
        let mut out = Vec::with_capacity(6);
        self.circulate_sides(r, |s| out.push(self.inner_triangle(s)));
        out
    }

    /// Degree (neighbor count) of a region
    pub fn degree(&self, r: u32) -> usize {
        let mut count = 0;
        self.circulate_sides(r, |_| count += 1);
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh(n: usize, jitter: f64, seed: u64) -> SphereMesh {
        SphereMesh::build(n, jitter, seed).unwrap()
    }

    #[test]
    fn test_region_and_side_counts() {
        let m = mesh(500, 0.0, 1);
        assert_eq!(m.num_regions(), 501);
        assert_eq!(m.num_sides(), 3 * m.num_triangles());
    }

    #[test]
    fn test_opposite_involution() {
        let m = mesh(300, 0.5, 42);
        for s in 0..m.num_sides() as u32 {
            assert_eq!(m.opposite(m.opposite(s)), s);
        }
    }

    #[test]
    fn test_side_rotation() {
        let m = mesh(100, 0.5, 42);
        for s in 0..m.num_sides() as u32 {
            assert_eq!(m.inner_triangle(m.next_side(s)), m.inner_triangle(s));
            assert_eq!(m.next_side(m.next_side(m.next_side(s))), s);
            assert_eq!(m.prev_side(m.next_side(s)), s);
        }
    }

    #[test]
    fn test_end_region_matches_twin_begin() {
        let m = mesh(200, 0.3, 7);
        for s in 0..m.num_sides() as u32 {
            assert_eq!(m.end_region(s), m.begin_region(m.opposite(s)));
        }
    }

    #[test]
    fn test_neighbor_symmetry() {
        let m = mesh(250, 0.5, 9);
        for r in 0..m.num_regions() as u32 {
            for nb in m.neighbors(r) {
                assert!(
                    m.neighbors(nb).contains(&r),
                    "neighbor relation must be symmetric ({} / {})",
                    r,
                    nb
                );
            }
        }
    }

    #[test]
    fn test_circulation_covers_all_outgoing_sides() {
        let m = mesh(150, 0.5, 3);
        let mut counted = vec![0usize; m.num_regions()];
        for r in 0..m.num_regions() as u32 {
            counted[r as usize] = m.degree(r);
        }
        let total: usize = counted.iter().sum();
        assert_eq!(total, m.num_sides());
    }

    #[test]
    fn test_ghost_pole_position() {
        let m = mesh(100, 0.0, 1);
        let pole = m.ghost_region();
        let (lat, _) = m.latlon(pole);
        assert!((lat + 90.0).abs() < 1e-9, "ghost region sits at the south pole");
        assert!(m.degree(pole) >= 3);
    }

    #[test]
    fn test_triangle_centers_on_sphere() {
        let m = mesh(200, 0.5, 5);
        for t in 0..m.num_triangles() {
            assert!((m.triangle_center(t).length() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_determinism() {
        let a = mesh(400, 0.5, 77);
        let b = mesh(400, 0.5, 77);
        assert_eq!(a.triangles, b.triangles);
        assert_eq!(a.halfedges, b.halfedges);
        assert_eq!(a.positions, b.positions);
    }

    #[test]
    fn test_jitter_changes_mesh() {
        let a = mesh(400, 0.8, 1);
        let b = mesh(400, 0.8, 2);
        assert_ne!(a.positions, b.positions);
    }
}
