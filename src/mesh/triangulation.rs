//! Stereographic Delaunay triangulation with south-pole stitching
//!
//! The sampled points are projected stereographically to the plane, where
//! their Delaunay triangulation is computed by lifting each planar point
//! `(x, y)` onto the paraboloid `(x, y, x² + y²)` and taking the lower
//! faces of the 3D convex hull. The hull itself comes from parry's
//! `convex_hull`.
//!
//! The planar triangulation leaves a hole where the projection pole was:
//! its convex-hull boundary rings the south cap. A synthetic south-pole
//! region is appended and one fan triangle is stitched over every boundary
//! side, after which every half-edge has a twin.
//!
//! Half-edge conventions (three sides per triangle, side `s` belongs to
//! triangle `s/3`):
//! - `triangles[s]` is the region a side starts at; it ends at
//!   `triangles[next(s)]`.
//! - `halfedges[s]` is the opposite side in the adjacent triangle.

use glam::{DVec2, DVec3};
use parry3d_f64::math::Point;
use parry3d_f64::transformation;
use std::collections::HashMap;

use crate::error::{Result, WorldGenError};
use crate::geometry::stereographic;

/// Raw half-edge arrays produced by triangulation + stitching
pub(crate) struct HalfEdges {
    /// Region index per side, 3 per triangle
    pub triangles: Vec<u32>,
    /// Twin side per side
    pub halfedges: Vec<u32>,
    /// Triangles at indices >= this are ghost fan triangles
    pub first_ghost_triangle: usize,
}

#[inline]
fn next_side(s: usize) -> usize {
    s - s % 3 + (s + 1) % 3
}

/// Triangulate the sampled sphere points and close the mesh around the
/// synthetic south pole (region index `points.len()`).
pub(crate) fn triangulate_with_pole(points: &[DVec3]) -> Result<HalfEdges> {
    let n = points.len();
    let planar: Vec<DVec2> = points.iter().map(|&p| stereographic(p)).collect();

    // Lift onto the paraboloid; the lower hull of the lifted cloud is the
    // planar Delaunay triangulation.
    let lifted: Vec<Point<f64>> = planar
        .iter()
        .map(|p| Point::new(p.x, p.y, p.x * p.x + p.y * p.y))
        .collect();

    let (hull_vertices, hull_faces) = transformation::convex_hull(&lifted);

    // Hull vertices are copies of input points; map them back to region
    // indices by exact planar coordinates.
    let mut index_of: HashMap<(u64, u64), u32> = HashMap::with_capacity(n);
    for (i, p) in planar.iter().enumerate() {
        index_of.insert((p.x.to_bits(), p.y.to_bits()), i as u32);
    }

    let mut faces: Vec<[u32; 3]> = Vec::with_capacity(hull_faces.len());
    for face in &hull_faces {
        let mut regions = [0u32; 3];
        for (slot, &hv) in face.iter().enumerate() {
            let v = hull_vertices.get(hv as usize).ok_or_else(|| {
                WorldGenError::MeshConstruction("convex hull face references missing vertex".into())
            })?;
            regions[slot] = *index_of.get(&(v.x.to_bits(), v.y.to_bits())).ok_or_else(|| {
                WorldGenError::MeshConstruction(
                    "hull vertex does not match any projected sample".into(),
                )
            })?;
        }

        // Keep only the lower hull. The lift is strictly convex, so the
        // lower faces are exactly the Delaunay triangles. Outward normals
        // point down on the lower hull, which makes the planar winding
        // clockwise; store the face flipped to counter-clockwise.
        let a = &lifted[regions[0] as usize];
        let b = &lifted[regions[1] as usize];
        let c = &lifted[regions[2] as usize];
        let winding = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
        if winding >= 0.0 {
            continue;
        }
        faces.push([regions[0], regions[2], regions[1]]);
    }

    if faces.is_empty() {
        return Err(WorldGenError::MeshConstruction(
            "triangulation produced no lower-hull faces".into(),
        ));
    }

    // Every sample must survive into the triangulation.
    let mut present = vec![false; n];
    for f in &faces {
        for &r in f {
            present[r as usize] = true;
        }
    }
    if let Some(missing) = present.iter().position(|&p| !p) {
        return Err(WorldGenError::MeshConstruction(format!(
            "sample {} is missing from the triangulation (degenerate input?)",
            missing
        )));
    }

    // Flatten and pair half-edges.
    let mut triangles: Vec<u32> = Vec::with_capacity(faces.len() * 3 + n * 3);
    for f in &faces {
        triangles.extend_from_slice(f);
    }

    let mut halfedges: Vec<i64> = vec![-1; triangles.len()];
    let mut edge_map: HashMap<(u32, u32), usize> = HashMap::with_capacity(triangles.len());
    for s in 0..triangles.len() {
        let from = triangles[s];
        let to = triangles[next_side(s)];
        if edge_map.insert((from, to), s).is_some() {
            return Err(WorldGenError::MeshConstruction(format!(
                "duplicate directed edge {} -> {}",
                from, to
            )));
        }
    }
    for s in 0..triangles.len() {
        let from = triangles[s];
        let to = triangles[next_side(s)];
        if let Some(&twin) = edge_map.get(&(to, from)) {
            halfedges[s] = twin as i64;
        }
    }

    stitch_pole(n as u32, &mut triangles, &mut halfedges)?;

    let halfedges: Vec<u32> = halfedges
        .iter()
        .map(|&h| {
            if h < 0 {
                Err(WorldGenError::MeshConstruction(
                    "side left unpaired after pole stitching".into(),
                ))
            } else {
                Ok(h as u32)
            }
        })
        .collect::<Result<_>>()?;

    // Involution check: opposite(opposite(s)) == s.
    for (s, &h) in halfedges.iter().enumerate() {
        if halfedges[h as usize] as usize != s {
            return Err(WorldGenError::MeshConstruction(format!(
                "half-edge involution broken at side {}",
                s
            )));
        }
    }

    let first_ghost_triangle = faces.len();
    Ok(HalfEdges {
        triangles,
        halfedges,
        first_ghost_triangle,
    })
}

/// Fan one ghost triangle over every unpaired boundary side
///
/// A boundary side `a → b` gains the triangle `(b, a, pole)`; its first
/// side pairs with the boundary side, and the two spoke sides pair with the
/// spokes of the neighboring fan triangles around the pole.
fn stitch_pole(pole: u32, triangles: &mut Vec<u32>, halfedges: &mut Vec<i64>) -> Result<()> {
    let solid_sides = triangles.len();
    let boundary: Vec<usize> = (0..solid_sides).filter(|&s| halfedges[s] < 0).collect();
    if boundary.is_empty() {
        return Err(WorldGenError::MeshConstruction(
            "no boundary sides found; projection hole is missing".into(),
        ));
    }

    // Fan triangle index by the region its boundary side ends at.
    let mut fan_by_end: HashMap<u32, usize> = HashMap::with_capacity(boundary.len());
    let mut fan_by_begin: HashMap<u32, usize> = HashMap::with_capacity(boundary.len());

    for &s in &boundary {
        let a = triangles[s];
        let b = triangles[next_side(s)];
        let t = triangles.len() / 3;
        triangles.extend_from_slice(&[b, a, pole]);
        halfedges.extend_from_slice(&[-1, -1, -1]);

        // Side 3t runs b → a: twin of the boundary side.
        halfedges[3 * t] = s as i64;
        halfedges[s] = (3 * t) as i64;

        if fan_by_begin.insert(a, t).is_some() || fan_by_end.insert(b, t).is_some() {
            return Err(WorldGenError::MeshConstruction(
                "boundary loop visits a region twice".into(),
            ));
        }
    }

    // Spoke pairing: side 3t+1 (a → pole) twins with side 3t'+2
    // (pole → a) of the fan whose boundary side ends at a.
    for (&a, &t) in &fan_by_begin {
        let t_prev = *fan_by_end.get(&a).ok_or_else(|| {
            WorldGenError::MeshConstruction("boundary loop around the pole is not closed".into())
        })?;
        halfedges[3 * t + 1] = (3 * t_prev + 2) as i64;
        halfedges[3 * t_prev + 2] = (3 * t + 1) as i64;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::sampling::fibonacci_sphere;
    use crate::rng::{stage, stage_rng};

    fn triangulate(n: usize, jitter: f64, seed: u64) -> HalfEdges {
        let mut rng = stage_rng(seed, stage::MESH);
        let points = fibonacci_sphere(n, jitter, &mut rng);
        triangulate_with_pole(&points).unwrap()
    }

    #[test]
    fn test_every_side_has_a_twin() {
        let mesh = triangulate(200, 0.5, 42);
        for s in 0..mesh.halfedges.len() {
            let twin = mesh.halfedges[s] as usize;
            assert_eq!(mesh.halfedges[twin] as usize, s);
            assert_ne!(twin, s);
        }
    }

    #[test]
    fn test_euler_characteristic() {
        // Closed triangulated sphere: V − E + F = 2, E = 3F/2.
        let n = 300;
        let mesh = triangulate(n, 0.3, 7);
        let v = (n + 1) as i64;
        let f = (mesh.triangles.len() / 3) as i64;
        let e = (mesh.triangles.len() / 2) as i64;
        assert_eq!(v - e + f, 2);
    }

    #[test]
    fn test_pole_region_present() {
        let n = 100;
        let mesh = triangulate(n, 0.0, 1);
        let pole = n as u32;
        let pole_sides = mesh.triangles.iter().filter(|&&r| r == pole).count();
        assert!(pole_sides >= 3, "pole must be a corner of the ghost fan");
        // Pole only appears in ghost triangles.
        for t in 0..mesh.first_ghost_triangle {
            for k in 0..3 {
                assert_ne!(mesh.triangles[3 * t + k], pole);
            }
        }
    }

    #[test]
    fn test_all_regions_used() {
        let n = 500;
        let mesh = triangulate(n, 0.9, 3);
        let mut seen = vec![false; n + 1];
        for &r in &mesh.triangles {
            seen[r as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_deterministic() {
        let a = triangulate(400, 0.5, 11);
        let b = triangulate(400, 0.5, 11);
        assert_eq!(a.triangles, b.triangles);
        assert_eq!(a.halfedges, b.halfedges);
    }
}
