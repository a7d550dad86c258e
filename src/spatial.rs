//! Nearest-region lookup backed by a k-d tree
//!
//! Only compiled with the `spatial-index` feature. The ghost region is
//! left out of the tree so lookups always land on a real sample point.

use glam::DVec3;
use kiddo::{ImmutableKdTree, SquaredEuclidean};

use crate::mesh::SphereMesh;

/// Immutable k-d tree over the region centers
pub(crate) struct RegionIndex {
    tree: ImmutableKdTree<f64, 3>,
}

impl RegionIndex {
    /// Index every non-ghost region of a mesh
    pub(crate) fn build(mesh: &SphereMesh) -> Self {
        let entries: Vec<[f64; 3]> = (0..mesh.ghost_region())
            .map(|r| mesh.position(r).to_array())
            .collect();
        Self {
            tree: ImmutableKdTree::new_from_slice(&entries),
        }
    }

    /// The region whose center is closest to a unit-sphere point
    ///
    /// Chord distance and arc distance order points identically, so the
    /// Euclidean nearest neighbor is also the spherical one.
    pub(crate) fn nearest(&self, point: DVec3) -> u32 {
        let found = self.tree.nearest_one::<SquaredEuclidean>(&point.to_array());
        found.item as u32
    }
}
