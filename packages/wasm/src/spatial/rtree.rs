//! R-tree over initial vertex positions using the rstar crate.
//!
//! The octree cannot separate two vertices that share a position, so the
//! minimizer uses this index to reject such inputs before building one.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::vector::Vector3;

/// A vertex position in the index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexPoint {
    /// The vertex index.
    pub vertex: u32,
    /// Position as `[x, y, z]`.
    pub position: [f32; 3],
}

impl VertexPoint {
    /// Create a new VertexPoint.
    pub fn new(vertex: u32, position: Vector3) -> Self {
        Self {
            vertex,
            position: position.into(),
        }
    }
}

impl RTreeObject for VertexPoint {
    type Envelope = AABB<[f32; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for VertexPoint {
    fn distance_2(&self, point: &[f32; 3]) -> f32 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        let dz = self.position[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }

    fn contains_point(&self, point: &[f32; 3]) -> bool {
        self.position == *point
    }
}

/// Spatial index over vertex positions.
pub struct PositionIndex {
    tree: RTree<VertexPoint>,
}

impl PositionIndex {
    /// Bulk load an index from positions; vertex ids are the slice indices.
    pub fn from_positions(positions: &[Vector3]) -> Self {
        let points = positions
            .iter()
            .enumerate()
            .map(|(i, &p)| VertexPoint::new(i as u32, p))
            .collect();

        Self {
            tree: RTree::bulk_load(points),
        }
    }

    /// Vertices stored at exactly `position`.
    pub fn vertices_at(&self, position: Vector3) -> Vec<u32> {
        let point: [f32; 3] = position.into();
        let mut vertices: Vec<u32> = self
            .tree
            .locate_all_at_point(&point)
            .map(|p| p.vertex)
            .collect();
        vertices.sort_unstable();
        vertices
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.tree.size()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

/// Find the lowest-indexed pair of vertices with identical positions.
///
/// Returns `(first, second)` with `first < second`, or `None` when all
/// positions are distinct. Nearly equal positions are not reported.
pub fn find_coincident(positions: &[Vector3]) -> Option<(u32, u32)> {
    let index = PositionIndex::from_positions(positions);

    positions.iter().enumerate().find_map(|(i, &p)| {
        index
            .vertices_at(p)
            .into_iter()
            .find(|&other| other != i as u32)
            .map(|other| (i as u32, other))
    })
}
