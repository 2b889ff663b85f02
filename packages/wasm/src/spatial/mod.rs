//! Spatial indexing for the layout engine.
//!
//! - `octree`: Barnes-Hut octree approximating all-pairs repulsion in O(n log n)
//! - `rtree`: R-tree over input positions for duplicate detection

pub mod octree;
mod rtree;

pub use octree::{Octree, OctreeNode};
pub use rtree::{PositionIndex, find_coincident};
