//! Graph data structures.
//!
//! This module provides the layout graph using petgraph's StableGraph for
//! topology, with Structure of Arrays (SoA) layout for positions so they can
//! be handed to JavaScript without copying.

mod edge;
mod layout_graph;
mod vertex;

pub use edge::{Edge, EdgeId};
pub use layout_graph::LayoutGraph;
pub use vertex::VertexId;
