//! Edge types.
//!
//! Edges are ordered pairs of vertices with a non-negative weight. The
//! minimizer treats them as undirected attraction between both endpoints.

use std::fmt;

use super::vertex::VertexId;

/// Stable edge identifier, assigned in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeId(pub u32);

impl EdgeId {
    /// Create a new EdgeId from a raw u32.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Edge({})", self.0)
    }
}

impl From<u32> for EdgeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<EdgeId> for u32 {
    #[inline]
    fn from(id: EdgeId) -> Self {
        id.0
    }
}

/// A weighted edge as consumed by the graph model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub tail: VertexId,
    pub head: VertexId,
    pub weight: f32,
}

impl Edge {
    pub fn new(tail: impl Into<VertexId>, head: impl Into<VertexId>, weight: f32) -> Self {
        Self {
            tail: tail.into(),
            head: head.into(),
            weight,
        }
    }

    /// Whether both endpoints are the same vertex.
    #[inline]
    pub fn is_self_loop(&self) -> bool {
        self.tail == self.head
    }
}
