//! Dense graph model consumed by the minimizer.
//!
//! Converts a vertex count and an edge list into:
//! - a repulsion weight per vertex (1.0, or the weighted degree)
//! - symmetric attraction lists in CSR form (offsets, neighbors, weights)
//! - a fixed flag per vertex
//!
//! Self-loops carry no energy and are dropped with a warning.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::graph::{Edge, VertexId};
use crate::layout::config::LayoutConfig;
use crate::vector::Vector3;

/// Weighted edge-length summary of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeLengthStats {
    pub vertex_count: usize,
    /// Sum of edge weights, each undirected edge counted once.
    pub total_attraction: f32,
    /// Weighted arithmetic mean of edge lengths.
    pub arithmetic_mean: f32,
    /// Weighted geometric mean of edge lengths.
    pub geometric_mean: f32,
}

/// Per-vertex repulsion weights, attraction lists, and fixed flags.
#[derive(Debug, Clone)]
pub struct GraphModel {
    repulsion: Vec<f32>,
    /// CSR offsets into `neighbors`/`weights`, `vertex_count + 1` entries.
    offsets: Vec<u32>,
    neighbors: Vec<u32>,
    weights: Vec<f32>,
    fixed: Vec<bool>,
    skipped_self_loops: Vec<VertexId>,
}

impl GraphModel {
    /// Build the model for `vertex_count` vertices.
    ///
    /// With `vertex_repulsion` every vertex repulses with weight 1.0;
    /// otherwise with the sum of the (unmodified) weights of its incident
    /// edges. With `ignore_edge_weights` every attraction weight is 1.0.
    /// Edges whose effective weight is 0 are omitted from the attraction
    /// lists.
    pub fn new(
        vertex_count: usize,
        edges: &[Edge],
        vertex_repulsion: bool,
        ignore_edge_weights: bool,
    ) -> Result<Self> {
        for edge in edges {
            if edge.tail.index() >= vertex_count || edge.head.index() >= vertex_count {
                return Err(Error::EdgeOutOfRange {
                    tail: edge.tail.raw(),
                    head: edge.head.raw(),
                    vertex_count,
                });
            }
            if !edge.weight.is_finite() || edge.weight < 0.0 {
                return Err(Error::InvalidEdgeWeight {
                    tail: edge.tail.raw(),
                    head: edge.head.raw(),
                    weight: edge.weight,
                });
            }
        }

        let mut skipped_self_loops = Vec::new();
        let mut degree = vec![0.0f32; vertex_count];
        let mut offsets = vec![0u32; vertex_count + 1];

        let effective_weight = |edge: &Edge| {
            if ignore_edge_weights { 1.0 } else { edge.weight }
        };

        // Count list lengths
        for edge in edges {
            if edge.is_self_loop() {
                log::warn!(vertex = edge.tail.raw(); "Skipping reflexive edge");
                skipped_self_loops.push(edge.tail);
                continue;
            }
            degree[edge.tail.index()] += edge.weight;
            degree[edge.head.index()] += edge.weight;
            if effective_weight(edge) > 0.0 {
                offsets[edge.tail.index() + 1] += 1;
                offsets[edge.head.index() + 1] += 1;
            }
        }

        // Prefix sum
        for i in 1..=vertex_count {
            offsets[i] += offsets[i - 1];
        }

        // Fill both directions so the lists are symmetric
        let total = offsets[vertex_count] as usize;
        let mut neighbors = vec![0u32; total];
        let mut weights = vec![0.0f32; total];
        let mut cursor = offsets[..vertex_count].to_vec();
        for edge in edges.iter().filter(|e| !e.is_self_loop()) {
            let weight = effective_weight(edge);
            if weight <= 0.0 {
                continue;
            }
            for (from, to) in [(edge.tail, edge.head), (edge.head, edge.tail)] {
                let slot = cursor[from.index()] as usize;
                neighbors[slot] = to.raw();
                weights[slot] = weight;
                cursor[from.index()] += 1;
            }
        }

        let repulsion = if vertex_repulsion {
            vec![1.0; vertex_count]
        } else {
            degree
        };

        Ok(Self {
            repulsion,
            offsets,
            neighbors,
            weights,
            fixed: vec![false; vertex_count],
            skipped_self_loops,
        })
    }

    /// Build the model with the repulsion mode and weighting from `config`.
    pub fn from_config(vertex_count: usize, edges: &[Edge], config: &LayoutConfig) -> Result<Self> {
        Self::new(
            vertex_count,
            edges,
            config.vertex_repulsion,
            config.ignore_edge_weights,
        )
    }

    /// Set the fixed flags; fixed vertices are never moved.
    pub fn with_fixed(mut self, fixed: &[bool]) -> Result<Self> {
        if fixed.len() != self.vertex_count() {
            return Err(Error::PositionCountMismatch {
                expected: self.vertex_count(),
                actual: fixed.len(),
            });
        }
        self.fixed = fixed.to_vec();
        Ok(self)
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.repulsion.len()
    }

    /// Repulsion weight of vertex `v`.
    #[inline]
    pub fn repulsion(&self, v: usize) -> f32 {
        self.repulsion[v]
    }

    pub fn repulsion_weights(&self) -> &[f32] {
        &self.repulsion
    }

    /// `(neighbor, weight)` pairs of vertex `v`'s attraction list.
    #[inline]
    pub fn attractions(&self, v: usize) -> impl Iterator<Item = (usize, f32)> + '_ {
        let range = self.offsets[v] as usize..self.offsets[v + 1] as usize;
        self.neighbors[range.clone()]
            .iter()
            .zip(&self.weights[range])
            .map(|(&n, &w)| (n as usize, w))
    }

    #[inline]
    pub fn is_fixed(&self, v: usize) -> bool {
        self.fixed[v]
    }

    /// Vertices whose reflexive edges were dropped, one entry per edge.
    pub fn skipped_self_loops(&self) -> &[VertexId] {
        &self.skipped_self_loops
    }

    /// Sum of all attraction list weights (each edge counted from both ends).
    pub fn total_attraction(&self) -> f32 {
        self.weights.iter().sum()
    }

    /// Sum of all repulsion weights.
    pub fn total_repulsion(&self) -> f32 {
        self.repulsion.iter().sum()
    }

    /// Weighted arithmetic and geometric mean of the edge lengths.
    pub fn edge_length_stats(&self, positions: &[Vector3]) -> EdgeLengthStats {
        let mut length_sum = 0.0f32;
        let mut log_length_sum = 0.0f32;
        let mut attraction = 0.0f32;

        for (v, &position) in positions.iter().enumerate().take(self.vertex_count()) {
            for (n, w) in self.attractions(v) {
                let dist = position.distance(positions[n]);
                length_sum += w * dist;
                log_length_sum += w * dist.ln();
                attraction += w;
            }
        }

        // Every edge was visited from both ends
        length_sum /= 2.0;
        log_length_sum /= 2.0;
        attraction /= 2.0;

        if attraction == 0.0 {
            return EdgeLengthStats {
                vertex_count: self.vertex_count(),
                total_attraction: 0.0,
                arithmetic_mean: 0.0,
                geometric_mean: 0.0,
            };
        }

        EdgeLengthStats {
            vertex_count: self.vertex_count(),
            total_attraction: attraction,
            arithmetic_mean: length_sum / attraction,
            geometric_mean: (log_length_sum / attraction).exp(),
        }
    }
}
