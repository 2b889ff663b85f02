//! LayoutGraph - graph container for energy-based layout.
//!
//! The LayoutGraph stores the topology using petgraph's StableGraph and keeps
//! SoA (Structure of Arrays) buffers for positions so that JavaScript can
//! read them through zero-copy views. Vertices are never removed, so a
//! vertex's petgraph index, its `VertexId` and its buffer slot coincide.

use petgraph::Directed;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::edge::{Edge, EdgeId};
use super::vertex::VertexId;
use crate::error::{ObserverClosed, Result};
use crate::layout::{GraphModel, LayoutConfig, LayoutStats, Minimizer};
use crate::vector::Vector3;

/// Graph with per-vertex positions and fixed flags.
///
/// `V` is an opaque identity carried per vertex (a name, a database key).
pub struct LayoutGraph<V = String> {
    /// Vertices store their identity, edges their weight.
    graph: StableGraph<V, f32, Directed>,

    pos_x: Vec<f32>,
    pos_y: Vec<f32>,
    pos_z: Vec<f32>,

    /// Fixed vertices are never moved by the minimizer.
    fixed: Vec<bool>,
}

impl<V> LayoutGraph<V> {
    pub fn new() -> Self {
        Self {
            graph: StableGraph::new(),
            pos_x: Vec::new(),
            pos_y: Vec::new(),
            pos_z: Vec::new(),
            fixed: Vec::new(),
        }
    }

    /// Create a graph with pre-allocated capacity.
    pub fn with_capacity(vertex_capacity: usize, edge_capacity: usize) -> Self {
        Self {
            graph: StableGraph::with_capacity(vertex_capacity, edge_capacity),
            pos_x: Vec::with_capacity(vertex_capacity),
            pos_y: Vec::with_capacity(vertex_capacity),
            pos_z: Vec::with_capacity(vertex_capacity),
            fixed: Vec::with_capacity(vertex_capacity),
        }
    }

    // =========================================================================
    // Vertex Operations
    // =========================================================================

    /// Add a vertex at the specified position.
    pub fn add_vertex(&mut self, identity: V, position: Vector3) -> VertexId {
        let index = self.graph.add_node(identity);

        self.pos_x.push(position.x);
        self.pos_y.push(position.y);
        self.pos_z.push(position.z);
        self.fixed.push(false);

        VertexId(index.index() as u32)
    }

    /// Add vertices from a positions array [x0, y0, z0, x1, y1, z1, ...].
    ///
    /// Trailing values that do not form a full triple are ignored.
    pub fn add_vertices_from_positions(&mut self, positions: &[f32]) -> u32
    where
        V: Default,
    {
        let count = positions.len() / 3;

        self.pos_x.reserve(count);
        self.pos_y.reserve(count);
        self.pos_z.reserve(count);
        self.fixed.reserve(count);

        for xyz in positions.chunks_exact(3) {
            self.add_vertex(V::default(), Vector3::new(xyz[0], xyz[1], xyz[2]));
        }

        count as u32
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Identity of a vertex.
    pub fn identity(&self, id: VertexId) -> Option<&V> {
        self.graph.node_weight(NodeIndex::new(id.index()))
    }

    pub fn position(&self, id: VertexId) -> Option<Vector3> {
        let i = id.index();
        (i < self.pos_x.len()).then(|| Vector3::new(self.pos_x[i], self.pos_y[i], self.pos_z[i]))
    }

    /// Set a vertex's position. Returns false for unknown vertices.
    pub fn set_position(&mut self, id: VertexId, position: Vector3) -> bool {
        let i = id.index();
        if i >= self.pos_x.len() {
            return false;
        }
        self.pos_x[i] = position.x;
        self.pos_y[i] = position.y;
        self.pos_z[i] = position.z;
        true
    }

    /// Fix or release a vertex. Returns false for unknown vertices.
    pub fn set_fixed(&mut self, id: VertexId, fixed: bool) -> bool {
        match self.fixed.get_mut(id.index()) {
            Some(flag) => {
                *flag = fixed;
                true
            }
            None => false,
        }
    }

    pub fn is_fixed(&self, id: VertexId) -> bool {
        self.fixed.get(id.index()).copied().unwrap_or(false)
    }

    // =========================================================================
    // Edge Operations
    // =========================================================================

    /// Add a weighted edge.
    ///
    /// Returns None if an endpoint does not exist or the weight is negative
    /// or not finite.
    pub fn add_edge(&mut self, tail: VertexId, head: VertexId, weight: f32) -> Option<EdgeId> {
        if tail.index() >= self.vertex_count() || head.index() >= self.vertex_count() {
            return None;
        }
        if !weight.is_finite() || weight < 0.0 {
            log::warn!(tail = tail.raw(), head = head.raw(), weight = weight; "Rejecting edge weight");
            return None;
        }

        let index = self.graph.add_edge(
            NodeIndex::new(tail.index()),
            NodeIndex::new(head.index()),
            weight,
        );
        Some(EdgeId(index.index() as u32))
    }

    /// Add edges from pairs [tail0, head0, tail1, head1, ...] with weight 1.0.
    ///
    /// Returns the number of edges added.
    pub fn add_edges_from_pairs(&mut self, edges: &[u32]) -> u32 {
        let mut added = 0;
        for pair in edges.chunks_exact(2) {
            if self.add_edge(VertexId(pair[0]), VertexId(pair[1]), 1.0).is_some() {
                added += 1;
            }
        }
        added
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> Vec<Edge> {
        self.graph
            .edge_references()
            .map(|e| Edge::new(e.source().index() as u32, e.target().index() as u32, *e.weight()))
            .collect()
    }

    /// Sum of incident edge weights per vertex; self-loops do not count.
    pub fn weighted_degrees(&self) -> Vec<f32> {
        let mut degrees = vec![0.0; self.vertex_count()];
        for edge in self.graph.edge_references() {
            let (tail, head) = (edge.source().index(), edge.target().index());
            if tail != head {
                degrees[tail] += *edge.weight();
                degrees[head] += *edge.weight();
            }
        }
        degrees
    }

    // =========================================================================
    // Buffer Access
    // =========================================================================

    pub fn positions_x(&self) -> &[f32] {
        &self.pos_x
    }

    pub fn positions_y(&self) -> &[f32] {
        &self.pos_y
    }

    pub fn positions_z(&self) -> &[f32] {
        &self.pos_z
    }

    /// Positions gathered into one vector per vertex.
    pub fn positions(&self) -> Vec<Vector3> {
        (0..self.pos_x.len())
            .map(|i| Vector3::new(self.pos_x[i], self.pos_y[i], self.pos_z[i]))
            .collect()
    }

    fn scatter_positions(&mut self, positions: &[Vector3]) {
        for (i, p) in positions.iter().enumerate() {
            self.pos_x[i] = p.x;
            self.pos_y[i] = p.y;
            self.pos_z[i] = p.z;
        }
    }

    // =========================================================================
    // Utilities
    // =========================================================================

    /// Componentwise minimum and maximum over all positions.
    pub fn bounds(&self) -> Option<(Vector3, Vector3)> {
        let positions = self.positions();
        let min = Vector3::min_of(positions.iter().copied())?;
        let max = Vector3::max_of(positions)?;
        Some((min, max))
    }

    /// Remove all vertices and edges.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.pos_x.clear();
        self.pos_y.clear();
        self.pos_z.clear();
        self.fixed.clear();
    }

    /// Place every free vertex uniformly in `[-1, 1)` along the first
    /// `dimensions` axes; the remaining axes are set to 0.
    pub fn randomize_positions(&mut self, dimensions: u8, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        for i in 0..self.pos_x.len() {
            if self.fixed[i] {
                continue;
            }
            self.pos_x[i] = rng.random_range(-1.0..1.0);
            self.pos_y[i] = if dimensions >= 2 { rng.random_range(-1.0..1.0) } else { 0.0 };
            self.pos_z[i] = if dimensions >= 3 { rng.random_range(-1.0..1.0) } else { 0.0 };
        }
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Dense model of this graph for `config`, including the fixed flags.
    pub fn model(&self, config: &LayoutConfig) -> Result<GraphModel> {
        GraphModel::from_config(self.vertex_count(), &self.edges(), config)?.with_fixed(&self.fixed)
    }

    /// Minimizer for this graph. Take its budget before calling [`run`]
    /// to cancel from elsewhere.
    ///
    /// [`run`]: LayoutGraph::run
    pub fn minimizer(&self, config: &LayoutConfig) -> Result<Minimizer> {
        Minimizer::new(self.model(config)?, config.clone())
    }

    /// Minimize the energy and write the resulting positions back.
    pub fn layout(&mut self, config: &LayoutConfig) -> Result<LayoutStats> {
        self.layout_with(config, || Ok(()))
    }

    /// Like [`layout`](LayoutGraph::layout), notifying `observer` after the
    /// initial energy and after every iteration.
    pub fn layout_with<F>(&mut self, config: &LayoutConfig, observer: F) -> Result<LayoutStats>
    where
        F: FnMut() -> std::result::Result<(), ObserverClosed>,
    {
        let mut minimizer = self.minimizer(config)?;
        self.run(&mut minimizer, observer)
    }

    /// Run a minimizer built by [`minimizer`](LayoutGraph::minimizer) on
    /// the current positions and write the result back.
    pub fn run<F>(&mut self, minimizer: &mut Minimizer, observer: F) -> Result<LayoutStats>
    where
        F: FnMut() -> std::result::Result<(), ObserverClosed>,
    {
        let mut positions = self.positions();
        let stats = minimizer.minimize_energy_with(&mut positions, observer)?;
        self.scatter_positions(&positions);
        Ok(stats)
    }
}

impl<V> Default for LayoutGraph<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Termination;

    fn triangle() -> LayoutGraph<String> {
        let mut graph = LayoutGraph::new();
        let a = graph.add_vertex("a".to_string(), Vector3::new(0.0, 0.0, 0.0));
        let b = graph.add_vertex("b".to_string(), Vector3::new(1.0, 0.0, 0.0));
        let c = graph.add_vertex("c".to_string(), Vector3::new(0.0, 1.0, 0.0));
        graph.add_edge(a, b, 1.0);
        graph.add_edge(b, c, 2.0);
        graph.add_edge(c, a, 1.0);
        graph
    }

    #[test]
    fn test_add_vertex() {
        let mut graph = LayoutGraph::new();
        let id = graph.add_vertex("main".to_string(), Vector3::new(10.0, 20.0, 0.0));

        assert_eq!(id, VertexId(0));
        assert_eq!(graph.vertex_count(), 1);
        assert_eq!(graph.position(id), Some(Vector3::new(10.0, 20.0, 0.0)));
        assert_eq!(graph.identity(id).map(String::as_str), Some("main"));
        assert_eq!(graph.position(VertexId(1)), None);
    }

    #[test]
    fn test_add_vertices_from_positions() {
        let mut graph: LayoutGraph<String> = LayoutGraph::new();
        let positions = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 9.0];

        let count = graph.add_vertices_from_positions(&positions);
        assert_eq!(count, 3);
        assert_eq!(graph.vertex_count(), 3);
        assert_eq!(graph.positions_z(), &[0.0, 1.0, 2.0]);
        assert_eq!(graph.identity(VertexId(2)).map(String::as_str), Some(""));
    }

    #[test]
    fn test_add_edge() {
        let mut graph = triangle();
        assert_eq!(graph.edge_count(), 3);

        assert!(graph.add_edge(VertexId(0), VertexId(7), 1.0).is_none());
        assert!(graph.add_edge(VertexId(0), VertexId(1), -1.0).is_none());
        assert!(graph.add_edge(VertexId(0), VertexId(1), f32::INFINITY).is_none());
        assert_eq!(graph.edge_count(), 3);

        assert_eq!(graph.add_edge(VertexId(1), VertexId(1), 0.5), Some(EdgeId(3)));
        assert_eq!(graph.edges()[3], Edge::new(1u32, 1u32, 0.5));
    }

    #[test]
    fn test_add_edges_from_pairs() {
        let mut graph: LayoutGraph<String> = LayoutGraph::new();
        graph.add_vertices_from_positions(&[0.0; 9]);

        let added = graph.add_edges_from_pairs(&[0, 1, 1, 2, 2, 5, 0]);
        assert_eq!(added, 2);
        assert_eq!(graph.edges().iter().map(|e| e.weight).sum::<f32>(), 2.0);
    }

    #[test]
    fn test_weighted_degrees_skip_self_loops() {
        let mut graph = triangle();
        graph.add_edge(VertexId(0), VertexId(0), 4.0);

        assert_eq!(graph.weighted_degrees(), vec![2.0, 3.0, 3.0]);
    }

    #[test]
    fn test_fix_release() {
        let mut graph = triangle();
        let id = VertexId(1);

        assert!(!graph.is_fixed(id));
        assert!(graph.set_fixed(id, true));
        assert!(graph.is_fixed(id));
        assert!(graph.set_fixed(id, false));
        assert!(!graph.is_fixed(id));

        assert!(!graph.set_fixed(VertexId(9), true));
        assert!(!graph.is_fixed(VertexId(9)));
    }

    #[test]
    fn test_bounds() {
        let mut graph = LayoutGraph::new();
        graph.add_vertex((), Vector3::new(-10.0, -5.0, 1.0));
        graph.add_vertex((), Vector3::new(10.0, 5.0, -1.0));

        assert_eq!(
            graph.bounds(),
            Some((Vector3::new(-10.0, -5.0, -1.0), Vector3::new(10.0, 5.0, 1.0)))
        );
        assert_eq!(LayoutGraph::<()>::new().bounds(), None);
    }

    #[test]
    fn test_clear() {
        let mut graph = triangle();
        graph.clear();

        assert_eq!(graph.vertex_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.positions().is_empty());

        let id = graph.add_vertex("again".to_string(), Vector3::ZERO);
        assert_eq!(id, VertexId(0));
    }

    #[test]
    fn test_randomize_positions() {
        let mut graph = triangle();
        graph.set_fixed(VertexId(0), true);
        graph.randomize_positions(2, 17);

        assert_eq!(graph.position(VertexId(0)), Some(Vector3::ZERO));
        for p in graph.positions() {
            assert!((-1.0..1.0).contains(&p.x));
            assert!((-1.0..1.0).contains(&p.y));
            assert_eq!(p.z, 0.0);
        }

        let mut again = triangle();
        again.set_fixed(VertexId(0), true);
        again.randomize_positions(2, 17);
        assert_eq!(graph.positions(), again.positions());

        again.randomize_positions(3, 17);
        assert!(again.positions().iter().skip(1).any(|p| p.z != 0.0));
    }

    #[test]
    fn test_model_carries_fixed_flags() {
        let mut graph = triangle();
        graph.set_fixed(VertexId(2), true);

        let model = graph.model(&LayoutConfig::default()).unwrap();
        assert_eq!(model.vertex_count(), 3);
        assert!(model.is_fixed(2));
        assert!(!model.is_fixed(0));
        assert_eq!(model.repulsion_weights(), &[2.0, 3.0, 3.0]);
    }

    #[test]
    fn test_layout_writes_back_positions() {
        let mut graph = triangle();
        graph.set_fixed(VertexId(0), true);
        let before = graph.positions();

        let config = LayoutConfig {
            iterations: 30,
            ..LayoutConfig::default()
        };
        let stats = graph.layout(&config).unwrap();

        assert_eq!(stats.iterations_run, 30);
        assert_eq!(stats.termination, Termination::Completed);
        let after = graph.positions();
        assert_eq!(after[0], before[0]);
        assert_ne!(after[1], before[1]);
        assert!(after.iter().all(|p| p.z == 0.0));
    }

    #[test]
    fn test_layout_cancelled_through_budget() {
        let mut graph = triangle();
        let config = LayoutConfig::default();
        let mut minimizer = graph.minimizer(&config).unwrap();
        let budget = minimizer.budget();

        let mut calls = 0;
        let stats = graph
            .run(&mut minimizer, || {
                calls += 1;
                if calls == 4 {
                    budget.stop();
                }
                Ok(())
            })
            .unwrap();

        assert_eq!(stats.iterations_run, 3);
        assert_eq!(stats.termination, Termination::Cancelled);
    }

    #[test]
    fn test_layout_cancelled_before_run() {
        let mut graph = triangle();
        let before = graph.positions();
        let mut minimizer = graph.minimizer(&LayoutConfig::default()).unwrap();
        minimizer.budget().stop();

        let stats = graph.run(&mut minimizer, || Ok(())).unwrap();

        assert_eq!(stats.iterations_run, 0);
        assert_eq!(stats.termination, Termination::Cancelled);
        assert_eq!(graph.positions(), before);
    }
}
