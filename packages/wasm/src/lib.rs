//! LinLog Layout - WASM Module
//!
//! Force-directed graph layout by energy minimization. Every vertex gets a
//! 2D or 3D position such that an energy (attraction along edges, repulsion
//! between all pairs, gravitation toward the barycenter) is approximately
//! minimal. Repulsion is approximated with a Barnes-Hut octree. The crate is
//! compiled to WebAssembly and exposes a JavaScript-friendly API via
//! wasm-bindgen; the same types are usable natively.
//!
//! # Architecture
//!
//! - `graph`: Graph container using petgraph's StableGraph, SoA positions
//! - `spatial`: Barnes-Hut octree and the R-tree duplicate check
//! - `layout`: Configuration, graph model, energy model and minimizer
//! - `vector`: 3D vector arithmetic
//! - `error`: Crate error type

use js_sys::{Float32Array, Function};
use wasm_bindgen::prelude::*;

pub mod error;
pub mod graph;
pub mod layout;
pub mod spatial;
pub mod vector;

#[cfg(test)]
mod test_log;

pub use error::{Error, ObserverClosed, Result};
pub use graph::{Edge, EdgeId, LayoutGraph, VertexId};
pub use layout::{
    EdgeLengthStats, GraphModel, IterationBudget, LayoutConfig, LayoutStats, Minimizer,
    Termination,
};
pub use vector::Vector3;

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Main entry point for the layout engine.
///
/// This struct wraps a [`LayoutGraph`] keyed by vertex names and provides
/// the public API exposed to JavaScript.
#[wasm_bindgen]
pub struct LinLogLayoutWasm {
    graph: LayoutGraph<String>,
}

#[wasm_bindgen]
impl LinLogLayoutWasm {
    /// Create a new empty layout graph.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            graph: LayoutGraph::new(),
        }
    }

    /// Create a layout graph with pre-allocated capacity.
    #[wasm_bindgen(js_name = withCapacity)]
    pub fn with_capacity(vertex_capacity: usize, edge_capacity: usize) -> Self {
        Self {
            graph: LayoutGraph::with_capacity(vertex_capacity, edge_capacity),
        }
    }

    // =========================================================================
    // Vertex Operations
    // =========================================================================

    /// Add a named vertex at the specified position.
    ///
    /// Returns the vertex ID. IDs are dense and assigned in insertion order.
    #[wasm_bindgen(js_name = addVertex)]
    pub fn add_vertex(&mut self, name: String, x: f32, y: f32, z: f32) -> u32 {
        self.graph.add_vertex(name, Vector3::new(x, y, z)).raw()
    }

    /// Add unnamed vertices from a Float32Array [x0, y0, z0, x1, y1, z1, ...].
    ///
    /// Returns the number of vertices added.
    #[wasm_bindgen(js_name = addVerticesFromPositions)]
    pub fn add_vertices_from_positions(&mut self, positions: &[f32]) -> u32 {
        self.graph.add_vertices_from_positions(positions)
    }

    #[wasm_bindgen(js_name = vertexCount)]
    pub fn vertex_count(&self) -> u32 {
        self.graph.vertex_count() as u32
    }

    #[wasm_bindgen(js_name = getVertexName)]
    pub fn get_vertex_name(&self, vertex_id: u32) -> Option<String> {
        self.graph.identity(VertexId(vertex_id)).cloned()
    }

    #[wasm_bindgen(js_name = getVertexX)]
    pub fn get_vertex_x(&self, vertex_id: u32) -> Option<f32> {
        self.graph.position(VertexId(vertex_id)).map(|p| p.x)
    }

    #[wasm_bindgen(js_name = getVertexY)]
    pub fn get_vertex_y(&self, vertex_id: u32) -> Option<f32> {
        self.graph.position(VertexId(vertex_id)).map(|p| p.y)
    }

    #[wasm_bindgen(js_name = getVertexZ)]
    pub fn get_vertex_z(&self, vertex_id: u32) -> Option<f32> {
        self.graph.position(VertexId(vertex_id)).map(|p| p.z)
    }

    /// Set a vertex's position. Returns false for unknown vertices.
    #[wasm_bindgen(js_name = setVertexPosition)]
    pub fn set_vertex_position(&mut self, vertex_id: u32, x: f32, y: f32, z: f32) -> bool {
        self.graph.set_position(VertexId(vertex_id), Vector3::new(x, y, z))
    }

    /// Pin a vertex (never moved by the minimizer).
    #[wasm_bindgen(js_name = pinVertex)]
    pub fn pin_vertex(&mut self, vertex_id: u32) -> bool {
        self.graph.set_fixed(VertexId(vertex_id), true)
    }

    #[wasm_bindgen(js_name = unpinVertex)]
    pub fn unpin_vertex(&mut self, vertex_id: u32) -> bool {
        self.graph.set_fixed(VertexId(vertex_id), false)
    }

    #[wasm_bindgen(js_name = isVertexPinned)]
    pub fn is_vertex_pinned(&self, vertex_id: u32) -> bool {
        self.graph.is_fixed(VertexId(vertex_id))
    }

    // =========================================================================
    // Edge Operations
    // =========================================================================

    /// Add a weighted edge between two vertices.
    ///
    /// Returns the edge ID, or None if an endpoint doesn't exist or the
    /// weight is negative or not finite.
    #[wasm_bindgen(js_name = addEdge)]
    pub fn add_edge(&mut self, tail: u32, head: u32, weight: f32) -> Option<u32> {
        self.graph
            .add_edge(VertexId(tail), VertexId(head), weight)
            .map(|id| id.raw())
    }

    /// Add edges from a Uint32Array of pairs [tail0, head0, tail1, head1, ...].
    ///
    /// All edges get weight 1.0. Returns the number of edges added.
    #[wasm_bindgen(js_name = addEdgesFromPairs)]
    pub fn add_edges_from_pairs(&mut self, edges: &[u32]) -> u32 {
        self.graph.add_edges_from_pairs(edges)
    }

    #[wasm_bindgen(js_name = edgeCount)]
    pub fn edge_count(&self) -> u32 {
        self.graph.edge_count() as u32
    }

    // =========================================================================
    // Position Buffer Access (Zero-Copy)
    // =========================================================================

    /// Get a zero-copy view of X positions.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    /// Copy or consume it immediately, do not store.
    #[wasm_bindgen(js_name = getPositionsXView)]
    pub fn get_positions_x_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.graph.positions_x()) }
    }

    /// Get a zero-copy view of Y positions. Same caveats as the X view.
    #[wasm_bindgen(js_name = getPositionsYView)]
    pub fn get_positions_y_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.graph.positions_y()) }
    }

    /// Get a zero-copy view of Z positions. Same caveats as the X view.
    #[wasm_bindgen(js_name = getPositionsZView)]
    pub fn get_positions_z_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.graph.positions_z()) }
    }

    /// Get the length of the position buffers.
    #[wasm_bindgen(js_name = positionsLen)]
    pub fn positions_len(&self) -> usize {
        self.graph.positions_x().len()
    }

    // =========================================================================
    // Graph Utilities
    // =========================================================================

    /// Get the bounding box of all vertices.
    ///
    /// Returns [min_x, min_y, min_z, max_x, max_y, max_z], or None if the
    /// graph is empty.
    #[wasm_bindgen(js_name = getBounds)]
    pub fn get_bounds(&self) -> Option<Vec<f32>> {
        self.graph
            .bounds()
            .map(|(min, max)| vec![min.x, min.y, min.z, max.x, max.y, max.z])
    }

    /// Clear all vertices and edges.
    pub fn clear(&mut self) {
        self.graph.clear();
    }

    /// Place unpinned vertices uniformly in [-1, 1) along the first
    /// `dimensions` axes.
    #[wasm_bindgen(js_name = randomizePositions)]
    pub fn randomize_positions(&mut self, dimensions: u8, seed: u32) {
        self.graph.randomize_positions(dimensions, u64::from(seed));
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Minimize the layout energy and update the position buffers.
    ///
    /// `config` is a partial `LayoutConfig` object (camelCase keys) or
    /// undefined for the defaults. `observer` is called without arguments
    /// after the initial energy and after every iteration; throwing from it
    /// stops the run. It must not call back into this object.
    ///
    /// Returns the run statistics.
    pub fn minimize(&mut self, config: JsValue, observer: Option<Function>) -> std::result::Result<JsValue, JsError> {
        let config: LayoutConfig = if config.is_undefined() || config.is_null() {
            LayoutConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };

        self.warn_self_loops();

        let stats = match observer {
            Some(callback) => self.graph.layout_with(&config, || {
                callback
                    .call0(&JsValue::NULL)
                    .map(|_| ())
                    .map_err(|thrown| {
                        ObserverClosed::new(
                            thrown
                                .as_string()
                                .unwrap_or_else(|| String::from("observer threw")),
                        )
                    })
            })?,
            None => self.graph.layout(&config)?,
        };

        Ok(serde_wasm_bindgen::to_value(&stats)?)
    }
}

impl LinLogLayoutWasm {
    /// Report reflexive edges on the browser console; the graph model
    /// drops them.
    fn warn_self_loops(&self) {
        for edge in self.graph.edges().iter().filter(|e| e.is_self_loop()) {
            let name = self
                .graph
                .identity(edge.tail)
                .map(String::as_str)
                .unwrap_or_default();
            web_sys::console::warn_1(
                &format!("Layout warning: reflexive edge for vertex '{name}' ignored").into(),
            );
        }
    }
}

impl Default for LinLogLayoutWasm {
    fn default() -> Self {
        Self::new()
    }
}
