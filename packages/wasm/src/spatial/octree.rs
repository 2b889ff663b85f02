//! Barnes-Hut octree stored as a node arena.
//!
//! Every node covers an axis-aligned cuboid. A leaf holds exactly one vertex;
//! an internal node holds up to 8 children plus the weighted barycenter and
//! total weight of everything below it. Child slots are indices into the
//! arena, so the tree is a flat `Vec` without parent pointers.
//!
//! The tree is rebuilt from scratch once per minimizer iteration and then
//! patched in place with [`Octree::move_vertex`] while vertices move during
//! that iteration. Patching only updates barycenters along the vertex's
//! original insertion path; a vertex that crosses an octant boundary keeps
//! its old leaf until the next rebuild.

use crate::vector::Vector3;

/// Insertion stops subdividing below this depth and folds the vertex into
/// the node it reached. Only nearly coincident positions get this deep.
const MAX_DEPTH: usize = 128;

/// Multipole acceptance: a node closer than this many widths is opened.
pub const OPENING_FACTOR: f32 = 2.0;

/// A single octree node.
#[derive(Debug, Clone)]
pub struct OctreeNode {
    /// For leaves, the vertex stored here; `None` for internal nodes.
    vertex: Option<u32>,
    /// Arena indices of the 8 octants; `None` where the octant is empty.
    children: [Option<u32>; 8],
    /// Weighted barycenter of the contained vertices.
    position: Vector3,
    /// Total weight of the contained vertices.
    weight: f32,
    min: Vector3,
    max: Vector3,
}

impl OctreeNode {
    fn leaf(vertex: u32, position: Vector3, weight: f32, min: Vector3, max: Vector3) -> Self {
        Self {
            vertex: Some(vertex),
            children: [None; 8],
            position,
            weight,
            min,
            max,
        }
    }

    /// The vertex stored in this leaf, or `None` for internal nodes.
    #[inline]
    pub fn vertex(&self) -> Option<u32> {
        self.vertex
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.vertex.is_some()
    }

    /// Weighted barycenter of the contained vertices.
    #[inline]
    pub fn position(&self) -> Vector3 {
        self.position
    }

    /// Total weight of the contained vertices.
    #[inline]
    pub fn weight(&self) -> f32 {
        self.weight
    }

    #[cfg(test)]
    fn min_corner(&self) -> Vector3 {
        self.min
    }

    #[cfg(test)]
    fn max_corner(&self) -> Vector3 {
        self.max
    }

    /// Maximum per-axis extent of this node's cuboid.
    #[inline]
    pub fn width(&self) -> f32 {
        Vector3::width(self.min, self.max)
    }

    /// Arena indices of the occupied octants.
    pub fn children(&self) -> impl Iterator<Item = u32> + '_ {
        self.children.iter().flatten().copied()
    }

    /// 3-bit octant code of `position` relative to this cuboid's midpoint.
    #[inline]
    fn octant(&self, position: Vector3) -> usize {
        let mid = (self.min + self.max) / 2.0;
        let mut octant = 0;
        if position.x > mid.x {
            octant |= 1;
        }
        if position.y > mid.y {
            octant |= 2;
        }
        if position.z > mid.z {
            octant |= 4;
        }
        octant
    }

    /// Cuboid of the child in `octant`.
    fn child_bounds(&self, octant: usize) -> (Vector3, Vector3) {
        let mid = (self.min + self.max) / 2.0;
        let mut min = self.min;
        let mut max = self.max;

        if octant & 1 == 0 {
            max.x = mid.x;
        } else {
            min.x = mid.x;
        }
        if octant & 2 == 0 {
            max.y = mid.y;
        } else {
            min.y = mid.y;
        }
        if octant & 4 == 0 {
            max.z = mid.z;
        } else {
            min.z = mid.z;
        }

        (min, max)
    }

    /// Fold a point into the aggregate barycenter and weight.
    #[inline]
    fn absorb(&mut self, position: Vector3, weight: f32) {
        self.position = (self.position * self.weight + position * weight) / (self.weight + weight);
        self.weight += weight;
    }
}

/// Octree over weighted vertex positions.
#[derive(Debug, Clone)]
pub struct Octree {
    nodes: Vec<OctreeNode>,
    root: Option<u32>,
    min: Vector3,
    max: Vector3,
}

impl Octree {
    /// Create an empty tree covering the cuboid `[min, max]`.
    pub fn new(min: Vector3, max: Vector3) -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
            min,
            max,
        }
    }

    /// Build a tree over all vertices.
    ///
    /// The bounding cuboid is the componentwise min/max over every position.
    /// Vertices are inserted in index order; zero-weight vertices are skipped.
    pub fn build(positions: &[Vector3], weights: &[f32]) -> Self {
        debug_assert_eq!(positions.len(), weights.len());

        let min = Vector3::min_of(positions.iter().copied()).unwrap_or_default();
        let max = Vector3::max_of(positions.iter().copied()).unwrap_or_default();

        let mut tree = Self::new(min, max);
        tree.nodes.reserve(positions.len() * 2);
        for (vertex, (&position, &weight)) in positions.iter().zip(weights).enumerate() {
            tree.insert(vertex as u32, position, weight);
        }
        tree
    }

    /// Insert a vertex.
    ///
    /// A leaf on the insertion path is converted to an internal node by
    /// pushing its occupant one level down. Every node on the path absorbs
    /// the new point into its barycenter. Zero-weight vertices are ignored.
    pub fn insert(&mut self, vertex: u32, position: Vector3, weight: f32) {
        if weight == 0.0 {
            return;
        }

        let Some(mut current) = self.root else {
            let root = self.push(OctreeNode::leaf(vertex, position, weight, self.min, self.max));
            self.root = Some(root);
            return;
        };

        for _ in 0..MAX_DEPTH {
            if let Some(occupant) = self.nodes[current as usize].vertex.take() {
                let node = &self.nodes[current as usize];
                let (occupant_position, occupant_weight) = (node.position, node.weight);
                let octant = node.octant(occupant_position);
                self.attach_leaf(current, octant, occupant, occupant_position, occupant_weight);
            }

            let node = &mut self.nodes[current as usize];
            node.absorb(position, weight);

            let octant = node.octant(position);
            let next = node.children[octant];
            match next {
                Some(child) => current = child,
                None => {
                    self.attach_leaf(current, octant, vertex, position, weight);
                    return;
                }
            }
        }

        log::warn!(vertex = vertex; "Octree depth limit reached; merging vertex into its cell");
        self.nodes[current as usize].absorb(position, weight);
    }

    /// Shift barycenters after a vertex moved from `old` to `new`.
    ///
    /// Descends along the octants of `old`, i.e. the path the vertex was
    /// inserted on. The leaf is not relocated even if `new` lies in a
    /// different octant.
    pub fn move_vertex(&mut self, old: Vector3, new: Vector3, weight: f32) {
        if weight == 0.0 {
            return;
        }

        let shift = new - old;
        let mut cursor = self.root;
        while let Some(current) = cursor {
            let node = &mut self.nodes[current as usize];
            node.position += shift * (weight / node.weight);
            cursor = node.children[node.octant(old)];
        }
    }

    /// Maximum per-axis extent of the tree's bounding cuboid.
    #[inline]
    pub fn width(&self) -> f32 {
        Vector3::width(self.min, self.max)
    }

    pub fn root(&self) -> Option<&OctreeNode> {
        self.root.map(|root| &self.nodes[root as usize])
    }

    pub fn node(&self, index: u32) -> &OctreeNode {
        &self.nodes[index as usize]
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Visit every node accepted as a single body for a query from `vertex`.
    ///
    /// Internal nodes whose barycenter is closer than
    /// [`OPENING_FACTOR`] times their width are opened and their children
    /// visited instead. The querying vertex's own leaf is skipped. The
    /// visitor receives the accepted node and its distance to `position`.
    pub fn for_each_accepted<F>(&self, vertex: u32, position: Vector3, mut visit: F)
    where
        F: FnMut(&OctreeNode, f32),
    {
        if let Some(root) = self.root {
            self.visit_accepted(root, vertex, position, &mut visit);
        }
    }

    fn visit_accepted<F>(&self, index: u32, vertex: u32, position: Vector3, visit: &mut F)
    where
        F: FnMut(&OctreeNode, f32),
    {
        let node = &self.nodes[index as usize];
        if node.vertex == Some(vertex) {
            return;
        }

        let dist = position.distance(node.position);
        if !node.is_leaf() && dist < OPENING_FACTOR * node.width() {
            for child in node.children() {
                self.visit_accepted(child, vertex, position, visit);
            }
            return;
        }

        visit(node, dist);
    }

    fn push(&mut self, node: OctreeNode) -> u32 {
        let index = self.nodes.len() as u32;
        self.nodes.push(node);
        index
    }

    fn attach_leaf(&mut self, parent: u32, octant: usize, vertex: u32, position: Vector3, weight: f32) {
        let (min, max) = self.nodes[parent as usize].child_bounds(octant);
        let child = self.push(OctreeNode::leaf(vertex, position, weight, min, max));
        self.nodes[parent as usize].children[octant] = Some(child);
    }
}
