//! Energy model and minimizer configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Configuration for the energy minimizer.
///
/// Deserializes from partial JS objects: missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Number of layout dimensions, 2 or 3 (default: 2).
    ///
    /// Only validated here. The minimizer treats every axis alike, so a 2D
    /// layout is one whose positions all have `z == 0`; pass this value to
    /// [`LayoutGraph::randomize_positions`] to seed such positions.
    ///
    /// [`LayoutGraph::randomize_positions`]: crate::graph::LayoutGraph::randomize_positions
    pub dimensions: u8,
    /// Number of minimizer iterations (default: 100).
    pub iterations: u32,
    /// Exponent of the distance in the attraction term (default: 1.0).
    /// 0.0 selects the logarithm of the distance.
    pub attr_exponent: f32,
    /// Exponent of the distance in the repulsion term (default: 0.0).
    /// 0.0 selects the logarithm of the distance.
    pub repu_exponent: f32,
    /// Use repulsion weight 1.0 for every vertex instead of its weighted
    /// degree (default: false, i.e. edge repulsion).
    pub vertex_repulsion: bool,
    /// Treat every edge as weight 1.0 (default: false).
    pub ignore_edge_weights: bool,
    /// Strength of the attraction toward the barycenter of all vertices
    /// (default: 0.001, 0.0 disables gravitation).
    pub gravitation_factor: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            dimensions: 2,
            iterations: 100,
            attr_exponent: 1.0,
            repu_exponent: 0.0,
            vertex_repulsion: false,
            ignore_edge_weights: false,
            gravitation_factor: 0.001,
        }
    }
}

impl LayoutConfig {
    /// The LinLog energy model: linear attraction, logarithmic repulsion.
    pub fn lin_log() -> Self {
        Self::default()
    }

    /// Energy version of the Fruchterman-Reingold model.
    pub fn fruchterman_reingold() -> Self {
        Self {
            attr_exponent: 3.0,
            repu_exponent: 0.0,
            ..Self::default()
        }
    }

    /// Reject configurations the energy model is undefined for.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.dimensions, 2 | 3) {
            return Err(Error::InvalidDimensions(self.dimensions));
        }

        for (name, value) in [
            ("attrExponent", self.attr_exponent),
            ("repuExponent", self.repu_exponent),
            ("gravitationFactor", self.gravitation_factor),
        ] {
            if !value.is_finite() {
                return Err(Error::NonFiniteParameter { name, value });
            }
        }

        if self.attr_exponent < 0.0 {
            return Err(Error::NegativeAttractionExponent(self.attr_exponent));
        }
        if self.repu_exponent >= self.attr_exponent {
            return Err(Error::UnboundedEnergy {
                attraction: self.attr_exponent,
                repulsion: self.repu_exponent,
            });
        }
        if self.gravitation_factor < 0.0 {
            return Err(Error::NegativeGravitation(self.gravitation_factor));
        }

        Ok(())
    }
}
