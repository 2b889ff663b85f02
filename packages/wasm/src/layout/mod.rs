//! Energy-based graph layout.
//!
//! - `config`: minimizer configuration and energy model presets
//! - `model`: dense per-vertex attraction lists and repulsion weights
//! - `energy`: per-vertex energy and move direction
//! - `minimizer`: the iteration loop with line search and pulsing repulsion

pub mod config;
pub mod energy;
pub mod minimizer;
pub mod model;

pub use config::LayoutConfig;
pub use energy::EnergyModel;
pub use minimizer::{IterationBudget, LayoutStats, Minimizer, Termination};
pub use model::{EdgeLengthStats, GraphModel};
