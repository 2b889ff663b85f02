//! Error types for graph construction and energy minimization.

/// Errors raised when a graph or configuration violates the layout contract.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("layout dimensions must be 2 or 3, got {0}")]
    InvalidDimensions(u8),

    #[error("attraction exponent must be non-negative, got {0}")]
    NegativeAttractionExponent(f32),

    #[error(
        "repulsion exponent {repulsion} must be smaller than attraction exponent {attraction}"
    )]
    UnboundedEnergy { attraction: f32, repulsion: f32 },

    #[error("configuration value `{name}` must be finite, got {value}")]
    NonFiniteParameter { name: &'static str, value: f32 },

    #[error("gravitation factor must be non-negative, got {0}")]
    NegativeGravitation(f32),

    #[error("edge ({tail}, {head}) references a vertex outside 0..{vertex_count}")]
    EdgeOutOfRange {
        tail: u32,
        head: u32,
        vertex_count: usize,
    },

    #[error("edge ({tail}, {head}) has invalid weight {weight}")]
    InvalidEdgeWeight { tail: u32, head: u32, weight: f32 },

    #[error("vertices {first} and {second} share the same initial position")]
    CoincidentVertices { first: u32, second: u32 },

    #[error("vertex {0} has a non-finite position")]
    NonFinitePosition(u32),

    #[error("expected {expected} positions, got {actual}")]
    PositionCountMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Raised by a layout observer to stop a running minimization.
///
/// The minimizer treats this as "the caller closed the view": the loop ends
/// after the current notification and all completed moves are kept.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("layout observer closed: {reason}")]
pub struct ObserverClosed {
    pub reason: String,
}

impl ObserverClosed {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
