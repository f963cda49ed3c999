//! Error types for particle fracture

use thiserror::Error;

/// Errors that can occur while configuring or building a fracture
///
/// None of these reach the host through [`crate::ExplodeModifier::apply`];
/// the modifier recovers locally and always hands back a usable mesh.
#[derive(Debug, Clone, Error)]
pub enum FractureError {
    /// Configuration validation failed
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The Voronoi solver output could not be parsed
    #[error("malformed solver output at line {line}: {message}")]
    Parse {
        /// 1-based line (cell) number in the solver stream
        line: usize,
        /// What the parser expected
        message: String,
    },

    /// The Voronoi solver failed to produce output
    #[error("voronoi solver failed: {0}")]
    Solver(String),

    /// Boolean intersection of a cell with the source mesh failed
    #[error("boolean intersection failed: {0}")]
    BooleanFailed(String),

    /// Mesh data is inconsistent (out-of-range indices, mismatched layers)
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),
}

/// Result type alias for fracture operations
pub type Result<T> = std::result::Result<T, FractureError>;
