//! Error types for world generation

use std::fmt;

/// Errors that can occur during world generation or queries
#[derive(Debug, Clone)]
pub enum WorldGenError {
    /// A caller-supplied parameter was rejected (point count, plate count,
    /// jitter range, bounding box, ...)
    InvalidArgument(String),
    /// Triangulation or south-pole stitching failed
    MeshConstruction(String),
    /// A pipeline stage detected a broken invariant (always a bug)
    PipelineStage {
        /// Name of the stage that failed
        stage: &'static str,
        /// What went wrong
        message: String,
    },
}

impl fmt::Display for WorldGenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldGenError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            WorldGenError::MeshConstruction(msg) => write!(f, "mesh construction failed: {}", msg),
            WorldGenError::PipelineStage { stage, message } => {
                write!(f, "pipeline stage '{}' failed: {}", stage, message)
            }
        }
    }
}

impl std::error::Error for WorldGenError {}

/// Result type alias for world generation operations
pub type Result<T> = std::result::Result<T, WorldGenError>;
