use glam::IVec2;
use thiserror::Error;

use crate::template::Direction;

/// Errors raised by template loading, chunk generation, the registry and
/// path queries.
#[derive(Debug, Error)]
pub enum Error {
    /// No template in the library can be placed for the requested direction.
    #[error("no template can be generated facing {direction:?}")]
    NoValidTemplate { direction: Direction },

    /// A forced template index does not name a candidate for the direction.
    #[error("template {index} cannot be generated facing {direction:?}")]
    IncompatibleTemplate { index: usize, direction: Direction },

    /// Registry lookup for a grid coordinate with no live chunk.
    #[error("no chunk registered at {0}")]
    ChunkNotFound(IVec2),

    /// An exit path was authored with fewer than two waypoints.
    #[error("path needs at least 2 waypoints, got {count}")]
    InsufficientPathPoints { count: usize },

    /// A path query was made against a chunk that owns no paths.
    #[error("chunk {0} has no camera paths")]
    NoPathsInChunk(IVec2),

    /// A template failed load-time validation.
    #[error("template {index} is malformed: {reason}")]
    InvalidTemplate { index: usize, reason: String },

    #[error("failed to decode template library: {0}")]
    Decode(#[from] postcard::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
