use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::geometry::DEFAULT_CELL_SIZE;
use crate::samples::START_ROOM;
use crate::streaming::StreamingPolicy;
use crate::template::Direction;

/// Seed used by tests and by the walker when none is given.
pub const DEFAULT_SEED: u64 = 42;

/// Configuration for level generation: seed, cell size, how the first chunk
/// is placed and the streaming policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub seed: u64,
    pub cell_size: Vec2,
    /// Direction of the first generation call; `Both` for a start room.
    pub start_direction: Direction,
    /// Library index forced for the first chunk, if any.
    pub start_template: Option<usize>,
    pub policy: StreamingPolicy,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            cell_size: DEFAULT_CELL_SIZE,
            start_direction: Direction::Both,
            start_template: Some(START_ROOM),
            policy: StreamingPolicy::default(),
        }
    }
}

impl LevelConfig {
    /// A left-right symmetric level bounded to `limit` chunks from the origin.
    #[must_use]
    pub fn symmetrical(limit: i32) -> Self {
        Self {
            policy: StreamingPolicy {
                generation_limit: Some(limit),
                symmetrical: true,
                ..StreamingPolicy::default()
            },
            ..Self::default()
        }
    }
}
