//! Procedural 2D level streaming from hand-authored chunk templates.
//!
//! Templates are stitched end to end: each chunk's exit fixes where the next
//! chunk's entry tile lands. A [`manager::ChunkManager`] grows the level
//! around a view, one [`manager::ChunkManager::tick`] at a time.

pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod follow;
pub mod generator;
pub mod geometry;
pub mod manager;
pub mod path;
pub mod registry;
pub mod samples;
pub mod streaming;
pub mod template;

pub use error::{Error, Result};
