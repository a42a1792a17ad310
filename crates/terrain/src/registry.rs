use std::collections::HashMap;

use glam::{IVec2, Vec2};

use crate::error::{Error, Result};
use crate::generator::{GeneratedChunk, ResolvedExit, RespawnPoint};
use crate::geometry::Bounds;
use crate::path::PathGeometry;
use crate::template::Direction;

/// A path owned by a chunk, tagged with the exit it leads to.
#[derive(Clone, Debug)]
pub struct ExitPath {
    pub exit: usize,
    pub geometry: PathGeometry,
}

/// A live, registered chunk.
#[derive(Debug)]
pub struct Chunk {
    grid: IVec2,
    facing: Direction,
    template_index: usize,
    flip_x: bool,
    bounds: Bounds,
    entrance: Vec2,
    entry_tile: IVec2,
    cell_size: Vec2,
    exits: Vec<ResolvedExit>,
    respawn_points: Vec<RespawnPoint>,
    paths: Vec<ExitPath>,
}

impl Chunk {
    /// Builds a chunk and one camera path per exit. Exits whose waypoints
    /// cannot form a path are logged and left without one.
    #[must_use]
    pub fn from_descriptor(descriptor: GeneratedChunk) -> Self {
        let paths = descriptor
            .exits
            .iter()
            .enumerate()
            .filter_map(|(exit, resolved)| {
                match PathGeometry::new(&resolved.waypoints, descriptor.facing, resolved.direction)
                {
                    Ok(geometry) => Some(ExitPath { exit, geometry }),
                    Err(err) => {
                        log::error!("chunk {} exit {exit}: {err}", descriptor.grid);
                        None
                    }
                }
            })
            .collect();

        Self {
            grid: descriptor.grid,
            facing: descriptor.facing,
            template_index: descriptor.template_index,
            flip_x: descriptor.flip_x(),
            bounds: descriptor.bounds,
            entrance: descriptor.entrance,
            entry_tile: descriptor.entry_tile,
            cell_size: descriptor.cell_size,
            exits: descriptor.exits,
            respawn_points: descriptor.respawn_points,
            paths,
        }
    }

    /// Grid coordinate this chunk is registered under.
    #[must_use]
    pub fn grid(&self) -> IVec2 {
        self.grid
    }

    /// Direction the chunk was generated toward.
    #[must_use]
    pub fn facing(&self) -> Direction {
        self.facing
    }

    /// Library index of the template this chunk was built from.
    #[must_use]
    pub fn template_index(&self) -> usize {
        self.template_index
    }

    /// Whether the template was mirrored along X.
    #[must_use]
    pub fn flip_x(&self) -> bool {
        self.flip_x
    }

    /// World bounds of the chunk's ground.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// World position of the entry tile's minimum corner.
    #[must_use]
    pub fn entrance(&self) -> Vec2 {
        self.entrance
    }

    /// World tile the template's entry tile landed on.
    #[must_use]
    pub fn entry_tile(&self) -> IVec2 {
        self.entry_tile
    }

    /// Cell size the chunk was generated with.
    #[must_use]
    pub fn cell_size(&self) -> Vec2 {
        self.cell_size
    }

    /// Resolved exits in template order.
    #[must_use]
    pub fn exits(&self) -> &[ResolvedExit] {
        &self.exits
    }

    /// Respawn locations placed from the template's respawn slots.
    #[must_use]
    pub fn respawn_points(&self) -> &[RespawnPoint] {
        &self.respawn_points
    }

    /// Camera paths, one per exit that could form one.
    #[must_use]
    pub fn paths(&self) -> &[ExitPath] {
        &self.paths
    }

    /// Path leading to the given exit, if that exit has one.
    #[must_use]
    pub fn path_for_exit(&self, exit: usize) -> Option<&PathGeometry> {
        self.paths
            .iter()
            .find(|p| p.exit == exit)
            .map(|p| &p.geometry)
    }

    /// The camera path whose closest point is nearest `position`.
    ///
    /// # Errors
    ///
    /// [`Error::NoPathsInChunk`] if the chunk owns no paths.
    pub fn closest_path(&self, position: Vec2) -> Result<&ExitPath> {
        self.paths
            .iter()
            .map(|p| (p, p.geometry.closest_point(position).distance_squared(position)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(p, _)| p)
            .ok_or(Error::NoPathsInChunk(self.grid))
    }
}

/// Live chunks keyed by grid coordinate. At most one chunk per coordinate;
/// registering over an occupied coordinate replaces the old chunk.
#[derive(Debug, Default)]
pub struct ChunkRegistry {
    chunks: HashMap<IVec2, Chunk>,
}

impl ChunkRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a chunk from `descriptor` and inserts it. Returns the chunk it
    /// replaced, if its grid id was already taken.
    pub fn register(&mut self, descriptor: GeneratedChunk) -> Option<Chunk> {
        let chunk = Chunk::from_descriptor(descriptor);
        let grid = chunk.grid;
        let replaced = self.chunks.insert(grid, chunk);
        if replaced.is_some() {
            log::debug!("replaced chunk at {grid}");
        }
        replaced
    }

    /// Live chunk at `grid`.
    ///
    /// # Errors
    ///
    /// [`Error::ChunkNotFound`] if no chunk is registered at `grid`.
    pub fn get(&self, grid: IVec2) -> Result<&Chunk> {
        self.chunks.get(&grid).ok_or(Error::ChunkNotFound(grid))
    }

    /// Whether a chunk is registered at `grid`.
    #[must_use]
    pub fn contains(&self, grid: IVec2) -> bool {
        self.chunks.contains_key(&grid)
    }

    /// Unregisters the chunk at `grid`. Removing an absent chunk is a no-op.
    pub fn remove(&mut self, grid: IVec2) -> Option<Chunk> {
        self.chunks.remove(&grid)
    }

    /// Number of live chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether no chunk is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Live chunks in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    /// Grid ids of every live chunk, sorted for deterministic iteration.
    #[must_use]
    pub fn grids(&self) -> Vec<IVec2> {
        let mut grids: Vec<IVec2> = self.chunks.keys().copied().collect();
        grids.sort_unstable_by_key(|g| (g.y, g.x));
        grids
    }

    /// Chunks whose bounds overlap `view`, in grid order.
    #[must_use]
    pub fn visible(&self, view: &Bounds) -> Vec<&Chunk> {
        let mut visible: Vec<&Chunk> = self
            .chunks
            .values()
            .filter(|c| c.bounds.intersects(view))
            .collect();
        visible.sort_unstable_by_key(|c| (c.grid.y, c.grid.x));
        visible
    }

    /// A chunk whose bounds contain `point`, preferring the lowest grid id
    /// when bounds overlap.
    #[must_use]
    pub fn chunk_at(&self, point: Vec2) -> Option<&Chunk> {
        self.chunks
            .values()
            .filter(|c| c.bounds.contains(point))
            .min_by_key(|c| (c.grid.y, c.grid.x))
    }
}
