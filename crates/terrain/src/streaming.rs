use std::collections::HashSet;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::generator::{GenerationRequest, ResolvedExit};
use crate::geometry::cell_centre;
use crate::registry::{Chunk, ChunkRegistry};
use crate::template::TemplateLibrary;

/// Rules deciding which neighbours get generated and which chunks are
/// dropped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamingPolicy {
    /// Maximum chunk lattice distance (Chebyshev) from `origin` a neighbour
    /// may have. `None` generates without bound.
    pub generation_limit: Option<i32>,
    /// Mirror chunks across the origin column.
    pub symmetrical: bool,
    /// Grid coordinate of the start chunk.
    pub origin: IVec2,
    /// Chunks farther than this (Chebyshev, in chunks) from every visible
    /// chunk are destroyed. `None` keeps everything.
    pub unload_distance: Option<i32>,
}

impl StreamingPolicy {
    /// Whether the neighbour behind `exit` lies inside the generation limit.
    #[must_use]
    pub fn within_limit(&self, exit: &ResolvedExit) -> bool {
        self.generation_limit
            .is_none_or(|limit| exit.tiles_from_origin.abs().max_element() <= limit)
    }

    /// `grid` reflected across the origin column.
    #[must_use]
    pub fn mirror_of(&self, grid: IVec2) -> IVec2 {
        IVec2::new(self.origin.x - (grid.x - self.origin.x), grid.y)
    }
}

/// Chebyshev distance between two grid coordinates.
fn lattice_distance(a: IVec2, b: IVec2) -> i32 {
    (a - b).abs().max_element()
}

/// Decides, each tick, which neighbours of the visible chunks to generate and
/// which chunks have fallen out of range.
#[derive(Clone, Copy, Debug, Default)]
pub struct StreamingDriver {
    policy: StreamingPolicy,
    /// World tile column chunks are reflected about in symmetrical mode.
    mirror_axis: Option<i32>,
}

impl StreamingDriver {
    #[must_use]
    pub fn new(policy: StreamingPolicy) -> Self {
        Self {
            policy,
            mirror_axis: None,
        }
    }

    /// Same driver, reflecting about tile column `tile_x`.
    #[must_use]
    pub fn with_mirror_axis(mut self, tile_x: i32) -> Self {
        self.set_mirror_axis(tile_x);
        self
    }

    /// Sets the tile column chunks are reflected about. The manager uses the
    /// start chunk's entry tile.
    pub fn set_mirror_axis(&mut self, tile_x: i32) {
        self.mirror_axis = Some(tile_x);
    }

    #[must_use]
    pub fn mirror_axis(&self) -> Option<i32> {
        self.mirror_axis
    }

    #[must_use]
    pub fn policy(&self) -> &StreamingPolicy {
        &self.policy
    }

    /// Requests for every unregistered neighbour of the `visible` chunks, in
    /// exit enumeration order, without duplicates. Exits past the generation
    /// limit are skipped. Visible ids that are not registered are ignored.
    #[must_use]
    pub fn plan(&self, registry: &ChunkRegistry, visible: &[IVec2]) -> Vec<GenerationRequest> {
        let mut seen = HashSet::new();
        let mut requests = Vec::new();
        for &grid in visible {
            let Ok(chunk) = registry.get(grid) else {
                continue;
            };
            for exit in chunk.exits() {
                if registry.contains(exit.neighbour_grid) {
                    continue;
                }
                if !self.policy.within_limit(exit) {
                    log::trace!(
                        "chunk {grid}: exit to {} is past the generation limit",
                        exit.neighbour_grid
                    );
                    continue;
                }
                if seen.insert(exit.neighbour_grid) {
                    requests.push(exit.neighbour_request());
                }
            }
        }
        requests
    }

    /// In symmetrical mode, replaces `request` with the exact reflection of
    /// the chunk mirrored across the origin column, when that chunk is live
    /// and its template is in `library` for the reflected direction.
    /// Otherwise `request` is returned unchanged.
    #[must_use]
    pub fn resolve(
        &self,
        registry: &ChunkRegistry,
        library: &TemplateLibrary,
        request: GenerationRequest,
    ) -> GenerationRequest {
        let Some(axis) = self.mirror_axis.filter(|_| self.policy.symmetrical) else {
            return request;
        };
        if request.grid.x == self.policy.origin.x {
            return request;
        }
        let mirror = self.policy.mirror_of(request.grid);
        let Ok(chunk) = registry.get(mirror) else {
            return request;
        };
        let reflected = self.reflection(chunk, axis);
        let index = chunk.template_index();
        if library
            .candidates(reflected.direction)
            .iter()
            .any(|c| c.index == index)
        {
            reflected
        } else {
            log::debug!(
                "mirror {mirror} template {index} cannot face {:?}; {} generates freely",
                reflected.direction,
                request.grid
            );
            request
        }
    }

    /// In symmetrical mode, the request that reflects the live chunk at
    /// `grid` onto its unregistered mirror. `None` on the origin column, when
    /// the mirror is already live or when no mirror axis is set.
    #[must_use]
    pub fn mirror_pending(
        &self,
        registry: &ChunkRegistry,
        grid: IVec2,
    ) -> Option<GenerationRequest> {
        let axis = self.mirror_axis.filter(|_| self.policy.symmetrical)?;
        if grid.x == self.policy.origin.x || registry.contains(self.policy.mirror_of(grid)) {
            return None;
        }
        let chunk = registry.get(grid).ok()?;
        Some(self.reflection(chunk, axis))
    }

    /// Request rebuilding `chunk` reflected about tile column `axis`. Its
    /// entry tile, facing and mirror flag are all reflected, so every tile,
    /// exit and waypoint lands on the mirror of the original.
    fn reflection(&self, chunk: &Chunk, axis: i32) -> GenerationRequest {
        let entry_tile = chunk.entry_tile();
        let mirrored_tile = IVec2::new(2 * axis - entry_tile.x, entry_tile.y);
        GenerationRequest {
            entry: cell_centre(mirrored_tile, chunk.cell_size()),
            direction: chunk.facing().mirrored(true),
            grid: self.policy.mirror_of(chunk.grid()),
            forced_template: Some(chunk.template_index()),
            forced_flip: Some(!chunk.flip_x()),
        }
    }

    /// Live chunks farther than the unload distance from every visible chunk.
    /// Nothing is stale while no chunk is visible. Distances below 1 count as
    /// 1, so direct neighbours of the view are never dropped.
    #[must_use]
    pub fn stale_chunks(&self, registry: &ChunkRegistry, visible: &[IVec2]) -> Vec<IVec2> {
        let Some(limit) = self.policy.unload_distance.map(|d| d.max(1)) else {
            return Vec::new();
        };
        if visible.is_empty() {
            return Vec::new();
        }
        registry
            .grids()
            .into_iter()
            .filter(|&grid| visible.iter().all(|&v| lattice_distance(grid, v) > limit))
            .collect()
    }
}
