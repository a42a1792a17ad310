use glam::{IVec2, Vec2};

use crate::backend::TileBackend;
use crate::config::LevelConfig;
use crate::error::Result;
use crate::events::{ChunkEvent, EventBus};
use crate::generator::{ChunkGenerator, GenerationRequest};
use crate::geometry::Bounds;
use crate::registry::ChunkRegistry;
use crate::streaming::{StreamingDriver, StreamingPolicy};
use crate::template::{Direction, TemplateLibrary};

/// What one [`ChunkManager::tick`] did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Chunks overlapping the view, in grid order.
    pub visible: Vec<IVec2>,
    pub generated: Vec<IVec2>,
    /// Neighbours whose generation failed this tick. They are retried on the
    /// next tick.
    pub failed: Vec<IVec2>,
    pub destroyed: Vec<IVec2>,
}

/// Streams chunks in and out around a view.
///
/// Owns the template library, the generator and the registry, paints each
/// new chunk's layers through a [`TileBackend`] and publishes lifecycle
/// events. All mutation happens on the caller's thread, between ticks.
pub struct ChunkManager<B: TileBackend> {
    library: TemplateLibrary,
    generator: ChunkGenerator,
    registry: ChunkRegistry,
    driver: StreamingDriver,
    events: EventBus,
    backend: B,
    start_direction: Direction,
    start_template: Option<usize>,
}

impl<B: TileBackend> ChunkManager<B> {
    #[must_use]
    pub fn new(config: &LevelConfig, library: TemplateLibrary, backend: B) -> Self {
        Self {
            library,
            generator: ChunkGenerator::new(config.cell_size, config.policy.origin, config.seed),
            registry: ChunkRegistry::new(),
            driver: StreamingDriver::new(config.policy),
            events: EventBus::new(),
            backend,
            start_direction: config.start_direction,
            start_template: config.start_template,
        }
    }

    /// Generates the first chunk at the policy origin with its entry tile on
    /// `entry`. Symmetrical levels are mirrored about that entry tile's column.
    ///
    /// # Errors
    ///
    /// Any generation error; the registry is left untouched.
    pub fn start(&mut self, entry: Vec2) -> Result<IVec2> {
        let request = GenerationRequest {
            entry,
            direction: self.start_direction,
            grid: self.driver.policy().origin,
            forced_template: self.start_template,
            forced_flip: None,
        };
        let grid = self.generate_chunk(&request)?;
        let axis = self.registry.get(grid)?.entry_tile().x;
        self.driver.set_mirror_axis(axis);
        Ok(grid)
    }

    /// Generates, paints, announces and registers one chunk. A live chunk
    /// already at the requested grid id is unloaded first.
    ///
    /// # Errors
    ///
    /// Any error from [`ChunkGenerator::generate`]; the registry is left
    /// untouched.
    pub fn generate_chunk(&mut self, request: &GenerationRequest) -> Result<IVec2> {
        let chunk = self.generator.generate(&self.library, request)?;
        if self.unload_chunk(chunk.grid) {
            log::debug!("chunk {} regenerated", chunk.grid);
        }
        if let Some(template) = self.library.get(chunk.template_index) {
            for layer in &template.layers {
                self.backend.apply_layer(
                    chunk.grid,
                    &layer.name,
                    &layer.tiles,
                    chunk.transform.offset,
                    chunk.flip_x(),
                );
            }
        }
        self.events.publish(&ChunkEvent::Generated(chunk.clone()));
        let grid = chunk.grid;
        self.registry.register(chunk);
        Ok(grid)
    }

    /// Generates `request` and records the outcome in `report`.
    fn generate_into(&mut self, request: &GenerationRequest, report: &mut TickReport) -> bool {
        match self.generate_chunk(request) {
            Ok(grid) => {
                report.generated.push(grid);
                true
            }
            Err(e) => {
                log::warn!("failed to generate chunk {}: {e}", request.grid);
                report.failed.push(request.grid);
                false
            }
        }
    }

    /// Generates the unregistered neighbours of every chunk overlapping
    /// `view`, then destroys chunks that fell outside the unload distance.
    /// In symmetrical mode each new chunk off the origin column is generated
    /// together with its mirror.
    pub fn tick(&mut self, view: &Bounds) -> TickReport {
        let visible: Vec<IVec2> = self
            .registry
            .visible(view)
            .into_iter()
            .map(|chunk| chunk.grid())
            .collect();

        let mut report = TickReport::default();
        for request in self.driver.plan(&self.registry, &visible) {
            if self.registry.contains(request.grid) {
                continue;
            }
            let request = self.driver.resolve(&self.registry, &self.library, request);
            if !self.generate_into(&request, &mut report) {
                continue;
            }
            if let Some(mirror) = self.driver.mirror_pending(&self.registry, request.grid) {
                self.generate_into(&mirror, &mut report);
            }
        }

        for grid in self.driver.stale_chunks(&self.registry, &visible) {
            if self.unload_chunk(grid) {
                report.destroyed.push(grid);
            }
        }

        if !report.generated.is_empty() || !report.destroyed.is_empty() {
            log::debug!(
                "tick: {} visible, {} generated, {} destroyed, {} live",
                visible.len(),
                report.generated.len(),
                report.destroyed.len(),
                self.registry.len()
            );
        }
        report.visible = visible;
        report
    }

    /// Unregisters a chunk, clears its tiles and publishes
    /// [`ChunkEvent::Destroyed`]. Returns `false` if it was not live.
    pub fn unload_chunk(&mut self, grid: IVec2) -> bool {
        if self.registry.remove(grid).is_none() {
            return false;
        }
        self.backend.clear_chunk(grid);
        self.events.publish(&ChunkEvent::Destroyed(grid));
        true
    }

    /// Live chunks.
    #[must_use]
    pub fn registry(&self) -> &ChunkRegistry {
        &self.registry
    }

    /// Templates chunks are generated from.
    #[must_use]
    pub fn library(&self) -> &TemplateLibrary {
        &self.library
    }

    /// Streaming rules in effect.
    #[must_use]
    pub fn policy(&self) -> &StreamingPolicy {
        self.driver.policy()
    }

    /// World size of one tile.
    #[must_use]
    pub fn cell_size(&self) -> Vec2 {
        self.generator.cell_size()
    }

    /// Subscribe to chunk lifecycle events here.
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Sink new chunks are painted into.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the tile sink.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
