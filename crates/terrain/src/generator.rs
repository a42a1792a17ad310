use glam::{IVec2, Vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::geometry::{Bounds, TileTransform, snap_to_cell, tile_to_world, world_to_tile};
use crate::template::{Candidate, Direction, ItemKind, TemplateLibrary, TileLayer};

/// Inputs of one generation call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationRequest {
    /// World position of the tile the new chunk is entered through.
    pub entry: Vec2,
    pub direction: Direction,
    pub grid: IVec2,
    /// Library index to use instead of a random pick (symmetrical mirroring).
    pub forced_template: Option<usize>,
    /// Mirror flag to use instead of the one implied by `direction`. Set when
    /// rebuilding a chunk as the reflection of another.
    pub forced_flip: Option<bool>,
}

/// An exit of a generated chunk, resolved into world space.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedExit {
    /// World direction of the exit, after mirroring.
    pub direction: Direction,
    pub exit_tile: IVec2,
    pub exit_position: Vec2,
    /// World position of the first tile of the neighbouring chunk.
    pub neighbour_origin: Vec2,
    pub neighbour_grid: IVec2,
    /// Camera path waypoints, nearest to the chunk entrance first.
    pub waypoints: Vec<Vec2>,
    /// Chunk lattice offset of the neighbour from the origin chunk.
    pub tiles_from_origin: IVec2,
}

impl ResolvedExit {
    /// Direction the neighbour behind this exit must be generated with.
    #[must_use]
    pub const fn neighbour_facing(&self) -> Direction {
        self.direction
    }

    /// The request that materializes the neighbour behind this exit.
    #[must_use]
    pub const fn neighbour_request(&self) -> GenerationRequest {
        GenerationRequest {
            entry: self.neighbour_origin,
            direction: self.neighbour_facing(),
            grid: self.neighbour_grid,
            forced_template: None,
            forced_flip: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ItemPlacement {
    pub kind: ItemKind,
    pub position: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RespawnPoint {
    pub position: Vec2,
    pub direction: Direction,
}

/// Everything needed to materialize one chunk. Produced by
/// [`ChunkGenerator::generate`] and consumed by the registry.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedChunk {
    pub grid: IVec2,
    pub facing: Direction,
    pub template_index: usize,
    /// Local-to-world tile transform; carries the mirror flag.
    pub transform: TileTransform,
    /// World tile the template's entry tile landed on.
    pub entry_tile: IVec2,
    pub cell_size: Vec2,
    pub bounds: Bounds,
    pub centre: Vec2,
    pub entrance: Vec2,
    pub exits: Vec<ResolvedExit>,
    pub items: Vec<ItemPlacement>,
    pub respawn_points: Vec<RespawnPoint>,
}

impl GeneratedChunk {
    #[must_use]
    pub const fn flip_x(&self) -> bool {
        self.transform.flip_x
    }

    /// World tiles of one of the template's layers.
    pub fn world_tiles<'a>(
        &self,
        layer: &'a TileLayer,
    ) -> impl Iterator<Item = (IVec2, &'a str)> + 'a {
        let transform = self.transform;
        layer
            .tiles
            .iter()
            .map(move |entry| (transform.apply(entry.position), entry.tile.as_str()))
    }
}

/// Selects templates and stitches them into world space.
pub struct ChunkGenerator {
    cell_size: Vec2,
    origin: IVec2,
    rng: StdRng,
}

impl ChunkGenerator {
    /// `origin` is the grid coordinate of the start chunk; exits report their
    /// distance from it.
    #[must_use]
    pub fn new(cell_size: Vec2, origin: IVec2, seed: u64) -> Self {
        Self {
            cell_size,
            origin,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    #[must_use]
    pub fn cell_size(&self) -> Vec2 {
        self.cell_size
    }

    #[must_use]
    pub fn origin(&self) -> IVec2 {
        self.origin
    }

    /// Picks a template for `direction`: the forced one when given, otherwise
    /// uniformly at random among the candidates.
    ///
    /// # Errors
    ///
    /// [`Error::NoValidTemplate`] when nothing in the library fits
    /// `direction`; [`Error::IncompatibleTemplate`] when `forced` is not one of
    /// the candidates.
    pub fn select(
        &mut self,
        library: &TemplateLibrary,
        direction: Direction,
        forced: Option<usize>,
    ) -> Result<Candidate> {
        let candidates = library.candidates(direction);
        if candidates.is_empty() {
            return Err(Error::NoValidTemplate { direction });
        }
        match forced {
            Some(index) => candidates
                .into_iter()
                .find(|c| c.index == index)
                .ok_or(Error::IncompatibleTemplate { index, direction }),
            None => Ok(candidates[self.rng.random_range(0..candidates.len())]),
        }
    }

    /// Generates the chunk described by `request`. Does not touch any
    /// registry; the result must be registered to take effect.
    ///
    /// # Errors
    ///
    /// Any error from [`ChunkGenerator::select`].
    pub fn generate(
        &mut self,
        library: &TemplateLibrary,
        request: &GenerationRequest,
    ) -> Result<GeneratedChunk> {
        let mut candidate = self.select(library, request.direction, request.forced_template)?;
        if let Some(flip_x) = request.forced_flip {
            candidate.flip_x = flip_x;
        }
        let template = library
            .get(candidate.index)
            .ok_or(Error::NoValidTemplate {
                direction: request.direction,
            })?;

        let cell = self.cell_size;
        let entry_tile = world_to_tile(request.entry, cell);
        let transform = TileTransform::anchored(entry_tile, template.entry, candidate.flip_x);
        let entrance = snap_to_cell(request.entry, cell);
        let bounds = Bounds::from_tiles(transform.apply_rect(template.ground_bounds), cell);

        let exits = template
            .exits
            .iter()
            .map(|exit| {
                let direction = exit.direction.mirrored(candidate.flip_x);
                let exit_tile = transform.apply(exit.position);
                let neighbour_grid = request.grid + direction.step();
                let mut waypoints: Vec<Vec2> = exit
                    .waypoints
                    .iter()
                    .map(|&wp| transform.to_world(wp, cell))
                    .collect();
                waypoints.sort_by(|a, b| {
                    a.distance_squared(entrance)
                        .total_cmp(&b.distance_squared(entrance))
                });
                ResolvedExit {
                    direction,
                    exit_tile,
                    exit_position: tile_to_world(exit_tile, cell),
                    neighbour_origin: tile_to_world(exit_tile + direction.step(), cell),
                    neighbour_grid,
                    waypoints,
                    tiles_from_origin: neighbour_grid - self.origin,
                }
            })
            .collect();

        let mut items = Vec::new();
        let mut respawn_points = Vec::new();
        let drop_chance = f64::from(template.item_drop_chance);
        for slot in &template.item_slots {
            let position = transform.to_world(slot.position, cell);
            if slot.kind.capabilities().respawn {
                respawn_points.push(RespawnPoint {
                    position,
                    direction: request.direction,
                });
            } else if self.rng.random_bool(drop_chance) {
                items.push(ItemPlacement {
                    kind: slot.kind,
                    position,
                });
            }
        }

        log::debug!(
            "generated chunk {} from template {} (flip: {}) facing {:?}",
            request.grid,
            template.index,
            candidate.flip_x,
            request.direction
        );

        Ok(GeneratedChunk {
            grid: request.grid,
            facing: request.direction,
            template_index: template.index,
            transform,
            entry_tile,
            cell_size: cell,
            bounds,
            centre: bounds.center(),
            entrance,
            exits,
            items,
            respawn_points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::TileRect;
    use crate::samples::sample_library;
    use crate::template::{ItemSlot, SampleTerrain, TemplateExit, TileEntry};

    const CELL: Vec2 = Vec2::new(2.0, 1.0);

    /// Right-facing corridor with one Right exit at (5, 0).
    fn corridor() -> SampleTerrain {
        SampleTerrain {
            facing: Direction::Right,
            layers: vec![TileLayer {
                name: "ground".into(),
                tiles: (0..=5)
                    .map(|x| TileEntry {
                        position: IVec2::new(x, -1),
                        tile: if x == 0 { "edge".into() } else { "grass".into() },
                    })
                    .collect(),
            }],
            ground_bounds: TileRect::new(IVec2::new(0, -1), IVec2::new(5, 3)),
            entry: IVec2::ZERO,
            exits: vec![TemplateExit {
                direction: Direction::Right,
                position: IVec2::new(5, 0),
                waypoints: vec![IVec2::new(5, 0), IVec2::new(3, 1), IVec2::new(1, 0)],
            }],
            item_slots: vec![
                ItemSlot {
                    kind: ItemKind::Respawn,
                    position: IVec2::new(1, 0),
                },
                ItemSlot {
                    kind: ItemKind::Coin,
                    position: IVec2::new(3, 2),
                },
            ],
            item_drop_chance: 1.0,
            index: 0,
        }
    }

    /// Up-facing shaft with an Up exit and a Right exit.
    fn shaft() -> SampleTerrain {
        SampleTerrain {
            facing: Direction::Up,
            layers: vec![],
            ground_bounds: TileRect::new(IVec2::ZERO, IVec2::new(3, 7)),
            entry: IVec2::new(1, 0),
            exits: vec![
                TemplateExit {
                    direction: Direction::Up,
                    position: IVec2::new(1, 7),
                    waypoints: vec![IVec2::new(1, 1), IVec2::new(1, 7)],
                },
                TemplateExit {
                    direction: Direction::Right,
                    position: IVec2::new(3, 4),
                    waypoints: vec![IVec2::new(1, 1), IVec2::new(3, 4)],
                },
            ],
            item_slots: vec![],
            item_drop_chance: 0.0,
            index: 0,
        }
    }

    fn request(direction: Direction, grid: IVec2) -> GenerationRequest {
        GenerationRequest {
            entry: Vec2::ZERO,
            direction,
            grid,
            forced_template: None,
            forced_flip: None,
        }
    }

    #[test]
    fn right_corridor_resolves_exit() {
        let library = TemplateLibrary::new(vec![corridor()]).unwrap();
        let mut generator = ChunkGenerator::new(CELL, IVec2::ZERO, 1);
        let chunk = generator
            .generate(&library, &request(Direction::Right, IVec2::ZERO))
            .unwrap();

        assert!(!chunk.flip_x());
        assert_eq!(chunk.exits.len(), 1);
        let exit = &chunk.exits[0];
        assert_eq!(exit.direction, Direction::Right);
        assert_eq!(exit.exit_position, Vec2::new(5.0 * CELL.x, 0.0));
        assert_eq!(exit.neighbour_origin, Vec2::new(6.0 * CELL.x, 0.0));
        assert_eq!(exit.neighbour_grid, IVec2::new(1, 0));
        assert_eq!(exit.tiles_from_origin, IVec2::new(1, 0));
        assert_eq!(exit.waypoints[0], Vec2::new(CELL.x, 0.0));
        assert_eq!(exit.waypoints[2], Vec2::new(5.0 * CELL.x, 0.0));
    }

    #[test]
    fn bounds_and_entrance() {
        let library = TemplateLibrary::new(vec![corridor()]).unwrap();
        let mut generator = ChunkGenerator::new(CELL, IVec2::ZERO, 1);
        let mut req = request(Direction::Right, IVec2::new(2, 0));
        req.entry = Vec2::new(21.3, 4.7);
        let chunk = generator.generate(&library, &req).unwrap();

        // Entry snaps to tile (10, 4).
        assert_eq!(chunk.entrance, Vec2::new(20.0, 4.0));
        assert_eq!(chunk.bounds.min, Vec2::new(20.0, 3.0));
        assert_eq!(chunk.bounds.max, Vec2::new(32.0, 8.0));
        assert_eq!(chunk.centre, chunk.bounds.center());
    }

    #[test]
    fn left_request_mirrors_right_template() {
        let library = TemplateLibrary::new(vec![corridor()]).unwrap();
        let mut generator = ChunkGenerator::new(CELL, IVec2::ZERO, 1);
        let chunk = generator
            .generate(&library, &request(Direction::Left, IVec2::ZERO))
            .unwrap();

        assert!(chunk.flip_x());
        let exit = &chunk.exits[0];
        assert_eq!(exit.direction, Direction::Left);
        assert_eq!(exit.neighbour_facing(), Direction::Left);
        assert_eq!(exit.exit_tile, IVec2::new(-5, 0));
        assert_eq!(exit.neighbour_grid, IVec2::new(-1, 0));
        assert_eq!(exit.waypoints[0], Vec2::new(-CELL.x, 0.0));
        assert_eq!(
            chunk.bounds,
            Bounds::from_corners(Vec2::new(-5.0 * CELL.x, -1.0), Vec2::new(CELL.x, 4.0))
        );
    }

    #[test]
    fn vertical_exits_keep_direction() {
        let library = TemplateLibrary::new(vec![shaft()]).unwrap();
        let mut generator = ChunkGenerator::new(CELL, IVec2::ZERO, 1);
        let chunk = generator
            .generate(&library, &request(Direction::Up, IVec2::new(3, 2)))
            .unwrap();

        let up = &chunk.exits[0];
        assert_eq!(up.neighbour_facing(), Direction::Up);
        assert_eq!(up.neighbour_grid, IVec2::new(3, 3));
        // Entry (1, 0) is the pivot, so the exit sits six rows above it.
        assert_eq!(up.exit_tile, IVec2::new(0, 7));
        assert_eq!(up.neighbour_origin, Vec2::new(0.0, 8.0));

        let right = &chunk.exits[1];
        assert_eq!(right.neighbour_facing(), Direction::Right);
        assert_eq!(right.neighbour_grid, IVec2::new(4, 2));
        assert_eq!(right.neighbour_request().direction, Direction::Right);
    }

    #[test]
    fn missing_template_is_reported() {
        let library = TemplateLibrary::new(vec![corridor()]).unwrap();
        let mut generator = ChunkGenerator::new(CELL, IVec2::ZERO, 1);
        let err = generator
            .generate(&library, &request(Direction::Down, IVec2::ZERO))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::NoValidTemplate {
                direction: Direction::Down
            }
        ));
    }

    #[test]
    fn forced_template_must_fit() {
        let library = TemplateLibrary::new(vec![corridor(), shaft()]).unwrap();
        let mut generator = ChunkGenerator::new(CELL, IVec2::ZERO, 1);
        let picked = generator.select(&library, Direction::Left, Some(0)).unwrap();
        assert_eq!(
            picked,
            Candidate {
                index: 0,
                flip_x: true
            }
        );
        assert!(matches!(
            generator.select(&library, Direction::Left, Some(1)),
            Err(Error::IncompatibleTemplate { index: 1, .. })
        ));
    }

    #[test]
    fn respawn_slots_become_respawn_points() {
        let library = TemplateLibrary::new(vec![corridor()]).unwrap();
        let mut generator = ChunkGenerator::new(CELL, IVec2::ZERO, 1);
        let chunk = generator
            .generate(&library, &request(Direction::Right, IVec2::ZERO))
            .unwrap();
        assert_eq!(
            chunk.respawn_points,
            vec![RespawnPoint {
                position: Vec2::new(CELL.x, 0.0),
                direction: Direction::Right,
            }]
        );
        // Drop chance 1.0 always places the coin.
        assert_eq!(chunk.items.len(), 1);
        assert_eq!(chunk.items[0].kind, ItemKind::Coin);
    }

    #[test]
    fn zero_drop_chance_places_nothing() {
        let mut template = corridor();
        template.item_drop_chance = 0.0;
        let library = TemplateLibrary::new(vec![template]).unwrap();
        let mut generator = ChunkGenerator::new(CELL, IVec2::ZERO, 1);
        let chunk = generator
            .generate(&library, &request(Direction::Right, IVec2::ZERO))
            .unwrap();
        assert!(chunk.items.is_empty());
        assert_eq!(chunk.respawn_points.len(), 1);
    }

    #[test]
    fn mirrored_generation_mirrors_tiles() {
        let library = TemplateLibrary::new(vec![corridor()]).unwrap();
        let mut generator = ChunkGenerator::new(CELL, IVec2::ZERO, 1);
        let mut right = request(Direction::Right, IVec2::new(1, 0));
        right.forced_template = Some(0);
        let mut left = request(Direction::Left, IVec2::new(-1, 0));
        left.forced_template = Some(0);

        let a = generator.generate(&library, &right).unwrap();
        let b = generator.generate(&library, &left).unwrap();
        assert_ne!(a.flip_x(), b.flip_x());
        assert_eq!(a.template_index, b.template_index);

        let layer = &library.get(0).unwrap().layers[0];
        for ((ta, ka), (tb, kb)) in a.world_tiles(layer).zip(b.world_tiles(layer)) {
            assert_eq!(ka, kb);
            assert_eq!(ta.x, -tb.x);
            assert_eq!(ta.y, tb.y);
        }
    }

    #[test]
    fn forced_flip_mirrors_vertical_template() {
        let library = TemplateLibrary::new(vec![shaft()]).unwrap();
        let mut generator = ChunkGenerator::new(CELL, IVec2::ZERO, 1);
        let plain = generator
            .generate(&library, &request(Direction::Up, IVec2::new(1, 0)))
            .unwrap();
        let mut mirrored = request(Direction::Up, IVec2::new(-1, 0));
        mirrored.forced_template = Some(0);
        mirrored.forced_flip = Some(true);
        let mirrored = generator.generate(&library, &mirrored).unwrap();

        assert!(!plain.flip_x());
        assert!(mirrored.flip_x());
        assert_eq!(plain.entry_tile, mirrored.entry_tile);
        assert_eq!(plain.exits[1].direction, Direction::Right);
        assert_eq!(mirrored.exits[1].direction, Direction::Left);
        assert_eq!(mirrored.exits[1].neighbour_grid, IVec2::new(-2, 0));
        assert_eq!(
            mirrored.exits[1].exit_tile,
            IVec2::new(-plain.exits[1].exit_tile.x, plain.exits[1].exit_tile.y)
        );
    }

    #[test]
    fn same_seed_same_level() {
        let library = sample_library().unwrap();
        let picks = |seed| {
            let mut generator = ChunkGenerator::new(CELL, IVec2::ZERO, seed);
            (0..16)
                .map(|_| {
                    generator
                        .generate(&library, &request(Direction::Right, IVec2::ZERO))
                        .map(|c| c.template_index)
                        .unwrap()
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(picks(7), picks(7));
    }
}
