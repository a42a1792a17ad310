//! A small hand-authored template set: a symmetric start room plus
//! corridors, ramps, bends and shafts that chain into each other.

use glam::IVec2;

use crate::error::Result;
use crate::geometry::TileRect;
use crate::template::{
    Direction, ItemKind, ItemSlot, SampleTerrain, TemplateExit, TemplateLibrary, TileEntry,
    TileLayer,
};

/// Library index of the start room.
pub const START_ROOM: usize = 0;

pub const GROUND_LAYER: &str = "ground";
pub const DECOR_LAYER: &str = "decor";

fn layer(name: &str, tiles: impl IntoIterator<Item = (IVec2, &'static str)>) -> TileLayer {
    TileLayer {
        name: name.to_owned(),
        tiles: tiles
            .into_iter()
            .map(|(position, tile)| TileEntry {
                position,
                tile: tile.to_owned(),
            })
            .collect(),
    }
}

/// Horizontal run of `tile` from `x0` to `x1` inclusive at height `y`.
fn row(
    x0: i32,
    x1: i32,
    y: i32,
    tile: &'static str,
) -> impl Iterator<Item = (IVec2, &'static str)> {
    (x0.min(x1)..=x0.max(x1)).map(move |x| (IVec2::new(x, y), tile))
}

/// Vertical run of `tile` from `y0` to `y1` inclusive at column `x`.
fn column(
    x: i32,
    y0: i32,
    y1: i32,
    tile: &'static str,
) -> impl Iterator<Item = (IVec2, &'static str)> {
    (y0.min(y1)..=y0.max(y1)).map(move |y| (IVec2::new(x, y), tile))
}

fn exit(direction: Direction, position: (i32, i32), waypoints: &[(i32, i32)]) -> TemplateExit {
    TemplateExit {
        direction,
        position: IVec2::new(position.0, position.1),
        waypoints: waypoints.iter().map(|&(x, y)| IVec2::new(x, y)).collect(),
    }
}

fn slot(kind: ItemKind, x: i32, y: i32) -> ItemSlot {
    ItemSlot {
        kind,
        position: IVec2::new(x, y),
    }
}

fn rect(min: (i32, i32), max: (i32, i32)) -> TileRect {
    TileRect::new(IVec2::new(min.0, min.1), IVec2::new(max.0, max.1))
}

fn start_room() -> SampleTerrain {
    SampleTerrain {
        facing: Direction::Both,
        layers: vec![
            layer(GROUND_LAYER, row(-6, 6, 0, "stone")),
            layer(
                DECOR_LAYER,
                [(IVec2::new(-2, 1), "banner"), (IVec2::new(2, 1), "banner")],
            ),
        ],
        ground_bounds: rect((-6, 0), (6, 6)),
        entry: IVec2::new(0, 1),
        exits: vec![
            exit(Direction::Left, (-6, 1), &[(0, 3), (-3, 3), (-6, 3)]),
            exit(Direction::Right, (6, 1), &[(0, 3), (3, 3), (6, 3)]),
        ],
        item_slots: vec![
            slot(ItemKind::Respawn, 0, 1),
            slot(ItemKind::Coin, -4, 2),
            slot(ItemKind::Coin, 4, 2),
        ],
        item_drop_chance: 1.0,
        index: 0,
    }
}

fn corridor() -> SampleTerrain {
    SampleTerrain {
        facing: Direction::Right,
        layers: vec![layer(GROUND_LAYER, row(0, 11, 0, "grass"))],
        ground_bounds: rect((0, 0), (11, 5)),
        entry: IVec2::new(0, 1),
        exits: vec![exit(Direction::Right, (11, 1), &[(0, 3), (6, 4), (11, 3)])],
        item_slots: vec![
            slot(ItemKind::Respawn, 2, 1),
            slot(ItemKind::Coin, 5, 2),
            slot(ItemKind::Crate, 8, 1),
        ],
        item_drop_chance: 0.5,
        index: 0,
    }
}

fn ramp() -> SampleTerrain {
    let steps = (0..=11).map(|x| (IVec2::new(x, x / 3), "grass"));
    SampleTerrain {
        facing: Direction::Right,
        layers: vec![layer(GROUND_LAYER, steps)],
        ground_bounds: rect((0, 0), (11, 9)),
        entry: IVec2::new(0, 1),
        exits: vec![exit(
            Direction::Right,
            (11, 4),
            &[(0, 3), (4, 4), (8, 5), (11, 6)],
        )],
        item_slots: vec![slot(ItemKind::Spikes, 6, 3), slot(ItemKind::HealthPack, 10, 5)],
        item_drop_chance: 0.4,
        index: 0,
    }
}

fn overhang() -> SampleTerrain {
    SampleTerrain {
        facing: Direction::Left,
        layers: vec![
            layer(GROUND_LAYER, row(-9, 0, 0, "grass")),
            layer(DECOR_LAYER, row(-7, -2, 5, "vines")),
        ],
        ground_bounds: rect((-9, 0), (0, 5)),
        entry: IVec2::new(0, 1),
        exits: vec![exit(Direction::Left, (-9, 1), &[(0, 3), (-4, 2), (-9, 3)])],
        item_slots: vec![slot(ItemKind::Weapon, -5, 1)],
        item_drop_chance: 0.25,
        index: 0,
    }
}

fn bend_up() -> SampleTerrain {
    SampleTerrain {
        facing: Direction::Right,
        layers: vec![layer(
            GROUND_LAYER,
            row(0, 3, 0, "grass").chain(column(7, 0, 11, "stone")),
        )],
        ground_bounds: rect((0, 0), (7, 11)),
        entry: IVec2::new(0, 1),
        exits: vec![exit(Direction::Up, (4, 11), &[(0, 3), (4, 5), (4, 11)])],
        item_slots: vec![slot(ItemKind::Respawn, 1, 1)],
        item_drop_chance: 0.0,
        index: 0,
    }
}

fn ledge_down() -> SampleTerrain {
    SampleTerrain {
        facing: Direction::Right,
        layers: vec![layer(
            GROUND_LAYER,
            row(0, 3, 0, "grass").chain(column(7, -11, 0, "stone")),
        )],
        ground_bounds: rect((0, -11), (7, 5)),
        entry: IVec2::new(0, 1),
        exits: vec![exit(Direction::Down, (5, -11), &[(0, 3), (5, 0), (5, -11)])],
        item_slots: vec![slot(ItemKind::Coin, 5, -4)],
        item_drop_chance: 0.5,
        index: 0,
    }
}

fn shaft() -> SampleTerrain {
    SampleTerrain {
        facing: Direction::Up,
        layers: vec![layer(
            GROUND_LAYER,
            column(-3, 0, 11, "stone").chain(column(3, 0, 11, "stone")),
        )],
        ground_bounds: rect((-3, 0), (3, 11)),
        entry: IVec2::new(0, 0),
        exits: vec![exit(Direction::Up, (0, 11), &[(0, 2), (1, 6), (0, 11)])],
        item_slots: vec![slot(ItemKind::Coin, 0, 6)],
        item_drop_chance: 0.3,
        index: 0,
    }
}

fn shaft_fork() -> SampleTerrain {
    SampleTerrain {
        facing: Direction::Up,
        layers: vec![layer(
            GROUND_LAYER,
            row(-3, 7, 7, "stone").chain(column(-3, 0, 6, "stone")),
        )],
        ground_bounds: rect((-3, 0), (7, 11)),
        entry: IVec2::new(0, 0),
        exits: vec![
            exit(Direction::Right, (7, 8), &[(0, 2), (0, 6), (7, 9)]),
            exit(Direction::Up, (0, 11), &[(0, 2), (0, 11)]),
        ],
        item_slots: vec![slot(ItemKind::Respawn, 2, 8)],
        item_drop_chance: 0.0,
        index: 0,
    }
}

fn pit() -> SampleTerrain {
    SampleTerrain {
        facing: Direction::Down,
        layers: vec![layer(
            GROUND_LAYER,
            column(-3, -11, 0, "stone").chain(row(0, 3, -10, "grass")),
        )],
        ground_bounds: rect((-3, -11), (3, 0)),
        entry: IVec2::new(0, 0),
        exits: vec![exit(Direction::Right, (3, -9), &[(0, -1), (0, -6), (3, -9)])],
        item_slots: vec![slot(ItemKind::Respawn, 1, -9)],
        item_drop_chance: 0.0,
        index: 0,
    }
}

/// The sample templates in library order; the start room comes first.
#[must_use]
pub fn sample_templates() -> Vec<SampleTerrain> {
    vec![
        start_room(),
        corridor(),
        ramp(),
        overhang(),
        bend_up(),
        ledge_down(),
        shaft(),
        shaft_fork(),
        pit(),
    ]
}

/// The sample templates loaded into a validated library.
///
/// # Errors
///
/// Propagates validation failures from [`TemplateLibrary::new`].
pub fn sample_library() -> Result<TemplateLibrary> {
    TemplateLibrary::new(sample_templates())
}
