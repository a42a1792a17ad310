use glam::IVec2;

use crate::template::TileEntry;

/// Receives tile layers to paint. `tiles` are template-local; world tile
/// positions are `origin + p` with `p.x` negated first when `flip_x` is set.
pub trait TileBackend {
    fn apply_layer(
        &mut self,
        grid: IVec2,
        layer: &str,
        tiles: &[TileEntry],
        origin: IVec2,
        flip_x: bool,
    );

    /// Called when the chunk at `grid` is destroyed.
    fn clear_chunk(&mut self, grid: IVec2);
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullBackend;

impl TileBackend for NullBackend {
    fn apply_layer(
        &mut self,
        _grid: IVec2,
        _layer: &str,
        _tiles: &[TileEntry],
        _origin: IVec2,
        _flip_x: bool,
    ) {
    }

    fn clear_chunk(&mut self, _grid: IVec2) {}
}

/// One recorded [`TileBackend::apply_layer`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppliedLayer {
    pub grid: IVec2,
    pub layer: String,
    pub tile_count: usize,
    pub origin: IVec2,
    pub flip_x: bool,
}

/// Records calls for inspection by hosts and tests.
#[derive(Clone, Debug, Default)]
pub struct RecordingBackend {
    pub applied: Vec<AppliedLayer>,
    pub cleared: Vec<IVec2>,
}

impl TileBackend for RecordingBackend {
    fn apply_layer(
        &mut self,
        grid: IVec2,
        layer: &str,
        tiles: &[TileEntry],
        origin: IVec2,
        flip_x: bool,
    ) {
        self.applied.push(AppliedLayer {
            grid,
            layer: layer.to_owned(),
            tile_count: tiles.len(),
            origin,
            flip_x,
        });
    }

    fn clear_chunk(&mut self, grid: IVec2) {
        self.cleared.push(grid);
    }
}
