use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

/// World-space size of one tile cell when no other size is configured.
pub const DEFAULT_CELL_SIZE: Vec2 = Vec2::new(1.0, 1.0);

/// World position of the minimum corner of `tile`.
#[inline]
#[must_use]
pub fn tile_to_world(tile: IVec2, cell_size: Vec2) -> Vec2 {
    tile.as_vec2() * cell_size
}

/// Tile containing the world position `pos`. Positions on a cell edge belong
/// to the cell whose minimum corner they sit on.
#[inline]
#[must_use]
pub fn world_to_tile(pos: Vec2, cell_size: Vec2) -> IVec2 {
    (pos / cell_size).floor().as_ivec2()
}

/// Snaps `pos` to the minimum corner of its containing cell.
#[inline]
#[must_use]
pub fn snap_to_cell(pos: Vec2, cell_size: Vec2) -> Vec2 {
    tile_to_world(world_to_tile(pos, cell_size), cell_size)
}

/// World position of the centre of `tile`.
#[inline]
#[must_use]
pub fn cell_centre(tile: IVec2, cell_size: Vec2) -> Vec2 {
    tile_to_world(tile, cell_size) + cell_size * 0.5
}

/// `-1` when mirroring along X, `1` otherwise.
#[inline]
#[must_use]
pub const fn axis_sign(flip_x: bool) -> i32 {
    if flip_x { -1 } else { 1 }
}

/// Applies horizontal mirroring to a local tile offset. Y is never inverted.
#[inline]
#[must_use]
pub const fn mirror_offset(offset: IVec2, flip_x: bool) -> IVec2 {
    IVec2::new(offset.x * axis_sign(flip_x), offset.y)
}

/// Check if two world positions are in different cells.
#[must_use]
pub fn crosses_cell_boundary(old: Vec2, new: Vec2, cell_size: Vec2) -> bool {
    world_to_tile(old, cell_size) != world_to_tile(new, cell_size)
}

/// Inclusive rectangle of tiles in a template's local frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRect {
    pub min: IVec2,
    pub max: IVec2,
}

impl TileRect {
    #[must_use]
    pub const fn new(min: IVec2, max: IVec2) -> Self {
        Self { min, max }
    }

    /// `true` when `min` does not exceed `max` on either axis.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }

    #[must_use]
    pub fn contains(&self, tile: IVec2) -> bool {
        tile.cmpge(self.min).all() && tile.cmple(self.max).all()
    }

    /// Mirrors the rectangle about the local X origin, keeping `min <= max`.
    #[must_use]
    pub fn mirrored(&self, flip_x: bool) -> Self {
        let a = mirror_offset(self.min, flip_x);
        let b = mirror_offset(self.max, flip_x);
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    #[must_use]
    pub fn translated(&self, by: IVec2) -> Self {
        Self {
            min: self.min + by,
            max: self.max + by,
        }
    }
}

/// Maps template-local tiles to world tiles: optional X mirror, then offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileTransform {
    pub offset: IVec2,
    pub flip_x: bool,
}

impl TileTransform {
    /// The transform that places local tile `pivot` onto world tile `anchor`.
    #[must_use]
    pub const fn anchored(anchor: IVec2, pivot: IVec2, flip_x: bool) -> Self {
        let mirrored = mirror_offset(pivot, flip_x);
        Self {
            offset: IVec2::new(anchor.x - mirrored.x, anchor.y - mirrored.y),
            flip_x,
        }
    }

    #[must_use]
    pub const fn apply(&self, local: IVec2) -> IVec2 {
        let mirrored = mirror_offset(local, self.flip_x);
        IVec2::new(self.offset.x + mirrored.x, self.offset.y + mirrored.y)
    }

    #[must_use]
    pub fn apply_rect(&self, rect: TileRect) -> TileRect {
        rect.mirrored(self.flip_x).translated(self.offset)
    }

    #[must_use]
    pub fn to_world(&self, local: IVec2, cell_size: Vec2) -> Vec2 {
        tile_to_world(self.apply(local), cell_size)
    }
}

/// Axis-aligned rectangle in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    /// Builds bounds from two arbitrary opposite corners.
    #[must_use]
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// World rectangle fully covering every cell of the inclusive tile range.
    #[must_use]
    pub fn from_tiles(tiles: TileRect, cell_size: Vec2) -> Self {
        Self::from_corners(
            tile_to_world(tiles.min, cell_size),
            tile_to_world(tiles.max + IVec2::ONE, cell_size),
        )
    }

    /// Bounds of the given half extents around `center`.
    #[must_use]
    pub fn around(center: Vec2, half_extents: Vec2) -> Self {
        Self::from_corners(center - half_extents, center + half_extents)
    }

    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Inclusive point-in-bounds test.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// `true` when the two rectangles overlap or touch.
    #[must_use]
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    #[must_use]
    pub fn expanded(&self, margin: Vec2) -> Self {
        Self::from_corners(self.min - margin, self.max + margin)
    }

    /// Smallest bounds containing both rectangles.
    #[must_use]
    pub fn union(&self, other: &Bounds) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CELL: Vec2 = Vec2::new(2.0, 0.5);

    #[test]
    fn tile_world_round_trip() {
        for tile in [IVec2::ZERO, IVec2::new(3, -4), IVec2::new(-7, 9)] {
            let world = tile_to_world(tile, CELL);
            assert_eq!(world_to_tile(world, CELL), tile);
        }
    }

    #[test]
    fn world_to_tile_floors_negative_positions() {
        assert_eq!(world_to_tile(Vec2::new(-0.1, -0.1), CELL), IVec2::new(-1, -1));
        assert_eq!(world_to_tile(Vec2::new(1.9, 0.49), CELL), IVec2::ZERO);
    }

    #[test]
    fn snap_lands_on_cell_corner() {
        let snapped = snap_to_cell(Vec2::new(5.3, 1.2), CELL);
        assert_eq!(snapped, Vec2::new(4.0, 1.0));
    }

    #[test]
    fn cell_centre_stays_inside_its_tile() {
        let tile = IVec2::new(-3, 2);
        let centre = cell_centre(tile, CELL);
        assert_eq!(centre, Vec2::new(-5.0, 1.25));
        assert_eq!(world_to_tile(centre, CELL), tile);
    }

    #[test]
    fn double_mirror_is_identity() {
        let offset = IVec2::new(5, -3);
        assert_eq!(mirror_offset(mirror_offset(offset, true), true), offset);
        assert_eq!(mirror_offset(offset, true), IVec2::new(-5, -3));
        assert_eq!(mirror_offset(offset, false), offset);
    }

    #[test]
    fn mirrored_rect_keeps_order() {
        let rect = TileRect::new(IVec2::new(0, -1), IVec2::new(6, 4));
        let flipped = rect.mirrored(true);
        assert_eq!(flipped.min, IVec2::new(-6, -1));
        assert_eq!(flipped.max, IVec2::new(0, 4));
        assert!(flipped.is_valid());
        assert_eq!(flipped.mirrored(true), rect);
    }

    #[test]
    fn anchored_transform_lands_pivot_on_anchor() {
        let pivot = IVec2::new(2, 1);
        let anchor = IVec2::new(10, -3);
        for flip in [false, true] {
            let transform = TileTransform::anchored(anchor, pivot, flip);
            assert_eq!(transform.apply(pivot), anchor);
        }
        let flipped = TileTransform::anchored(anchor, pivot, true);
        assert_eq!(flipped.apply(IVec2::new(5, 1)), IVec2::new(7, -3));
        let rect = flipped.apply_rect(TileRect::new(IVec2::ZERO, IVec2::new(5, 2)));
        assert_eq!(rect, TileRect::new(IVec2::new(7, -4), IVec2::new(12, -2)));
    }

    #[test]
    fn bounds_from_tiles_covers_last_cell() {
        let rect = TileRect::new(IVec2::ZERO, IVec2::new(4, 2));
        let bounds = Bounds::from_tiles(rect, CELL);
        assert_eq!(bounds.min, Vec2::ZERO);
        assert_eq!(bounds.max, Vec2::new(10.0, 1.5));
        assert_eq!(bounds.center(), Vec2::new(5.0, 0.75));
    }

    #[test]
    fn contains_is_inclusive() {
        let bounds = Bounds::from_corners(Vec2::new(1.0, 1.0), Vec2::ZERO);
        assert!(bounds.contains(Vec2::ZERO));
        assert!(bounds.contains(Vec2::ONE));
        assert!(!bounds.contains(Vec2::new(1.01, 0.5)));
    }

    #[test]
    fn intersecting_and_disjoint_bounds() {
        let a = Bounds::from_corners(Vec2::ZERO, Vec2::new(2.0, 2.0));
        let b = Bounds::from_corners(Vec2::new(2.0, 1.0), Vec2::new(3.0, 3.0));
        let c = Bounds::from_corners(Vec2::new(5.0, 5.0), Vec2::new(6.0, 6.0));
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
        assert_eq!(a.union(&c).max, Vec2::new(6.0, 6.0));
    }

    #[test]
    fn expanded_view_reaches_nearby_bounds() {
        let view = Bounds::around(Vec2::ZERO, Vec2::ONE);
        let nearby = Bounds::from_corners(Vec2::new(2.5, 0.0), Vec2::new(4.0, 1.0));
        assert!(!view.intersects(&nearby));
        let streamed = view.expanded(Vec2::splat(2.0));
        assert_eq!(streamed, Bounds::around(Vec2::ZERO, Vec2::splat(3.0)));
        assert!(streamed.intersects(&nearby));
    }

    #[test]
    fn boundary_crossing() {
        assert!(!crosses_cell_boundary(
            Vec2::new(0.1, 0.1),
            Vec2::new(1.9, 0.4),
            CELL
        ));
        assert!(crosses_cell_boundary(
            Vec2::new(1.9, 0.1),
            Vec2::new(2.1, 0.1),
            CELL
        ));
    }
}
