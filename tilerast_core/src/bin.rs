//! The binning stage: distributing screen triangles into per-tile buckets.

use crate::{
    arena::SlotCursor,
    clip::Viewport,
    triangle::{Bounds, ScreenTriangle},
};
use bitvec::vec::BitVec;
use std::{
    ops::RangeInclusive,
    sync::atomic::{AtomicU32, Ordering},
};

/// How a framebuffer is divided into tiles. Tiles on the right and bottom edges may be partial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tiles_x: u32,
    pub tiles_y: u32,
}

/// The pixel rectangle `[x0, x1) x [y0, y1)` covered by a tile, clipped to the framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl TileRect {
    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }
}

impl TileGrid {
    /// # Panics
    /// Panics if a tile dimension is zero.
    pub fn new(width: u32, height: u32, tile_width: u32, tile_height: u32) -> Self {
        assert!(tile_width > 0 && tile_height > 0);
        Self {
            width,
            height,
            tile_width,
            tile_height,
            tiles_x: width.div_ceil(tile_width),
            tiles_y: height.div_ceil(tile_height),
        }
    }

    #[inline(always)]
    pub fn tile_count(&self) -> usize {
        self.tiles_x as usize * self.tiles_y as usize
    }

    /// Amount of pixels in a full tile.
    #[inline(always)]
    pub fn tile_len(&self) -> usize {
        self.tile_width as usize * self.tile_height as usize
    }

    #[inline(always)]
    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.width,
            height: self.height,
        }
    }

    #[inline(always)]
    pub fn tile_index(&self, tile_x: u32, tile_y: u32) -> usize {
        tile_y as usize * self.tiles_x as usize + tile_x as usize
    }

    pub fn tile_rect(&self, index: usize) -> TileRect {
        let tile_x = (index % self.tiles_x as usize) as u32;
        let tile_y = (index / self.tiles_x as usize) as u32;
        let x0 = tile_x * self.tile_width;
        let y0 = tile_y * self.tile_height;

        TileRect {
            x0,
            y0,
            x1: (x0 + self.tile_width).min(self.width),
            y1: (y0 + self.tile_height).min(self.height),
        }
    }
}

/// The tiles overlapped by a bounding box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRange {
    pub x: RangeInclusive<u32>,
    pub y: RangeInclusive<u32>,
}

impl TileRange {
    /// Clamps `bounds` to the framebuffer and returns the tiles it overlaps, or [`None`] if it
    /// lies entirely outside.
    pub fn covering(grid: &TileGrid, bounds: Bounds) -> Option<Self> {
        let x_lo = bounds.min.x.floor().max(0.0);
        let y_lo = bounds.min.y.floor().max(0.0);
        let x_hi = bounds.max.x.floor().min(grid.width as f32 - 1.0);
        let y_hi = bounds.max.y.floor().min(grid.height as f32 - 1.0);

        // also rejects NaN
        if !(x_lo <= x_hi && y_lo <= y_hi) {
            return None;
        }

        let (x_lo, x_hi) = (x_lo as u32, x_hi as u32);
        let (y_lo, y_hi) = (y_lo as u32, y_hi as u32);

        Some(Self {
            x: x_lo / grid.tile_width..=x_hi / grid.tile_width,
            y: y_lo / grid.tile_height..=y_hi / grid.tile_height,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.y
            .clone()
            .flat_map(|y| self.x.clone().map(move |x| (x, y)))
    }
}

/// Fixed-capacity triangle buckets, one per tile, filled concurrently.
#[derive(Debug)]
pub struct TileBins {
    grid: TileGrid,
    capacity: u32,
    cursors: Box<[SlotCursor]>,
    slots: Box<[AtomicU32]>,
}

impl TileBins {
    pub fn new(grid: TileGrid, capacity: u32) -> Self {
        let tiles = grid.tile_count();
        Self {
            grid,
            capacity,
            cursors: (0..tiles).map(|_| SlotCursor::new()).collect(),
            slots: (0..tiles * capacity as usize)
                .map(|_| AtomicU32::new(0))
                .collect(),
        }
    }

    #[inline(always)]
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Capacity of a single bucket.
    #[inline(always)]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Reallocates the buckets for a new grid. Every bucket ends up empty.
    pub fn resize(&mut self, grid: TileGrid) {
        *self = Self::new(grid, self.capacity);
    }

    /// Empties every bucket.
    pub fn reset(&mut self) {
        self.cursors.iter_mut().for_each(SlotCursor::reset);
    }

    /// Appends a triangle to the bucket of `tile`. Returns `false` if the bucket is full.
    #[inline(always)]
    pub fn insert(&self, tile: usize, triangle: u32) -> bool {
        let Some(slot) = self.cursors[tile].claim(self.capacity) else {
            return false;
        };

        let base = tile * self.capacity as usize;
        self.slots[base + slot as usize].store(triangle, Ordering::Relaxed);
        true
    }

    /// Amount of triangles in the bucket of `tile`.
    #[inline(always)]
    pub fn len(&self, tile: usize) -> u32 {
        self.cursors[tile].filled(self.capacity)
    }

    /// The triangles in the bucket of `tile`, in no particular order.
    ///
    /// Only meaningful once binning is complete.
    pub fn bucket(&self, tile: usize) -> impl Iterator<Item = u32> + '_ {
        let base = tile * self.capacity as usize;
        let len = self.len(tile) as usize;
        self.slots[base..base + len]
            .iter()
            .map(|slot| slot.load(Ordering::Relaxed))
    }

    /// Total amount of entries dropped because their bucket was full.
    pub fn dropped_entries(&self) -> u64 {
        self.cursors
            .iter()
            .map(|cursor| u64::from(cursor.overflow(self.capacity)))
            .sum()
    }

    /// One bit per tile, set for tiles whose bucket overflowed.
    pub fn overflowed_tiles(&self) -> BitVec {
        let mut bits = BitVec::repeat(false, self.cursors.len());
        for (tile, cursor) in self.cursors.iter().enumerate() {
            if cursor.overflow(self.capacity) > 0 {
                bits.set(tile, true);
            }
        }

        bits
    }

    /// Size of the bucket storage, in bytes.
    pub fn size_in_bytes(&self) -> usize {
        size_of_val(&*self.cursors) + size_of_val(&*self.slots)
    }
}

/// Result of binning a single triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BinCounts {
    pub inserted: u32,
    pub dropped: u32,
}

/// Binning work item: inserts triangle `index` into the bucket of every tile its clamped bounding
/// box overlaps.
pub fn bin_triangle(bins: &TileBins, index: u32, triangle: &ScreenTriangle) -> BinCounts {
    let mut counts = BinCounts::default();
    let Some(range) = TileRange::covering(bins.grid(), triangle.bounds()) else {
        return counts;
    };

    for (x, y) in range.iter() {
        if bins.insert(bins.grid().tile_index(x, y), index) {
            counts.inserted += 1;
        } else {
            counts.dropped += 1;
        }
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triangle::{ScreenVertex, TriangleKey};
    use glam::Vec2;
    use proptest::prelude::*;

    fn triangle(points: [Vec2; 3]) -> ScreenTriangle {
        ScreenTriangle::new(
            points.map(|position| ScreenVertex {
                position,
                z: 0.5,
                rw: 1.0,
                uv: Vec2::ZERO,
            }),
            TriangleKey::default(),
        )
        .unwrap()
    }

    fn tiles_of(bins: &TileBins, triangle: u32) -> Vec<usize> {
        (0..bins.grid().tile_count())
            .filter(|&tile| bins.bucket(tile).any(|t| t == triangle))
            .collect()
    }

    #[test]
    fn grid_rounds_up() {
        let grid = TileGrid::new(17, 8, 8, 8);
        assert_eq!((grid.tiles_x, grid.tiles_y), (3, 1));

        let last = grid.tile_rect(2);
        assert_eq!((last.x0, last.x1, last.width()), (16, 17, 1));
        assert_eq!(last.height(), 8);
    }

    #[test]
    fn example_lands_in_last_tile() {
        let bins = TileBins::new(TileGrid::new(16, 16, 8, 8), 4);
        let tri = triangle([
            Vec2::new(10.0, 10.0),
            Vec2::new(110.0, 10.0),
            Vec2::new(10.0, 110.0),
        ]);

        let counts = bin_triangle(&bins, 0, &tri);
        assert_eq!(counts.inserted, 1);
        assert_eq!(tiles_of(&bins, 0), vec![bins.grid().tile_index(1, 1)]);
    }

    #[test]
    fn offscreen_is_skipped() {
        let bins = TileBins::new(TileGrid::new(16, 16, 8, 8), 4);
        let tri = triangle([
            Vec2::new(-30.0, 2.0),
            Vec2::new(-10.0, 2.0),
            Vec2::new(-20.0, 12.0),
        ]);

        assert_eq!(bin_triangle(&bins, 0, &tri), BinCounts::default());
    }

    #[test]
    fn overflow_is_per_tile() {
        let mut bins = TileBins::new(TileGrid::new(16, 8, 8, 8), 2);
        let left = triangle([Vec2::new(1.0, 1.0), Vec2::new(6.0, 1.0), Vec2::new(1.0, 6.0)]);
        let both = triangle([Vec2::new(1.0, 1.0), Vec2::new(15.0, 1.0), Vec2::new(1.0, 6.0)]);

        bin_triangle(&bins, 0, &left);
        bin_triangle(&bins, 1, &left);
        let counts = bin_triangle(&bins, 2, &both);

        assert_eq!(counts, BinCounts { inserted: 1, dropped: 1 });
        assert_eq!(bins.dropped_entries(), 1);
        assert_eq!(bins.len(0), 2);
        assert_eq!(tiles_of(&bins, 2), vec![1]);

        let overflowed = bins.overflowed_tiles();
        assert!(overflowed[0]);
        assert!(!overflowed[1]);

        bins.reset();
        assert_eq!(bins.len(0), 0);
        assert_eq!(bins.dropped_entries(), 0);
        assert!(bins.overflowed_tiles().not_any());
    }

    fn screen_point() -> impl Strategy<Value = Vec2> {
        (-40.0f32..80.0, -40.0f32..80.0).prop_map(|(x, y)| Vec2::new(x, y))
    }

    proptest::proptest! {
        #[test]
        fn binning_is_complete(
            points in proptest::collection::vec([screen_point(), screen_point(), screen_point()], 1..16),
            tile in 1u32..10,
            width in 1u32..50,
            height in 1u32..50,
        ) {
            let grid = TileGrid::new(width, height, tile, tile);
            let bins = TileBins::new(grid, 64);

            let triangles: Vec<_> = points
                .into_iter()
                .filter_map(|p| ScreenTriangle::new(
                    p.map(|position| ScreenVertex { position, z: 0.0, rw: 1.0, uv: Vec2::ZERO }),
                    TriangleKey::default(),
                ))
                .collect();

            for (index, triangle) in triangles.iter().enumerate() {
                bin_triangle(&bins, index as u32, triangle);
            }

            for (index, triangle) in triangles.iter().enumerate() {
                let bounds = triangle.bounds();
                for tile in 0..grid.tile_count() {
                    let rect = grid.tile_rect(tile);
                    let overlaps = bounds.max.x >= rect.x0 as f32
                        && bounds.min.x < rect.x1 as f32
                        && bounds.max.y >= rect.y0 as f32
                        && bounds.min.y < rect.y1 as f32;

                    let occurrences = bins.bucket(tile).filter(|&t| t == index as u32).count();
                    prop_assert_eq!(occurrences, usize::from(overlaps));
                }
            }
        }
    }
}
