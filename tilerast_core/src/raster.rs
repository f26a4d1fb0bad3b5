//! The tile rasterization stage.
//!
//! Every tile is rasterized by a single work item into its own region of a tile-major scratch
//! buffer, so work items never share pixels. Once every tile is done, the scratch buffers are
//! resolved into the row-major frame images one band of tile rows at a time.

use crate::{
    bin::{TileBins, TileGrid},
    color::Color,
    texture::{Sampler, Texture},
    triangle::{ScreenTriangle, TriangleKey},
};
use glam::{Vec2, Vec3};
use strum::{IntoStaticStr, VariantArray};

/// Which value the depth test compares and the depth image stores. Smaller is closer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, VariantArray, IntoStaticStr)]
pub enum DepthMode {
    /// Interpolated view-space `w`, `1 / sum(b_i / w_i)`.
    #[default]
    Linear,
    /// Interpolated normalized device depth, `sum(b_i * z_i / w_i)`.
    Ndc,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterSettings {
    pub clear_color: Color,
    pub depth_mode: DepthMode,
    pub sampler: Sampler,
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            clear_color: Color::BLACK,
            depth_mode: DepthMode::default(),
            sampler: Sampler::default(),
        }
    }
}

/// Inputs shared by every tile of a frame.
#[derive(Debug, Clone, Copy)]
pub struct RasterInput<'a> {
    pub triangles: &'a [ScreenTriangle],
    pub bins: &'a TileBins,
    pub texture: &'a Texture,
    pub settings: &'a RasterSettings,
}

/// The current winner of a pixel.
#[derive(Clone, Copy)]
struct Fragment {
    depth: f32,
    key: TriangleKey,
    triangle: u32,
    weights: Vec3,
    rw: f32,
}

impl Fragment {
    /// Whether `self` wins the depth test against `other`. Exact ties go to the smaller key, so
    /// the result does not depend on the order of the bucket.
    #[inline(always)]
    fn beats(&self, other: &Option<Self>) -> bool {
        match other {
            None => true,
            Some(other) => {
                self.depth < other.depth || (self.depth == other.depth && self.key < other.key)
            }
        }
    }
}

#[inline(always)]
fn shade(input: &RasterInput, tile: usize, point: Vec2) -> (Color, f32) {
    let mut best: Option<Fragment> = None;
    for index in input.bins.bucket(tile) {
        let triangle = &input.triangles[index as usize];
        let Some(weights) = triangle.barycentric(point) else {
            continue;
        };

        let rw = triangle.interpolate_rw(weights);
        let depth = match input.settings.depth_mode {
            DepthMode::Linear => rw.recip(),
            DepthMode::Ndc => triangle.interpolate_ndc_depth(weights),
        };

        if !depth.is_finite() {
            continue;
        }

        let candidate = Fragment {
            depth,
            key: triangle.key,
            triangle: index,
            weights,
            rw,
        };

        if candidate.beats(&best) {
            best = Some(candidate);
        }
    }

    match best {
        Some(fragment) => {
            let triangle = &input.triangles[fragment.triangle as usize];
            let uv = triangle.interpolate_uv(fragment.weights, fragment.rw);
            let color = input.settings.sampler.sample(input.texture, uv);
            (color, fragment.depth)
        }
        None => (input.settings.clear_color, f32::INFINITY),
    }
}

/// Rasterization work item: clears the scratch region of `tile` and resolves the visible
/// triangle of each of its pixels.
///
/// `color` and `depth` hold the tile's pixels row-major with a stride of the full tile width, and
/// must be [`TileGrid::tile_len`] long. Pixels of partial tiles that lie outside of the
/// framebuffer are left cleared.
pub fn rasterize_tile(input: &RasterInput, tile: usize, color: &mut [Color], depth: &mut [f32]) {
    let grid = input.bins.grid();
    color.fill(input.settings.clear_color);
    depth.fill(f32::INFINITY);

    if input.bins.len(tile) == 0 {
        return;
    }

    let rect = grid.tile_rect(tile);
    let stride = grid.tile_width as usize;
    for local_y in 0..rect.height() {
        for local_x in 0..rect.width() {
            let point = Vec2::new(
                (rect.x0 + local_x) as f32 + 0.5,
                (rect.y0 + local_y) as f32 + 0.5,
            );

            let (c, d) = shade(input, tile, point);
            let offset = local_y as usize * stride + local_x as usize;
            color[offset] = c;
            depth[offset] = d;
        }
    }
}

/// Resolve work item: copies one band of tile rows from a tile-major scratch buffer into the
/// matching rows of a row-major image.
///
/// `tiles` holds the `tiles_x` tiles of the band and `rows` the image rows they cover.
pub fn resolve_band<T: Copy>(grid: &TileGrid, tiles: &[T], rows: &mut [T]) {
    let width = grid.width as usize;
    if width == 0 {
        return;
    }

    let tile_width = grid.tile_width as usize;
    let tile_len = grid.tile_len();
    let band_height = rows.len() / width;

    for (tile_x, tile) in tiles.chunks(tile_len).enumerate() {
        let x0 = tile_x * tile_width;
        let len = tile_width.min(width - x0);

        for y in 0..band_height {
            let src = &tile[y * tile_width..y * tile_width + len];
            rows[y * width + x0..y * width + x0 + len].copy_from_slice(src);
        }
    }
}
