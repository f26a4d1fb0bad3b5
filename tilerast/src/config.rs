use crate::executor::Executor;
use easyerr::Error;
use tilerast_core::{
    DEFAULT_MAX_SUB_TRIANGLES, DEFAULT_MAX_TILE_TRIANGLES, DEFAULT_TILE_HEIGHT, DEFAULT_TILE_WIDTH,
    clip::{ClipStrategy, CullMode, PlaneSet},
    color::Color,
    raster::DepthMode,
    texture::Sampler,
};

#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("tile dimensions must be non-zero (got {width}x{height})")]
    TileSize { width: u32, height: u32 },
    #[error("tile buckets must be able to hold at least one triangle")]
    BucketCapacity,
    #[error("input triangles must be allowed at least one sub-triangle")]
    SubTriangleBudget,
}

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Width of a tile, in pixels.
    pub tile_width: u32,
    /// Height of a tile, in pixels.
    pub tile_height: u32,
    /// How many screen triangles each input triangle is budgeted in the triangle buffer. The
    /// buffer holds `triangle_count * max_sub_triangles` triangles.
    pub max_sub_triangles: u32,
    /// Capacity of each tile bucket.
    pub max_tile_triangles: u32,
    pub clip_strategy: ClipStrategy,
    pub plane_set: PlaneSet,
    pub cull_mode: CullMode,
    pub depth_mode: DepthMode,
    pub sampler: Sampler,
    /// Color of pixels not covered by any triangle.
    pub clear_color: Color,
    pub executor: Executor,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tile_width: DEFAULT_TILE_WIDTH,
            tile_height: DEFAULT_TILE_HEIGHT,
            max_sub_triangles: DEFAULT_MAX_SUB_TRIANGLES,
            max_tile_triangles: DEFAULT_MAX_TILE_TRIANGLES,
            clip_strategy: ClipStrategy::default(),
            plane_set: PlaneSet::default(),
            cull_mode: CullMode::default(),
            depth_mode: DepthMode::default(),
            sampler: Sampler::default(),
            clear_color: Color::BLACK,
            executor: Executor::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(ConfigError::TileSize {
                width: self.tile_width,
                height: self.tile_height,
            });
        }

        if self.max_tile_triangles == 0 {
            return Err(ConfigError::BucketCapacity);
        }

        if self.max_sub_triangles == 0 {
            return Err(ConfigError::SubTriangleBudget);
        }

        Ok(())
    }
}
