//! Core crate of the tilerast software rasterizer. This crate contains the data model and the
//! per-work-item kernels of every pipeline stage, expressed as ordinary functions: it does not
//! spawn threads, schedule dispatches or log anything. Orchestration lives in the `tilerast` crate.

pub mod arena;
pub mod bin;
pub mod clip;
pub mod color;
pub mod frame;
pub mod geometry;
pub mod image;
pub mod raster;
pub mod texture;
pub mod triangle;

pub use glam;

/// Default width of a tile, in pixels.
pub const DEFAULT_TILE_WIDTH: u32 = 8;
/// Default height of a tile, in pixels.
pub const DEFAULT_TILE_HEIGHT: u32 = 8;
/// Default maximum amount of sub-triangles a single input triangle may account for in the
/// triangle buffer.
pub const DEFAULT_MAX_SUB_TRIANGLES: u32 = 4;
/// Default capacity of a tile bucket.
pub const DEFAULT_MAX_TILE_TRIANGLES: u32 = 512;
