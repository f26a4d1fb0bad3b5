//! Main crate of the tilerast software rasterizer. This crate drives the kernels of
//! [`tilerast_core`] as a per-frame sequence of data-parallel dispatches and owns every buffer
//! they work on. It does not present anything: the rendered images are made available through
//! [`Pipeline::current_frame`].

mod config;
mod executor;
mod stats;

pub use config::{Config, ConfigError};
pub use executor::Executor;
pub use stats::{CapacityExceeded, CapacityKind, FrameStats};
pub use tilerast_core as core;

use bytesize::ByteSize;
use easyerr::{Error, ResultExt};
use glam::{Mat4, Vec2, Vec3};
use std::sync::Arc;
use tilerast_core::{
    arena::SlotArena,
    bin::{TileBins, TileGrid, bin_triangle},
    clip::{self, ClipCounts, ClipSettings, ClipStrategy, ClipTriangle},
    color::Color,
    frame::{Frame, FrameStore},
    geometry::{GeometryError, GeometryStore},
    raster::{RasterInput, RasterSettings, rasterize_tile, resolve_band},
    texture::Texture,
    triangle::ScreenTriangle,
};
use tinylog::{Logger, debug, info, trace, warn};

/// All the loggers of the [`Pipeline`].
pub struct Loggers {
    pub root: Logger,
    pub geometry: Logger,
    pub clip: Logger,
    pub binning: Logger,
    pub raster: Logger,
    pub frame: Logger,
}

impl Loggers {
    pub fn new(logger: Logger) -> Self {
        Self {
            geometry: logger.child("geometry", tinylog::Level::Trace),
            clip: logger.child("clip", tinylog::Level::Trace),
            binning: logger.child("binning", tinylog::Level::Trace),
            raster: logger.child("raster", tinylog::Level::Trace),
            frame: logger.child("frame", tinylog::Level::Trace),
            root: logger,
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration")]
    Config { source: ConfigError },
    #[error("invalid geometry")]
    Geometry { source: GeometryError },
    #[error("mesh with {triangles} triangles does not fit in the triangle buffer")]
    TooManyTriangles { triangles: usize },
}

/// Buffers that live for a single frame and are reset at the start of each one.
struct FrameBuffers {
    /// Compacted screen triangles.
    triangles: SlotArena<ScreenTriangle>,
    /// Near-clipped triangles of a two-pass clip.
    intermediate: SlotArena<ClipTriangle>,
    bins: TileBins,
    /// Tile-major rasterization output.
    color: Vec<Color>,
    depth: Vec<f32>,
}

impl FrameBuffers {
    fn new(grid: TileGrid, config: &Config, triangles: u32) -> Self {
        let scratch = grid.tile_count() * grid.tile_len();
        Self {
            triangles: SlotArena::with_capacity(triangles * config.max_sub_triangles),
            intermediate: SlotArena::with_capacity(match config.clip_strategy {
                ClipStrategy::SinglePass => 0,
                ClipStrategy::TwoPass => triangles * 2,
            }),
            bins: TileBins::new(grid, config.max_tile_triangles),
            color: vec![Color::default(); scratch],
            depth: vec![0.0; scratch],
        }
    }

    fn resize(&mut self, grid: TileGrid) {
        let scratch = grid.tile_count() * grid.tile_len();
        self.bins.resize(grid);
        self.color.resize(scratch, Color::default());
        self.depth.resize(scratch, 0.0);
    }

    fn size_in_bytes(&self) -> usize {
        self.triangles.capacity() as usize * size_of::<ScreenTriangle>()
            + self.intermediate.capacity() as usize * size_of::<ClipTriangle>()
            + self.bins.size_in_bytes()
            + size_of_val(&*self.color)
            + size_of_val(&*self.depth)
    }
}

/// The tile-based rasterization pipeline.
///
/// Every [`Pipeline::render`] runs the stages of a frame in order, each as one dispatch that
/// completes before the next one starts:
///
/// 1. reset of the per-frame buffers
/// 2. clip/transform (one or two dispatches, see [`ClipStrategy`])
/// 3. binning
/// 4. tile rasterization
/// 5. resolve of the tiles into the back frame
///
/// and finally swaps the back frame to the front.
pub struct Pipeline {
    config: Config,
    loggers: Loggers,
    geometry: GeometryStore,
    /// Triangles of the loaded mesh, as `u32` since it bounds the triangle buffer.
    triangle_count: u32,
    grid: TileGrid,
    buffers: FrameBuffers,
    frames: FrameStore,
    stats: FrameStats,
}

impl Pipeline {
    /// Creates a new [`Pipeline`] with an empty mesh and a zero-sized framebuffer. Call
    /// [`Pipeline::load_mesh`] and [`Pipeline::resize`] before rendering.
    pub fn new(config: Config, logger: Logger) -> Result<Self, PipelineError> {
        config.validate().context(PipelineCtx::Config)?;

        let loggers = Loggers::new(logger);
        let grid = TileGrid::new(0, 0, config.tile_width, config.tile_height);
        let buffers = FrameBuffers::new(grid, &config, 0);
        let frames = FrameStore::new(0, 0, config.clear_color);

        let (tile_width, tile_height) = (config.tile_width, config.tile_height);
        let strategy: &'static str = config.clip_strategy.into();
        let planes: &'static str = config.plane_set.into();
        let executor: &'static str = config.executor.into();
        info!(
            loggers.root,
            "created pipeline with {tile_width}x{tile_height} tiles";
            strategy = strategy,
            planes = planes,
            executor = executor
        );

        let worst_case = config
            .clip_strategy
            .max_sub_triangles(config.plane_set);
        if config.max_sub_triangles < worst_case {
            let budget = config.max_sub_triangles;
            warn!(
                loggers.clip,
                "sub-triangle budget of {budget} is below the worst case of {worst_case}, large triangles may lose pieces"
            );
        }

        Ok(Self {
            config,
            loggers,
            geometry: GeometryStore::default(),
            triangle_count: 0,
            grid,
            buffers,
            frames,
            stats: FrameStats::default(),
        })
    }

    #[inline(always)]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline(always)]
    pub fn loggers(&self) -> &Loggers {
        &self.loggers
    }

    #[inline(always)]
    pub fn geometry(&self) -> &GeometryStore {
        &self.geometry
    }

    #[inline(always)]
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Validates and loads a mesh, replacing the current one. If validation fails, the current
    /// mesh is kept.
    pub fn load_mesh(
        &mut self,
        positions: &[Vec3],
        uvs: &[Vec2],
        indices: &[u32],
    ) -> Result<(), PipelineError> {
        let geometry = GeometryStore::load(positions, uvs, indices)
            .inspect_err(|e| {
                warn!(self.loggers.geometry, "rejected mesh: {e}");
            })
            .context(PipelineCtx::Geometry)?;

        let triangles = geometry.triangle_count();
        let triangle_count = u32::try_from(triangles)
            .ok()
            .filter(|count| {
                count
                    .checked_mul(self.config.max_sub_triangles.max(2))
                    .is_some()
            })
            .ok_or(PipelineError::TooManyTriangles { triangles })?;

        self.buffers.triangles =
            SlotArena::with_capacity(triangle_count * self.config.max_sub_triangles);
        if self.config.clip_strategy == ClipStrategy::TwoPass {
            self.buffers.intermediate = SlotArena::with_capacity(triangle_count * 2);
        }

        let size = ByteSize(geometry.size_in_bytes() as u64);
        info!(
            self.loggers.geometry,
            "loaded mesh ({size})";
            vertices = geometry.vertex_count(),
            triangles = triangle_count
        );
        debug!(
            self.loggers.geometry,
            "frame buffers now take {}", ByteSize(self.buffers.size_in_bytes() as u64)
        );

        self.geometry = geometry;
        self.triangle_count = triangle_count;
        Ok(())
    }

    /// Changes the size of the output. Reallocates both frame generations and the tile buffers.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.grid = TileGrid::new(
            width,
            height,
            self.config.tile_width,
            self.config.tile_height,
        );
        self.buffers.resize(self.grid);
        self.frames.resize(width, height);

        let frame_store = ByteSize(self.frames.size_in_bytes() as u64);
        let tile_buffers = ByteSize(self.buffers.size_in_bytes() as u64);
        info!(
            self.loggers.frame,
            "resized to {width}x{height} ({frame_store} frame store, {tile_buffers} tile buffers)";
            tiles_x = self.grid.tiles_x,
            tiles_y = self.grid.tiles_y
        );
    }

    /// The last completed frame. Holding on to it does not block rendering: it keeps showing the
    /// same frame while the pipeline moves on.
    #[inline(always)]
    pub fn current_frame(&self) -> Arc<Frame> {
        self.frames.current_frame()
    }

    #[inline(always)]
    pub fn frames(&self) -> &FrameStore {
        &self.frames
    }

    /// Statistics of the last completed frame.
    #[inline(always)]
    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Renders a frame of the loaded mesh and publishes it as the current frame.
    pub fn render(&mut self, view: Mat4, projection: Mat4, model: Mat4, texture: &Texture) {
        let mvp = projection * view * model;
        let mut stats = FrameStats {
            input_triangles: self.triangle_count,
            ..Default::default()
        };

        self.reset();
        self.clip(&mvp, &mut stats);
        self.bin(&mut stats);
        self.rasterize(texture);
        self.resolve();

        self.frames.swap();
        stats.frame = self.frames.current_frame().index;
        self.report(&stats);
        self.stats = stats;
    }

    fn reset(&mut self) {
        self.buffers.triangles.reset();
        self.buffers.intermediate.reset();
        self.buffers.bins.reset();
    }

    fn clip(&mut self, mvp: &Mat4, stats: &mut FrameStats) {
        let executor = self.config.executor;
        let geometry = &self.geometry;
        let settings = ClipSettings {
            planes: self.config.plane_set,
            cull: self.config.cull_mode,
            viewport: self.grid.viewport(),
            max_sub_triangles: self.config.max_sub_triangles,
        };

        let counts = match self.config.clip_strategy {
            ClipStrategy::SinglePass => {
                let triangles = &self.buffers.triangles;
                executor.map_sum(self.triangle_count, |index| {
                    clip::clip_single_pass(geometry, index, mvp, &settings, |triangle| {
                        triangles.push(triangle);
                    })
                })
            }
            ClipStrategy::TwoPass => {
                let intermediate = &self.buffers.intermediate;
                let near = executor.map_sum(self.triangle_count, |index| {
                    clip::clip_near_pass(geometry, index, mvp, &settings, |triangle| {
                        intermediate.push(triangle);
                    })
                });

                let intermediate = self.buffers.intermediate.as_slice();
                stats.intermediate_triangles = intermediate.len() as u32;
                trace!(
                    self.loggers.clip,
                    "near pass done";
                    intermediate = intermediate.len()
                );

                let triangles = &self.buffers.triangles;
                near + executor.map_sum(intermediate.len() as u32, |index| {
                    clip::clip_ndc_pass(&intermediate[index as usize], &settings, |triangle| {
                        triangles.push(triangle);
                    })
                })
            }
        };

        let ClipCounts {
            emitted,
            rejected,
            degenerate,
            culled,
            dropped,
        } = counts;

        stats.triangles = self.buffers.triangles.len();
        stats.dropped_triangles = dropped
            + self.buffers.triangles.overflow()
            + self.buffers.intermediate.overflow();
        stats.rejected_triangles = rejected;
        stats.degenerate_triangles = degenerate;
        stats.culled_triangles = culled;

        let count = self.triangle_count;
        trace!(
            self.loggers.clip,
            "clipped {count} triangles";
            emitted = emitted,
            rejected = rejected,
            degenerate = degenerate,
            culled = culled,
            dropped = dropped
        );
    }

    fn bin(&mut self, stats: &mut FrameStats) {
        let triangles = self.buffers.triangles.as_slice();
        let bins = &self.buffers.bins;

        stats.bin_entries = self
            .config
            .executor
            .map_sum(triangles.len() as u32, |index| {
                u64::from(bin_triangle(bins, index, &triangles[index as usize]).inserted)
            });
        stats.dropped_bin_entries = bins.dropped_entries();
        stats.overflowed_tiles = bins.overflowed_tiles();

        let count = triangles.len();
        trace!(
            self.loggers.binning,
            "binned {count} triangles";
            entries = stats.bin_entries,
            dropped = stats.dropped_bin_entries
        );
    }

    fn rasterize(&mut self, texture: &Texture) {
        let settings = RasterSettings {
            clear_color: self.config.clear_color,
            depth_mode: self.config.depth_mode,
            sampler: self.config.sampler,
        };

        let FrameBuffers {
            triangles,
            bins,
            color,
            depth,
            ..
        } = &mut self.buffers;

        let input = RasterInput {
            triangles: triangles.as_slice(),
            bins,
            texture,
            settings: &settings,
        };

        self.config.executor.for_each_chunk_pair(
            color,
            depth,
            self.grid.tile_len(),
            |tile, color, depth| rasterize_tile(&input, tile, color, depth),
        );

        trace!(
            self.loggers.raster,
            "rasterized {} tiles", self.grid.tile_count()
        );
    }

    fn resolve(&mut self) {
        let executor = self.config.executor;
        let grid = self.grid;
        let band = grid.tiles_x as usize * grid.tile_len();
        let rows = grid.width as usize * grid.tile_height as usize;

        let back = self.frames.back_mut();
        executor.for_each_band(
            &self.buffers.color,
            band,
            back.color.pixels_mut(),
            rows,
            |tiles, rows| resolve_band(&grid, tiles, rows),
        );
        executor.for_each_band(
            &self.buffers.depth,
            band,
            back.depth.pixels_mut(),
            rows,
            |tiles, rows| resolve_band(&grid, tiles, rows),
        );
    }

    fn report(&self, stats: &FrameStats) {
        let frame = stats.frame;
        for exceeded in stats.capacity_exceeded() {
            let kind: &'static str = exceeded.kind.into();
            warn!(
                self.loggers.root,
                "capacity exceeded in frame {frame}";
                kind = kind,
                dropped = exceeded.dropped
            );
        }

        if stats.dropped_bin_entries > 0 {
            warn!(
                self.loggers.binning,
                "{} tiles overflowed",
                stats.overflowed_tiles.count_ones()
            );
        }

        debug!(
            self.loggers.frame,
            "frame {frame} complete";
            triangles = stats.triangles,
            bin_entries = stats.bin_entries
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::VariantArray;
    use tilerast_core::{
        clip::{CullMode, PlaneSet},
        image::Image,
        raster::DepthMode,
    };

    const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    const SIZE: u32 = 32;

    struct Mesh {
        positions: Vec<Vec3>,
        uvs: Vec<Vec2>,
        indices: Vec<u32>,
    }

    impl Mesh {
        fn new() -> Self {
            Self {
                positions: Vec::new(),
                uvs: Vec::new(),
                indices: Vec::new(),
            }
        }

        /// Adds a camera facing square at view depth `z`, textured with a single texture
        /// coordinate.
        fn quad(mut self, half: f32, z: f32, u: f32) -> Self {
            let base = self.positions.len() as u32;
            self.positions.extend([
                Vec3::new(-half, -half, z),
                Vec3::new(half, -half, z),
                Vec3::new(half, half, z),
                Vec3::new(-half, half, z),
            ]);
            self.uvs.extend([Vec2::new(u, 0.5); 4]);
            self.indices
                .extend([0, 1, 2, 0, 2, 3].map(|index| base + index));
            self
        }

        fn triangle(mut self, positions: [Vec3; 3]) -> Self {
            let base = self.positions.len() as u32;
            self.positions.extend(positions);
            self.uvs.extend([Vec2::new(0.25, 0.5); 3]);
            self.indices.extend([0, 1, 2].map(|index| base + index));
            self
        }
    }

    /// 2x1: red, blue
    fn texture() -> Texture {
        Image::from_pixels(2, 1, vec![RED, BLUE]).unwrap()
    }

    fn projection() -> Mat4 {
        Mat4::perspective_rh(90f32.to_radians(), 1.0, 0.1, 100.0)
    }

    fn pipeline(config: Config, mesh: &Mesh) -> Pipeline {
        let mut pipeline = Pipeline::new(config, Logger::dummy()).unwrap();
        pipeline
            .load_mesh(&mesh.positions, &mesh.uvs, &mesh.indices)
            .unwrap();
        pipeline.resize(SIZE, SIZE);
        pipeline
    }

    fn render(pipeline: &mut Pipeline, model: Mat4) -> Arc<Frame> {
        pipeline.render(Mat4::IDENTITY, projection(), model, &texture());
        pipeline.current_frame()
    }

    #[test]
    fn rejects_invalid_config() {
        let config = Config {
            tile_width: 0,
            ..Default::default()
        };

        assert!(matches!(
            Pipeline::new(config, Logger::dummy()),
            Err(PipelineError::Config { .. })
        ));
    }

    #[test]
    fn failed_load_keeps_mesh() {
        let mesh = Mesh::new().quad(1.0, -2.0, 0.25);
        let mut pipeline = pipeline(Config::default(), &mesh);

        let result = pipeline.load_mesh(&mesh.positions, &mesh.uvs, &[0, 1, 9]);
        assert!(matches!(
            result,
            Err(PipelineError::Geometry {
                source: GeometryError::IndexOutOfRange { index: 9, .. }
            })
        ));

        let result = pipeline.load_mesh(&mesh.positions, &mesh.uvs, &[0, 1]);
        assert!(matches!(result, Err(PipelineError::Geometry { .. })));
        assert_eq!(pipeline.geometry().triangle_count(), 2);

        let frame = render(&mut pipeline, Mat4::IDENTITY);
        assert_eq!(frame.color.at(12, 12), RED);
    }

    #[test]
    fn nearest_surface_wins() {
        let mesh = Mesh::new()
            .quad(3.0, -4.0, 0.75)
            .quad(1.0, -2.0, 0.25);

        for depth_mode in DepthMode::VARIANTS {
            let config = Config {
                depth_mode: *depth_mode,
                ..Default::default()
            };

            let mut pipeline = pipeline(config, &mesh);
            let frame = render(&mut pipeline, Mat4::IDENTITY);

            // only the near quad covers the centre, only the far one covers this ring
            assert_eq!(frame.color.at(12, 12), RED);
            assert_eq!(frame.color.at(5, 5), BLUE);
            assert!(frame.depth.at(12, 12) < frame.depth.at(5, 5));
            assert_eq!(frame.color.at(0, 0), Color::BLACK);
            assert!(frame.depth.at(0, 0).is_infinite());

            if *depth_mode == DepthMode::Linear {
                assert!((frame.depth.at(12, 12) - 2.0).abs() < 1e-4);
                assert!((frame.depth.at(5, 5) - 4.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn rendering_is_idempotent() {
        let mesh = Mesh::new().quad(1.0, -2.0, 0.25).quad(1.5, -3.0, 0.75);
        let mut pipeline = pipeline(Config::default(), &mesh);

        let model = Mat4::from_rotation_y(0.3);
        let first = render(&mut pipeline, model);
        let second = render(&mut pipeline, model);

        assert_eq!(first.index + 1, second.index);
        assert_eq!(first.color, second.color);
        assert_eq!(first.depth, second.depth);
    }

    #[test]
    fn held_frame_is_unaffected() {
        let mesh = Mesh::new().quad(1.0, -2.0, 0.25);
        let mut pipeline = pipeline(Config::default(), &mesh);

        let held = render(&mut pipeline, Mat4::IDENTITY);
        let snapshot = (*held).clone();

        let moved = render(&mut pipeline, Mat4::from_translation(Vec3::new(0.8, 0.0, 0.0)));
        assert_ne!(moved.color, snapshot.color);
        assert_eq!(*held, snapshot);
        assert_eq!(pipeline.frames().allocated(), 1);
    }

    #[test]
    fn executors_and_strategies_agree() {
        let mesh = Mesh::new()
            .quad(1.0, -2.0, 0.25)
            .quad(3.0, -1.0, 0.75)
            .quad(50.0, -5.0, 0.5);
        let model = Mat4::from_rotation_x(0.7) * Mat4::from_rotation_y(0.4);

        let mut frames = Vec::new();
        for executor in Executor::VARIANTS {
            for strategy in ClipStrategy::VARIANTS {
                let config = Config {
                    executor: *executor,
                    clip_strategy: *strategy,
                    ..Default::default()
                };

                let mut pipeline = pipeline(config, &mesh);
                frames.push((*strategy, render(&mut pipeline, model)));
            }
        }

        for (strategy, frame) in &frames {
            let (_, reference) = frames
                .iter()
                .find(|(other, _)| other == strategy)
                .unwrap();
            assert_eq!(frame, reference);
        }
    }

    #[test]
    fn tile_bucket_overflow_is_reported() {
        let mesh = Mesh::new()
            .quad(1.0, -2.0, 0.25)
            .quad(1.0, -3.0, 0.75);
        let config = Config {
            max_tile_triangles: 1,
            ..Default::default()
        };

        let mut pipeline = pipeline(config, &mesh);
        render(&mut pipeline, Mat4::IDENTITY);

        let stats = pipeline.stats();
        assert_eq!(stats.triangles, 4);
        assert!(stats.dropped_bin_entries > 0);
        assert!(stats.overflowed_tiles.any());
        assert!(
            stats
                .capacity_exceeded()
                .any(|e| e.kind == CapacityKind::TileBucket)
        );
    }

    #[test]
    fn triangle_buffer_overflow_is_reported() {
        // a single triangle much larger than the view, split up by the side planes
        let mesh = Mesh::new().triangle([
            Vec3::new(-10.0, -10.0, -2.0),
            Vec3::new(10.0, -10.0, -2.0),
            Vec3::new(0.0, 10.0, -2.0),
        ]);

        for strategy in ClipStrategy::VARIANTS {
            let config = Config {
                max_sub_triangles: 1,
                plane_set: PlaneSet::Guard,
                clip_strategy: *strategy,
                ..Default::default()
            };

            let mut pipeline = pipeline(config, &mesh);
            render(&mut pipeline, Mat4::IDENTITY);

            let stats = pipeline.stats();
            assert_eq!(stats.triangles, 1);
            assert!(stats.dropped_triangles > 0);
            assert_eq!(
                stats.capacity_exceeded().next().map(|e| e.kind),
                Some(CapacityKind::TriangleBuffer)
            );

            if *strategy == ClipStrategy::TwoPass {
                assert_eq!(stats.intermediate_triangles, 1);
            }
        }
    }

    #[test]
    fn default_budget_fits_near_clipping() {
        // straddles the near plane, so the near clip turns it into a quad
        let mesh = Mesh::new().triangle([
            Vec3::new(-1.0, -1.0, -3.0),
            Vec3::new(1.0, -1.0, -3.0),
            Vec3::new(0.0, -1.0, 2.0),
        ]);

        for strategy in ClipStrategy::VARIANTS {
            let config = Config {
                clip_strategy: *strategy,
                ..Default::default()
            };

            let mut pipeline = pipeline(config, &mesh);
            render(&mut pipeline, Mat4::IDENTITY);

            let stats = pipeline.stats();
            assert_eq!(stats.triangles, 2);
            assert_eq!(stats.dropped_triangles, 0);
            assert_eq!(stats.capacity_exceeded().count(), 0);
        }
    }

    #[test]
    fn skipped_triangles_are_counted() {
        let mesh = Mesh::new()
            .quad(1.0, -2.0, 0.25)
            // zero area
            .triangle([
                Vec3::new(-1.0, 0.0, -2.0),
                Vec3::new(0.0, 0.0, -2.0),
                Vec3::new(1.0, 0.0, -2.0),
            ])
            // behind the camera
            .triangle([
                Vec3::new(-1.0, -1.0, 1.0),
                Vec3::new(1.0, -1.0, 1.0),
                Vec3::new(0.0, 1.0, 2.0),
            ]);

        for strategy in ClipStrategy::VARIANTS {
            let config = Config {
                clip_strategy: *strategy,
                ..Default::default()
            };

            let mut pipeline = pipeline(config, &mesh);
            let frame = render(&mut pipeline, Mat4::IDENTITY);
            assert_eq!(frame.color.at(12, 12), RED);

            let stats = pipeline.stats();
            assert_eq!(stats.input_triangles, 4);
            assert_eq!(stats.triangles, 2);
            assert_eq!(stats.degenerate_triangles, 1);
            assert_eq!(stats.rejected_triangles, 1);
            assert_eq!(stats.culled_triangles, 0);
            assert_eq!(stats.dropped_triangles, 0);
        }
    }

    #[test]
    fn resized_blank_frame_uses_clear_color() {
        let config = Config {
            clear_color: BLUE,
            ..Default::default()
        };

        let mesh = Mesh::new().quad(1.0, -2.0, 0.25);
        let mut pipeline = pipeline(config, &mesh);
        let blank = pipeline.current_frame();
        assert_eq!(blank.color.at(0, 0), BLUE);

        let rendered = render(&mut pipeline, Mat4::IDENTITY);
        assert_eq!(rendered.color.at(0, 0), BLUE);
        assert_eq!(rendered.color.at(12, 12), RED);
    }

    #[test]
    fn back_faces_are_culled() {
        let mesh = Mesh::new().quad(1.0, -2.0, 0.25);
        let config = Config {
            cull_mode: CullMode::Back,
            ..Default::default()
        };

        let mut pipeline = pipeline(config, &mesh);
        let front = render(&mut pipeline, Mat4::IDENTITY);
        assert_eq!(front.color.at(12, 12), RED);

        // turn the quad around its own centre
        let flip = Mat4::from_translation(Vec3::new(0.0, 0.0, -2.0))
            * Mat4::from_rotation_y(std::f32::consts::PI)
            * Mat4::from_translation(Vec3::new(0.0, 0.0, 2.0));
        let back = render(&mut pipeline, flip);
        assert_eq!(back.color.at(12, 12), Color::BLACK);
        assert_eq!(pipeline.stats().culled_triangles, 2);
    }

    #[test]
    fn empty_framebuffer_renders() {
        let mesh = Mesh::new().quad(1.0, -2.0, 0.25);
        let mut pipeline = Pipeline::new(Config::default(), Logger::dummy()).unwrap();
        pipeline
            .load_mesh(&mesh.positions, &mesh.uvs, &mesh.indices)
            .unwrap();

        let frame = render(&mut pipeline, Mat4::IDENTITY);
        assert_eq!(frame.index, 1);
        assert!(frame.color.is_empty());
    }

    proptest::proptest! {
        #[test]
        fn executors_agree_for_any_rotation(
            pitch in -3.2f32..3.2,
            yaw in -3.2f32..3.2,
            two_pass in proptest::bool::ANY,
        ) {
            let mesh = Mesh::new()
                .quad(1.0, -2.0, 0.25)
                .quad(2.0, -1.0, 0.75)
                .quad(1.5, 0.5, 0.5);
            let model = Mat4::from_rotation_x(pitch) * Mat4::from_rotation_y(yaw);
            let clip_strategy = if two_pass {
                ClipStrategy::TwoPass
            } else {
                ClipStrategy::SinglePass
            };

            let frames: Vec<_> = Executor::VARIANTS
                .iter()
                .map(|executor| {
                    let config = Config {
                        executor: *executor,
                        clip_strategy,
                        ..Default::default()
                    };

                    let mut pipeline = pipeline(config, &mesh);
                    let frame = render(&mut pipeline, model);
                    (frame, pipeline.stats().clone())
                })
                .collect();

            let (reference, reference_stats) = &frames[0];
            for (frame, stats) in &frames[1..] {
                proptest::prop_assert_eq!(frame, reference);
                proptest::prop_assert_eq!(stats, reference_stats);
            }
        }
    }
}
