use clap::{Args, Parser, ValueEnum};
use std::path::PathBuf;
use tilerast::{
    Config, Executor,
    core::{
        clip::{ClipStrategy, CullMode, PlaneSet},
        raster::DepthMode,
        texture::{AddressMode, Filter, Sampler},
    },
};

fn clap_styles() -> clap::builder::Styles {
    use clap::builder::styling::{AnsiColor, Color, Style};
    clap::builder::Styles::styled()
        .header(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
        )
        .usage(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
        )
        .literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlue))))
        .invalid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightRed))))
        .error(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::White))))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scene {
    /// A spinning textured cube.
    Cube,
    /// A large textured ground plane that extends behind the camera.
    Ground,
    /// The cube standing on the ground plane.
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    Single,
    Two,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Planes {
    Near,
    Guard,
    Frustum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Cull {
    None,
    Back,
    Front,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Depth {
    Linear,
    Ndc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Filtering {
    Nearest,
    Bilinear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tinylog::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => tinylog::Level::Trace,
            LogLevel::Debug => tinylog::Level::Debug,
            LogLevel::Info => tinylog::Level::Info,
            LogLevel::Warn => tinylog::Level::Warn,
            LogLevel::Error => tinylog::Level::Error,
        }
    }
}

#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Width of the framebuffer, in pixels.
    #[arg(long, default_value_t = 320)]
    pub width: u32,
    /// Height of the framebuffer, in pixels.
    #[arg(long, default_value_t = 240)]
    pub height: u32,
    /// Amount of frames to render. The last one is written out.
    #[arg(short, long, default_value_t = 1)]
    pub frames: u32,
    /// Path of the color PNG to write.
    #[arg(short, long, default_value = "frame.png")]
    pub output: PathBuf,
    /// Path of a PNG to write a visualization of the depth buffer to.
    #[arg(long)]
    pub depth_output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SceneArgs {
    /// The scene to render.
    #[arg(long, value_enum, default_value_t = Scene::Both)]
    pub scene: Scene,
    /// Path of the texture to sample. A checkerboard is used if not given.
    #[arg(short, long)]
    pub texture: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct PipelineArgs {
    #[arg(long, value_enum, default_value_t = Strategy::Single)]
    pub strategy: Strategy,
    #[arg(long, value_enum, default_value_t = Planes::Near)]
    pub planes: Planes,
    #[arg(long, value_enum, default_value_t = Cull::None)]
    pub cull: Cull,
    #[arg(long, value_enum, default_value_t = Depth::Linear)]
    pub depth: Depth,
    #[arg(long, value_enum, default_value_t = Filtering::Nearest)]
    pub filter: Filtering,
    /// Clamp texture coordinates instead of repeating the texture.
    #[arg(long)]
    pub clamp: bool,
    /// Width and height of a tile, in pixels.
    #[arg(long, default_value_t = tilerast::core::DEFAULT_TILE_WIDTH)]
    pub tile_size: u32,
    /// Capacity of each tile bucket.
    #[arg(long, default_value_t = tilerast::core::DEFAULT_MAX_TILE_TRIANGLES)]
    pub max_tile_triangles: u32,
    /// Triangle buffer budget per input triangle.
    #[arg(long, default_value_t = tilerast::core::DEFAULT_MAX_SUB_TRIANGLES)]
    pub max_sub_triangles: u32,
    /// Run every stage on the calling thread.
    #[arg(long)]
    pub serial: bool,
}

impl PipelineArgs {
    pub fn config(&self) -> Config {
        Config {
            tile_width: self.tile_size,
            tile_height: self.tile_size,
            max_sub_triangles: self.max_sub_triangles,
            max_tile_triangles: self.max_tile_triangles,
            clip_strategy: match self.strategy {
                Strategy::Single => ClipStrategy::SinglePass,
                Strategy::Two => ClipStrategy::TwoPass,
            },
            plane_set: match self.planes {
                Planes::Near => PlaneSet::Near,
                Planes::Guard => PlaneSet::Guard,
                Planes::Frustum => PlaneSet::Frustum,
            },
            cull_mode: match self.cull {
                Cull::None => CullMode::None,
                Cull::Back => CullMode::Back,
                Cull::Front => CullMode::Front,
            },
            depth_mode: match self.depth {
                Depth::Linear => DepthMode::Linear,
                Depth::Ndc => DepthMode::Ndc,
            },
            sampler: Sampler {
                filter: match self.filter {
                    Filtering::Nearest => Filter::Nearest,
                    Filtering::Bilinear => Filter::Bilinear,
                },
                address: if self.clamp {
                    AddressMode::ClampToEdge
                } else {
                    AddressMode::Repeat
                },
            },
            executor: if self.serial {
                Executor::Serial
            } else {
                Executor::Parallel
            },
            ..Default::default()
        }
    }
}

/// tilerast software rasterizer
#[derive(Debug, Parser)]
#[command(name = "tilerast")]
#[command(styles = clap_styles())]
pub struct Cli {
    #[command(flatten)]
    pub output: OutputArgs,
    #[command(flatten)]
    pub scene: SceneArgs,
    #[command(flatten)]
    pub pipeline: PipelineArgs,
    /// Minimum level of the log records to print.
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}
