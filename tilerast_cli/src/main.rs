mod cli;
mod scene;

use clap::Parser;
use cli::Cli;
use easyerr::{Error, ResultExt};
use glam::Mat4;
use ordered_float::OrderedFloat;
use scene::Mesh;
use std::{path::Path, process::ExitCode};
use tilerast::{
    Pipeline, PipelineError,
    core::{
        color::Color,
        frame::Frame,
        texture::{Texture, checkerboard},
    },
};
use tinylog::{
    drain::buf::RecordBuf,
    info,
    logger::{Context as LoggerContext, LoggerFamily},
    record::RecordWithCtx,
};

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to load texture")]
    Texture { source: image::ImageError },
    #[error("failed to save image")]
    Save { source: image::ImageError },
    #[error("failed to set up pipeline")]
    Pipeline { source: PipelineError },
    #[error("frame does not fit in an image buffer")]
    ImageSize,
}

fn load_texture(path: Option<&Path>) -> Result<Texture, CliError> {
    let Some(path) = path else {
        return Ok(checkerboard(
            64,
            8,
            Color::rgb(0.9, 0.9, 0.85),
            Color::rgb(0.2, 0.35, 0.6),
        ));
    };

    let image = image::open(path).context(CliCtx::Texture)?.to_rgba8();
    let pixels = image
        .pixels()
        .map(|pixel| Color::from_rgba8(pixel.0))
        .collect();

    Texture::from_pixels(image.width(), image.height(), pixels).ok_or(CliError::ImageSize)
}

fn save_color(frame: &Frame, path: &Path) -> Result<(), CliError> {
    let rgba = frame
        .color
        .pixels()
        .iter()
        .flat_map(|color| color.to_rgba8())
        .collect();

    image::RgbaImage::from_raw(frame.width(), frame.height(), rgba)
        .ok_or(CliError::ImageSize)?
        .save(path)
        .context(CliCtx::Save)
}

/// Writes the depth buffer as a grayscale image, near surfaces bright and empty pixels black.
fn save_depth(frame: &Frame, path: &Path) -> Result<(), CliError> {
    let finite = || {
        frame
            .depth
            .pixels()
            .iter()
            .copied()
            .filter(|depth| depth.is_finite())
            .map(OrderedFloat)
    };

    let near = finite().min().map_or(0.0, |d| d.0);
    let far = finite().max().map_or(1.0, |d| d.0);
    let range = (far - near).max(f32::EPSILON);

    let rgba = frame
        .depth
        .pixels()
        .iter()
        .flat_map(|&depth| {
            let value = if depth.is_finite() {
                (255.0 * (1.0 - 0.8 * (depth - near) / range)) as u8
            } else {
                0
            };
            [value, value, value, 255]
        })
        .collect();

    image::RgbaImage::from_raw(frame.width(), frame.height(), rgba)
        .ok_or(CliError::ImageSize)?
        .save(path)
        .context(CliCtx::Save)
}

fn print_records(records: &RecordBuf) {
    let ctx = LoggerContext::new("tilerast");
    let mut buf: Vec<RecordWithCtx> = Vec::new();
    records.get_range(&ctx, 0..records.len(ctx.clone()), &mut buf);

    for record in &buf {
        eprintln!(
            "[{:>5}] {}: {}",
            record.value.static_data.level.to_string(),
            record.ctx,
            record.value.message
        );
    }
}

fn run(cli: &Cli, log_family: &LoggerFamily) -> Result<(), CliError> {
    let logger = log_family.logger("tilerast", cli.log_level.into());
    let config = cli.pipeline.config();
    let mut pipeline = Pipeline::new(config, logger).context(CliCtx::Pipeline)?;

    let (width, height) = (cli.output.width, cli.output.height);
    pipeline.resize(width, height);

    let mesh = Mesh::scene(cli.scene.scene);
    pipeline
        .load_mesh(&mesh.positions, &mesh.uvs, &mesh.indices)
        .context(CliCtx::Pipeline)?;

    let texture = load_texture(cli.scene.texture.as_deref())?;
    let aspect = width as f32 / height.max(1) as f32;
    let projection = Mat4::perspective_rh(60f32.to_radians(), aspect, 0.1, 100.0);

    for frame in 0..cli.output.frames.max(1) {
        let model = Mat4::from_rotation_y(frame as f32 * 0.02);
        pipeline.render(scene::orbit_view(frame), projection, model, &texture);
    }

    let stats = pipeline.stats();
    info!(
        pipeline.loggers().root,
        "rendered {} frames", stats.frame
    );
    for exceeded in stats.capacity_exceeded() {
        let kind: &'static str = exceeded.kind.into();
        eprintln!("capacity exceeded: {kind} dropped {}", exceeded.dropped);
    }

    println!(
        "frame {}: {} input, {} screen triangles ({} rejected, {} culled, {} degenerate), {} bin entries",
        stats.frame,
        stats.input_triangles,
        stats.triangles,
        stats.rejected_triangles,
        stats.culled_triangles,
        stats.degenerate_triangles,
        stats.bin_entries,
    );

    let frame = pipeline.current_frame();
    save_color(&frame, &cli.output.output)?;
    if let Some(path) = &cli.output.depth_output {
        save_depth(&frame, path)?;
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_records = RecordBuf::new();
    let log_family = LoggerFamily::builder()
        .with_drain(log_records.drain())
        .build();

    let result = run(&cli, &log_family);
    print_records(&log_records);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            let mut source = std::error::Error::source(&e);
            while let Some(e) = source {
                eprintln!("  caused by: {e}");
                source = e.source();
            }

            ExitCode::FAILURE
        }
    }
}
