//! # Material Demo
//!
//! Demonstrates:
//! - Resolving a material's properties by name against shader reflection
//! - Reflection reports for each shader and the linked pipeline
//! - Writing a uniform block as a whole struct or member by member
//! - Encoding draws on a dedicated render thread fed with frame tasks

use clap::Parser;

use material_demos::render_worker::{DrawFrame, RenderWorker};
use material_demos::scene::{Scene, SceneConfig, UniformUpdate};

/// Log level for reflection reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
enum ReportLevel {
    Error,
    Warn,
    Info,
    #[default]
    Debug,
    Trace,
}

impl From<ReportLevel> for log::Level {
    fn from(level: ReportLevel) -> Self {
        match level {
            ReportLevel::Error => log::Level::Error,
            ReportLevel::Warn => log::Level::Warn,
            ReportLevel::Info => log::Level::Info,
            ReportLevel::Debug => log::Level::Debug,
            ReportLevel::Trace => log::Level::Trace,
        }
    }
}

/// Material demo arguments.
#[derive(Parser, Debug)]
#[command(
    name = "Material Demo",
    about = "Draws a textured cube through a name-bound material",
    version
)]
struct Args {
    /// Number of frames to encode before exiting.
    #[arg(long, default_value = "120")]
    frames: u64,

    /// Seconds of animation between frames.
    #[arg(long, default_value = "0.016")]
    frame_time: f32,

    /// Write `ubo.projection`, `ubo.model` and `ubo.view` separately instead
    /// of the whole struct.
    #[arg(long)]
    per_member: bool,

    /// Log level for the reflection reports.
    #[arg(long, default_value = "debug", value_enum)]
    report_level: ReportLevel,

    /// Render target width in pixels.
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Render target height in pixels.
    #[arg(long, default_value = "720")]
    height: u32,
}

impl From<&Args> for SceneConfig {
    fn from(args: &Args) -> Self {
        Self {
            width: args.width,
            height: args.height,
            uniform_update: if args.per_member {
                UniformUpdate::PerMember
            } else {
                UniformUpdate::WholeStruct
            },
            report_level: args.report_level.into(),
        }
    }
}

fn main() {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Material Demo");
    log::info!("Graphics version: {}", material_graphics::VERSION);
    log::info!("Demos version: {}", material_demos::VERSION);

    let scene = match Scene::new(SceneConfig::from(&args)) {
        Ok(scene) => scene,
        Err(err) => {
            log::error!("Failed to build scene: {err}");
            std::process::exit(1);
        }
    };

    let worker = match RenderWorker::spawn(scene) {
        Ok(worker) => worker,
        Err(err) => {
            log::error!("Failed to spawn render thread: {err}");
            std::process::exit(1);
        }
    };

    for frame in 0..args.frames {
        if !worker.submit(DrawFrame {
            time: frame as f32 * args.frame_time,
        }) {
            log::warn!("Render thread stopped early at frame {frame}");
            break;
        }
    }

    match worker.stop() {
        Some(stats) => log::info!(
            "Encoded {} frames ({} commands, {} buffer flushes, {} failed)",
            stats.frames,
            stats.commands,
            stats.flushes,
            stats.failed_tasks
        ),
        None => {
            log::error!("Render thread panicked");
            std::process::exit(1);
        }
    }
}
