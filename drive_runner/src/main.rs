// THEORY:
// `drive_runner` puts a `color_drive::ControlLoop` on real hardware. It owns
// everything the library deliberately leaves out: argument parsing, the config
// file, the logger, the serial link to the motor controller, and the camera.
//
// The loop itself is blocking, so it runs on tokio's blocking pool while the async
// side waits for Ctrl-C. Ctrl-C only raises the `CancellationSignal`; the loop
// finishes its current cycle, stops the motors and releases the camera on its own.

mod serial;
mod settings;

#[cfg(feature = "camera")]
mod camera;

use anyhow::{Context, Result};
use clap::Parser;
use color_drive::DriveConfig;
use color_drive::core_modules::command::{CommandSink, LoggingSink};
use color_drive::core_modules::display::{DisplaySink, NullDisplay, SnapshotFile};
use color_drive::core_modules::frame_source::{FrameSource, ImageSequenceSource};
use color_drive::pipeline::{CancellationSignal, ControlLoop, RunSummary};
use log::{info, warn};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about = "Drive toward a colored object seen by the camera")]
struct Args {
    /// TOML file with a `DriveConfig`. Missing keys use the built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Serial device of the motor controller.
    #[arg(long, default_value = "/dev/serial0")]
    serial_port: String,

    #[arg(long, default_value_t = 115_200)]
    baud_rate: u32,

    /// Log motor commands instead of sending them.
    #[arg(long)]
    dry_run: bool,

    /// Replay the images of this directory instead of reading a camera.
    #[arg(long)]
    frames: Option<PathBuf>,

    /// Camera index (requires the `camera` feature).
    #[arg(long, default_value_t = 0)]
    camera: i32,

    /// Keep the latest annotated frame in this JPEG file.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Overrides `min_radius` from the config file.
    #[arg(long)]
    min_radius: Option<f32>,

    /// Overrides `forward_throttle` from the config file.
    #[arg(long)]
    throttle: Option<f32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Logging & Arguments ---
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    // --- 2. Configuration ---
    let config = settings::load(
        args.config.as_deref(),
        settings::Overrides {
            min_radius: args.min_radius,
            forward_throttle: args.throttle,
        },
    )?;
    info!("drive config: {config:?}");

    // --- 3. Sinks ---
    let commands: Box<dyn CommandSink + Send> = if args.dry_run {
        Box::new(LoggingSink)
    } else {
        Box::new(serial::open_motor_link(&args.serial_port, args.baud_rate)?)
    };
    let display: Box<dyn DisplaySink + Send> = match &args.snapshot {
        Some(path) => Box::new(SnapshotFile::new(path)),
        None => Box::new(NullDisplay),
    };

    // --- 4. Stop Button ---
    let cancel = CancellationSignal::new();
    let stop_button = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, stopping");
                stop_button.cancel();
            }
            Err(e) => warn!("could not listen for Ctrl-C: {e}"),
        }
    });

    // --- 5. Control Loop ---
    let summary = tokio::task::spawn_blocking(move || -> Result<RunSummary> {
        let source = open_source(&args, &config)?;
        let control = ControlLoop::new(&config, source, commands, display, cancel)?;
        Ok(control.run())
    })
    .await
    .context("control loop panicked")??;

    info!(
        "run ended ({:?}) after {} cycles, {} motor commands",
        summary.reason, summary.cycles, summary.commands_sent
    );
    Ok(())
}

fn open_source(args: &Args, config: &DriveConfig) -> Result<Box<dyn FrameSource>> {
    if let Some(dir) = &args.frames {
        let source = ImageSequenceSource::from_dir(dir)
            .with_context(|| format!("failed to open frame directory {}", dir.display()))?;
        info!("replaying {} frames from {}", source.remaining(), dir.display());
        return Ok(Box::new(source));
    }
    open_camera(args.camera, config)
}

#[cfg(feature = "camera")]
fn open_camera(index: i32, config: &DriveConfig) -> Result<Box<dyn FrameSource>> {
    let source = camera::CameraSource::open(index, config.frame_width, config.frame_height)?;
    Ok(Box::new(source))
}

#[cfg(not(feature = "camera"))]
fn open_camera(_index: i32, _config: &DriveConfig) -> Result<Box<dyn FrameSource>> {
    anyhow::bail!("built without the `camera` feature; pass --frames <dir> to replay images")
}
