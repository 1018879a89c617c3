// THEORY:
// This file is the entry point for the `color_drive` library crate. It exposes the
// perception-to-actuation loop of a color-following robot as a small, typed API:
//
// 1.  **Configuration** (`config`): every tunable the loop needs, fixed for a run.
// 2.  **Stages** (`core_modules`): frame acquisition, color segmentation, blob
//     selection, the start/stop arbiter, and the command/display boundaries.
// 3.  **Orchestration** (`pipeline`): the `ControlLoop` that runs the stages once per
//     frame and guarantees the actuator is stopped when it exits.
//
// Hardware (cameras, serial ports) stays outside this crate; the `drive_runner`
// binary plugs concrete implementations into the traits exported here.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod pipeline;

pub use config::{ColorRange, DriveConfig};
pub use error::{DriveError, Result};
