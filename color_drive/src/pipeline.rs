// THEORY:
// The `pipeline` module is the top-level API of the crate. `ControlLoop` owns one of
// each stage and runs them in a fixed order, once per frame:
//
//     acquire -> segment -> select -> arbitrate -> dispatch (on change) -> display
//
// A cycle never starts before the previous one has finished dispatching and
// displaying. The loop runs until the frame source ends or the `CancellationSignal`
// is raised; the signal is checked once, at the end of each cycle.
//
// Shutdown is the one place the loop does not trust the arbiter's bookkeeping: it
// sends a stop command first, whatever state the arbiter is in, then releases the
// frame source, then clears the display.

use crate::config::DriveConfig;
use crate::core_modules::blob_selector::blob_selector;
use crate::core_modules::color_segmenter::ColorSegmenter;
use crate::core_modules::command::CommandSink;
use crate::core_modules::display::{DisplaySink, annotate, encode_jpeg};
use crate::core_modules::frame_source::FrameSource;
use crate::core_modules::motion_arbiter::MotionArbiter;
use crate::error::Result;
use image::RgbImage;
use log::{debug, info, warn};

// Re-export key data structures for the public API.
pub use crate::core_modules::blob::{Blob, Point};
pub use crate::core_modules::cancellation::CancellationSignal;
pub use crate::core_modules::command::MotionCommand;
pub use crate::core_modules::motion_arbiter::MotionState;

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The frame source stopped delivering frames.
    EndOfStream,
    /// The cancellation signal was raised.
    Cancelled,
}

/// What happened during one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    pub blob: Option<Blob>,
    /// The command dispatched this cycle, if the motion state changed.
    pub command: Option<MotionCommand>,
}

/// Totals for a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub reason: StopReason,
    pub cycles: u64,
    /// Commands handed to the sink, including the final forced stop.
    pub commands_sent: u64,
}

/// Segments `frame` and returns its largest blob, whether or not it is big enough
/// to drive toward.
pub fn detect(frame: &RgbImage, config: &DriveConfig) -> Option<Blob> {
    let mask = ColorSegmenter::from_config(config).segment(frame);
    blob_selector::select(&mask)
}

pub struct ControlLoop<S, C, D>
where
    S: FrameSource,
    C: CommandSink,
    D: DisplaySink,
{
    source: S,
    commands: C,
    display: D,
    segmenter: ColorSegmenter,
    arbiter: MotionArbiter,
    cancel: CancellationSignal,
    cycles: u64,
    commands_sent: u64,
}

impl<S, C, D> ControlLoop<S, C, D>
where
    S: FrameSource,
    C: CommandSink,
    D: DisplaySink,
{
    /// Builds a loop from a validated configuration.
    pub fn new(
        config: &DriveConfig,
        source: S,
        commands: C,
        display: D,
        cancel: CancellationSignal,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            source,
            commands,
            display,
            segmenter: ColorSegmenter::from_config(config),
            arbiter: MotionArbiter::new(config.min_radius, config.forward_throttle),
            cancel,
            cycles: 0,
            commands_sent: 0,
        })
    }

    pub fn motion_state(&self) -> MotionState {
        self.arbiter.state()
    }

    /// Runs one cycle on an already acquired frame.
    pub fn step(&mut self, frame: &RgbImage) -> CycleOutcome {
        self.cycles += 1;

        let mask = self.segmenter.segment(frame);
        let blob = blob_selector::select(&mask);
        match &blob {
            Some(b) => debug!(
                "cycle {}: blob at ({}, {}) radius {:.1}",
                self.cycles, b.centroid.x, b.centroid.y, b.radius
            ),
            None => debug!("cycle {}: no blob", self.cycles),
        }

        let command = self.arbiter.arbitrate(blob.as_ref());
        if let Some(command) = &command {
            self.dispatch(command);
        }

        let annotated = annotate(frame, blob.as_ref());
        if let Err(e) = encode_jpeg(&annotated).and_then(|bytes| self.display.update(&bytes)) {
            warn!("display update failed: {e}");
        }

        CycleOutcome { blob, command }
    }

    /// Runs until end of stream or cancellation, then shuts down.
    pub fn run(mut self) -> RunSummary {
        info!("control loop started");
        let reason = loop {
            let Some(frame) = self.source.next_frame() else {
                warn!("failed to grab frame, ending run");
                break StopReason::EndOfStream;
            };
            self.step(&frame);

            if self.cancel.is_cancelled() {
                info!("control loop stopped by user");
                break StopReason::Cancelled;
            }
        };

        // --- Shutdown: stop motors, release the source, clear the display ---
        let stop = self.arbiter.force_stop();
        self.dispatch(&stop);
        drop(self.source);
        if let Err(e) = self.display.clear() {
            warn!("display clear failed: {e}");
        }

        info!(
            "control loop finished after {} cycles ({:?}), {} commands sent",
            self.cycles, reason, self.commands_sent
        );
        RunSummary {
            reason,
            cycles: self.cycles,
            commands_sent: self.commands_sent,
        }
    }

    fn dispatch(&mut self, command: &MotionCommand) {
        info!(
            "sending motion command: left={} right={}",
            command.left, command.right
        );
        self.commands_sent += 1;
        if let Err(e) = self.commands.send(command) {
            warn!("motion command dispatch failed: {e}");
        }
    }
}
