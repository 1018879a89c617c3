// THEORY:
// The `command` module is the boundary between the control loop and the motor
// controller. The controller owns the serial protocol; this side only needs to hand
// over a structured "set wheel throttles" message and move on.
//
// Key architectural principles:
// 1.  **Fire and Forget**: `CommandSink::send` is best effort. The loop logs a
//     failed dispatch and keeps running; it never retries.
// 2.  **Wire Shape**: a command serializes to the controller's JSON form,
//     `{"T":1,"L":0.2,"R":0.2}`, where `T` selects the speed-control message.
// 3.  **Pluggable Sinks**: anything that can write bytes can carry commands through
//     `JsonLineSink`; `LoggingSink` stands in when no hardware is attached.

use crate::error::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Message type selecting per-wheel speed control on the motor controller.
pub const SPEED_CONTROL: u8 = 1;

/// A per-wheel throttle message, throttles normalized to `-1.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionCommand {
    #[serde(rename = "T")]
    pub kind: u8,
    #[serde(rename = "L")]
    pub left: f32,
    #[serde(rename = "R")]
    pub right: f32,
}

impl MotionCommand {
    /// Both wheels forward at `throttle`.
    pub fn forward(throttle: f32) -> Self {
        Self {
            kind: SPEED_CONTROL,
            left: throttle,
            right: throttle,
        }
    }

    pub fn stop() -> Self {
        Self {
            kind: SPEED_CONTROL,
            left: 0.0,
            right: 0.0,
        }
    }

    pub fn is_stop(&self) -> bool {
        self.left == 0.0 && self.right == 0.0
    }
}

/// Accepts motion commands on behalf of the motor controller.
pub trait CommandSink {
    fn send(&mut self, command: &MotionCommand) -> Result<()>;
}

impl<T: CommandSink + ?Sized> CommandSink for &mut T {
    fn send(&mut self, command: &MotionCommand) -> Result<()> {
        (**self).send(command)
    }
}

impl<T: CommandSink + ?Sized> CommandSink for Box<T> {
    fn send(&mut self, command: &MotionCommand) -> Result<()> {
        (**self).send(command)
    }
}

/// Writes each command as one line of JSON, e.g. to a serial port.
pub struct JsonLineSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLineSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> CommandSink for JsonLineSink<W> {
    fn send(&mut self, command: &MotionCommand) -> Result<()> {
        serde_json::to_writer(&mut self.writer, command)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Logs commands instead of sending them anywhere.
#[derive(Debug, Clone, Default)]
pub struct LoggingSink;

impl CommandSink for LoggingSink {
    fn send(&mut self, command: &MotionCommand) -> Result<()> {
        info!(
            "motor command (dry run): left={} right={}",
            command.left, command.right
        );
        Ok(())
    }
}
