use anyhow::{Context, Result};
use color_drive::core_modules::command::JsonLineSink;
use serialport::SerialPort;
use std::time::Duration;

/// How long a single command write may block before the dispatch is given up.
const WRITE_TIMEOUT: Duration = Duration::from_millis(100);

/// Opens the motor controller's serial link as a line-oriented JSON command sink.
pub fn open_motor_link(port: &str, baud_rate: u32) -> Result<JsonLineSink<Box<dyn SerialPort>>> {
    let port = serialport::new(port, baud_rate)
        .timeout(WRITE_TIMEOUT)
        .open()
        .with_context(|| format!("failed to open serial port {port} at {baud_rate} baud"))?;
    Ok(JsonLineSink::new(port))
}
