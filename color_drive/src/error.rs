use std::io;

/// Errors surfaced by `color_drive`.
///
/// Only construction-time failures reach a caller. Once a `ControlLoop` is
/// running, sink failures are logged and absorbed so the loop can always reach
/// its shutdown path.
#[derive(thiserror::Error, Debug)]
pub enum DriveError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error("failed to encode motion command: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DriveError>;
