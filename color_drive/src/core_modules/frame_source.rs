// THEORY:
// A `FrameSource` is anything that yields successive RGB frames: a camera, a
// recorded sequence, a test script. The loop asks for one frame per cycle and treats
// `None` as end of stream. A failing device is not an error to bubble up; it simply
// ends the run, and the loop then stops the motors and releases the source.
//
// Sources are released by dropping them, so a source that holds a device should
// free it in `Drop`. That covers every exit path, including a constructor that
// fails halfway through.

use crate::error::Result;
use image::RgbImage;
use log::warn;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

pub trait FrameSource {
    /// Blocks until the next frame is available. `None` means end of stream.
    fn next_frame(&mut self) -> Option<RgbImage>;
}

impl<T: FrameSource + ?Sized> FrameSource for &mut T {
    fn next_frame(&mut self) -> Option<RgbImage> {
        (**self).next_frame()
    }
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn next_frame(&mut self) -> Option<RgbImage> {
        (**self).next_frame()
    }
}

/// Replays the image files of a directory, in file-name order, as camera frames.
///
/// Frames are delivered at their stored size; the requested capture size is not
/// applied. A file that cannot be read or decoded ends the stream, just like a
/// camera that stops delivering.
pub struct ImageSequenceSource {
    paths: VecDeque<PathBuf>,
}

impl ImageSequenceSource {
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            if path.is_file() && image::ImageFormat::from_path(&path).is_ok() {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(Self::from_paths(paths))
    }

    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }

    /// Frames still to be delivered.
    pub fn remaining(&self) -> usize {
        self.paths.len()
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Option<RgbImage> {
        let path = self.paths.pop_front()?;
        match image::open(&path) {
            Ok(frame) => Some(frame.into_rgb8()),
            Err(e) => {
                warn!("failed to grab frame from {}: {e}", path.display());
                self.paths.clear();
                None
            }
        }
    }
}
