// THEORY:
// The `display` module is the operator-facing side of the loop. Each cycle the loop
// draws the detected blob onto the frame, encodes the result, and hands the bytes to
// a `DisplaySink`. Rendering is never part of the control decision; a broken display
// is logged and ignored.

use crate::core_modules::blob::Blob;
use crate::error::Result;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_circle_mut;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Overlay color for the enclosing circle.
pub const OVERLAY_COLOR: Rgb<u8> = Rgb([255, 255, 128]);

pub const JPEG_QUALITY: u8 = 80;

/// Receives encoded, annotated frames.
pub trait DisplaySink {
    fn update(&mut self, encoded: &[u8]) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

impl<T: DisplaySink + ?Sized> DisplaySink for &mut T {
    fn update(&mut self, encoded: &[u8]) -> Result<()> {
        (**self).update(encoded)
    }

    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }
}

impl<T: DisplaySink + ?Sized> DisplaySink for Box<T> {
    fn update(&mut self, encoded: &[u8]) -> Result<()> {
        (**self).update(encoded)
    }

    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }
}

/// Returns a copy of `frame` with the blob's enclosing circle drawn on it.
pub fn annotate(frame: &RgbImage, blob: Option<&Blob>) -> RgbImage {
    let mut annotated = frame.clone();
    if let Some(blob) = blob {
        let (cx, cy) = blob.circle_center;
        draw_hollow_circle_mut(
            &mut annotated,
            (cx as i32, cy as i32),
            blob.radius as i32,
            OVERLAY_COLOR,
        );
    }
    annotated
}

pub fn encode_jpeg(frame: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
    encoder.write_image(
        frame.as_raw(),
        frame.width(),
        frame.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(buffer)
}

/// Discards everything. For headless runs.
#[derive(Debug, Clone, Default)]
pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    fn update(&mut self, _encoded: &[u8]) -> Result<()> {
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Keeps the most recent frame in a single file that viewers can poll.
///
/// Updates go through a temporary sibling file and a rename, so a reader never
/// sees a half-written image.
pub struct SnapshotFile {
    path: PathBuf,
    staging: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut staging = path.clone().into_os_string();
        staging.push(".partial");
        Self {
            path,
            staging: staging.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DisplaySink for SnapshotFile {
    fn update(&mut self, encoded: &[u8]) -> Result<()> {
        fs::write(&self.staging, encoded)?;
        fs::rename(&self.staging, &self.path)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::blob::Point;

    fn blob_at(x: f32, y: f32, radius: f32) -> Blob {
        Blob {
            centroid: Point {
                x: x as i32,
                y: y as i32,
            },
            circle_center: (x, y),
            radius,
            area: 0.0,
        }
    }

    #[test]
    fn annotation_draws_circle_outline_only() {
        let frame = RgbImage::new(64, 64);
        let annotated = annotate(&frame, Some(&blob_at(32.0, 32.0, 10.0)));

        assert_eq!(annotated.get_pixel(42, 32), &OVERLAY_COLOR);
        assert_eq!(annotated.get_pixel(32, 22), &OVERLAY_COLOR);
        assert_eq!(annotated.get_pixel(32, 32), &Rgb([0, 0, 0]));
        assert_eq!(frame.get_pixel(42, 32), &Rgb([0, 0, 0]));
    }

    #[test]
    fn no_blob_leaves_frame_untouched() {
        let frame = RgbImage::from_pixel(16, 16, Rgb([10, 20, 30]));
        assert_eq!(annotate(&frame, None), frame);
    }

    #[test]
    fn encodes_jpeg() {
        let frame = RgbImage::from_pixel(32, 24, Rgb([200, 40, 40]));
        let bytes = encode_jpeg(&frame).expect("encode");
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&bytes).expect("decode").into_rgb8();
        assert_eq!(decoded.dimensions(), (32, 24));
    }

    #[test]
    fn snapshot_file_is_replaced_then_removed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut display = SnapshotFile::new(dir.path().join("latest.jpg"));

        display.update(b"first").expect("update");
        display.update(b"second").expect("update");
        assert_eq!(fs::read(display.path()).expect("read"), b"second");
        assert_eq!(fs::read_dir(dir.path()).expect("list").count(), 1);

        display.clear().expect("clear");
        assert!(!display.path().exists());
        display.clear().expect("clearing twice is fine");
    }
}
