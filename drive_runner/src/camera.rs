// THEORY:
// `CameraSource` adapts an OpenCV `VideoCapture` to the `FrameSource` trait. OpenCV
// delivers BGR `Mat`s; the loop works on `image::RgbImage`, so each frame is
// converted and copied out once. Any read failure or empty frame ends the stream.
// The device is released in `Drop`, which the loop triggers during shutdown.

use anyhow::{Result, bail};
use color_drive::core_modules::frame_source::FrameSource;
use image::RgbImage;
use log::{info, warn};
use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};

pub struct CameraSource {
    capture: VideoCapture,
    frame: Mat,
}

impl CameraSource {
    /// Opens camera `index` and requests the given capture size. Drivers are free to
    /// pick a different size; frames are passed on as delivered.
    pub fn open(index: i32, width: u32, height: u32) -> Result<Self> {
        let mut capture = VideoCapture::new(index, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            bail!("camera {index} could not be opened");
        }
        capture.set(videoio::CAP_PROP_FRAME_WIDTH, width as f64)?;
        capture.set(videoio::CAP_PROP_FRAME_HEIGHT, height as f64)?;
        info!(
            "camera {index} opened at {}x{}",
            capture.get(videoio::CAP_PROP_FRAME_WIDTH)?,
            capture.get(videoio::CAP_PROP_FRAME_HEIGHT)?
        );
        Ok(Self {
            capture,
            frame: Mat::default(),
        })
    }

    fn grab(&mut self) -> opencv::Result<Option<RgbImage>> {
        if !self.capture.read(&mut self.frame)? || self.frame.empty() {
            return Ok(None);
        }
        let mut rgb = Mat::default();
        imgproc::cvt_color(&self.frame, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;
        let (width, height) = (rgb.cols() as u32, rgb.rows() as u32);
        Ok(RgbImage::from_raw(width, height, rgb.data_bytes()?.to_vec()))
    }
}

impl FrameSource for CameraSource {
    fn next_frame(&mut self) -> Option<RgbImage> {
        match self.grab() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("failed to grab frame from camera: {e}");
                None
            }
        }
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            warn!("failed to release camera: {e}");
        }
    }
}
