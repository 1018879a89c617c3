// THEORY:
// The `ColorSegmenter` turns a camera frame into a binary mask of "the color we are
// looking for". It is the only stage that touches every pixel, so it is written as a
// straight pipeline of whole-image passes:
//
// 1.  **Smoothing**: a separable Gaussian blur with an odd, OpenCV-sized kernel
//     removes pixel-level sensor noise before any decision is made per pixel.
// 2.  **HSV Conversion**: raw RGB is a poor basis for color matching under changing
//     light; hue and saturation stay put when a surface gets darker, so the band is
//     expressed in HSV (8-bit convention: hue 0..=180, s/v 0..=255).
// 3.  **Thresholding**: a pixel is foreground iff all three channels fall inside the
//     configured `ColorRange`.
// 4.  **Opening**: erosion followed by dilation with the same iteration count. The
//     erosion deletes specks smaller than the kernel, the dilation grows surviving
//     regions back to their true outline. Dilating first would fill holes instead.
//
// There are no failure paths: every frame yields a mask, possibly empty.

use crate::config::{ColorRange, DriveConfig, HUE_MAX, Hsv};
use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::filter::separable_filter_equal;
use imageproc::morphology::{dilate, erode};

/// Binary mask: `255` for foreground, `0` for background.
pub type Mask = GrayImage;

pub const FOREGROUND: u8 = 255;

pub struct ColorSegmenter {
    range: ColorRange,
    kernel: Vec<f32>,
    iterations: u8,
}

impl ColorSegmenter {
    pub fn new(range: ColorRange, blur_kernel: u32, iterations: u8) -> Self {
        Self {
            range,
            kernel: gaussian_kernel(blur_kernel),
            iterations,
        }
    }

    pub fn from_config(config: &DriveConfig) -> Self {
        Self::new(
            config.color_range,
            config.blur_kernel,
            config.morphology_iterations,
        )
    }

    pub fn segment(&self, frame: &RgbImage) -> Mask {
        // --- 1. Smoothing ---
        let blurred = if self.kernel.len() > 1 {
            separable_filter_equal(frame, &self.kernel)
        } else {
            frame.clone()
        };

        // --- 2 & 3. HSV conversion and thresholding ---
        let mut mask = Mask::new(blurred.width(), blurred.height());
        for (x, y, pixel) in blurred.enumerate_pixels() {
            if self.range.contains(rgb_to_hsv(pixel.0)) {
                mask.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }

        // --- 4. Opening ---
        if self.iterations == 0 {
            return mask;
        }
        // One L-inf step is one pass of a 3x3 square kernel.
        let eroded = erode(&mask, Norm::LInf, self.iterations);
        dilate(&eroded, Norm::LInf, self.iterations)
    }
}

/// Builds a normalized 1D Gaussian kernel of odd length `size`, choosing sigma the
/// way OpenCV does when none is given.
// Not `imageproc::filter::gaussian_blur_f32`: that derives the kernel size from
// sigma, so the configured `blur_kernel` width would not be honored.
fn gaussian_kernel(size: u32) -> Vec<f32> {
    if size <= 1 {
        return vec![1.0];
    }
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let half = (size / 2) as i32;
    let mut kernel: Vec<f32> = (-half..=half)
        .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|w| *w /= sum);
    kernel
}

/// Converts an 8-bit RGB pixel to 8-bit HSV (hue halved to fit `0..=180`).
pub fn rgb_to_hsv(rgb: [u8; 3]) -> Hsv {
    let [r, g, b] = rgb.map(f32::from);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let chroma = max - min;

    let value = max;
    let saturation = if max > 0.0 { 255.0 * chroma / max } else { 0.0 };

    let mut hue = if chroma == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / chroma
    } else if max == g {
        120.0 + 60.0 * (b - r) / chroma
    } else {
        240.0 + 60.0 * (r - g) / chroma
    };
    if hue < 0.0 {
        hue += 360.0;
    }

    let mut hue = (hue / 2.0).round() as u8;
    if hue >= HUE_MAX {
        hue -= HUE_MAX;
    }
    [hue, saturation.round() as u8, value as u8]
}
