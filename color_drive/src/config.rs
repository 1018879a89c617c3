// THEORY:
// The `config` module holds the static configuration surface of a run. Values are
// set once at startup (from defaults, a file, or CLI overrides), validated once, and
// never changed while the loop is running.
//
// Defaults are the hand-tuned constants of the robot this loop was built for: a
// 640x480 capture, a blue-ish HSV band, a 12 px minimum radius, an 11x11 blur,
// five rounds of opening and a 0.2 forward throttle.

use crate::error::{DriveError, Result};
use serde::{Deserialize, Serialize};

/// One color in HSV space using the 8-bit OpenCV convention:
/// hue in `0..=180`, saturation and value in `0..=255`.
pub type Hsv = [u8; 3];

/// Largest legal hue in the 8-bit HSV convention (degrees / 2).
pub const HUE_MAX: u8 = 180;

/// Inclusive per-channel bounds that define a "foreground" pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRange {
    pub lower: Hsv,
    pub upper: Hsv,
}

impl ColorRange {
    pub fn new(lower: Hsv, upper: Hsv) -> Self {
        Self { lower, upper }
    }

    /// True iff every channel of `hsv` lies within `[lower, upper]`.
    pub fn contains(&self, hsv: Hsv) -> bool {
        (0..3).all(|c| self.lower[c] <= hsv[c] && hsv[c] <= self.upper[c])
    }
}

impl Default for ColorRange {
    fn default() -> Self {
        Self {
            lower: [90, 120, 90],
            upper: [120, 255, 220],
        }
    }
}

/// Configuration for the `ControlLoop`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Requested capture width in pixels. A hint only; sources may deliver other sizes.
    pub frame_width: u32,
    /// Requested capture height in pixels. A hint only.
    pub frame_height: u32,
    /// The HSV band isolating the tracked object.
    pub color_range: ColorRange,
    /// A blob must have an enclosing radius strictly greater than this to count.
    pub min_radius: f32,
    /// Erosion rounds, followed by the same number of dilation rounds.
    pub morphology_iterations: u8,
    /// Side of the square smoothing kernel. Must be odd.
    pub blur_kernel: u32,
    /// Throttle applied to both wheels while moving, in `(0, 1]`.
    pub forward_throttle: f32,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            frame_width: 640,
            frame_height: 480,
            color_range: ColorRange::default(),
            min_radius: 12.0,
            morphology_iterations: 5,
            blur_kernel: 11,
            forward_throttle: 0.2,
        }
    }
}

impl DriveConfig {
    pub fn validate(&self) -> Result<()> {
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(invalid(format!(
                "frame size must be non-zero, got {}x{}",
                self.frame_width, self.frame_height
            )));
        }
        if self.blur_kernel == 0 || self.blur_kernel % 2 == 0 {
            return Err(invalid(format!(
                "blur kernel must be a positive odd number, got {}",
                self.blur_kernel
            )));
        }

        let ColorRange { lower, upper } = self.color_range;
        for (channel, name) in ["hue", "saturation", "value"].iter().enumerate() {
            if lower[channel] > upper[channel] {
                return Err(invalid(format!(
                    "{name} lower bound {} exceeds upper bound {}",
                    lower[channel], upper[channel]
                )));
            }
        }
        if upper[0] > HUE_MAX {
            return Err(invalid(format!(
                "hue upper bound {} exceeds {HUE_MAX}",
                upper[0]
            )));
        }

        if !self.min_radius.is_finite() || self.min_radius < 0.0 {
            return Err(invalid(format!(
                "min_radius must be a non-negative number, got {}",
                self.min_radius
            )));
        }
        if !(self.forward_throttle > 0.0 && self.forward_throttle <= 1.0) {
            return Err(invalid(format!(
                "forward_throttle must be in (0, 1], got {}",
                self.forward_throttle
            )));
        }
        Ok(())
    }
}

fn invalid(message: String) -> DriveError {
    DriveError::InvalidConfig(message)
}
