// THEORY:
// Startup configuration for the runner. A run's `DriveConfig` is assembled in three
// layers, each overriding the last: built-in defaults, an optional TOML file, and
// the few command-line flags that operators tune in the field. The result is
// validated once here, before any hardware is touched.

use anyhow::{Context, Result};
use color_drive::DriveConfig;
use std::fs;
use std::path::Path;

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub min_radius: Option<f32>,
    pub forward_throttle: Option<f32>,
}

/// Parses a TOML document into a `DriveConfig`. Missing keys keep their defaults.
pub fn parse(text: &str) -> Result<DriveConfig> {
    toml::from_str(text).context("invalid drive config")
}

pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<DriveConfig> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            parse(&text).with_context(|| format!("in {}", path.display()))?
        }
        None => DriveConfig::default(),
    };

    if let Some(min_radius) = overrides.min_radius {
        config.min_radius = min_radius;
    }
    if let Some(throttle) = overrides.forward_throttle {
        config.forward_throttle = throttle;
    }

    config.validate()?;
    Ok(config)
}
