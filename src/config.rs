//! Tunable parameters for detection and rendering, loadable from TOML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Largest accepted image width or height in pixels.
pub const MAX_IMAGE_DIMENSION: u32 = 16_384;
/// Largest accepted font size in pixels.
pub const MAX_FONT_SIZE: u32 = 512;

/// Which burst rule to apply.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Difference exceeds rolling mean + N * rolling std.
    #[default]
    RollingZscore,
    /// Change in slope (impressions/minute) exceeds a fixed threshold.
    SlopeAcceleration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectionConfig {
    pub strategy: Strategy,
    pub window_size: usize,
    pub z_multiplier: f64,
    /// Window ends at the candidate point instead of the point before it.
    pub include_current: bool,
    pub slope_threshold: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            window_size: 5,
            z_multiplier: 2.0,
            include_current: false,
            slope_threshold: 8.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// Roughly how many date labels to spread across the x axis.
    pub tick_target: u32,
    pub title_font_size: u32,
    pub label_font_size: u32,
    pub final_value_font_size: u32,
    pub marker_font_size: u32,
    /// Height of the final-value label as a fraction of the series maximum.
    pub final_value_height: f64,
    /// `None` picks the strategy default (labels for slope markers only).
    pub annotate_markers: Option<bool>,
    pub font_path: Option<PathBuf>,
    pub output: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 500,
            tick_target: 10,
            title_font_size: 24,
            label_font_size: 14,
            final_value_font_size: 20,
            marker_font_size: 12,
            final_value_height: 0.8,
            annotate_markers: None,
            font_path: None,
            output: PathBuf::from("graph.png"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub detection: DetectionConfig,
    pub render: RenderConfig,
}

impl Config {
    /// Read and validate a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detection.validate()?;
        self.render.validate()
    }
}

fn invalid(field: &'static str, message: String) -> ConfigError {
    ConfigError::InvalidValue { field, message }
}

impl DetectionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size < 2 {
            return Err(invalid(
                "detection.window_size",
                format!("must be at least 2, got {}", self.window_size),
            ));
        }
        if !self.z_multiplier.is_finite() || self.z_multiplier < 0.0 {
            return Err(invalid(
                "detection.z_multiplier",
                format!("must be a finite non-negative number, got {}", self.z_multiplier),
            ));
        }
        if !self.slope_threshold.is_finite() {
            return Err(invalid(
                "detection.slope_threshold",
                format!("must be finite, got {}", self.slope_threshold),
            ));
        }
        Ok(())
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dims = 1..=MAX_IMAGE_DIMENSION;
        if !dims.contains(&self.width) || !dims.contains(&self.height) {
            return Err(invalid(
                "render.width/height",
                format!(
                    "must be in 1..={MAX_IMAGE_DIMENSION}, got {}x{}",
                    self.width, self.height
                ),
            ));
        }
        if self.tick_target == 0 {
            return Err(invalid("render.tick_target", "must be at least 1".to_string()));
        }
        let sizes = [
            ("render.title_font_size", self.title_font_size),
            ("render.label_font_size", self.label_font_size),
            ("render.final_value_font_size", self.final_value_font_size),
            ("render.marker_font_size", self.marker_font_size),
        ];
        for (field, size) in sizes {
            if !(1..=MAX_FONT_SIZE).contains(&size) {
                return Err(invalid(
                    field,
                    format!("must be in 1..={MAX_FONT_SIZE}, got {size}"),
                ));
            }
        }
        if !(self.final_value_height > 0.0 && self.final_value_height <= 1.0) {
            return Err(invalid(
                "render.final_value_height",
                format!("must be in (0, 1], got {}", self.final_value_height),
            ));
        }
        Ok(())
    }

    /// Whether marker points get a timestamp label.
    pub fn annotates_markers(&self, strategy: Strategy) -> bool {
        self.annotate_markers
            .unwrap_or(strategy == Strategy::SlopeAcceleration)
    }
}
