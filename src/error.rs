//! Error types for loading, configuring and rendering.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading the impression series.
#[derive(Error, Debug)]
pub enum LoadError {
    /// I/O error
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// CSV framing or field error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Header row lacks a required column
    #[error("missing required column: {0}")]
    MissingColumn(&'static str),

    /// A `date` cell could not be parsed
    #[error("row {row}: unparseable date '{value}'")]
    InvalidDate { row: usize, value: String },

    /// An `impressions` cell was negative or not finite
    #[error("row {row}: invalid impressions value {value}")]
    InvalidImpressions { row: usize, value: f64 },
}

/// Configuration file and value errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
}

/// Chart rendering errors.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Nothing to draw
    #[error("cannot render an empty series")]
    EmptySeries,

    /// Neither the configured nor the bundled font could be registered
    #[error("no usable font for chart text")]
    FontUnavailable,

    /// Plotting backend failure
    #[error("drawing failed: {0}")]
    Draw(String),

    /// PNG encoding failure
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    /// Writing the image file failed
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Any failure of the load → detect → render pipeline.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
