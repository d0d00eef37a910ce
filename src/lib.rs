//! Burst core: impression burst detection and charting.
//! Pipeline is `load` → `detect` → `render`; no shared state between stages.

mod anomaly;
mod chart;
mod config;
mod detect;
mod error;
mod loader;
pub mod logging;
mod models;
mod render;
mod trend;

pub use anomaly::{rolling_stats, RollingZScore, WindowStats};
pub use chart::{day_ticks, tick_interval_days, Annotation, ChartLayout, Tick};
pub use config::{Config, DetectionConfig, RenderConfig, Strategy};
pub use detect::{detect, detector, Burst, BurstDetector, BurstSet, Marker};
pub use error::{ConfigError, Error, LoadError, RenderError, Result};
pub use loader::{load, load_from_reader};
pub use models::{parse_timestamp, Series, SeriesPoint};
pub use render::{render, render_to_file};
pub use trend::{elapsed_minutes, slope_diffs, slopes, SlopeAcceleration};
