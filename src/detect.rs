//! Burst detection interface shared by both strategies.

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

use crate::anomaly::RollingZScore;
use crate::config::{DetectionConfig, Strategy};
use crate::models::Series;
use crate::trend::SlopeAcceleration;

/// A point flagged as an unusually large increase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Burst {
    pub index: usize,
    pub timestamp: NaiveDateTime,
    pub impressions: f64,
    /// Value of the derived signal that crossed the threshold.
    pub signal: f64,
    pub threshold: f64,
}

/// A point drawn on the chart for a burst.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub index: usize,
    pub timestamp: NaiveDateTime,
    pub impressions: f64,
    pub burst_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BurstSet {
    pub strategy: Strategy,
    pub bursts: Vec<Burst>,
    pub markers: Vec<Marker>,
}

impl BurstSet {
    pub fn empty(strategy: Strategy) -> Self {
        Self {
            strategy,
            bursts: Vec::new(),
            markers: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bursts.is_empty()
    }

    pub fn indices(&self) -> Vec<usize> {
        self.bursts.iter().map(|b| b.index).collect()
    }
}

pub trait BurstDetector {
    fn strategy(&self) -> Strategy;

    /// Flag bursts in `series`. Must be pure: same input, same output.
    fn detect(&self, series: &Series) -> BurstSet;
}

/// Build the detector selected by `config`.
pub fn detector(config: &DetectionConfig) -> Box<dyn BurstDetector> {
    match config.strategy {
        Strategy::RollingZscore => Box::new(RollingZScore {
            window_size: config.window_size,
            z_multiplier: config.z_multiplier,
            include_current: config.include_current,
        }),
        Strategy::SlopeAcceleration => Box::new(SlopeAcceleration {
            threshold: config.slope_threshold,
        }),
    }
}

/// Run the configured strategy over `series`.
pub fn detect(series: &Series, config: &DetectionConfig) -> BurstSet {
    let set = detector(config).detect(series);
    debug!(
        strategy = ?set.strategy,
        points = series.len(),
        bursts = set.bursts.len(),
        markers = set.markers.len(),
        "burst detection finished"
    );
    set
}
