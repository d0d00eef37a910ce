//! Rolling z-score burst detection over the first difference of impressions.

use crate::config::Strategy;
use crate::detect::{Burst, BurstDetector, BurstSet, Marker};
use crate::models::Series;

/// Flags a point when its difference exceeds `mean + z_multiplier * std` of a
/// trailing window of differences.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingZScore {
    pub window_size: usize,
    pub z_multiplier: f64,
    /// Window ends at the candidate itself rather than the previous point.
    pub include_current: bool,
}

impl Default for RollingZScore {
    fn default() -> Self {
        Self {
            window_size: 5,
            z_multiplier: 2.0,
            include_current: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    pub mean: f64,
    /// Sample standard deviation (n - 1).
    pub std: f64,
}

/// Rolling mean/std aligned with `diffs`. An entry is `None` while the window
/// reaches before the series start or covers an undefined difference.
pub fn rolling_stats(
    diffs: &[Option<f64>],
    window_size: usize,
    include_current: bool,
) -> Vec<Option<WindowStats>> {
    (0..diffs.len())
        .map(|t| {
            let end = if include_current { t + 1 } else { t };
            if window_size == 0 || end < window_size {
                return None;
            }
            let window: Option<Vec<f64>> = diffs[end - window_size..end].iter().copied().collect();
            window.and_then(|w| mean_std(&w))
        })
        .collect()
}

fn mean_std(vals: &[f64]) -> Option<WindowStats> {
    if vals.len() < 2 {
        return None;
    }
    let n = vals.len() as f64;
    let mean = vals.iter().sum::<f64>() / n;
    let sq_diff: f64 = vals.iter().map(|v| (v - mean).powi(2)).sum();
    let std = (sq_diff / (n - 1.0)).sqrt();
    Some(WindowStats { mean, std })
}

impl BurstDetector for RollingZScore {
    fn strategy(&self) -> Strategy {
        Strategy::RollingZscore
    }

    fn detect(&self, series: &Series) -> BurstSet {
        let diffs = series.diffs();
        let stats = rolling_stats(&diffs, self.window_size, self.include_current);
        let mut set = BurstSet::empty(self.strategy());

        for (i, point) in series.points().iter().enumerate() {
            let (Some(diff), Some(window)) = (diffs[i], stats[i]) else {
                continue;
            };
            let threshold = window.mean + self.z_multiplier * window.std;
            if diff > threshold {
                set.bursts.push(Burst {
                    index: i,
                    timestamp: point.timestamp,
                    impressions: point.impressions,
                    signal: diff,
                    threshold,
                });
                set.markers.push(Marker {
                    index: i,
                    timestamp: point.timestamp,
                    impressions: point.impressions,
                    burst_index: i,
                });
            }
        }
        set
    }
}
