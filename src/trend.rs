//! Slope acceleration: change in impressions-per-minute between consecutive
//! intervals, with the preceding point used as the chart marker.

use crate::config::Strategy;
use crate::detect::{Burst, BurstDetector, BurstSet, Marker};
use crate::models::Series;

#[derive(Debug, Clone, PartialEq)]
pub struct SlopeAcceleration {
    /// Minimum slope increase (impressions/minute) that counts as a burst.
    pub threshold: f64,
}

impl Default for SlopeAcceleration {
    fn default() -> Self {
        Self { threshold: 8.0 }
    }
}

/// Minutes elapsed since the previous point. Index 0 is `None`.
pub fn elapsed_minutes(series: &Series) -> Vec<Option<f64>> {
    let points = series.points();
    (0..points.len())
        .map(|i| {
            let prev = points.get(i.checked_sub(1)?)?;
            let ms = (points[i].timestamp - prev.timestamp).num_milliseconds();
            Some(ms as f64 / 60_000.0)
        })
        .collect()
}

/// Impressions per minute over each interval. `None` at index 0 and wherever
/// no time elapsed.
pub fn slopes(series: &Series) -> Vec<Option<f64>> {
    series
        .diffs()
        .into_iter()
        .zip(elapsed_minutes(series))
        .map(|(diff, minutes)| match (diff, minutes) {
            (Some(d), Some(m)) if m > 0.0 => Some(d / m),
            _ => None,
        })
        .collect()
}

/// `slope[t] - slope[t-1]`, `None` unless both slopes are defined.
pub fn slope_diffs(slopes: &[Option<f64>]) -> Vec<Option<f64>> {
    (0..slopes.len())
        .map(|t| {
            let prev = slopes.get(t.checked_sub(1)?).copied().flatten()?;
            Some(slopes[t]? - prev)
        })
        .collect()
}

impl BurstDetector for SlopeAcceleration {
    fn strategy(&self) -> Strategy {
        Strategy::SlopeAcceleration
    }

    fn detect(&self, series: &Series) -> BurstSet {
        let points = series.points();
        let accel = slope_diffs(&slopes(series));
        let mut set = BurstSet::empty(self.strategy());

        for (i, value) in accel.into_iter().enumerate() {
            let Some(value) = value.filter(|v| v.is_finite()) else {
                continue;
            };
            if value <= self.threshold {
                continue;
            }
            let Some(prev_idx) = i.checked_sub(1) else {
                continue;
            };
            let (point, prev) = (&points[i], &points[prev_idx]);
            set.bursts.push(Burst {
                index: i,
                timestamp: point.timestamp,
                impressions: point.impressions,
                signal: value,
                threshold: self.threshold,
            });
            set.markers.push(Marker {
                index: prev_idx,
                timestamp: prev.timestamp,
                impressions: prev.impressions,
                burst_index: i,
            });
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SeriesPoint;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn at_minutes(rows: &[(i64, f64)]) -> Series {
        Series::new(
            rows.iter()
                .map(|&(m, v)| SeriesPoint {
                    timestamp: start() + Duration::minutes(m),
                    impressions: v,
                })
                .collect(),
        )
    }

    #[test]
    fn test_sharp_increase_marks_previous_point() {
        let series = at_minutes(&[(0, 0.0), (1, 1.0), (2, 2.0), (3, 3.0), (4, 50.0)]);
        let set = SlopeAcceleration::default().detect(&series);
        assert_eq!(set.indices(), vec![4]);
        assert!((set.bursts[0].signal - 46.0).abs() < 1e-9);
        assert_eq!(set.markers.len(), 1);
        assert_eq!(set.markers[0].index, 3);
        assert_eq!(set.markers[0].burst_index, 4);
        assert_eq!(set.markers[0].impressions, 3.0);
        assert_eq!(set.markers[0].timestamp, start() + Duration::minutes(3));
    }

    #[test]
    fn test_duplicate_timestamps_are_skipped() {
        let series = at_minutes(&[(0, 0.0), (1, 1.0), (1, 100.0), (2, 101.0), (3, 102.0)]);
        let s = slopes(&series);
        assert_eq!(s[2], None);
        let accel = slope_diffs(&s);
        assert_eq!(accel[2], None);
        assert_eq!(accel[3], None);
        assert_eq!(accel[4], Some(0.0));
        assert!(SlopeAcceleration::default().detect(&series).is_empty());
    }

    #[test]
    fn test_irregular_spacing_uses_minutes() {
        // 10 impressions over 2 minutes is 5/min, then 30 over 1 minute.
        let series = at_minutes(&[(0, 0.0), (2, 10.0), (3, 40.0)]);
        let s = slopes(&series);
        assert_eq!(s, vec![None, Some(5.0), Some(30.0)]);
        let set = SlopeAcceleration::default().detect(&series);
        assert_eq!(set.indices(), vec![2]);
        assert_eq!(set.markers[0].index, 1);
    }

    #[test]
    fn test_threshold_is_strict() {
        let series = at_minutes(&[(0, 0.0), (1, 1.0), (2, 10.0)]);
        let set = SlopeAcceleration::default().detect(&series);
        assert!(set.is_empty());

        let lower = SlopeAcceleration { threshold: 7.5 };
        assert_eq!(lower.detect(&series).indices(), vec![2]);
    }

    #[test]
    fn test_deceleration_not_flagged() {
        let series = at_minutes(&[(0, 0.0), (1, 100.0), (2, 101.0), (3, 102.0)]);
        assert!(SlopeAcceleration::default().detect(&series).is_empty());
    }

    #[test]
    fn test_tiny_series() {
        assert!(SlopeAcceleration::default().detect(&Series::default()).is_empty());
        assert!(SlopeAcceleration::default()
            .detect(&at_minutes(&[(0, 5.0)]))
            .is_empty());
        assert!(SlopeAcceleration::default()
            .detect(&at_minutes(&[(0, 0.0), (1, 500.0)]))
            .is_empty());
    }

    #[test]
    fn test_sub_minute_intervals() {
        let base = start();
        let series = Series::new(vec![
            SeriesPoint {
                timestamp: base,
                impressions: 0.0,
            },
            SeriesPoint {
                timestamp: base + Duration::seconds(30),
                impressions: 1.0,
            },
            SeriesPoint {
                timestamp: base + Duration::seconds(60),
                impressions: 11.0,
            },
        ]);
        let s = slopes(&series);
        assert_eq!(s[1], Some(2.0));
        assert_eq!(s[2], Some(20.0));
        assert_eq!(SlopeAcceleration::default().detect(&series).indices(), vec![2]);
    }
}
