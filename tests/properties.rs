//! Property-based tests for the burst detectors.

use burst_core::{
    tick_interval_days, BurstDetector, RollingZScore, Series, SeriesPoint, SlopeAcceleration,
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;

fn origin() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Series with non-decreasing timestamps; gaps of 0 produce duplicates.
fn build(rows: &[(i64, f64)]) -> Series {
    let mut t = origin();
    Series::new(
        rows.iter()
            .map(|&(gap, v)| {
                t += Duration::minutes(gap);
                SeriesPoint {
                    timestamp: t,
                    impressions: v,
                }
            })
            .collect(),
    )
}

fn rows(max_len: usize) -> impl Strategy<Value = Vec<(i64, f64)>> {
    prop::collection::vec((0i64..5, 0.0..1_000.0f64), 0..max_len)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn zscore_short_series_never_flags(window in 2usize..10, data in rows(12)) {
        let series = build(&data);
        prop_assume!(series.len() < window + 1);
        let detector = RollingZScore { window_size: window, ..RollingZScore::default() };
        prop_assert!(detector.detect(&series).is_empty());
    }

    #[test]
    fn zscore_skips_leading_window(
        window in 2usize..8,
        z in 0.0..3.0f64,
        include_current in any::<bool>(),
        data in rows(40),
    ) {
        let series = build(&data);
        let detector = RollingZScore { window_size: window, z_multiplier: z, include_current };
        let set = detector.detect(&series);
        let first_allowed = if include_current { window } else { window + 1 };
        for idx in set.indices() {
            prop_assert!(idx >= first_allowed, "index {} flagged with window {}", idx, window);
        }
        for burst in &set.bursts {
            prop_assert!(burst.signal.is_finite() && burst.threshold.is_finite());
        }
    }

    #[test]
    fn slope_never_touches_index_zero(threshold in -5.0..20.0f64, data in rows(40)) {
        let series = build(&data);
        let set = SlopeAcceleration { threshold }.detect(&series);
        for burst in &set.bursts {
            prop_assert!(burst.index >= 2);
            prop_assert!(burst.signal.is_finite());
        }
        for marker in &set.markers {
            prop_assert!(marker.index > 0);
            prop_assert_eq!(marker.index + 1, marker.burst_index);
        }
        prop_assert_eq!(set.bursts.len(), set.markers.len());
    }

    #[test]
    fn detectors_are_idempotent(data in rows(40)) {
        let series = build(&data);
        let zscore = RollingZScore::default();
        prop_assert_eq!(zscore.detect(&series), zscore.detect(&series));
        let slope = SlopeAcceleration::default();
        prop_assert_eq!(slope.detect(&series), slope.detect(&series));
    }

    #[test]
    fn tick_interval_covers_span(span in 0i64..5_000, target in 1u32..40) {
        let interval = tick_interval_days(span, target);
        prop_assert!(interval >= 1);
        prop_assert!(interval * i64::from(target) >= span);
    }
}
