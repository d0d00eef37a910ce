//! Chart layout: axis ranges, date ticks and text annotations. Everything here
//! is pure so it can be checked without drawing.

use std::ops::Range;

use chrono::{Duration, NaiveDateTime, NaiveTime};

use crate::config::{RenderConfig, Strategy};
use crate::detect::BurstSet;
use crate::models::Series;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Days between tick labels so that roughly `tick_target` labels fit the span.
pub fn tick_interval_days(span_days: i64, tick_target: u32) -> i64 {
    let target = i64::from(tick_target.max(1));
    let span = span_days.max(0);
    ((span + target - 1) / target).max(1)
}

/// Midnights from `first`'s date, every `interval` days, within `[first, last]`.
pub fn day_ticks(first: NaiveDateTime, last: NaiveDateTime, interval: i64) -> Vec<NaiveDateTime> {
    let step = Duration::days(interval.max(1));
    let mut t = first.date().and_time(NaiveTime::MIN);
    let mut ticks = Vec::new();
    while t <= last {
        if t >= first {
            ticks.push(t);
        }
        t += step;
    }
    ticks
}

/// Fractional days since `origin`; the chart's x coordinate.
pub fn day_offset(origin: NaiveDateTime, t: NaiveDateTime) -> f64 {
    (t - origin).num_milliseconds() as f64 / MS_PER_DAY
}

/// Whole numbers print without a fractional part.
pub fn format_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

pub fn title(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::RollingZscore => "Impressions with Significant Growth Bursts",
        Strategy::SlopeAcceleration => "Impressions with Sharp Increases",
    }
}

pub fn legend_label(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::RollingZscore => "Significant Growth",
        Strategy::SlopeAcceleration => "Sharp Increase",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub x: f64,
    pub label: String,
}

/// Everything the renderer draws, in chart coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayout {
    pub title: &'static str,
    pub legend: &'static str,
    pub x_range: Range<f64>,
    pub y_range: Range<f64>,
    pub line: Vec<(f64, f64)>,
    pub markers: Vec<(f64, f64)>,
    pub ticks: Vec<Tick>,
    pub tick_interval_days: i64,
    pub final_value: Annotation,
    pub marker_labels: Vec<Annotation>,
}

impl ChartLayout {
    /// `None` for an empty series.
    pub fn new(series: &Series, bursts: &BurstSet, config: &RenderConfig) -> Option<Self> {
        let first = series.first()?;
        let last = series.last()?;
        let origin = first.timestamp;

        let span = day_offset(origin, last.timestamp);
        let pad = if span > 0.0 { span * 0.02 } else { 0.5 };
        let x_range = -pad..span + pad;

        let y_max = series.max_impressions().filter(|m| *m > 0.0).unwrap_or(1.0);
        let y_range = 0.0..y_max * 1.1;

        let line = series
            .points()
            .iter()
            .map(|p| (day_offset(origin, p.timestamp), p.impressions))
            .collect();
        let markers = bursts
            .markers
            .iter()
            .map(|m| (day_offset(origin, m.timestamp), m.impressions))
            .collect();

        let interval = tick_interval_days(
            (last.timestamp - first.timestamp).num_days(),
            config.tick_target,
        );
        let ticks = day_ticks(origin, last.timestamp, interval)
            .into_iter()
            .map(|t| Tick {
                x: day_offset(origin, t),
                label: t.format("%Y-%m-%d").to_string(),
            })
            .collect();

        let final_value = Annotation {
            text: format_value(last.impressions),
            x: span,
            y: y_max * config.final_value_height,
        };

        let marker_labels = if config.annotates_markers(bursts.strategy) {
            bursts
                .markers
                .iter()
                .map(|m| Annotation {
                    text: m.timestamp.format("%Y-%m-%d %H:%M").to_string(),
                    x: day_offset(origin, m.timestamp),
                    y: m.impressions,
                })
                .collect()
        } else {
            Vec::new()
        };

        Some(Self {
            title: title(bursts.strategy),
            legend: legend_label(bursts.strategy),
            x_range,
            y_range,
            line,
            markers,
            ticks,
            tick_interval_days: interval,
            final_value,
            marker_labels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::Marker;
    use crate::models::SeriesPoint;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_tick_interval() {
        assert_eq!(tick_interval_days(35, 10), 4);
        assert_eq!(tick_interval_days(30, 10), 3);
        assert_eq!(tick_interval_days(9, 10), 1);
        assert_eq!(tick_interval_days(0, 10), 1);
        assert_eq!(tick_interval_days(-3, 10), 1);
        assert_eq!(tick_interval_days(100, 0), 100);
    }

    #[test]
    fn test_day_ticks_skip_midnight_before_start() {
        let first = day(1) + Duration::hours(6);
        let ticks = day_ticks(first, day(9), 2);
        assert_eq!(ticks, vec![day(3), day(5), day(7), day(9)]);
        assert_eq!(day_ticks(day(1), day(1), 1), vec![day(1)]);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(1234.0), "1234");
        assert_eq!(format_value(12.5), "12.5");
        assert_eq!(format_value(0.0), "0");
    }

    #[test]
    fn test_layout_annotations() {
        let series = Series::new(
            (1..=31)
                .map(|d| SeriesPoint {
                    timestamp: day(d),
                    impressions: f64::from(d) * 10.0,
                })
                .collect(),
        );
        let bursts = BurstSet {
            strategy: Strategy::SlopeAcceleration,
            bursts: Vec::new(),
            markers: vec![Marker {
                index: 9,
                timestamp: day(10),
                impressions: 100.0,
                burst_index: 10,
            }],
        };
        let layout = ChartLayout::new(&series, &bursts, &RenderConfig::default()).unwrap();
        assert_eq!(layout.tick_interval_days, 3);
        assert_eq!(layout.ticks.len(), 11);
        assert_eq!(layout.ticks[0].label, "2024-01-01");
        assert_eq!(layout.ticks[1].label, "2024-01-04");
        assert_eq!(layout.final_value.text, "310");
        assert!((layout.final_value.x - 30.0).abs() < 1e-9);
        assert!((layout.final_value.y - 248.0).abs() < 1e-9);
        assert_eq!(layout.markers, vec![(9.0, 100.0)]);
        assert_eq!(layout.marker_labels.len(), 1);
        assert_eq!(layout.marker_labels[0].text, "2024-01-10 00:00");
        assert_eq!(layout.title, "Impressions with Sharp Increases");
        assert_eq!(layout.line.len(), 31);
    }

    #[test]
    fn test_layout_degenerate_series() {
        let bursts = BurstSet::empty(Strategy::RollingZscore);
        assert!(ChartLayout::new(&Series::default(), &bursts, &RenderConfig::default()).is_none());

        let single = Series::new(vec![SeriesPoint {
            timestamp: day(2),
            impressions: 0.0,
        }]);
        let layout = ChartLayout::new(&single, &bursts, &RenderConfig::default()).unwrap();
        assert!(layout.x_range.start < layout.x_range.end);
        assert!(layout.y_range.start < layout.y_range.end);
        assert_eq!(layout.final_value.text, "0");
        assert!(layout.marker_labels.is_empty());
        assert_eq!(layout.legend, "Significant Growth");
    }
}
