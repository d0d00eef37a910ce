use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a `date` cell. Accepts plain dates, date-times with or without
/// seconds, and RFC 3339 strings (converted to UTC).
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub timestamp: NaiveDateTime,
    pub impressions: f64,
}

/// Impression counts ordered ascending by timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    points: Vec<SeriesPoint>,
}

impl Series {
    /// Build a series, sorting by timestamp. The sort is stable so duplicate
    /// timestamps keep their input order.
    pub fn new(mut points: Vec<SeriesPoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        Self { points }
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&SeriesPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    pub fn impressions(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.impressions).collect()
    }

    pub fn max_impressions(&self) -> Option<f64> {
        self.points.iter().map(|p| p.impressions).reduce(f64::max)
    }

    /// First difference, aligned with the points. Index 0 is `None`.
    pub fn diffs(&self) -> Vec<Option<f64>> {
        let mut out = Vec::with_capacity(self.points.len());
        for (i, p) in self.points.iter().enumerate() {
            out.push(match i {
                0 => None,
                _ => Some(p.impressions - self.points[i - 1].impressions),
            });
        }
        out
    }
}
