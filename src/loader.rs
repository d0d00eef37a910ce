//! CSV ingestion: `date` + `impressions` columns into a sorted [`Series`].

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::LoadError;
use crate::models::{parse_timestamp, Series, SeriesPoint};

const REQUIRED_COLUMNS: [&str; 2] = ["date", "impressions"];

#[derive(Debug, Deserialize)]
struct RawRow {
    date: String,
    impressions: f64,
}

/// Load a series from a CSV file on disk.
pub fn load(path: impl AsRef<Path>) -> Result<Series, LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "reading impressions CSV");
    load_from_reader(file)
}

/// Load a series from any CSV source. Extra columns are ignored; rows come
/// back sorted by timestamp.
pub fn load_from_reader<R: Read>(reader: R) -> Result<Series, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    for col in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == col) {
            return Err(LoadError::MissingColumn(col));
        }
    }

    let mut points = Vec::new();
    for (i, row) in rdr.deserialize::<RawRow>().enumerate() {
        let row = row?;
        let row_no = i + 1;
        let timestamp = parse_timestamp(&row.date).ok_or_else(|| LoadError::InvalidDate {
            row: row_no,
            value: row.date.clone(),
        })?;
        if !row.impressions.is_finite() || row.impressions < 0.0 {
            return Err(LoadError::InvalidImpressions {
                row: row_no,
                value: row.impressions,
            });
        }
        points.push(SeriesPoint {
            timestamp,
            impressions: row.impressions,
        });
    }

    debug!(rows = points.len(), "loaded impression series");
    Ok(Series::new(points))
}
