use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::Path;

use log::{debug, warn};
use serde::de::{self, Deserializer};
use serde::Deserialize;

use super::error::OverlayError;

const REQUIRED_COLUMNS: [&str; 6] = [
    "frame_nmr",
    "car_id",
    "car_bbox",
    "license_plate_bbox",
    "license_number",
    "license_number_score",
];

/// One row of the detection export: a single vehicle seen in a single frame.
///
/// Boxes are kept in their exported text form and parsed where they are used,
/// so a malformed box only costs the row or vehicle that carries it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DetectionRecord {
    #[serde(deserialize_with = "integral")]
    pub frame_nmr: u32,
    #[serde(deserialize_with = "integral")]
    pub car_id: i64,
    pub car_bbox: String,
    pub license_plate_bbox: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub license_plate_bbox_score: Option<f32>,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub license_number_score: Option<f32>,
}

impl DetectionRecord {
    /// Score used for ranking. Missing and NaN scores lose against any real score.
    pub fn rank_score(&self) -> f32 {
        match self.license_number_score {
            Some(score) if !score.is_nan() => score,
            _ => f32::NEG_INFINITY,
        }
    }
}

// Interpolated exports sometimes write integer columns as `12.0`.
fn integral<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    let raw = String::deserialize(deserializer)?;
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| de::Error::custom(format!("expected an integer, got {raw:?}")))?;
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(de::Error::custom(format!("expected an integer, got {raw:?}")));
    }
    T::try_from(value as i64).map_err(|_| de::Error::custom(format!("{raw:?} is out of range")))
}

/// In-memory detection table with a per-frame index.
#[derive(Debug, Default)]
pub struct ResultsTable {
    records: Vec<DetectionRecord>,
    by_frame: BTreeMap<u32, Vec<usize>>,
}

impl ResultsTable {
    pub fn from_path(path: &Path) -> Result<Self, OverlayError> {
        let file = File::open(path)?;
        let table = Self::from_reader(file)?;
        debug!(
            "Loaded {} detections for {} vehicles from {:?}",
            table.len(),
            table.vehicle_count(),
            path
        );
        Ok(table)
    }

    /// Reads a CSV table. Rows that fail to deserialize are logged and dropped.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, OverlayError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|header| header == column) {
                return Err(OverlayError::MissingColumn(column.to_string()));
            }
        }

        let mut records = Vec::new();
        for result in reader.deserialize::<DetectionRecord>() {
            match result {
                Ok(record) => records.push(record),
                Err(err) if err.is_io_error() => return Err(err.into()),
                Err(err) => {
                    let line = err.position().map(|pos| pos.line()).unwrap_or_default();
                    warn!("Skipping results row at line {}: {}", line, err);
                }
            }
        }

        Ok(Self::from_records(records))
    }

    pub fn from_records(records: Vec<DetectionRecord>) -> Self {
        let mut by_frame: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for (index, record) in records.iter().enumerate() {
            by_frame.entry(record.frame_nmr).or_default().push(index);
        }
        Self { records, by_frame }
    }

    pub fn records(&self) -> &[DetectionRecord] {
        &self.records
    }

    /// Rows of one frame, in table order.
    pub fn rows_for_frame(&self, frame_nmr: u32) -> impl Iterator<Item = &DetectionRecord> + '_ {
        self.by_frame
            .get(&frame_nmr)
            .into_iter()
            .flatten()
            .map(move |&index| &self.records[index])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn vehicle_count(&self) -> usize {
        let mut ids: Vec<i64> = self.records.iter().map(|record| record.car_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }
}
