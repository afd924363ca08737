use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use log::{debug, info, warn};
use opencv::core::Rect;
use opencv::core::Size;
use opencv::imgproc::resize;
use opencv::imgproc::INTER_LINEAR;
use opencv::prelude::Mat;
use opencv::prelude::MatTraitConst;
use thiserror::Error;

use super::bbox_text::parse_bbox;
use super::error::{BboxParseError, OverlayError};
use super::results_table::{DetectionRecord, ResultsTable};
use super::{BestPlateEntry, BestPlates, BoundingBox, FrameSource};

/// Why a vehicle ends up without a plate crop.
#[derive(Debug, Error)]
pub enum CropSkip {
    #[error("could not read frame {frame_nmr}")]
    FrameUnavailable { frame_nmr: u32 },

    #[error("malformed plate box: {0}")]
    MalformedBox(#[from] BboxParseError),

    #[error("invalid crop coordinates ({x1}, {y1}, {x2}, {y2})")]
    DegenerateRegion { x1: i32, y1: i32, x2: i32, y2: i32 },

    #[error("crop failed: {0}")]
    Processing(#[from] OverlayError),
}

impl From<opencv::Error> for CropSkip {
    fn from(err: opencv::Error) -> Self {
        CropSkip::Processing(err.into())
    }
}

pub type CropOutcome = Result<Mat, CropSkip>;

/// Picks the highest scoring row per vehicle. On equal scores the earliest
/// row in table order wins; rows without a score only win when the vehicle
/// has no scored row at all.
pub fn select_best_rows(records: &[DetectionRecord]) -> BTreeMap<i64, &DetectionRecord> {
    let mut best: BTreeMap<i64, &DetectionRecord> = BTreeMap::new();
    for record in records {
        match best.entry(record.car_id) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(mut slot) => {
                if record.rank_score() > slot.get().rank_score() {
                    slot.insert(record);
                }
            }
        }
    }
    best
}

/// Width that keeps the aspect ratio of a `width` x `height` region scaled to `target_height`.
pub fn crop_width(width: i32, height: i32, target_height: i32) -> i32 {
    let scaled = target_height as f64 * width as f64 / height as f64;
    (scaled.round() as i32).max(1)
}

/// Cuts the plate out of `frame` and scales it to `crop_height` rows.
pub fn crop_plate(frame: &Mat, plate: &BoundingBox, crop_height: i32) -> CropOutcome {
    let size = frame.size()?;
    let ((x1, y1), (x2, y2)) = plate.corners();
    let (x1, y1) = (x1.max(0), y1.max(0));
    let (x2, y2) = (x2.min(size.width), y2.min(size.height));
    if x2 <= x1 || y2 <= y1 {
        return Err(CropSkip::DegenerateRegion { x1, y1, x2, y2 });
    }

    let (width, height) = (x2 - x1, y2 - y1);
    let region = Mat::roi(frame, Rect::new(x1, y1, width, height))?;
    let mut resized = Mat::default();
    resize(
        &region,
        &mut resized,
        Size::new(crop_width(width, height, crop_height), crop_height),
        0.0,
        0.0,
        INTER_LINEAR,
    )?;
    Ok(resized)
}

#[derive(Debug, Default)]
pub struct SelectionReport {
    pub cropped: usize,
    pub skipped: Vec<(i64, CropSkip)>,
}

impl SelectionReport {
    pub fn vehicles(&self) -> usize {
        self.cropped + self.skipped.len()
    }

    pub fn log_summary(&self) {
        info!(
            "Selected plates for {} vehicles, {} without crop",
            self.vehicles(),
            self.skipped.len()
        );
        for (car_id, skip) in &self.skipped {
            debug!("car {}: {}", car_id, skip);
        }
    }
}

pub struct BestCropSelector {
    crop_height: i32,
}

impl BestCropSelector {
    pub fn new(crop_height: i32) -> Self {
        Self { crop_height }
    }

    /// Builds the plate map. Every vehicle in the table gets an entry; the crop
    /// is left empty when it cannot be produced.
    pub fn select<S: FrameSource + ?Sized>(
        &self,
        source: &mut S,
        table: &ResultsTable,
    ) -> (BestPlates, SelectionReport) {
        let mut plates = BestPlates::new();
        let mut report = SelectionReport::default();

        for (car_id, record) in select_best_rows(table.records()) {
            let mut entry = BestPlateEntry {
                crop: None,
                text: record.license_number.clone().unwrap_or_default(),
                score: record.license_number_score,
                frame_nmr: record.frame_nmr,
            };

            match self.crop_for(source, record) {
                Ok(crop) => {
                    entry.crop = Some(crop);
                    report.cropped += 1;
                }
                Err(skip) => {
                    match &skip {
                        CropSkip::FrameUnavailable { frame_nmr } => {
                            warn!("Could not read frame {} for car {}", frame_nmr, car_id)
                        }
                        CropSkip::DegenerateRegion { x1, y1, x2, y2 } => warn!(
                            "Invalid crop coordinates for car {}: ({}, {}, {}, {})",
                            car_id, x1, y1, x2, y2
                        ),
                        other => warn!(
                            "Error processing license plate for car {} (frame {}): {}",
                            car_id, record.frame_nmr, other
                        ),
                    }
                    report.skipped.push((car_id, skip));
                }
            }
            plates.insert(car_id, entry);
        }

        (plates, report)
    }

    fn crop_for<S: FrameSource + ?Sized>(
        &self,
        source: &mut S,
        record: &DetectionRecord,
    ) -> CropOutcome {
        let plate = parse_bbox(&record.license_plate_bbox)?;
        let unavailable = CropSkip::FrameUnavailable {
            frame_nmr: record.frame_nmr,
        };

        if source.seek(record.frame_nmr).is_err() {
            return Err(unavailable);
        }
        let frame = match source.next_frame() {
            Ok(Some(frame)) if !frame.empty() => frame,
            _ => return Err(unavailable),
        };
        crop_plate(&frame, &plate, self.crop_height)
    }
}
