pub mod annotator;
pub mod best_crop;
pub mod bbox_text;
pub mod bounding_box_render;
pub mod error;
pub mod memory;
pub mod results_table;
pub mod style;
pub mod video_reader;
pub mod video_writer;

use std::collections::BTreeMap;

use opencv::prelude::Mat;

pub use error::OverlayError;

/// Corner coordinates of a box as exported by the detection stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        return Self { x1, y1, x2, y2 };
    }

    /// Pixel corners, truncated toward zero and saturated to the `i32` range.
    pub fn corners(&self) -> ((i32, i32), (i32, i32)) {
        (
            (self.x1 as i32, self.y1 as i32),
            (self.x2 as i32, self.y2 as i32),
        )
    }
}

/// Plate chosen for a vehicle, shown above it on every frame it appears in.
pub struct BestPlateEntry {
    pub crop: Option<Mat>,
    pub text: String,
    pub score: Option<f32>,
    pub frame_nmr: u32,
}

impl BestPlateEntry {
    pub fn has_crop(&self) -> bool {
        use opencv::prelude::MatTraitConst;
        self.crop.as_ref().map_or(false, |crop| !crop.empty())
    }
}

pub type BestPlates = BTreeMap<i64, BestPlateEntry>;

/// Sequential frame provider. Frame numbers are zero based.
pub trait FrameSource {
    fn seek(&mut self, frame_nmr: u32) -> Result<(), OverlayError>;
    fn next_frame(&mut self) -> Result<Option<Mat>, OverlayError>;

    /// Goes back to the first frame.
    fn rewind(&mut self) -> Result<(), OverlayError> {
        self.seek(0)
    }
}

pub trait FrameSink {
    fn write_frame(&mut self, frame: &Mat) -> Result<(), OverlayError>;
}
