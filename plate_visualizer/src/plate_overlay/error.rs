use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BboxParseError {
    #[error("bounding box must be enclosed in brackets: {0:?}")]
    MissingBrackets(String),

    #[error("bounding box needs 4 values, got {0}")]
    WrongArity(usize),

    #[error("invalid bounding box value {0:?}")]
    InvalidNumber(String),
}

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("could not open video file {path:?}")]
    VideoOpen { path: PathBuf },

    #[error("could not open video writer at {path:?}")]
    WriterOpen { path: PathBuf },

    #[error("codec must be a 4 character code, got {0:?}")]
    InvalidCodec(String),

    #[error("could not decode frame {0}")]
    Decode(u32),

    #[error("results table is missing column {0:?}")]
    MissingColumn(String),

    #[error("results table: {0}")]
    Table(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Bbox(#[from] BboxParseError),

    #[error("region x={x} y={y} w={width} h={height} falls outside {frame_width}x{frame_height} frame")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        frame_width: i32,
        frame_height: i32,
    },

    #[error("opencv: {0}")]
    OpenCv(#[from] opencv::Error),
}
