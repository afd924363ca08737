use opencv::prelude::Mat;
use opencv::prelude::MatTraitConst;

use super::error::OverlayError;
use super::{FrameSink, FrameSource};

/// Frames already decoded into memory, served in order.
#[derive(Default)]
pub struct VecFrameSource {
    frames: Vec<Mat>,
    position: usize,
    fail_from: Option<usize>,
    seek_fails: bool,
}

impl VecFrameSource {
    pub fn new(frames: Vec<Mat>) -> Self {
        Self {
            frames,
            position: 0,
            fail_from: None,
            seek_fails: false,
        }
    }

    /// Reading frame `frame_nmr` or any later one returns a decode error.
    pub fn with_decode_failure_at(mut self, frame_nmr: usize) -> Self {
        self.fail_from = Some(frame_nmr);
        self
    }

    /// Every seek fails and leaves the position where it was.
    pub fn with_seek_failure(mut self) -> Self {
        self.seek_fails = true;
        self
    }
}

impl FrameSource for VecFrameSource {
    fn seek(&mut self, frame_nmr: u32) -> Result<(), OverlayError> {
        if self.seek_fails {
            return Err(OverlayError::Decode(frame_nmr));
        }
        self.position = frame_nmr as usize;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Mat>, OverlayError> {
        if self.fail_from.map_or(false, |fail| self.position >= fail) {
            return Err(OverlayError::Decode(self.position as u32));
        }
        let Some(frame) = self.frames.get(self.position) else {
            return Ok(None);
        };
        self.position += 1;
        Ok(Some(frame.try_clone()?))
    }
}

/// Collects written frames.
#[derive(Default)]
pub struct VecFrameSink {
    pub frames: Vec<Mat>,
}

impl FrameSink for VecFrameSink {
    fn write_frame(&mut self, frame: &Mat) -> Result<(), OverlayError> {
        self.frames.push(frame.try_clone()?);
        Ok(())
    }
}
