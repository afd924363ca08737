use std::path::{Path, PathBuf};

use log::{debug, warn};
use opencv::core::Size;
use opencv::prelude::Mat;
use opencv::prelude::MatTraitConst;
use opencv::prelude::VideoCaptureTrait;
use opencv::prelude::VideoCaptureTraitConst;
use opencv::videoio::VideoCapture;
use opencv::videoio::CAP_ANY;
use opencv::videoio::CAP_PROP_FPS;
use opencv::videoio::CAP_PROP_FRAME_COUNT;
use opencv::videoio::CAP_PROP_FRAME_HEIGHT;
use opencv::videoio::CAP_PROP_FRAME_WIDTH;
use opencv::videoio::CAP_PROP_POS_FRAMES;

use super::error::OverlayError;
use super::FrameSource;

pub struct VideoReader {
    capture: VideoCapture,
    path: PathBuf,
    pub fps: f64,
    pub width: i32,
    pub height: i32,
    /// Container estimate, not always exact.
    pub frame_count: u32,
}

impl VideoReader {
    pub fn open(path: &Path) -> Result<Self, OverlayError> {
        let open_error = || OverlayError::VideoOpen {
            path: path.to_path_buf(),
        };
        let file_name = path.to_str().ok_or_else(open_error)?;
        let capture = VideoCapture::from_file(file_name, CAP_ANY).map_err(|err| {
            debug!("VideoCapture rejected {:?}: {}", path, err);
            open_error()
        })?;
        if !VideoCaptureTraitConst::is_opened(&capture)? {
            return Err(open_error());
        }

        let fps = VideoCaptureTraitConst::get(&capture, CAP_PROP_FPS)?;
        let width = VideoCaptureTraitConst::get(&capture, CAP_PROP_FRAME_WIDTH)? as i32;
        let height = VideoCaptureTraitConst::get(&capture, CAP_PROP_FRAME_HEIGHT)? as i32;
        let frame_count = VideoCaptureTraitConst::get(&capture, CAP_PROP_FRAME_COUNT)?.max(0.0) as u32;
        debug!(
            "Opened {:?}: {}x{} at {:.2} fps, ~{} frames",
            path, width, height, fps, frame_count
        );

        Ok(Self {
            capture,
            path: path.to_path_buf(),
            fps,
            width,
            height,
            frame_count,
        })
    }

    pub fn frame_size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn release(&mut self) -> Result<(), OverlayError> {
        self.capture.release()?;
        Ok(())
    }
}

impl FrameSource for VideoReader {
    fn seek(&mut self, frame_nmr: u32) -> Result<(), OverlayError> {
        if !VideoCaptureTrait::set(&mut self.capture, CAP_PROP_POS_FRAMES, frame_nmr as f64)? {
            return Err(OverlayError::Decode(frame_nmr));
        }
        Ok(())
    }

    /// Seeks to the first frame, reopening the file when the backend
    /// cannot seek.
    fn rewind(&mut self) -> Result<(), OverlayError> {
        if let Err(err) = self.seek(0) {
            debug!("Seek to start failed ({}), reopening {:?}", err, self.path);
            *self = Self::open(&self.path)?;
        }
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Mat>, OverlayError> {
        let mut image = Mat::default();
        let grabbed = self.capture.read(&mut image)?;
        if !grabbed || image.empty() {
            return Ok(None);
        }
        Ok(Some(image))
    }
}

impl Drop for VideoReader {
    fn drop(&mut self) {
        debug!("Releasing video capture {:?}", self.path);
        if let Err(err) = self.capture.release() {
            warn!("Could not release {:?}: {}", self.path, err);
        }
    }
}
