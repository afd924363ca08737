use std::path::{Path, PathBuf};

use log::{debug, warn};
use opencv::core::Size;
use opencv::prelude::Mat;
use opencv::prelude::VideoWriterTrait;
use opencv::prelude::VideoWriterTraitConst;
use opencv::videoio::VideoWriter;

use super::error::OverlayError;
use super::FrameSink;

/// Packs a four character codec name such as `mp4v` or `MJPG`.
pub fn fourcc(code: &str) -> Result<i32, OverlayError> {
    let chars: Vec<char> = code.chars().collect();
    match chars[..] {
        [c1, c2, c3, c4] if chars.iter().all(char::is_ascii) => {
            Ok(VideoWriter::fourcc(c1, c2, c3, c4)?)
        }
        _ => Err(OverlayError::InvalidCodec(code.to_string())),
    }
}

pub struct AnnotatedVideoWriter {
    writer: VideoWriter,
    path: PathBuf,
    frames_written: usize,
}

impl AnnotatedVideoWriter {
    pub fn create(path: &Path, codec: &str, fps: f64, size: Size) -> Result<Self, OverlayError> {
        let open_error = || OverlayError::WriterOpen {
            path: path.to_path_buf(),
        };
        let file_name = path.to_str().ok_or_else(open_error)?;
        let writer = VideoWriter::new(file_name, fourcc(codec)?, fps, size, true)?;
        if !writer.is_opened()? {
            return Err(open_error());
        }
        debug!(
            "Writing {:?} as {} at {}x{}, {:.2} fps",
            path, codec, size.width, size.height, fps
        );
        Ok(Self {
            writer,
            path: path.to_path_buf(),
            frames_written: 0,
        })
    }

    /// Flushes and closes the container.
    pub fn release(&mut self) -> Result<(), OverlayError> {
        self.writer.release()?;
        Ok(())
    }
}

impl FrameSink for AnnotatedVideoWriter {
    fn write_frame(&mut self, frame: &Mat) -> Result<(), OverlayError> {
        self.writer.write(frame)?;
        self.frames_written += 1;
        Ok(())
    }
}

impl Drop for AnnotatedVideoWriter {
    fn drop(&mut self) {
        debug!(
            "Releasing video writer {:?} after {} frames",
            self.path, self.frames_written
        );
        if let Err(err) = self.writer.release() {
            warn!("Could not release {:?}: {}", self.path, err);
        }
    }
}
