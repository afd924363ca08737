use std::path::PathBuf;

use crate::plate_overlay::style::RenderStyle;

pub const DEFAULT_RESULTS_PATH: &str = "./test_interpolated.csv";
pub const DEFAULT_VIDEO_PATH: &str = "./2103099-uhd_3840_2160_30fps.mp4";
pub const DEFAULT_OUTPUT_PATH: &str = "./out.mp4";
pub const DEFAULT_CODEC: &str = "mp4v";
pub const DEFAULT_PROGRESS_EVERY: u32 = 100;

/// Everything a visualization run needs.
#[derive(Debug, Clone)]
pub struct VisualizerConfig {
    pub results_path: PathBuf,
    pub video_path: PathBuf,
    pub output_path: PathBuf,
    pub codec: String,
    /// Log progress every this many frames; 0 disables it.
    pub progress_every: u32,
    pub style: RenderStyle,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            results_path: PathBuf::from(DEFAULT_RESULTS_PATH),
            video_path: PathBuf::from(DEFAULT_VIDEO_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            codec: DEFAULT_CODEC.to_string(),
            progress_every: DEFAULT_PROGRESS_EVERY,
            style: RenderStyle::default(),
        }
    }
}
