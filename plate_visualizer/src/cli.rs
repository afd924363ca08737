use std::path::PathBuf;

use clap::Parser;

use crate::config::{
    VisualizerConfig, DEFAULT_CODEC, DEFAULT_OUTPUT_PATH, DEFAULT_PROGRESS_EVERY,
    DEFAULT_RESULTS_PATH, DEFAULT_VIDEO_PATH,
};
use crate::plate_overlay::style::RenderStyle;

#[derive(Parser, Debug)]
#[command(
    name = "visualize",
    about = "Overlay tracked vehicles, plate boxes and recognized plates on a video"
)]
pub struct Args {
    /// Detection table (CSV) produced by the tracking and OCR stage
    #[arg(short, long, default_value = DEFAULT_RESULTS_PATH)]
    pub results: PathBuf,

    /// Source video the detections were computed on
    #[arg(short, long, default_value = DEFAULT_VIDEO_PATH)]
    pub video: PathBuf,

    /// Annotated video to write
    #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,

    /// Four character code of the output codec
    #[arg(long, default_value = DEFAULT_CODEC)]
    pub codec: String,

    /// Log progress every N frames (0 disables)
    #[arg(long, default_value_t = DEFAULT_PROGRESS_EVERY)]
    pub progress_every: u32,

    /// Height in pixels of the plate shown above each vehicle
    #[arg(long, default_value_t = 400, value_parser = clap::value_parser!(i32).range(1..))]
    pub crop_height: i32,
}

impl Args {
    pub fn into_config(self) -> VisualizerConfig {
        VisualizerConfig {
            results_path: self.results,
            video_path: self.video,
            output_path: self.output,
            codec: self.codec,
            progress_every: self.progress_every,
            style: RenderStyle {
                crop_height: self.crop_height,
                ..RenderStyle::default()
            },
        }
    }
}
