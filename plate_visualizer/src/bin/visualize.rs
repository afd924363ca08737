use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::error;

use plate_visualizer::cli::Args;
use plate_visualizer::plate_overlay::annotator::run;
use plate_visualizer::plate_overlay::OverlayError;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Args::parse().into_config();
    match run(&config) {
        Ok(_) => Ok(()),
        Err(OverlayError::VideoOpen { path }) => {
            error!("Could not open video file {}", path.display());
            error!("Please check:");
            error!("1. The video file exists at that path");
            error!("2. The file name matches exactly");
            error!("3. The video file is not corrupted");
            anyhow::bail!("could not open video file {}", path.display())
        }
        Err(err) => Err(err).with_context(|| {
            format!(
                "failed to annotate {} with {}",
                config.video_path.display(),
                config.results_path.display()
            )
        }),
    }
}
