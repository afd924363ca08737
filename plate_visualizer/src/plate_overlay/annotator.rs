use log::{info, warn};
use opencv::prelude::MatTraitConst;

use super::best_crop::{BestCropSelector, SelectionReport};
use super::bounding_box_render::{BoundingBoxRender, FrameReport};
use super::error::OverlayError;
use super::results_table::ResultsTable;
use super::video_reader::VideoReader;
use super::video_writer::AnnotatedVideoWriter;
use super::{FrameSink, FrameSource};
use crate::config::VisualizerConfig;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RenderSummary {
    pub frames_written: usize,
    pub rows: FrameReport,
}

#[derive(Debug)]
pub struct RunSummary {
    pub selection: SelectionReport,
    pub render: RenderSummary,
}

/// Annotates every frame `source` yields, in order, and writes it to `sink`.
///
/// The first frame that cannot be decoded ends the stream. Frame numbers
/// count from the current source position, so rewind before calling or use
/// [`render_from_start`].
pub fn annotate_stream<S, W>(
    source: &mut S,
    sink: &mut W,
    table: &ResultsTable,
    render: &BoundingBoxRender,
    progress_every: u32,
) -> Result<RenderSummary, OverlayError>
where
    S: FrameSource + ?Sized,
    W: FrameSink + ?Sized,
{
    let mut summary = RenderSummary::default();
    let mut frame_nmr: u32 = 0;

    loop {
        let mut frame = match source.next_frame() {
            Ok(Some(frame)) if !frame.empty() => frame,
            Ok(_) => break,
            Err(err) => {
                warn!("Stopping at frame {}: {}", frame_nmr, err);
                break;
            }
        };

        let report = render.render(&mut frame, frame_nmr, table.rows_for_frame(frame_nmr));
        summary.rows.merge(&report);

        sink.write_frame(&frame)?;
        summary.frames_written += 1;

        if progress_every > 0 && frame_nmr % progress_every == 0 {
            info!("Processed frame {}", frame_nmr);
        }
        frame_nmr += 1;
    }

    Ok(summary)
}

/// Rewinds `source` and annotates it. A failed rewind is logged and the
/// pass continues from wherever the source currently is.
pub fn render_from_start<S, W>(
    source: &mut S,
    sink: &mut W,
    table: &ResultsTable,
    render: &BoundingBoxRender,
    progress_every: u32,
) -> Result<RenderSummary, OverlayError>
where
    S: FrameSource + ?Sized,
    W: FrameSink + ?Sized,
{
    if let Err(err) = source.rewind() {
        warn!(
            "Could not rewind to the first frame, rendering from current position: {}",
            err
        );
    }
    annotate_stream(source, sink, table, render, progress_every)
}

/// Loads the table, picks the best plate per vehicle and renders the
/// annotated copy of the input video.
pub fn run(config: &VisualizerConfig) -> Result<RunSummary, OverlayError> {
    let table = ResultsTable::from_path(&config.results_path)?;
    info!(
        "Loaded {} detections for {} vehicles",
        table.len(),
        table.vehicle_count()
    );

    let mut reader = VideoReader::open(&config.video_path)?;
    let mut writer = AnnotatedVideoWriter::create(
        &config.output_path,
        &config.codec,
        reader.fps,
        reader.frame_size(),
    )?;

    let selector = BestCropSelector::new(config.style.crop_height);
    let (plates, selection) = selector.select(&mut reader, &table);
    selection.log_summary();

    let render = BoundingBoxRender::new(&config.style, &plates);
    let summary = render_from_start(
        &mut reader,
        &mut writer,
        &table,
        &render,
        config.progress_every,
    )?;

    writer.release()?;
    reader.release()?;
    info!(
        "Wrote {} frames ({} rows annotated, {} overlays skipped, {} rows skipped)",
        summary.frames_written,
        summary.rows.annotated + summary.rows.without_plate,
        summary.rows.overlays_skipped,
        summary.rows.rows_skipped
    );
    info!(
        "Visualization complete! Output saved as {}",
        config.output_path.display()
    );

    Ok(RunSummary {
        selection,
        render: summary,
    })
}
