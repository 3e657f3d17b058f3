//! The detection pass.
//!
//! One sequential sweep over the source video: decode a frame, run the
//! detector, feed the segmenter, render the overlay, append to the
//! visualization stream. The segmenter's final interval list is the input
//! to the export pass.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use adscan_media::{
    probe_video, EncodingConfig, FrameStream, OverlayRenderer, PresenceSegmenter, RunningStats,
    TargetDetector, VideoInfo, VisualizationWriter,
};
use adscan_models::{FrameSample, Segment};
use chrono::Local;
use tracing::info;

use crate::config::RunConfig;
use crate::error::{WorkerError, WorkerResult};

const PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

/// Outcome of the detection pass.
pub struct DetectionPassResult {
    /// Closed presence segments in detection order.
    pub segments: Vec<Segment>,
    /// Probed source video information.
    pub video: VideoInfo,
    /// Path of the annotated visualization video.
    pub visualization_path: PathBuf,
}

/// Run the single-pass detection loop over the source video.
///
/// Fails before producing any output when the source cannot be probed or
/// decoded; the visualization file is the only artifact written here.
pub async fn run_detection_pass(
    config: &RunConfig,
    run_dir: &Path,
    detector: &TargetDetector,
) -> WorkerResult<DetectionPassResult> {
    let video = probe_video(&config.input_video).await?;
    if video.width == 0 || video.height == 0 || video.fps <= 0.0 {
        return Err(WorkerError::processing_failed(format!(
            "Source video reports unusable geometry ({}x{} @ {} fps)",
            video.width, video.height, video.fps
        )));
    }

    info!(
        "Video info: {}x{}, {:.2} fps, duration {:.2}s",
        video.width, video.height, video.fps, video.duration
    );

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let visualization_path = run_dir.join(format!(
        "{}_visulize_{}.mp4",
        config.class_tag(),
        timestamp
    ));

    let mut stream = FrameStream::open(&config.input_video, video.width, video.height).await?;
    let mut writer = VisualizationWriter::create(
        &visualization_path,
        video.width,
        video.height,
        video.fps,
        &EncodingConfig::default(),
    )
    .await?;

    let renderer = OverlayRenderer::new();
    let mut segmenter = PresenceSegmenter::new(config.min_segment_duration);

    let mut frame_index: u64 = 0;
    let mut last_secs = 0.0;
    let mut last_log = Instant::now();

    while let Some(mut frame) = stream.next_frame().await? {
        let sample = FrameSample {
            frame_index,
            timestamp_sec: frame_index as f64 / video.fps,
            detections: detector.detect(&frame)?,
        };
        last_secs = sample.timestamp_sec;

        segmenter.step(sample.has_target(), sample.timestamp_sec);

        let stats = RunningStats {
            segment_count: segmenter.segment_count(),
            target_duration_secs: segmenter.closed_duration_secs(),
            video_duration_secs: video.duration,
        };
        renderer.render(&mut frame, &sample.detections, detector.class_names(), &stats);
        writer.write_frame(&frame).await?;

        frame_index += 1;
        if last_log.elapsed() > PROGRESS_INTERVAL {
            log_progress(frame_index, video.frame_count);
            last_log = Instant::now();
        }
    }

    let segments = segmenter.finalize(last_secs);

    writer.finish().await?;
    stream.finish().await?;

    info!(
        frames = frame_index,
        segments = segments.len(),
        "Detection pass complete"
    );

    Ok(DetectionPassResult {
        segments,
        video,
        visualization_path,
    })
}

fn log_progress(frame_index: u64, total_frames: Option<u64>) {
    match total_frames {
        Some(total) if total > 0 => info!(
            "Processing: {:.1}% ({}/{})",
            frame_index as f64 / total as f64 * 100.0,
            frame_index,
            total
        ),
        _ => info!("Processing: {} frames", frame_index),
    }
}
