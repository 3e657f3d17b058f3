//! The clip export pass.

use std::path::Path;

use adscan_media::{export_clip, EncodingConfig, VideoInfo};
use adscan_models::{ExpandedSegment, Segment, SegmentReport};
use chrono::Local;
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::error::WorkerResult;

/// Export one clip per segment, sequentially.
///
/// A failed extraction is logged and skipped; its report entry simply has no
/// clip path. With no segments at all, no clip directory is created.
pub async fn export_segments(
    config: &RunConfig,
    run_dir: &Path,
    video: &VideoInfo,
    segments: &[Segment],
) -> WorkerResult<Vec<SegmentReport>> {
    if segments.is_empty() {
        info!(classes = ?config.target_classes, "No target segments detected");
        return Ok(Vec::new());
    }

    let seg_dir = run_dir.join(format!("{}_segments", config.class_tag()));
    tokio::fs::create_dir_all(&seg_dir).await?;

    let encoding = EncodingConfig::default();
    let mut reports = Vec::with_capacity(segments.len());

    for (i, segment) in segments.iter().enumerate() {
        let index = i + 1;
        let expanded = segment.expand(
            config.pre_buffer_sec,
            config.post_buffer_sec,
            video.duration,
        );

        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let filename = clip_filename(&config.class_tag(), &timestamp, index, &expanded);
        let output = seg_dir.join(&filename);

        let clip_path = match export_clip(
            &config.input_video,
            &output,
            expanded.start_sec,
            expanded.end_sec,
            &encoding,
        )
        .await
        {
            Ok(()) => {
                info!(
                    "Saved clip {}: {} ({:.1}s)",
                    index,
                    filename,
                    expanded.duration_secs()
                );
                Some(output)
            }
            Err(e) => {
                warn!("Failed to export clip {}: {}", index, e);
                None
            }
        };

        reports.push(SegmentReport {
            index,
            expanded,
            clip_path,
        });
    }

    Ok(reports)
}

fn clip_filename(
    class_tag: &str,
    timestamp: &str,
    index: usize,
    expanded: &ExpandedSegment,
) -> String {
    format!(
        "{}_{}_{}_{:.1}s-{:.1}s.mp4",
        class_tag, timestamp, index, expanded.start_sec, expanded.end_sec
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config(input: PathBuf) -> RunConfig {
        RunConfig {
            input_video: input,
            output_base: PathBuf::from("output"),
            target_classes: vec!["billboard".to_string()],
            model_path: "models/adscan.onnx".to_string(),
            labels_path: None,
            pre_buffer_sec: 2.0,
            post_buffer_sec: 3.0,
            confidence_threshold: 0.25,
            min_segment_duration: 0.5,
        }
    }

    fn video() -> VideoInfo {
        VideoInfo {
            duration: 60.0,
            width: 1280,
            height: 720,
            fps: 30.0,
            codec: "h264".to_string(),
            frame_count: Some(1800),
        }
    }

    #[test]
    fn test_clip_filename_format() {
        let expanded = Segment::new(2.5, 4.0).expand(2.0, 3.0, 100.0);
        let name = clip_filename("Billboard-drinks", "20240301_120000", 1, &expanded);
        assert_eq!(name, "Billboard-drinks_20240301_120000_1_0.5s-7.0s.mp4");
    }

    #[test]
    fn test_clip_filename_clamped_start() {
        let expanded = Segment::new(0.5, 4.0).expand(2.0, 3.0, 100.0);
        let name = clip_filename("billboard", "20240301_120000", 3, &expanded);
        assert!(name.starts_with("billboard_20240301_120000_3_0.0s-"));
    }

    #[tokio::test]
    async fn test_no_segments_creates_no_clip_directory() {
        let run_dir = tempfile::TempDir::new().unwrap();
        let cfg = config(PathBuf::from("missing.mp4"));

        let reports = export_segments(&cfg, run_dir.path(), &video(), &[])
            .await
            .unwrap();
        assert!(reports.is_empty());
        assert!(!run_dir.path().join("billboard_segments").exists());
    }

    #[tokio::test]
    async fn test_failed_extractions_are_skipped_not_fatal() {
        let run_dir = tempfile::TempDir::new().unwrap();
        // Nonexistent source: every extraction fails, none should abort
        let cfg = config(PathBuf::from("/nonexistent/source.mp4"));
        let segments = [Segment::new(5.0, 7.0), Segment::new(20.0, 22.5)];

        let reports = export_segments(&cfg, run_dir.path(), &video(), &segments)
            .await
            .unwrap();

        // Every raw segment is still reported, just without a clip path
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.clip_path.is_none()));
        assert_eq!(reports[0].index, 1);
        assert_eq!(reports[1].index, 2);
        assert!((reports[1].original().start_sec - 20.0).abs() < 1e-9);
        assert!(run_dir.path().join("billboard_segments").is_dir());
    }
}
