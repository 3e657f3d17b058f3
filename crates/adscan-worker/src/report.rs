//! Summary artifact writing.

use std::path::{Path, PathBuf};

use adscan_media::VideoInfo;
use adscan_models::{RunSummary, SegmentReport};
use tracing::info;

use crate::config::RunConfig;
use crate::error::WorkerResult;

/// Assemble the run summary from the export pass results.
pub fn build_summary(
    config: &RunConfig,
    video: &VideoInfo,
    segments: Vec<SegmentReport>,
) -> RunSummary {
    RunSummary {
        target_classes: config.target_classes.clone(),
        video_duration_sec: video.duration,
        segments,
    }
}

/// Write the summary text file into the run directory.
pub async fn write_summary(
    run_dir: &Path,
    config: &RunConfig,
    summary: &RunSummary,
) -> WorkerResult<PathBuf> {
    let path = run_dir.join(format!("{}_summary.txt", config.class_tag()));
    tokio::fs::write(&path, summary.render()).await?;
    info!("Summary written: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use adscan_models::Segment;

    fn config() -> RunConfig {
        RunConfig {
            input_video: PathBuf::from("input.mp4"),
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

    #[tokio::test]
    async fn test_summary_file_name_and_content() {
        let run_dir = tempfile::TempDir::new().unwrap();
        let cfg = config();

        let reports = vec![SegmentReport {
            index: 1,
            expanded: Segment::new(10.0, 12.0).expand(2.0, 3.0, 60.0),
            clip_path: Some(PathBuf::from("seg1.mp4")),
        }];
        let summary = build_summary(&cfg, &video(), reports);

        let path = write_summary(run_dir.path(), &cfg, &summary).await.unwrap();
        assert_eq!(path, run_dir.path().join("billboard_summary.txt"));

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("总出现时长: 2.00秒"));
        assert!(text.contains("目标出现时长占比: 3.33%"));
    }

    #[tokio::test]
    async fn test_zero_segments_summary_reflects_zero() {
        let run_dir = tempfile::TempDir::new().unwrap();
        let cfg = config();
        let summary = build_summary(&cfg, &video(), Vec::new());

        let path = write_summary(run_dir.path(), &cfg, &summary).await.unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("检测到的片段数: 0"));
        assert!(text.contains("目标出现时长占比: 0.00%"));
    }
}
