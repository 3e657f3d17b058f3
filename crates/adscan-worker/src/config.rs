//! Run configuration.

use std::path::PathBuf;

use adscan_media::COCO_CLASSES;

use crate::error::{WorkerError, WorkerResult};

/// Configuration for one processing run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Source video path
    pub input_video: PathBuf,
    /// Base directory holding the numbered run directories
    pub output_base: PathBuf,
    /// Target class names to track (case-insensitive match)
    pub target_classes: Vec<String>,
    /// Path to the ONNX detection model
    pub model_path: String,
    /// Optional class-name table file, one name per line; the COCO-80
    /// table is used when unset
    pub labels_path: Option<PathBuf>,
    /// Seconds kept before each segment in exported clips
    pub pre_buffer_sec: f64,
    /// Seconds kept after each segment in exported clips
    pub post_buffer_sec: f64,
    /// Detection confidence threshold (0, 1]
    pub confidence_threshold: f32,
    /// Minimum raw segment duration; shorter runs are dropped
    pub min_segment_duration: f64,
}

impl RunConfig {
    /// Create config from environment variables plus the positional input
    /// path.
    pub fn from_env(input_video: PathBuf) -> WorkerResult<Self> {
        let target_classes: Vec<String> = std::env::var("ADSCAN_TARGET_CLASSES")
            .ok()
            .map(|raw| {
                raw.split(',')
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let config = Self {
            input_video,
            output_base: std::env::var("ADSCAN_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("output")),
            target_classes,
            model_path: std::env::var("ADSCAN_MODEL")
                .unwrap_or_else(|_| "models/adscan.onnx".to_string()),
            labels_path: std::env::var("ADSCAN_LABELS").ok().map(PathBuf::from),
            pre_buffer_sec: env_f64("ADSCAN_PRE_BUFFER_SEC", 2.0),
            post_buffer_sec: env_f64("ADSCAN_POST_BUFFER_SEC", 3.0),
            confidence_threshold: env_f64("ADSCAN_CONFIDENCE", 0.25) as f32,
            min_segment_duration: env_f64("ADSCAN_MIN_SEGMENT_SEC", 0.5),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject out-of-range tunables before any output is produced.
    pub fn validate(&self) -> WorkerResult<()> {
        if self.target_classes.is_empty() {
            return Err(WorkerError::config_error(
                "ADSCAN_TARGET_CLASSES must list at least one class name",
            ));
        }
        if !(self.confidence_threshold > 0.0 && self.confidence_threshold <= 1.0) {
            return Err(WorkerError::config_error(format!(
                "Confidence threshold {} outside (0, 1]",
                self.confidence_threshold
            )));
        }
        if self.pre_buffer_sec < 0.0 || self.post_buffer_sec < 0.0 {
            return Err(WorkerError::config_error("Clip buffers must be >= 0"));
        }
        if self.min_segment_duration < 0.0 {
            return Err(WorkerError::config_error(
                "Minimum segment duration must be >= 0",
            ));
        }
        Ok(())
    }

    /// The `-`-joined class tag used in every artifact name.
    pub fn class_tag(&self) -> String {
        self.target_classes.join("-")
    }

    /// Load the detector's class-name table.
    pub fn load_class_names(&self) -> WorkerResult<Vec<String>> {
        match &self.labels_path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                let names: Vec<String> = text
                    .lines()
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty())
                    .collect();
                if names.is_empty() {
                    return Err(WorkerError::config_error(format!(
                        "Labels file {} contains no class names",
                        path.display()
                    )));
                }
                Ok(names)
            }
            None => Ok(COCO_CLASSES.iter().map(|s| s.to_string()).collect()),
        }
    }
}

fn env_f64(name: &str, default: f64) -> f64 {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
