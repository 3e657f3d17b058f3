#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper and detection core for AdScan.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Video probing via FFprobe
//! - Raw frame streaming over FFmpeg pipes (decode and encode)
//! - ONNX object detection behind a stubbable trait
//! - The presence segmenter state machine
//! - Detection overlay rendering
//! - Clip extraction

pub mod clip;
pub mod command;
pub mod detect;
pub mod error;
pub mod frames;
pub mod overlay;
pub mod probe;
pub mod segmenter;

pub use clip::{export_clip, EncodingConfig};
pub use command::{check_ffmpeg, check_ffprobe, run_ffmpeg, FfmpegCommand};
pub use detect::{
    resolve_target_ids, FrameDetector, TargetDetector, YoloDetector, YoloDetectorConfig,
    COCO_CLASSES,
};
pub use error::{MediaError, MediaResult};
pub use frames::{FrameStream, RgbFrame, VisualizationWriter};
pub use overlay::{OverlayRenderer, RunningStats};
pub use probe::{probe_video, VideoInfo};
pub use segmenter::PresenceSegmenter;
