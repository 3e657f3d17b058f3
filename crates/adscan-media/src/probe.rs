//! Source video probing.
//!
//! One ffprobe call per run, restricted to the first video stream plus the
//! container duration. Everything downstream (frame timestamps, clip
//! clamping, the visualization encoder geometry) is derived from the
//! [`VideoInfo`] produced here.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// Video file information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Duration in seconds
    pub duration: f64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Frame rate (fps)
    pub fps: f64,
    /// Video codec
    pub codec: String,
    /// Total frame count, when the container reports one
    pub frame_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ProbeDoc {
    #[serde(default)]
    streams: Vec<StreamDoc>,
    format: Option<FormatDoc>,
}

#[derive(Debug, Deserialize)]
struct StreamDoc {
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    nb_frames: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FormatDoc {
    duration: Option<String>,
}

/// Probe a video file for geometry, frame rate, duration and frame count.
///
/// Fails when the file is absent, ffprobe is missing, or the container has
/// no video stream; all three abort the run before any artifact exists.
pub async fn probe_video(path: impl AsRef<Path>) -> MediaResult<VideoInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=codec_name,width,height,avg_frame_rate,r_frame_rate,nb_frames",
            "-show_entries",
            "format=duration",
            "-print_format",
            "json",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: format!("probe of {} failed", path.display()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).into_owned()),
        });
    }

    let doc: ProbeDoc = serde_json::from_slice(&output.stdout)?;

    let stream = doc
        .streams
        .first()
        .ok_or_else(|| MediaError::InvalidVideo(format!("{} has no video stream", path.display())))?;

    let duration = doc
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    // avg_frame_rate reflects what actually gets decoded; r_frame_rate is
    // only a fallback for containers that leave it at 0/0.
    let fps = [&stream.avg_frame_rate, &stream.r_frame_rate]
        .into_iter()
        .flatten()
        .find_map(|r| rate_to_fps(r))
        .unwrap_or(30.0);

    Ok(VideoInfo {
        duration,
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
        fps,
        codec: stream.codec_name.clone().unwrap_or_default(),
        frame_count: stream.nb_frames.as_deref().and_then(|n| n.parse().ok()),
    })
}

/// ffprobe reports rates as a fraction ("30000/1001") or plain decimal.
fn rate_to_fps(rate: &str) -> Option<f64> {
    match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            (den > 0.0).then(|| num / den)
        }
        None => rate.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_fraction() {
        assert!((rate_to_fps("25/1").unwrap() - 25.0).abs() < 1e-9);
        assert!((rate_to_fps("30000/1001").unwrap() - 29.97).abs() < 0.01);
    }

    #[test]
    fn test_rate_decimal() {
        assert!((rate_to_fps("23.976").unwrap() - 23.976).abs() < 1e-9);
    }

    #[test]
    fn test_rate_degenerate() {
        assert!(rate_to_fps("0/0").is_none());
        assert!(rate_to_fps("garbage").is_none());
    }

    #[test]
    fn test_probe_doc_parsing() {
        let json = r#"{
            "streams": [{
                "codec_name": "h264",
                "width": 1920,
                "height": 1080,
                "avg_frame_rate": "30/1",
                "r_frame_rate": "30/1",
                "nb_frames": "900"
            }],
            "format": { "duration": "30.000000" }
        }"#;
        let doc: ProbeDoc = serde_json::from_str(json).unwrap();
        assert_eq!(doc.streams.len(), 1);
        assert_eq!(doc.streams[0].nb_frames.as_deref(), Some("900"));
        assert_eq!(
            doc.format.unwrap().duration.as_deref(),
            Some("30.000000")
        );
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let err = probe_video("/nonexistent/video.mp4").await.unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
