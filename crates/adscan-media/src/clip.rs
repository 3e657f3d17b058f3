//! Clip extraction.

use std::path::Path;
use tracing::info;

use crate::command::{run_ffmpeg, FfmpegCommand};
use crate::error::MediaResult;

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "fast";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_CRF: u8 = 18;

/// Video encoding configuration shared by the clip exporter and the
/// visualization writer.
#[derive(Debug, Clone)]
pub struct EncodingConfig {
    /// Video codec (e.g., "libx264")
    pub codec: String,
    /// Encoding preset (e.g., "fast", "medium", "slow")
    pub preset: String,
    /// Constant Rate Factor (quality, 0-51, lower is better)
    pub crf: u8,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: DEFAULT_CRF,
        }
    }
}

/// Extract `[start_secs, end_secs)` from a video file into an independent,
/// audio-free clip.
///
/// Each call seeks the source independently; callers run extractions
/// sequentially and treat a failure as recoverable for that clip only.
pub async fn export_clip<P: AsRef<Path>>(
    input: P,
    output: P,
    start_secs: f64,
    end_secs: f64,
    encoding: &EncodingConfig,
) -> MediaResult<()> {
    let input = input.as_ref();
    let output = output.as_ref();
    let duration = (end_secs - start_secs).max(0.0);

    info!(
        "Extracting clip: {} -> {} (start: {:.2}s, duration: {:.2}s)",
        input.display(),
        output.display(),
        start_secs,
        duration
    );

    let cmd = FfmpegCommand::new(input, output)
        .seek(start_secs)
        .duration(duration)
        .video_codec(&encoding.codec)
        .preset(&encoding.preset)
        .crf(encoding.crf)
        .no_audio();

    run_ffmpeg(&cmd).await?;

    info!("Clip extracted: {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_defaults() {
        let encoding = EncodingConfig::default();
        assert_eq!(encoding.codec, "libx264");
        assert_eq!(encoding.preset, "fast");
        assert_eq!(encoding.crf, 18);
    }
}
