//! FFmpeg invocation.
//!
//! A small builder assembles the argument list (seek and duration go before
//! `-i`, codec options after), and [`run_ffmpeg`] executes it to completion.
//! There is deliberately no cancellation or timeout path: an invocation
//! either finishes or fails with the process's own stderr attached.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Builder for a single FFmpeg invocation.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    input: PathBuf,
    output: PathBuf,
    /// Options placed before `-i` (seek, duration)
    pre_input: Vec<String>,
    /// Options placed after `-i` (codec, quality, stream mapping)
    post_input: Vec<String>,
}

impl FfmpegCommand {
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            pre_input: Vec::new(),
            post_input: Vec::new(),
        }
    }

    /// Seek the input before decoding starts.
    pub fn seek(mut self, seconds: f64) -> Self {
        self.opt_pre("-ss", format!("{:.3}", seconds));
        self
    }

    /// Limit how much of the input is read.
    pub fn duration(mut self, seconds: f64) -> Self {
        self.opt_pre("-t", format!("{:.3}", seconds));
        self
    }

    pub fn video_codec(mut self, codec: impl Into<String>) -> Self {
        self.opt("-c:v", codec);
        self
    }

    pub fn preset(mut self, preset: impl Into<String>) -> Self {
        self.opt("-preset", preset);
        self
    }

    pub fn crf(mut self, crf: u8) -> Self {
        self.opt("-crf", crf.to_string());
        self
    }

    pub fn pixel_format(mut self, format: impl Into<String>) -> Self {
        self.opt("-pix_fmt", format);
        self
    }

    pub fn fps(mut self, fps: f64) -> Self {
        self.opt("-r", format!("{:.3}", fps));
        self
    }

    /// Drop the audio stream from the output.
    pub fn no_audio(mut self) -> Self {
        self.post_input.push("-an".into());
        self
    }

    fn opt(&mut self, flag: &str, value: impl Into<String>) {
        self.post_input.push(flag.into());
        self.post_input.push(value.into());
    }

    fn opt_pre(&mut self, flag: &str, value: impl Into<String>) {
        self.pre_input.push(flag.into());
        self.pre_input.push(value.into());
    }

    /// Assemble the full argument list. Output is overwritten if present and
    /// FFmpeg's own log level is held at `error` so stderr stays diagnostic.
    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec!["-y".into(), "-v".into(), "error".into()];
        args.extend(self.pre_input.iter().cloned());
        args.push("-i".into());
        args.push(self.input.to_string_lossy().into_owned());
        args.extend(self.post_input.iter().cloned());
        args.push(self.output.to_string_lossy().into_owned());
        args
    }
}

/// Run an FFmpeg command to completion, capturing stderr for error context.
pub async fn run_ffmpeg(cmd: &FfmpegCommand) -> MediaResult<()> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

    let args = cmd.to_args();
    debug!("ffmpeg {}", args.join(" "));

    let output = Command::new("ffmpeg")
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if output.status.success() {
        Ok(())
    } else {
        Err(MediaError::ffmpeg_failed(
            "ffmpeg exited with an error",
            Some(String::from_utf8_lossy(&output.stderr).into_owned()),
            output.status.code(),
        ))
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arg_assembly_order() {
        let args = FfmpegCommand::new("in.mp4", "out.mp4")
            .seek(10.0)
            .duration(30.0)
            .video_codec("libx264")
            .crf(18)
            .to_args();

        // -ss/-t before -i, codec options after, output path last
        let ss = args.iter().position(|a| a == "-ss").unwrap();
        let t = args.iter().position(|a| a == "-t").unwrap();
        let i = args.iter().position(|a| a == "-i").unwrap();
        let codec = args.iter().position(|a| a == "-c:v").unwrap();
        assert!(ss < i && t < i && i < codec);
        assert_eq!(args.last().unwrap(), "out.mp4");
    }

    #[test]
    fn test_seek_and_duration_values() {
        let args = FfmpegCommand::new("in.mp4", "out.mp4")
            .seek(7.5)
            .duration(2.25)
            .to_args();
        assert!(args.windows(2).any(|w| w == ["-ss", "7.500"]));
        assert!(args.windows(2).any(|w| w == ["-t", "2.250"]));
    }

    #[test]
    fn test_no_audio_flag() {
        let args = FfmpegCommand::new("in.mp4", "out.mp4").no_audio().to_args();
        assert!(args.contains(&"-an".to_string()));
    }

    #[test]
    fn test_overwrite_and_log_level_always_present() {
        let args = FfmpegCommand::new("in.mp4", "out.mp4").to_args();
        assert_eq!(args[0], "-y");
        assert!(args.windows(2).any(|w| w == ["-v", "error"]));
    }
}
