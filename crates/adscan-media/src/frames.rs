//! Raw frame streaming over FFmpeg pipes.
//!
//! Decoding reads `-f rawvideo -pix_fmt rgb24` frames from an FFmpeg child's
//! stdout; encoding feeds annotated frames back into a second FFmpeg child's
//! stdin. Both children are spawned with `kill_on_drop` so an early exit
//! from the frame loop cannot leak a process or a half-open pipe.

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::clip::EncodingConfig;
use crate::error::{MediaError, MediaResult};

/// A decoded RGB24 raster frame.
#[derive(Debug, Clone)]
pub struct RgbFrame {
    pub width: u32,
    pub height: u32,
    /// Packed RGB bytes, `width * height * 3` long.
    pub data: Vec<u8>,
}

impl RgbFrame {
    /// Frame area in pixels.
    pub fn area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }
}

const BYTES_PER_PIXEL: usize = 3;

/// Sequential frame reader over an FFmpeg rawvideo pipe.
pub struct FrameStream {
    child: Child,
    stdout: ChildStdout,
    width: u32,
    height: u32,
    frame_len: usize,
}

impl FrameStream {
    /// Spawn an FFmpeg decoder for `path` producing RGB24 frames at the
    /// video's native size and frame rate.
    pub async fn open(path: impl AsRef<Path>, width: u32, height: u32) -> MediaResult<Self> {
        let path = path.as_ref();

        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        if width == 0 || height == 0 {
            return Err(MediaError::InvalidVideo(format!(
                "Cannot stream frames for {}x{} video",
                width, height
            )));
        }

        debug!("Spawning FFmpeg decoder for {}", path.display());

        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-i"])
            .arg(path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MediaError::internal("FFmpeg decoder stdout not captured"))?;

        Ok(Self {
            child,
            stdout,
            width,
            height,
            frame_len: width as usize * height as usize * BYTES_PER_PIXEL,
        })
    }

    /// Read the next frame; `None` once the stream is exhausted.
    pub async fn next_frame(&mut self) -> MediaResult<Option<RgbFrame>> {
        let mut data = vec![0u8; self.frame_len];
        let mut filled = 0;

        while filled < self.frame_len {
            let n = self.stdout.read(&mut data[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled == 0 {
            return Ok(None);
        }
        if filled < self.frame_len {
            return Err(MediaError::InvalidVideo(format!(
                "Truncated frame: expected {} bytes, got {}",
                self.frame_len, filled
            )));
        }

        Ok(Some(RgbFrame {
            width: self.width,
            height: self.height,
            data,
        }))
    }

    /// Wait for the decoder to exit after the stream has been drained.
    pub async fn finish(mut self) -> MediaResult<()> {
        drop(self.stdout);
        let status = self.child.wait().await?;
        if !status.success() {
            // EOF already delivered every decodable frame; a late non-zero
            // status usually means trailing container damage.
            warn!("FFmpeg decoder exited with status {:?}", status.code());
        }
        Ok(())
    }
}

/// Sequential frame writer encoding the visualization output.
pub struct VisualizationWriter {
    child: Child,
    stdin: Option<ChildStdin>,
    /// Drains encoder stderr so a chatty process can never fill the pipe
    /// and stall the frame loop.
    stderr_task: JoinHandle<String>,
    frame_len: usize,
}

impl VisualizationWriter {
    /// Spawn an FFmpeg encoder writing H.264 to `path`, expecting RGB24
    /// frames of the given geometry on stdin. No audio track is produced.
    pub async fn create(
        path: impl AsRef<Path>,
        width: u32,
        height: u32,
        fps: f64,
        encoding: &EncodingConfig,
    ) -> MediaResult<Self> {
        let path = path.as_ref();

        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        debug!("Spawning FFmpeg encoder for {}", path.display());

        let mut child = Command::new("ffmpeg")
            .args([
                "-y",
                "-v",
                "error",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgb24",
                "-s",
                &format!("{}x{}", width, height),
                "-r",
                &format!("{:.3}", fps),
                "-i",
                "-",
                "-c:v",
                &encoding.codec,
                "-preset",
                &encoding.preset,
                "-crf",
                &encoding.crf.to_string(),
                "-pix_fmt",
                "yuv420p",
                "-an",
            ])
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| MediaError::internal("FFmpeg encoder stdin not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("FFmpeg encoder stderr not captured"))?;

        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = BufReader::new(stderr).read_to_string(&mut buf).await;
            buf
        });

        Ok(Self {
            child,
            stdin: Some(stdin),
            stderr_task,
            frame_len: width as usize * height as usize * BYTES_PER_PIXEL,
        })
    }

    /// Append one frame to the visualization stream.
    pub async fn write_frame(&mut self, frame: &RgbFrame) -> MediaResult<()> {
        if frame.data.len() != self.frame_len {
            return Err(MediaError::internal(format!(
                "Frame size mismatch: expected {} bytes, got {}",
                self.frame_len,
                frame.data.len()
            )));
        }

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| MediaError::internal("Encoder already finished"))?;
        stdin.write_all(&frame.data).await?;
        Ok(())
    }

    /// Close the input pipe and wait for the encoder to flush and exit.
    pub async fn finish(mut self) -> MediaResult<()> {
        // Dropping stdin signals EOF to the encoder.
        drop(self.stdin.take());

        let status = self.child.wait().await?;
        let stderr = self.stderr_task.await.unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            Err(MediaError::ffmpeg_failed(
                "Visualization encoder failed",
                Some(stderr),
                status.code(),
            ))
        }
    }
}
