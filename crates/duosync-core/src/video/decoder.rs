use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use anyhow::{bail, Context, Result};
use image::{DynamicImage, RgbImage};
use tracing::{debug, error, info, warn};

use super::frame::Frame;
use crate::config::ToolPaths;
use crate::error::MediaError;
use crate::process::{wait_checked, StderrDrain};

/// A sequential source of decoded frames.
pub trait FrameSource {
    /// Read the next frame, or `None` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Width of every frame this source yields.
    fn width(&self) -> u32;

    /// Height of every frame this source yields.
    fn height(&self) -> u32;

    /// Whether frames carry an alpha channel.
    fn has_alpha(&self) -> bool {
        false
    }

    /// Discard up to `count` frames. Returns how many were actually dropped.
    fn skip_frames(&mut self, count: u64) -> Result<u64> {
        let mut skipped = 0;
        while skipped < count {
            if self.next_frame()?.is_none() {
                warn!(requested = count, skipped, "source ended while skipping");
                break;
            }
            skipped += 1;
        }
        Ok(skipped)
    }
}

/// Video metadata obtained by probing with ffprobe.
#[derive(Debug, Clone, Copy)]
pub struct ProbeResult {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

pub fn probe(path: &Path, tools: &ToolPaths) -> Result<ProbeResult> {
    info!(?path, "probing video metadata with ffprobe");

    let output = Command::new(&tools.ffprobe)
        .args([
            "-v", "error",
            "-select_streams", "v:0",
            "-show_entries", "stream=width,height,r_frame_rate",
            "-of", "csv=p=0",
        ])
        .arg(path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .with_context(|| format!("failed to run {}, is ffmpeg installed?", tools.ffprobe.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!(%stderr, ?path, "ffprobe failed");
        bail!("ffprobe failed: {stderr}");
    }

    parse_probe_output(&String::from_utf8_lossy(&output.stdout))
}

/// Parse ffprobe's `width,height,num/den` line.
fn parse_probe_output(stdout: &str) -> Result<ProbeResult> {
    let parts: Vec<&str> = stdout.trim().split(',').collect();
    if parts.len() < 3 {
        error!(%stdout, "unexpected ffprobe output format, expected width,height,fps");
        bail!("unexpected ffprobe output: {stdout}");
    }

    let width: u32 = parts[0].parse().context("failed to parse width")?;
    let height: u32 = parts[1].parse().context("failed to parse height")?;

    let fps = if let Some((num, den)) = parts[2].split_once('/') {
        let num: f64 = num.parse().context("failed to parse fps numerator")?;
        let den: f64 = den.parse().context("failed to parse fps denominator")?;
        if den > 0.0 { num / den } else { 0.0 }
    } else {
        parts[2].parse().context("failed to parse fps")?
    };

    if fps <= 0.0 {
        warn!(fps, "video has non-positive fps, timestamps will be 0.0");
    }

    info!(width, height, fps, "probe completed");
    Ok(ProbeResult { width, height, fps })
}

/// Decodes video frames by piping raw RGB24 data from the ffmpeg CLI.
pub struct VideoDecoder {
    child: Child,
    tool: String,
    stderr: StderrDrain,
    /// Set once the child has been reaped; later reads report end of stream.
    exited: bool,
    width: u32,
    height: u32,
    fps: f64,
    frame_count: u32,
    frame_bytes: usize,
}

impl VideoDecoder {
    /// Open a video file for decoding.
    pub fn open(path: &Path, tools: &ToolPaths) -> Result<Self> {
        if !path.exists() {
            bail!("video file does not exist: {}", path.display());
        }

        let info = probe(path, tools)?;
        if info.width == 0 || info.height == 0 {
            bail!("invalid video dimensions: {}x{}", info.width, info.height);
        }

        info!(?path, "spawning ffmpeg decoder process");

        let tool = tools.ffmpeg.display().to_string();
        let mut child = Command::new(&tools.ffmpeg)
            .args(["-i"])
            .arg(path)
            .args([
                "-f", "rawvideo",
                "-pix_fmt", "rgb24",
                "-v", "error",
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| MediaError::Spawn {
                tool: tool.clone(),
                source,
            })?;
        let stderr = StderrDrain::spawn(&mut child);

        let frame_bytes = (info.width as usize) * (info.height as usize) * 3;

        info!(
            width = info.width,
            height = info.height,
            fps = info.fps,
            frame_bytes,
            "video decoder opened"
        );

        Ok(Self {
            child,
            tool,
            stderr,
            exited: false,
            width: info.width,
            height: info.height,
            fps: info.fps,
            frame_count: 0,
            frame_bytes,
        })
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Fill `buf` from the ffmpeg pipe. Returns fewer bytes only at end of stream.
    fn read_full(&mut self, buf: &mut [u8]) -> Result<usize> {
        let stdout = self
            .child
            .stdout
            .as_mut()
            .context("ffmpeg stdout not available")?;

        let mut read = 0;
        while read < buf.len() {
            match stdout.read(&mut buf[read..]) {
                Ok(0) => break,
                Ok(n) => read += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!(frame = self.frame_count, %e, "failed to read from ffmpeg pipe");
                    return Err(e).context("failed to read from ffmpeg pipe");
                }
            }
        }
        Ok(read)
    }

    /// Wait for ffmpeg after end of stream; a failed decode is an error, not EOF.
    fn reap(&mut self) -> Result<(), MediaError> {
        self.exited = true;
        wait_checked(&mut self.child, &self.tool, &mut self.stderr).map(|_| ())
    }
}

impl FrameSource for VideoDecoder {
    /// Read the next frame from the ffmpeg pipe, or `None` if the video is finished.
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.exited {
            return Ok(None);
        }

        let mut buf = vec![0u8; self.frame_bytes];
        let read = self.read_full(&mut buf)?;

        if read == 0 {
            self.reap().with_context(|| {
                format!("ffmpeg decode failed after {} frames", self.frame_count)
            })?;
            info!(total_frames = self.frame_count, "video stream ended");
            return Ok(None);
        }

        if read < self.frame_bytes {
            error!(
                read_bytes = read,
                expected_bytes = self.frame_bytes,
                frame = self.frame_count,
                "ffmpeg stream ended mid-frame"
            );
            self.reap().context("ffmpeg decode failed mid-frame")?;
            bail!(
                "ffmpeg stream ended mid-frame (read {read}/{} bytes)",
                self.frame_bytes,
            );
        }

        let image = RgbImage::from_raw(self.width, self.height, buf)
            .context("failed to create RgbImage from raw frame data")?;

        let frame_number = self.frame_count;
        let timestamp_seconds = if self.fps > 0.0 {
            frame_number as f64 / self.fps
        } else {
            0.0
        };
        self.frame_count += 1;

        debug!(frame_number, timestamp_seconds, "decoded frame");

        Ok(Some(Frame {
            image: DynamicImage::ImageRgb8(image),
            frame_number,
            timestamp_seconds,
        }))
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

impl Drop for VideoDecoder {
    fn drop(&mut self) {
        info!(total_frames = self.frame_count, "closing video decoder");
        if !self.exited {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
