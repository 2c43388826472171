use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use anyhow::{bail, Context, Result};
use image::RgbImage;
use tracing::{debug, error, info};

use crate::config::ToolPaths;
use crate::error::MediaError;
use crate::process::{wait_checked, StderrDrain};

/// A sequential consumer of composite frames.
pub trait FrameSink {
    /// Append one frame. Every frame must match the sink's dimensions.
    fn write_frame(&mut self, image: &RgbImage) -> Result<()>;

    /// Flush and close the sink. Calling it twice is a no-op.
    fn finish(&mut self) -> Result<()>;
}

/// Encodes RGB24 frames into a silent MJPEG AVI by piping them into ffmpeg.
pub struct VideoEncoder {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    tool: String,
    stderr: StderrDrain,
    output: PathBuf,
    width: u32,
    height: u32,
    frames_written: u64,
}

impl VideoEncoder {
    pub fn create(
        output: &Path,
        width: u32,
        height: u32,
        fps: f64,
        tools: &ToolPaths,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!("invalid encoder dimensions: {width}x{height}");
        }

        info!(?output, width, height, fps, "spawning ffmpeg encoder process");

        let tool = tools.ffmpeg.display().to_string();
        let mut child = Command::new(&tools.ffmpeg)
            .args(["-y", "-v", "error"])
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24"])
            .args(["-s", &format!("{width}x{height}")])
            .args(["-r", &fps.to_string()])
            .args(["-i", "pipe:0"])
            .args(["-an", "-c:v", "mjpeg", "-q:v", "1"])
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| MediaError::Spawn {
                tool: tool.clone(),
                source,
            })?;

        let stdin = child.stdin.take().context("ffmpeg stdin not available")?;
        let stderr = StderrDrain::spawn(&mut child);

        Ok(Self {
            child: Some(child),
            stdin: Some(stdin),
            tool,
            stderr,
            output: output.to_path_buf(),
            width,
            height,
            frames_written: 0,
        })
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl FrameSink for VideoEncoder {
    fn write_frame(&mut self, image: &RgbImage) -> Result<()> {
        if image.dimensions() != (self.width, self.height) {
            bail!(
                "frame is {}x{}, encoder expects {}x{}",
                image.width(),
                image.height(),
                self.width,
                self.height
            );
        }

        let stdin = self
            .stdin
            .as_mut()
            .context("encoder already finished")?;

        if let Err(e) = stdin.write_all(image.as_raw()) {
            error!(frame = self.frames_written, %e, "failed to write to ffmpeg encoder");
            // A closed pipe usually means ffmpeg gave up; its exit status says why.
            self.finish()
                .with_context(|| format!("ffmpeg encoder exited at frame {}", self.frames_written))?;
            return Err(e).with_context(|| {
                format!("failed to write frame {} to ffmpeg", self.frames_written)
            });
        }
        self.frames_written += 1;

        debug!(frame = self.frames_written, "encoded frame");
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        // Closing stdin signals end of stream.
        drop(self.stdin.take());

        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        wait_checked(&mut child, &self.tool, &mut self.stderr)?;

        info!(
            output = ?self.output,
            frames = self.frames_written,
            "silent video written"
        );
        Ok(())
    }
}

impl Drop for VideoEncoder {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            drop(self.stdin.take());
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
