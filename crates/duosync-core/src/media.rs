use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{error, info};

use crate::config::ToolPaths;
use crate::error::MediaError;

/// The external steps that need a full media tool: pulling audio out of a
/// container and muxing the final file.
pub trait MediaTool {
    /// Extract the audio track of `video` to a 16-bit PCM WAV at `wav`.
    fn extract_audio(&self, video: &Path, wav: &Path) -> Result<PathBuf, MediaError>;

    /// Combine `audio` with `silent_video` into `output`, keeping video quality.
    fn mux(&self, audio: &Path, silent_video: &Path, output: &Path) -> Result<PathBuf, MediaError>;
}

/// [`MediaTool`] backed by the ffmpeg CLI.
pub struct Ffmpeg {
    program: PathBuf,
}

impl Ffmpeg {
    pub fn new(tools: &ToolPaths) -> Self {
        Self {
            program: tools.ffmpeg.clone(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-y", "-v", "error"]);
        cmd
    }

    fn run(&self, mut cmd: Command, output: &Path) -> Result<PathBuf, MediaError> {
        let tool = self.program.display().to_string();
        info!(%tool, ?output, "running ffmpeg");

        let result = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| MediaError::Spawn {
                tool: tool.clone(),
                source,
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            error!(%tool, status = %result.status, %stderr, "ffmpeg failed");
            return Err(MediaError::ToolFailed {
                tool,
                status: result.status,
                stderr,
            });
        }

        if !output.exists() {
            return Err(MediaError::MissingOutput {
                tool,
                path: output.to_path_buf(),
            });
        }

        Ok(output.to_path_buf())
    }
}

impl MediaTool for Ffmpeg {
    fn extract_audio(&self, video: &Path, wav: &Path) -> Result<PathBuf, MediaError> {
        let mut cmd = self.command();
        cmd.arg("-i")
            .arg(video)
            .args(["-vn", "-acodec", "pcm_s16le"])
            .arg(wav);
        let path = self.run(cmd, wav)?;
        info!(?video, ?wav, "audio extracted");
        Ok(path)
    }

    fn mux(&self, audio: &Path, silent_video: &Path, output: &Path) -> Result<PathBuf, MediaError> {
        let mut cmd = self.command();
        cmd.arg("-i")
            .arg(audio)
            .arg("-i")
            .arg(silent_video)
            .args(["-q:v", "0"])
            .arg(output);
        let path = self.run(cmd, output)?;
        info!(?output, "audio and video muxed");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let tools = ToolPaths {
            ffmpeg: PathBuf::from("/nonexistent/duosync-ffmpeg"),
            ..ToolPaths::default()
        };
        let err = Ffmpeg::new(&tools)
            .extract_audio(Path::new("a.mp4"), Path::new("a.wav"))
            .unwrap_err();
        assert!(matches!(err, MediaError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_reported() {
        let tools = ToolPaths {
            ffmpeg: PathBuf::from("false"),
            ..ToolPaths::default()
        };
        let err = Ffmpeg::new(&tools)
            .mux(Path::new("a.wav"), Path::new("v.avi"), Path::new("out.avi"))
            .unwrap_err();
        assert!(matches!(err, MediaError::ToolFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn success_without_output_is_reported() {
        let tools = ToolPaths {
            ffmpeg: PathBuf::from("true"),
            ..ToolPaths::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("never.avi");
        let err = Ffmpeg::new(&tools)
            .mux(Path::new("a.wav"), Path::new("v.avi"), &out)
            .unwrap_err();
        assert!(matches!(err, MediaError::MissingOutput { .. }));
    }
}
