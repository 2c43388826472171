use std::io::Read;
use std::process::{Child, ExitStatus};
use std::thread::{self, JoinHandle};

use tracing::error;

use crate::error::MediaError;

/// Reads a child's stderr on a background thread so a chatty process
/// never stalls on a full pipe while we stream frames through it.
pub(crate) struct StderrDrain(Option<JoinHandle<String>>);

impl StderrDrain {
    pub(crate) fn spawn(child: &mut Child) -> Self {
        let handle = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf);
                String::from_utf8_lossy(&buf).trim().to_string()
            })
        });
        Self(handle)
    }

    /// Everything the child wrote. Only complete once the child has exited.
    fn collect(&mut self) -> String {
        self.0
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or_default()
    }
}

/// Reap `child`; a non-zero exit becomes [`MediaError::ToolFailed`] carrying its stderr.
pub(crate) fn wait_checked(
    child: &mut Child,
    tool: &str,
    stderr: &mut StderrDrain,
) -> Result<ExitStatus, MediaError> {
    let status = child.wait().map_err(|source| MediaError::Wait {
        tool: tool.to_string(),
        source,
    })?;
    let stderr = stderr.collect();

    if !status.success() {
        error!(%tool, %status, %stderr, "media process failed");
        return Err(MediaError::ToolFailed {
            tool: tool.to_string(),
            status,
            stderr,
        });
    }
    Ok(status)
}

#[cfg(all(test, unix))]
pub(crate) mod tests {
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::process::{Command, Stdio};

    use super::*;

    /// Write an executable `/bin/sh` script standing in for a media tool.
    pub(crate) fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn spawn(script: &Path) -> Child {
        Command::new(script)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap()
    }

    #[test]
    fn failure_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake_tool(dir.path(), "tool", "echo 'Invalid data found' >&2\nexit 3");

        let mut child = spawn(&script);
        let mut drain = StderrDrain::spawn(&mut child);
        let err = wait_checked(&mut child, "tool", &mut drain).unwrap_err();

        let MediaError::ToolFailed { status, stderr, .. } = err else {
            panic!("expected ToolFailed");
        };
        assert_eq!(status.code(), Some(3));
        assert_eq!(stderr, "Invalid data found");
    }

    #[test]
    fn large_stderr_does_not_block() {
        let dir = tempfile::tempdir().unwrap();
        // well past a 64 KiB pipe buffer
        let script = fake_tool(dir.path(), "tool", "head -c 300000 /dev/zero | tr '\\0' x >&2");

        let mut child = spawn(&script);
        let mut drain = StderrDrain::spawn(&mut child);
        assert!(wait_checked(&mut child, "tool", &mut drain).unwrap().success());
    }
}
