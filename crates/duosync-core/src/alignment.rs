//! Boundary to the external audio aligner and its JSON sidecar.
//!
//! The cross-correlation itself happens outside this crate. What comes back
//! is one [`AlignmentResult`] per input file, carrying the signed `trim` in
//! seconds and the probed stream metadata. Fields this crate does not use are
//! preserved so the sidecar records the aligner's output verbatim.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info};

use crate::error::{AlignmentError, MediaError};

/// Per-file output of the aligner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentResult {
    /// Seconds to cut from the start of this file to line it up with the others.
    pub trim: f64,
    #[serde(default)]
    pub orig_streams: Vec<StreamInfo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Metadata for one stream of an aligned file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AlignmentResult {
    pub fn new(trim: f64, fps: Option<f64>) -> Self {
        Self {
            trim,
            orig_streams: vec![StreamInfo {
                fps,
                extra: Map::new(),
            }],
            extra: Map::new(),
        }
    }

    /// Frame rate of the first stream that reports one.
    pub fn fps(&self) -> Option<f64> {
        self.orig_streams.iter().find_map(|s| s.fps)
    }
}

/// Pulls out `(trim_a, trim_b, fps)` from a two-file alignment. The frame
/// rate is taken from stream A.
pub fn pair_parameters(results: &[AlignmentResult]) -> Result<(f64, f64, f64), AlignmentError> {
    let [a, b] = results else {
        return Err(AlignmentError::ResultCount {
            expected: 2,
            got: results.len(),
        });
    };
    let fps = a.fps().ok_or(AlignmentError::MissingFps { index: 0 })?;
    Ok((a.trim, b.trim, fps))
}

/// Produces one alignment result per input, in input order.
pub trait Aligner {
    fn align(&self, inputs: &[PathBuf]) -> Result<Vec<AlignmentResult>, AlignmentError>;
}

/// Shapes the aligner is known to print with `--json`.
#[derive(Deserialize)]
#[serde(untagged)]
enum AlignerOutput {
    Results(Vec<AlignmentResult>),
    EditList { edit_list: Vec<(String, AlignmentResult)> },
}

impl AlignerOutput {
    fn into_results(self) -> Vec<AlignmentResult> {
        match self {
            AlignerOutput::Results(r) => r,
            AlignerOutput::EditList { edit_list } => {
                edit_list.into_iter().map(|(_, r)| r).collect()
            }
        }
    }
}

pub fn parse_aligner_output(json: &str) -> Result<Vec<AlignmentResult>, AlignmentError> {
    let output: AlignerOutput = serde_json::from_str(json)?;
    Ok(output.into_results())
}

fn check_count(
    results: Vec<AlignmentResult>,
    expected: usize,
) -> Result<Vec<AlignmentResult>, AlignmentError> {
    if results.len() != expected {
        error!(expected, got = results.len(), "alignment result count mismatch");
        return Err(AlignmentError::ResultCount {
            expected,
            got: results.len(),
        });
    }
    Ok(results)
}

/// Runs the aligner CLI as a subprocess and parses its JSON report.
pub struct CommandAligner {
    program: PathBuf,
}

impl CommandAligner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Aligner for CommandAligner {
    fn align(&self, inputs: &[PathBuf]) -> Result<Vec<AlignmentResult>, AlignmentError> {
        let tool = self.program.display().to_string();
        info!(%tool, ?inputs, "running audio aligner");

        let output = Command::new(&self.program)
            .arg("--json")
            .args(inputs)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| MediaError::Spawn {
                tool: tool.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            error!(%tool, status = %output.status, %stderr, "aligner failed");
            return Err(MediaError::ToolFailed {
                tool,
                status: output.status,
                stderr,
            }
            .into());
        }

        let results = parse_aligner_output(&String::from_utf8_lossy(&output.stdout))?;
        let results = check_count(results, inputs.len())?;
        info!(trims = ?results.iter().map(|r| r.trim).collect::<Vec<_>>(), "alignment complete");
        Ok(results)
    }
}

/// Replays a previously saved sidecar instead of re-running the aligner.
pub struct SidecarAligner {
    path: PathBuf,
}

impl SidecarAligner {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Aligner for SidecarAligner {
    fn align(&self, inputs: &[PathBuf]) -> Result<Vec<AlignmentResult>, AlignmentError> {
        info!(path = ?self.path, "loading alignment sidecar");
        let results = read_sidecar(&self.path)?;
        check_count(results, inputs.len())
    }
}

pub fn read_sidecar(path: &Path) -> Result<Vec<AlignmentResult>, AlignmentError> {
    let json = fs::read_to_string(path)?;
    parse_aligner_output(&json)
}

/// Write results as 4-space indented JSON.
pub fn write_sidecar(path: &Path, results: &[AlignmentResult]) -> Result<(), AlignmentError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    results.serialize(&mut ser)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, &buf)?;

    info!(?path, bytes = buf.len(), "alignment sidecar written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALIGNER_JSON: &str = r#"[
        {
            "trim": 1.52,
            "pad": 0.0,
            "orig_duration": 64.2,
            "orig_streams": [
                {"type": "Video", "fps": 29.97, "resolution": [[1920, 1080], "1920x1080"]},
                {"type": "Audio", "sample_rate": 48000}
            ]
        },
        {
            "trim": 0.0,
            "pad": 1.52,
            "orig_streams": [{"type": "Video", "fps": 29.97}]
        }
    ]"#;

    #[test]
    fn parses_bare_result_list() {
        let results = parse_aligner_output(ALIGNER_JSON).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].trim, 1.52);
        assert_eq!(results[0].fps(), Some(29.97));
        assert_eq!(results[0].extra["pad"], serde_json::json!(0.0));
        assert_eq!(results[0].orig_streams[1].fps, None);
    }

    #[test]
    fn parses_edit_list_shape() {
        let json = r#"{"edit_list": [
            ["a.mp4", {"trim": 0.25, "orig_streams": [{"fps": 25.0}]}],
            ["b.mp4", {"trim": 0.0, "orig_streams": [{"fps": 25.0}]}]
        ]}"#;
        let results = parse_aligner_output(json).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].trim, 0.25);
    }

    #[test]
    fn pair_parameters_use_stream_a_fps() {
        let results = vec![
            AlignmentResult::new(0.5, Some(30.0)),
            AlignmentResult::new(0.0, Some(60.0)),
        ];
        assert_eq!(pair_parameters(&results).unwrap(), (0.5, 0.0, 30.0));
    }

    #[test]
    fn missing_fps_is_an_error() {
        let results = vec![
            AlignmentResult::new(0.5, None),
            AlignmentResult::new(0.0, Some(30.0)),
        ];
        assert!(matches!(
            pair_parameters(&results),
            Err(AlignmentError::MissingFps { index: 0 })
        ));
    }

    #[test]
    fn wrong_result_count_is_an_error() {
        let results = vec![AlignmentResult::new(0.5, Some(30.0))];
        assert!(matches!(
            pair_parameters(&results),
            Err(AlignmentError::ResultCount { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn sidecar_preserves_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("combined_a_b.json");
        let results = parse_aligner_output(ALIGNER_JSON).unwrap();

        write_sidecar(&path, &results).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n    {"), "expected 4-space indentation");

        let reloaded = read_sidecar(&path).unwrap();
        assert_eq!(reloaded, results);
    }

    #[test]
    fn sidecar_aligner_checks_input_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("align.json");
        write_sidecar(&path, &[AlignmentResult::new(0.1, Some(30.0))]).unwrap();

        let aligner = SidecarAligner::new(&path);
        let inputs = vec![PathBuf::from("a.mp4"), PathBuf::from("b.mp4")];
        assert!(matches!(
            aligner.align(&inputs),
            Err(AlignmentError::ResultCount { expected: 2, got: 1 })
        ));
    }
}
