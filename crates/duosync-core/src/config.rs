use std::path::{Path, PathBuf};

/// Marks intermediates we create and later delete, so they never collide
/// with a user's own files in the output directory.
const TEMP_TAG: &str = "duosync-tmp";

/// Executables for the external collaborators.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    /// Audio aligner CLI (`alignment_info_by_sound_track`).
    pub aligner: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            aligner: PathBuf::from("alignment_info_by_sound_track"),
        }
    }
}

/// Where composite debug snapshots go and how often.
#[derive(Debug, Clone)]
pub struct DebugFrames {
    pub dir: PathBuf,
    /// Save every Nth composite frame (1 = every frame).
    pub every: u32,
    /// TrueType font for the text overlay; text is skipped when unset or unreadable.
    pub font: Option<PathBuf>,
}

/// Parameters for one stitching run.
#[derive(Debug, Clone)]
pub struct StitchConfig {
    /// Left-hand video. Its audio track is kept.
    pub video_a: PathBuf,
    /// Right-hand video.
    pub video_b: PathBuf,
    pub output_dir: PathBuf,
    /// Extension of the combined output container.
    pub container: String,
    /// Load alignment from this sidecar instead of running the aligner.
    pub alignment_file: Option<PathBuf>,
    /// Write the raw alignment results next to the output.
    pub write_alignment_json: bool,
    /// Skip the whole run if the combined output already exists.
    pub skip_existing: bool,
    /// Leave the intermediate audio and silent video on disk.
    pub keep_temp: bool,
    pub debug_frames: Option<DebugFrames>,
    pub tools: ToolPaths,
}

impl StitchConfig {
    pub fn new(video_a: impl Into<PathBuf>, video_b: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            video_a: video_a.into(),
            video_b: video_b.into(),
            output_dir: output_dir.into(),
            container: "avi".to_string(),
            alignment_file: None,
            write_alignment_json: true,
            skip_existing: false,
            keep_temp: false,
            debug_frames: None,
            tools: ToolPaths::default(),
        }
    }

    fn combined_stem(&self) -> String {
        format!("combined_{}_{}", file_stem(&self.video_a), file_stem(&self.video_b))
    }

    /// `combined_<a>_<b>.<container>` in the output directory.
    pub fn combined_video_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", self.combined_stem(), self.container))
    }

    /// `combined_<a>_<b>.json` in the output directory.
    pub fn alignment_json_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.json", self.combined_stem()))
    }

    /// Intermediate WAV extracted from stream A: `<a>.duosync-tmp.wav`.
    pub fn temp_audio_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}.{TEMP_TAG}.wav", file_stem(&self.video_a)))
    }

    /// Composite video before muxing: `combined_<a>_<b>.silent.duosync-tmp.avi`.
    pub fn temp_silent_video_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}.silent.{TEMP_TAG}.avi", self.combined_stem()))
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string())
}
