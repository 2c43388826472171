use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "duosync", about = "Align two recordings by sound and stitch them side by side")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Align, composite and mux two videos into one side-by-side file.
    Stitch {
        /// Left-hand video; its audio track is kept.
        video_a: PathBuf,

        /// Right-hand video.
        video_b: PathBuf,

        /// Directory for the combined video and its alignment sidecar.
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Container extension of the combined video.
        #[arg(long, default_value = "avi")]
        container: String,

        /// Reuse a saved alignment JSON instead of running the aligner.
        #[arg(long)]
        alignment: Option<PathBuf>,

        /// Do not write the alignment sidecar next to the output.
        #[arg(long)]
        no_alignment_json: bool,

        /// Skip the run when the combined video already exists.
        #[arg(long)]
        skip_existing: bool,

        /// Keep the intermediate WAV and silent video.
        #[arg(long)]
        keep_temp: bool,

        /// Directory to save composite frames with side overlays.
        #[arg(long)]
        debug_frames: Option<PathBuf>,

        /// Save every Nth composite frame to --debug-frames.
        #[arg(long, default_value_t = 30)]
        debug_every: u32,

        /// TrueType font used for debug frame labels.
        #[arg(long)]
        debug_font: Option<PathBuf>,

        #[command(flatten)]
        tools: ToolArgs,
    },

    /// Run the audio aligner only and write its results as JSON.
    Align {
        video_a: PathBuf,

        video_b: PathBuf,

        /// Where to write the results (default: combined_<a>_<b>.json in the current directory).
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        tools: ToolArgs,
    },
}

#[derive(Args)]
pub struct ToolArgs {
    /// ffmpeg executable.
    #[arg(long, default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,

    /// ffprobe executable.
    #[arg(long, default_value = "ffprobe")]
    pub ffprobe: PathBuf,

    /// Audio aligner executable.
    #[arg(long, default_value = "alignment_info_by_sound_track")]
    pub aligner: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn stitch_defaults() {
        let cli = Cli::try_parse_from(["duosync", "stitch", "a.mp4", "b.mp4"]).unwrap();
        let Command::Stitch {
            output_dir,
            container,
            skip_existing,
            debug_every,
            tools,
            ..
        } = cli.command
        else {
            panic!("expected stitch");
        };
        assert_eq!(output_dir, PathBuf::from("."));
        assert_eq!(container, "avi");
        assert!(!skip_existing);
        assert_eq!(debug_every, 30);
        assert_eq!(tools.ffmpeg, PathBuf::from("ffmpeg"));
    }

    #[test]
    fn stitch_requires_two_videos() {
        assert!(Cli::try_parse_from(["duosync", "stitch", "a.mp4"]).is_err());
    }
}
