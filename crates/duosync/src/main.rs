mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use duosync_core::alignment::{write_sidecar, Aligner, CommandAligner, SidecarAligner};
use duosync_core::config::{DebugFrames, StitchConfig, ToolPaths};
use duosync_core::media::Ffmpeg;
use duosync_core::pipeline::{self, StitchOutcome};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = cli::Cli::parse();

    match cli.command {
        cli::Command::Stitch {
            video_a,
            video_b,
            output_dir,
            container,
            alignment,
            no_alignment_json,
            skip_existing,
            keep_temp,
            debug_frames,
            debug_every,
            debug_font,
            tools,
        } => {
            info!(?video_a, ?video_b, ?output_dir, "starting stitch");

            let mut config = StitchConfig::new(video_a, video_b, output_dir);
            config.container = container;
            config.alignment_file = alignment;
            config.write_alignment_json = !no_alignment_json;
            config.skip_existing = skip_existing;
            config.keep_temp = keep_temp;
            config.debug_frames = debug_frames.map(|dir| DebugFrames {
                dir,
                every: debug_every,
                font: debug_font,
            });
            config.tools = tool_paths(tools);

            let aligner = make_aligner(&config);
            let media = Ffmpeg::new(&config.tools);

            match pipeline::run_pipeline(&config, aligner.as_ref(), &media)
                .context("stitch failed")?
            {
                StitchOutcome::Skipped { output } => {
                    warn!(?output, "output exists and --skip-existing is set, nothing done");
                }
                StitchOutcome::Completed(report) => {
                    info!(
                        output = ?report.output,
                        offset_frames = report.offset.frames,
                        width = report.layout.width,
                        height = report.layout.height,
                        frames = report.stats.frames_written,
                        padded = report.stats.padded_frames,
                        "stitch complete"
                    );
                }
            }
            Ok(())
        }
        cli::Command::Align {
            video_a,
            video_b,
            output,
            tools,
        } => {
            let aligner = CommandAligner::new(&tools.aligner);
            let (results, offset) = pipeline::align_pair(&aligner, &video_a, &video_b)?;

            let output = output.unwrap_or_else(|| {
                StitchConfig::new(&video_a, &video_b, ".").alignment_json_path()
            });
            write_sidecar(&output, &results).context("failed to write alignment results")?;

            info!(
                ?output,
                offset_frames = offset.frames,
                audio_offset_seconds = offset.audio_offset_seconds,
                "alignment written"
            );
            Ok(())
        }
    }
}

fn tool_paths(args: cli::ToolArgs) -> ToolPaths {
    ToolPaths {
        ffmpeg: args.ffmpeg,
        ffprobe: args.ffprobe,
        aligner: args.aligner,
    }
}

fn make_aligner(config: &StitchConfig) -> Box<dyn Aligner> {
    match &config.alignment_file {
        Some(path) => Box::new(SidecarAligner::new(path)),
        None => Box::new(CommandAligner::new(&config.tools.aligner)),
    }
}
