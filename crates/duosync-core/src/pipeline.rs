use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::alignment::{pair_parameters, write_sidecar, Aligner, AlignmentResult};
use crate::audio::AudioBuffer;
use crate::compositor::{compose, CompositeLayout};
use crate::config::StitchConfig;
use crate::debug::{DebugRenderer, PairSummary};
use crate::media::MediaTool;
use crate::offset::{resolve_offset, FrameOffset};
use crate::pairing::FramePairer;
use crate::video::decoder::{FrameSource, VideoDecoder};
use crate::video::encoder::{FrameSink, VideoEncoder};

/// Counts from the compositing stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompositeStats {
    pub frames_written: u64,
    /// Frames where one side was padding.
    pub padded_frames: u64,
    pub debug_frames: u64,
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct StitchReport {
    pub output: PathBuf,
    pub offset: FrameOffset,
    pub layout: CompositeLayout,
    pub stats: CompositeStats,
    pub audio_samples_dropped: usize,
}

#[derive(Debug, Clone)]
pub enum StitchOutcome {
    /// `skip_existing` was set and the combined output was already there.
    Skipped { output: PathBuf },
    Completed(StitchReport),
}

/// Run the aligner on two files and resolve the frame offset.
pub fn align_pair(
    aligner: &dyn Aligner,
    video_a: &Path,
    video_b: &Path,
) -> Result<(Vec<AlignmentResult>, FrameOffset)> {
    let inputs = [video_a.to_path_buf(), video_b.to_path_buf()];
    let results = aligner.align(&inputs).context("audio alignment failed")?;
    let (trim_a, trim_b, fps) = pair_parameters(&results)?;
    info!(trim_a, trim_b, fps, "alignment received");

    let offset = resolve_offset(trim_a, trim_b, fps)?;
    Ok((results, offset))
}

/// Pair, compose and write every frame of two sources.
///
/// The sink is finished before returning so a failed encode surfaces here.
pub fn composite_streams<A, B, S>(
    a: A,
    b: B,
    offset: &FrameOffset,
    layout: &CompositeLayout,
    sink: &mut S,
    debug: Option<&DebugRenderer>,
) -> Result<CompositeStats>
where
    A: FrameSource,
    B: FrameSource,
    S: FrameSink + ?Sized,
{
    let mut stats = CompositeStats::default();

    for (index, pair) in FramePairer::new(a, b, offset)?.enumerate() {
        let pair = pair?;
        let index = index as u64;

        let composite = compose(layout, &pair.a.image, &pair.b.image)
            .with_context(|| format!("failed to compose frame pair {index}"))?;
        sink.write_frame(&composite)?;

        stats.frames_written += 1;
        if pair.padded.is_some() {
            stats.padded_frames += 1;
        }

        if let Some(renderer) = debug {
            if renderer.wants(index) {
                renderer
                    .save_composite(&composite, layout, &PairSummary::of(index, &pair))
                    .context("failed to save debug frame")?;
                stats.debug_frames += 1;
            }
        }
    }

    sink.finish()?;
    info!(
        frames = stats.frames_written,
        padded = stats.padded_frames,
        "compositing complete"
    );
    Ok(stats)
}

/// Intermediate files removed when dropped unless `keep` is set.
struct TempFiles {
    paths: Vec<PathBuf>,
    keep: bool,
}

impl TempFiles {
    fn new(keep: bool) -> Self {
        Self {
            paths: Vec::new(),
            keep,
        }
    }

    fn track(&mut self, path: &Path) -> PathBuf {
        self.paths.push(path.to_path_buf());
        path.to_path_buf()
    }
}

impl Drop for TempFiles {
    fn drop(&mut self) {
        if self.keep {
            info!(paths = ?self.paths, "keeping temporary files");
            return;
        }
        for path in &self.paths {
            if !path.exists() {
                continue;
            }
            match std::fs::remove_file(path) {
                Ok(()) => info!(?path, "removed temporary file"),
                Err(e) => warn!(?path, error = %e, "failed to remove temporary file"),
            }
        }
    }
}

/// Align, composite and mux two recordings into one side-by-side video.
pub fn run_pipeline(
    config: &StitchConfig,
    aligner: &dyn Aligner,
    media: &dyn MediaTool,
) -> Result<StitchOutcome> {
    for input in [&config.video_a, &config.video_b] {
        if !input.exists() {
            bail!("input video does not exist: {}", input.display());
        }
    }

    let output = config.combined_video_path();
    if config.skip_existing && output.exists() {
        info!(?output, "combined output already exists, skipping");
        return Ok(StitchOutcome::Skipped { output });
    }

    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("failed to create output directory {}", config.output_dir.display())
    })?;

    info!(
        video_a = ?config.video_a,
        video_b = ?config.video_b,
        ?output,
        "pipeline starting"
    );

    let (results, offset) = align_pair(aligner, &config.video_a, &config.video_b)?;
    if config.write_alignment_json {
        write_sidecar(&config.alignment_json_path(), &results)
            .context("failed to write alignment sidecar")?;
    }

    let mut temp = TempFiles::new(config.keep_temp);

    let decoder_a = VideoDecoder::open(&config.video_a, &config.tools)
        .context("failed to open video A")?;
    let decoder_b = VideoDecoder::open(&config.video_b, &config.tools)
        .context("failed to open video B")?;

    let layout = CompositeLayout::for_sources(
        (decoder_a.width(), decoder_a.height()),
        (decoder_b.width(), decoder_b.height()),
    );

    let silent_video = temp.track(&config.temp_silent_video_path());
    let mut encoder = VideoEncoder::create(
        &silent_video,
        layout.width,
        layout.height,
        offset.fps,
        &config.tools,
    )
    .context("failed to start video encoder")?;

    let debug = config
        .debug_frames
        .as_ref()
        .map(|d| DebugRenderer::new(&d.dir, d.every, d.font.as_deref()))
        .transpose()?;

    let stats = composite_streams(
        decoder_a,
        decoder_b,
        &offset,
        &layout,
        &mut encoder,
        debug.as_ref(),
    )?;

    let wav = temp.track(&config.temp_audio_path());
    media
        .extract_audio(&config.video_a, &wav)
        .context("failed to extract audio from video A")?;

    let mut audio = AudioBuffer::read_wav(&wav)?;
    let audio_samples_dropped = audio.trim_start(offset.audio_offset_seconds);
    audio.write_wav(&wav)?;

    media
        .mux(&wav, &silent_video, &output)
        .context("failed to mux audio and video")?;

    info!(
        ?output,
        frames = stats.frames_written,
        padded = stats.padded_frames,
        audio_samples_dropped,
        "pipeline complete"
    );

    Ok(StitchOutcome::Completed(StitchReport {
        output,
        offset,
        layout,
        stats,
        audio_samples_dropped,
    }))
}
