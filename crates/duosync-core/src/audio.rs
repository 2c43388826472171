use std::path::Path;

use anyhow::{bail, Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::{info, warn};

/// Interleaved 16-bit PCM audio plus the format needed to write it back.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioBuffer {
    /// Load a 16-bit integer PCM WAV file.
    pub fn read_wav(path: &Path) -> Result<Self> {
        let mut reader = WavReader::open(path)
            .with_context(|| format!("failed to open WAV {}", path.display()))?;
        let spec = reader.spec();

        if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
            bail!(
                "expected 16-bit PCM in {}, got {}-bit {:?}",
                path.display(),
                spec.bits_per_sample,
                spec.sample_format
            );
        }

        let samples = reader
            .samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("failed to read samples from {}", path.display()))?;

        info!(
            ?path,
            sample_rate = spec.sample_rate,
            channels = spec.channels,
            samples = samples.len(),
            "audio loaded"
        );

        Ok(Self {
            samples,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
        })
    }

    /// Write back as 16-bit PCM WAV with the original rate and channel count.
    pub fn write_wav(&self, path: &Path) -> Result<()> {
        let spec = WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut writer = WavWriter::create(path, spec)
            .with_context(|| format!("failed to create WAV {}", path.display()))?;
        for &s in &self.samples {
            writer.write_sample(s).context("failed to write sample")?;
        }
        writer.finalize().context("failed to finalize WAV")?;

        info!(?path, samples = self.samples.len(), "audio written");
        Ok(())
    }

    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Drop the first `seconds` of audio. Returns the number of samples removed.
    ///
    /// Non-positive offsets remove nothing; offsets past the end empty the buffer.
    pub fn trim_start(&mut self, seconds: f64) -> usize {
        let frames = (seconds * self.sample_rate as f64).round();
        if !frames.is_finite() || frames <= 0.0 {
            return 0;
        }

        let wanted = (frames as usize).saturating_mul(self.channels as usize);
        let removed = wanted.min(self.samples.len());
        if removed < wanted {
            warn!(
                wanted,
                available = self.samples.len(),
                "audio offset exceeds track length, output will be empty"
            );
        }

        self.samples.drain(..removed);
        info!(seconds, removed, remaining = self.samples.len(), "audio trimmed");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo(frames: usize, rate: u32) -> AudioBuffer {
        AudioBuffer {
            samples: (0..frames * 2).map(|i| i as i16).collect(),
            sample_rate: rate,
            channels: 2,
        }
    }

    #[test]
    fn trims_whole_sample_frames() {
        let mut audio = stereo(100, 10);
        // 0.5s at 10 Hz = 5 frames = 10 interleaved samples
        assert_eq!(audio.trim_start(0.5), 10);
        assert_eq!(audio.samples.len(), 190);
        assert_eq!(audio.samples[0], 10);
        assert_eq!(audio.frames(), 95);
    }

    #[test]
    fn zero_or_negative_offset_is_a_no_op() {
        let mut audio = stereo(10, 10);
        assert_eq!(audio.trim_start(0.0), 0);
        assert_eq!(audio.trim_start(-1.0), 0);
        assert_eq!(audio.samples.len(), 20);
    }

    #[test]
    fn offset_past_end_clamps_to_empty() {
        let mut audio = stereo(10, 10);
        assert_eq!(audio.trim_start(5.0), 20);
        assert!(audio.samples.is_empty());
        assert_eq!(audio.duration_seconds(), 0.0);
    }

    #[test]
    fn offset_rounds_to_nearest_frame() {
        let mut audio = AudioBuffer {
            samples: vec![0; 48_000],
            sample_rate: 48_000,
            channels: 1,
        };
        // 0.0000104s * 48000 = 0.4992 frames -> 0
        assert_eq!(audio.trim_start(0.000_010_4), 0);
        // 0.0000105s * 48000 = 0.504 frames -> 1
        assert_eq!(audio.trim_start(0.000_010_5), 1);
    }

    #[test]
    fn wav_keeps_format_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.wav");

        let mut audio = stereo(8, 8000);
        audio.trim_start(0.0005);
        audio.write_wav(&path).unwrap();

        let reloaded = AudioBuffer::read_wav(&path).unwrap();
        assert_eq!(reloaded, audio);
    }

    #[test]
    fn rejects_float_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut w = WavWriter::create(&path, spec).unwrap();
        w.write_sample(0.5f32).unwrap();
        w.finalize().unwrap();

        assert!(AudioBuffer::read_wav(&path).is_err());
    }
}
