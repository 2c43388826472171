use tracing::{debug, info};

use crate::error::OffsetError;

/// Which of the two input streams a value refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    A,
    B,
}

/// Result of converting the aligner's trims into frame-level skipping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOffset {
    /// Positive: skip this many frames from stream A. Negative: skip from stream B.
    pub frames: i64,
    /// Stream whose trim decided the offset.
    pub chosen: Stream,
    /// Seconds to cut from the front of stream A's audio.
    pub audio_offset_seconds: f64,
    /// Frame rate the offset was computed at, shared by both streams.
    pub fps: f64,
}

impl FrameOffset {
    /// The stream that has frames discarded before pairing, if any.
    pub fn lagging(&self) -> Option<Stream> {
        match self.frames {
            0 => None,
            n if n > 0 => Some(Stream::A),
            _ => Some(Stream::B),
        }
    }

    /// Number of frames to discard from the lagging stream.
    pub fn skip_count(&self) -> u64 {
        self.frames.unsigned_abs()
    }
}

/// Convert per-stream trims (seconds) into a signed frame offset.
///
/// The trim with the larger magnitude wins; ties go to stream A so that
/// the result is deterministic.
pub fn resolve_offset(trim_a: f64, trim_b: f64, fps: f64) -> Result<FrameOffset, OffsetError> {
    if !fps.is_finite() || fps <= 0.0 {
        return Err(OffsetError::InvalidFps(fps));
    }
    if !trim_a.is_finite() || !trim_b.is_finite() {
        return Err(OffsetError::InvalidTrim { trim_a, trim_b });
    }

    let (frames, chosen) = if trim_a.abs() >= trim_b.abs() {
        ((trim_a * fps).round() as i64, Stream::A)
    } else {
        (-((trim_b * fps).round() as i64), Stream::B)
    };

    let audio_offset_seconds = if frames > 0 { trim_a } else { 0.0 };

    debug!(trim_a, trim_b, fps, ?chosen, "trims compared");
    info!(frames, audio_offset_seconds, "frame offset resolved");

    Ok(FrameOffset {
        frames,
        chosen,
        audio_offset_seconds,
        fps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn larger_trim_a_skips_from_a() {
        let off = resolve_offset(0.5, 0.0, 30.0).unwrap();
        assert_eq!(off.frames, 15);
        assert_eq!(off.chosen, Stream::A);
        assert_eq!(off.lagging(), Some(Stream::A));
        assert_eq!(off.audio_offset_seconds, 0.5);
        assert_eq!(off.fps, 30.0);
    }

    #[test]
    fn larger_trim_b_negates() {
        let off = resolve_offset(0.1, 1.25, 24.0).unwrap();
        assert_eq!(off.frames, -30);
        assert_eq!(off.chosen, Stream::B);
        assert_eq!(off.lagging(), Some(Stream::B));
        assert_eq!(off.skip_count(), 30);
        assert_eq!(off.audio_offset_seconds, 0.0);
    }

    #[test]
    fn rounds_to_nearest_frame() {
        // 0.49 * 29.97 = 14.68
        let off = resolve_offset(0.49, 0.0, 29.97).unwrap();
        assert_eq!(off.frames, 15);
    }

    #[test]
    fn zero_trims_mean_no_skip() {
        let off = resolve_offset(0.0, 0.0, 30.0).unwrap();
        assert_eq!(off.frames, 0);
        assert_eq!(off.lagging(), None);
        assert_eq!(off.audio_offset_seconds, 0.0);
    }

    #[test]
    fn equal_magnitudes_pick_a() {
        let off = resolve_offset(-0.5, 0.5, 30.0).unwrap();
        assert_eq!(off.chosen, Stream::A);
        assert_eq!(off.frames, -15);
        // stream A is not the skipped one, so its audio is untouched
        assert_eq!(off.audio_offset_seconds, 0.0);
    }

    #[test]
    fn negative_trim_b_skips_from_a() {
        let off = resolve_offset(0.2, -1.0, 10.0).unwrap();
        assert_eq!(off.frames, 10);
        assert_eq!(off.lagging(), Some(Stream::A));
        assert_eq!(off.audio_offset_seconds, 0.2);
    }

    #[test]
    fn rejects_bad_fps() {
        assert_eq!(
            resolve_offset(0.0, 0.0, 0.0),
            Err(OffsetError::InvalidFps(0.0))
        );
        assert!(resolve_offset(0.0, 0.0, f64::NAN).is_err());
        assert!(resolve_offset(f64::INFINITY, 0.0, 30.0).is_err());
    }
}
