use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::offset::{FrameOffset, Stream};
use crate::video::decoder::FrameSource;
use crate::video::frame::Frame;

/// Two frames to be shown side by side.
pub struct FramePair {
    pub a: Frame,
    pub b: Frame,
    /// Side holding a synthesized blank frame, if one source has ended.
    pub padded: Option<Stream>,
}

/// Reads two sources in lock-step, padding whichever ends first.
///
/// Yields `max(m, n)` pairs for sources of `m` and `n` remaining frames.
/// A decode error is yielded once and ends the iteration.
pub struct FramePairer<A, B> {
    a: A,
    b: B,
    pairs: u64,
    finished: bool,
}

impl<A: FrameSource, B: FrameSource> FramePairer<A, B> {
    /// Discard the offset from the lagging source and get ready to pair.
    pub fn new(mut a: A, mut b: B, offset: &FrameOffset) -> Result<Self> {
        let count = offset.skip_count();
        match offset.lagging() {
            Some(Stream::A) => {
                let skipped = a.skip_frames(count).context("failed to skip frames from stream A")?;
                info!(skipped, "skipped leading frames from stream A");
            }
            Some(Stream::B) => {
                let skipped = b.skip_frames(count).context("failed to skip frames from stream B")?;
                info!(skipped, "skipped leading frames from stream B");
            }
            None => info!("streams already aligned, no frames skipped"),
        }

        Ok(Self {
            a,
            b,
            pairs: 0,
            finished: false,
        })
    }

    /// Pairs yielded so far.
    pub fn pairs(&self) -> u64 {
        self.pairs
    }

    fn next_pair(&mut self) -> Result<Option<FramePair>> {
        let fa = self.a.next_frame().context("failed to decode stream A")?;
        let fb = self.b.next_frame().context("failed to decode stream B")?;

        let pair = match (fa, fb) {
            (Some(a), Some(b)) => FramePair { a, b, padded: None },
            (None, Some(b)) => FramePair {
                a: blank_for(&self.a),
                b,
                padded: Some(Stream::A),
            },
            (Some(a), None) => FramePair {
                a,
                b: blank_for(&self.b),
                padded: Some(Stream::B),
            },
            (None, None) => {
                info!(pairs = self.pairs, "both streams exhausted");
                return Ok(None);
            }
        };

        if pair.padded.is_some() && self.pairs % 100 == 0 {
            debug!(pair = self.pairs, padded = ?pair.padded, "padding exhausted stream");
        }
        self.pairs += 1;
        Ok(Some(pair))
    }
}

fn blank_for(source: &impl FrameSource) -> Frame {
    Frame::blank(source.width(), source.height(), source.has_alpha())
}

impl<A: FrameSource, B: FrameSource> Iterator for FramePairer<A, B> {
    type Item = Result<FramePair>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_pair() {
            Ok(Some(pair)) => Some(Ok(pair)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                warn!(pairs = self.pairs, "pairing stopped on decode error");
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
