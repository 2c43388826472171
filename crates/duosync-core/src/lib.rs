//! Audio-aligned side-by-side stitching of two recordings of the same event.
//!
//! The aligner and ffmpeg do the heavy lifting; this crate turns the aligner's
//! trims into a frame offset, pairs the two streams frame by frame, composes
//! each pair into one image and trims the kept audio track to match.

pub mod alignment;
pub mod audio;
pub mod compositor;
pub mod config;
pub mod debug;
pub mod error;
pub mod media;
pub mod offset;
pub mod pairing;
pub mod pipeline;
mod process;
pub mod rect;
pub mod video;
