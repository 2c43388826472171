use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use tracing::{debug, info, warn};

use crate::compositor::CompositeLayout;
use crate::offset::Stream;
use crate::pairing::FramePair;
use crate::rect::PixelRect;

const TEXT_SCALE: f32 = 20.0;
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const TEXT_LINE_HEIGHT: i32 = 22;

const SOURCE_COLOR: Rgb<u8> = Rgb([0, 220, 0]);
const PADDING_COLOR: Rgb<u8> = Rgb([230, 30, 30]);

/// What the overlay says about one composite frame.
#[derive(Debug, Clone, Copy)]
pub struct PairSummary {
    pub index: u64,
    /// Source frame numbers; `None` where the side is padding.
    pub a_frame: Option<u32>,
    pub b_frame: Option<u32>,
}

impl PairSummary {
    pub fn of(index: u64, pair: &FramePair) -> Self {
        Self {
            index,
            a_frame: (pair.padded != Some(Stream::A)).then_some(pair.a.frame_number),
            b_frame: (pair.padded != Some(Stream::B)).then_some(pair.b.frame_number),
        }
    }
}

/// Saves composite frames as PNGs with each side outlined and labeled.
pub struct DebugRenderer {
    dir: PathBuf,
    every: u32,
    font: Option<FontVec>,
}

impl DebugRenderer {
    pub fn new(dir: &Path, every: u32, font_path: Option<&Path>) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create debug frames directory {}", dir.display()))?;
        info!(?dir, every, "debug frames directory ready");

        Ok(Self {
            dir: dir.to_path_buf(),
            every: every.max(1),
            font: font_path.and_then(Self::load_font),
        })
    }

    /// Whether composite `index` should be saved.
    pub fn wants(&self, index: u64) -> bool {
        index % self.every as u64 == 0
    }

    pub fn save_composite(
        &self,
        composite: &RgbImage,
        layout: &CompositeLayout,
        summary: &PairSummary,
    ) -> Result<PathBuf> {
        let mut img = composite.clone();

        draw_region(&mut img, layout.left, summary.a_frame.is_some());
        draw_region(&mut img, layout.right, summary.b_frame.is_some());
        self.draw_text_overlay(&mut img, layout, summary);

        let path = self.dir.join(format!("pair_{:08}.png", summary.index));
        img.save(&path)
            .with_context(|| format!("failed to save debug frame to {}", path.display()))?;

        debug!(?path, "saved debug frame");
        Ok(path)
    }

    fn draw_text_overlay(&self, img: &mut RgbImage, layout: &CompositeLayout, summary: &PairSummary) {
        let Some(font) = &self.font else { return };
        let scale = PxScale::from(TEXT_SCALE);

        let header = format!("#{}", summary.index);
        draw_text_mut(img, TEXT_COLOR, 6, 6, scale, font, &header);

        for (label, rect, frame) in [
            ("A", layout.left, summary.a_frame),
            ("B", layout.right, summary.b_frame),
        ] {
            let text = match frame {
                Some(n) => format!("{label} F:{n}"),
                None => format!("{label} PAD"),
            };
            draw_text_mut(
                img,
                TEXT_COLOR,
                rect.x as i32 + 6,
                rect.y as i32 + 6 + TEXT_LINE_HEIGHT,
                scale,
                font,
                &text,
            );
        }
    }

    fn load_font(path: &Path) -> Option<FontVec> {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                warn!(?path, error = %e, "failed to read font file");
                return None;
            }
        };
        match FontVec::try_from_vec(data) {
            Ok(font) => {
                info!(?path, "loaded debug font");
                Some(font)
            }
            Err(e) => {
                warn!(?path, error = %e, "failed to parse font file");
                None
            }
        }
    }
}

fn draw_region(img: &mut RgbImage, region: PixelRect, is_source: bool) {
    if region.w == 0 || region.h == 0 {
        return;
    }
    let color = if is_source { SOURCE_COLOR } else { PADDING_COLOR };
    let rect = Rect::at(region.x as i32, region.y as i32).of_size(region.w, region.h);
    draw_hollow_rect_mut(img, rect, color);
}
