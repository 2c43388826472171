use anyhow::{bail, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use tracing::{debug, info};

use crate::rect::PixelRect;

/// Area-like downscaling filter.
const RESIZE_FILTER: FilterType = FilterType::Triangle;

/// Scale factor applied to a frame of the given height.
///
/// 1080p and 2160p sources both land on 540 rows; anything else passes
/// through at its native size.
pub fn scale_for_height(height: u32) -> f64 {
    match height {
        1080 => 0.5,
        2160 => 0.25,
        _ => 1.0,
    }
}

/// Size a `width`x`height` frame occupies in the composite.
pub fn scaled_dimensions(width: u32, height: u32) -> (u32, u32) {
    let r = PixelRect { x: 0, y: 0, w: width, h: height }.scale_size(scale_for_height(height));
    (r.w, r.h)
}

/// Where each side lands in the composite frame. Fixed for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeLayout {
    pub left: PixelRect,
    pub right: PixelRect,
    pub width: u32,
    pub height: u32,
}

impl CompositeLayout {
    /// Layout for two streams given their native `(width, height)`.
    pub fn for_sources(a: (u32, u32), b: (u32, u32)) -> Self {
        let (aw, ah) = scaled_dimensions(a.0, a.1);
        let (bw, bh) = scaled_dimensions(b.0, b.1);

        let left = PixelRect { x: 0, y: 0, w: aw, h: ah };
        let right = PixelRect { x: 0, y: 0, w: bw, h: bh }.beside(left);

        let layout = Self {
            left,
            right,
            width: aw + bw,
            height: ah.max(bh),
        };
        info!(
            width = layout.width,
            height = layout.height,
            ?a,
            ?b,
            "composite layout computed"
        );
        layout
    }
}

/// Resize a frame by its height bucket and flatten it to RGB (alpha is dropped).
pub fn resize_frame(image: &DynamicImage) -> RgbImage {
    let (w, h) = scaled_dimensions(image.width(), image.height());
    let rgb = image.to_rgb8();
    if (w, h) == rgb.dimensions() {
        return rgb;
    }
    debug!(from_w = rgb.width(), from_h = rgb.height(), w, h, "resizing frame");
    imageops::resize(&rgb, w, h, RESIZE_FILTER)
}

/// Resize both frames and stack them horizontally, A on the left.
///
/// A side shorter than the composite is top-aligned over black.
pub fn compose(layout: &CompositeLayout, a: &DynamicImage, b: &DynamicImage) -> Result<RgbImage> {
    let left = resize_frame(a);
    let right = resize_frame(b);

    for (side, img, slot) in [("left", &left, layout.left), ("right", &right, layout.right)] {
        if img.dimensions() != (slot.w, slot.h) {
            bail!(
                "{side} frame resized to {}x{}, layout expects {}x{}",
                img.width(),
                img.height(),
                slot.w,
                slot.h
            );
        }
    }

    let mut canvas = RgbImage::new(layout.width, layout.height);
    imageops::replace(&mut canvas, &left, layout.left.x as i64, layout.left.y as i64);
    imageops::replace(&mut canvas, &right, layout.right.x as i64, layout.right.y as i64);
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgba, RgbaImage};

    fn solid(w: u32, h: u32, v: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([v, v, v])))
    }

    #[test]
    fn height_buckets() {
        assert_eq!(scaled_dimensions(1920, 1080), (960, 540));
        assert_eq!(scaled_dimensions(3840, 2160), (960, 540));
        assert_eq!(scaled_dimensions(1280, 720), (1280, 720));
        assert_eq!(scaled_dimensions(1080, 1920), (1080, 1920));
    }

    #[test]
    fn hd_and_uhd_make_1920x540() {
        let layout = CompositeLayout::for_sources((1920, 1080), (3840, 2160));
        assert_eq!((layout.width, layout.height), (1920, 540));
        assert_eq!(layout.right.x, 960);
    }

    #[test]
    fn composite_width_is_sum_and_height_is_max() {
        let layout = CompositeLayout::for_sources((1280, 720), (1920, 1080));
        let out = compose(&layout, &solid(1280, 720, 10), &solid(1920, 1080, 200)).unwrap();
        assert_eq!(out.dimensions(), (1280 + 960, 720));
        assert_eq!(out.get_pixel(0, 0).0, [10, 10, 10]);
        assert_eq!(out.get_pixel(1280, 0).0, [200, 200, 200]);
        // below the shorter right side stays black
        assert_eq!(out.get_pixel(1280, 600).0, [0, 0, 0]);
    }

    #[test]
    fn alpha_is_dropped() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 2, Rgba([9, 8, 7, 0])));
        let layout = CompositeLayout::for_sources((4, 2), (4, 2));
        let out = compose(&layout, &rgba, &solid(4, 2, 1)).unwrap();
        assert_eq!(out.get_pixel(0, 0).0, [9, 8, 7]);
    }

    #[test]
    fn mismatched_frame_is_rejected() {
        let layout = CompositeLayout::for_sources((4, 2), (4, 2));
        assert!(compose(&layout, &solid(8, 2, 0), &solid(4, 2, 0)).is_err());
    }
}
