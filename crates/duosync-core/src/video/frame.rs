use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

/// Pixel value used when synthesizing padding frames.
pub const BLANK_PIXEL_VALUE: u8 = 1;

/// A single decoded video frame with metadata.
#[derive(Clone, Debug)]
pub struct Frame {
    /// The frame's image data. Decoders produce RGB; RGBA is accepted and
    /// flattened during composition.
    pub image: DynamicImage,
    /// Absolute frame number from the start of the source (0-based).
    pub frame_number: u32,
    /// Elapsed seconds from the start of the source.
    pub timestamp_seconds: f64,
}

impl Frame {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// A padding frame filled with [`BLANK_PIXEL_VALUE`] in every channel.
    pub fn blank(width: u32, height: u32, with_alpha: bool) -> Self {
        let v = BLANK_PIXEL_VALUE;
        let image = if with_alpha {
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([v, v, v, v])))
        } else {
            DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([v, v, v])))
        };
        Self {
            image,
            frame_number: 0,
            timestamp_seconds: 0.0,
        }
    }
}
