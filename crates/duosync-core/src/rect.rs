/// A rectangle in absolute pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl PixelRect {
    pub fn right(self) -> u32 {
        self.x + self.w
    }

    pub fn bottom(self) -> u32 {
        self.y + self.h
    }

    /// Scale width and height by `factor`, truncating toward zero.
    pub fn scale_size(self, factor: f64) -> PixelRect {
        assert!(factor > 0.0, "scale factor must be > 0");
        PixelRect {
            x: self.x,
            y: self.y,
            w: (self.w as f64 * factor) as u32,
            h: (self.h as f64 * factor) as u32,
        }
    }

    /// Place this rect immediately to the right of `other`, top-aligned.
    pub fn beside(self, other: PixelRect) -> PixelRect {
        PixelRect {
            x: other.right(),
            y: other.y,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_size_truncates() {
        let r = PixelRect { x: 0, y: 0, w: 1281, h: 721 };
        let scaled = r.scale_size(0.5);
        assert_eq!((scaled.w, scaled.h), (640, 360));
    }

    #[test]
    fn scale_size_keeps_origin() {
        let r = PixelRect { x: 10, y: 20, w: 3840, h: 2160 };
        let scaled = r.scale_size(0.25);
        assert_eq!(scaled, PixelRect { x: 10, y: 20, w: 960, h: 540 });
    }

    #[test]
    fn beside_stacks_horizontally() {
        let left = PixelRect { x: 0, y: 0, w: 960, h: 540 };
        let right = PixelRect { x: 0, y: 0, w: 640, h: 360 }.beside(left);
        assert_eq!(right.x, 960);
        assert_eq!(right.y, 0);
        assert_eq!(right.right(), 1600);
        assert_eq!(right.bottom(), 360);
    }
}
