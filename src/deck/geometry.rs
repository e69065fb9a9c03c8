//! EMU geometry and the fixed slide layout.

pub const EMU_PER_INCH: i64 = 914_400;

/// 10in x 7.5in, the classic 4:3 slide.
pub const SLIDE_WIDTH: i64 = 10 * EMU_PER_INCH;
pub const SLIDE_HEIGHT: i64 = 7 * EMU_PER_INCH + EMU_PER_INCH / 2;

/// Convert inches to EMU.
pub fn inches(value: f64) -> i64 {
    (value * EMU_PER_INCH as f64).round() as i64
}

/// Axis-aligned placement of a shape, in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl Frame {
    pub const fn new(x: i64, y: i64, cx: i64, cy: i64) -> Self {
        Self { x, y, cx, cy }
    }

    pub fn from_inches(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(inches(x), inches(y), inches(width), inches(height))
    }

    /// The largest frame with the image's aspect ratio that fits inside
    /// `self`, centered in it.
    ///
    /// Width-constrained scaling is used when it keeps the height within
    /// bounds; otherwise the height is the limiting dimension.
    pub fn fit_centered(&self, width_px: u32, height_px: u32) -> Frame {
        if width_px == 0 || height_px == 0 {
            return *self;
        }
        let (w, h) = (width_px as f64, height_px as f64);
        let by_width = self.cx as f64 / w;
        let scale = if h * by_width <= self.cy as f64 {
            by_width
        } else {
            self.cy as f64 / h
        };
        let cx = ((w * scale).round() as i64).min(self.cx);
        let cy = ((h * scale).round() as i64).min(self.cy);
        Frame {
            x: self.x + (self.cx - cx) / 2,
            y: self.y + (self.cy - cy) / 2,
            cx,
            cy,
        }
    }
}

/// Regions shared by every slide.
pub mod layout {
    use super::*;

    pub fn header_bar() -> Frame {
        Frame::new(0, 0, SLIDE_WIDTH, inches(0.95))
    }

    /// Title text inside the header bar, leaving the right edge for the logo.
    pub fn header_title() -> Frame {
        Frame::from_inches(0.4, 0.0, 7.9, 0.95)
    }

    pub fn accent_rule() -> Frame {
        Frame::new(0, inches(0.95), SLIDE_WIDTH, inches(0.06))
    }

    pub fn logo() -> Frame {
        Frame::from_inches(8.45, 0.12, 1.35, 0.71)
    }

    /// Where slide bodies, charts and chart placeholders go.
    pub fn content() -> Frame {
        Frame::from_inches(0.5, 1.25, 9.0, 5.55)
    }

    pub fn footer() -> Frame {
        Frame::from_inches(0.5, 6.95, 9.0, 0.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_image_is_width_limited_and_vertically_centered() {
        let region = Frame::new(0, 0, 900, 500);
        let fit = region.fit_centered(1800, 600);
        assert_eq!((fit.cx, fit.cy), (900, 300));
        assert_eq!((fit.x, fit.y), (0, 100));
    }

    #[test]
    fn tall_image_is_height_limited_and_horizontally_centered() {
        let region = Frame::new(100, 50, 900, 500);
        let fit = region.fit_centered(200, 400);
        assert_eq!((fit.cx, fit.cy), (250, 500));
        assert_eq!((fit.x, fit.y), (100 + 325, 50));
    }

    #[test]
    fn exact_aspect_fills_region() {
        let region = Frame::new(0, 0, 900, 450);
        assert_eq!(region.fit_centered(2, 1), region);
    }

    #[test]
    fn content_region_sits_between_header_and_footer() {
        let content = layout::content();
        let header = layout::accent_rule();
        assert!(content.y >= header.y + header.cy);
        assert!(content.y + content.cy <= layout::footer().y);
        assert!(content.x + content.cx <= SLIDE_WIDTH);
    }
}
