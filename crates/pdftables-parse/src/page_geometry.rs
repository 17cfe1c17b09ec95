//! Page coordinate normalization: MediaBox offset, rotation, CropBox, y-flip.
//!
//! Transforms points from PDF native space (bottom-left origin) into the
//! visible page's top-left origin space used by every downstream type.

use pdftables_core::BBox;

/// US Letter, used when a page has no usable MediaBox.
pub const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Transform from PDF native space to top-left display space.
#[derive(Debug, Clone, PartialEq)]
pub struct PageGeometry {
    rotation: i32,
    media_x0: f64,
    media_y0: f64,
    native_width: f64,
    native_height: f64,
    crop_x0: f64,
    crop_y0: f64,
    width: f64,
    height: f64,
}

impl PageGeometry {
    /// `media_box` and `crop_box` are raw `[llx, lly, urx, ury]` arrays.
    /// `rotation` is the page `/Rotate` value; anything other than a
    /// multiple of 90 is treated as 0.
    pub fn new(media_box: [f64; 4], crop_box: Option<[f64; 4]>, rotation: i64) -> Self {
        let rotation = match rotation.rem_euclid(360) {
            r @ (90 | 180 | 270) => r as i32,
            _ => 0,
        };
        let media = normalize_box(media_box);
        let crop = crop_box.map(normalize_box).unwrap_or(media);

        let native_width = media.x1 - media.x0;
        let native_height = media.bottom - media.top;

        // crop relative to the media origin, then rotated clockwise
        let (cx0, cy0, cx1, cy1) = (
            crop.x0 - media.x0,
            crop.top - media.top,
            crop.x1 - media.x0,
            crop.bottom - media.top,
        );
        let (rx0, ry0, rx1, ry1) = match rotation {
            90 => (cy0, native_width - cx1, cy1, native_width - cx0),
            180 => (
                native_width - cx1,
                native_height - cy1,
                native_width - cx0,
                native_height - cy0,
            ),
            270 => (native_height - cy1, cx0, native_height - cy0, cx1),
            _ => (cx0, cy0, cx1, cy1),
        };

        Self {
            rotation,
            media_x0: media.x0,
            media_y0: media.top,
            native_width,
            native_height,
            crop_x0: rx0,
            crop_y0: ry0,
            width: rx1 - rx0,
            height: ry1 - ry0,
        }
    }

    /// Visible page width after rotation and cropping.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Visible page height after rotation and cropping.
    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn rotation(&self) -> i32 {
        self.rotation
    }

    /// Map a point from PDF native space to top-left display space.
    pub fn normalize_point(&self, x: f64, y: f64) -> (f64, f64) {
        let px = x - self.media_x0;
        let py = y - self.media_y0;

        let (rx, ry) = match self.rotation {
            90 => (py, self.native_width - px),
            180 => (self.native_width - px, self.native_height - py),
            270 => (self.native_height - py, px),
            _ => (px, py),
        };

        let cx = rx - self.crop_x0;
        let cy = ry - self.crop_y0;
        (cx, self.height - cy)
    }
}

/// Order a raw box so that `x0 < x1` and `top < bottom` (still PDF space).
fn normalize_box(raw: [f64; 4]) -> BBox {
    BBox::new(
        raw[0].min(raw[2]),
        raw[1].min(raw[3]),
        raw[0].max(raw[2]),
        raw[1].max(raw[3]),
    )
}
