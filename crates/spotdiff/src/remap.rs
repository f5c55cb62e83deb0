//! Coordinate remapping between crop, analysis, and full-image pixel spaces.
//!
//! Detection runs in a shared analysis space derived from the left crop.
//! Each final box is mapped back to full-image pixels via the corresponding
//! image's scale factors and crop offsets. Rounding convention throughout:
//! floor on offsets, round on scaled extents — the downstream overlay renders
//! at a fixed reference resolution and needs it stable.

use serde::{Deserialize, Serialize};

use crate::rect::IntRect;

/// Mapping between one image's crop region (full-image pixels) and the
/// shared analysis resolution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpaceMap {
    /// Crop region in full-image pixel coordinates.
    pub crop: IntRect,
    /// Analysis width in pixels.
    pub analysis_w: u32,
    /// Analysis height in pixels.
    pub analysis_h: u32,
}

impl SpaceMap {
    pub fn new(crop: IntRect, analysis_w: u32, analysis_h: u32) -> Self {
        Self {
            crop,
            analysis_w,
            analysis_h,
        }
    }

    /// Map an analysis-space rect to full-image pixel coordinates.
    pub fn analysis_to_full(&self, rect: IntRect) -> IntRect {
        let sx = self.crop.width as f64 / self.analysis_w.max(1) as f64;
        let sy = self.crop.height as f64 / self.analysis_h.max(1) as f64;
        IntRect::new(
            self.crop.left + (rect.left as f64 * sx).floor() as i32,
            self.crop.top + (rect.top as f64 * sy).floor() as i32,
            (rect.width as f64 * sx).round() as i32,
            (rect.height as f64 * sy).round() as i32,
        )
    }

    /// Map a full-image rect back into analysis-space pixels.
    pub fn full_to_analysis(&self, rect: IntRect) -> IntRect {
        let sx = self.analysis_w as f64 / self.crop.width.max(1) as f64;
        let sy = self.analysis_h as f64 / self.crop.height.max(1) as f64;
        IntRect::new(
            ((rect.left - self.crop.left) as f64 * sx).floor() as i32,
            ((rect.top - self.crop.top) as f64 * sy).floor() as i32,
            (rect.width as f64 * sx).round() as i32,
            (rect.height as f64 * sy).round() as i32,
        )
    }
}

/// Reproject a rect from one pixel space to another by their extents, same
/// rounding convention as [`SpaceMap`].
pub fn scale_rect_between_spaces(
    rect: IntRect,
    from_w: u32,
    from_h: u32,
    to_w: u32,
    to_h: u32,
) -> IntRect {
    let sx = to_w as f64 / from_w.max(1) as f64;
    let sy = to_h as f64 / from_h.max(1) as f64;
    IntRect::new(
        (rect.left as f64 * sx).floor() as i32,
        (rect.top as f64 * sy).floor() as i32,
        (rect.width as f64 * sx).round() as i32,
        (rect.height as f64 * sy).round() as i32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_to_full_applies_scale_and_offset() {
        let space = SpaceMap::new(IntRect::new(100, 50, 512, 512), 256, 256);
        let full = space.analysis_to_full(IntRect::new(10, 20, 30, 40));
        assert_eq!(full, IntRect::new(120, 90, 60, 80));
    }

    #[test]
    fn round_trip_reproduces_the_box_within_rounding() {
        let space = SpaceMap::new(IntRect::new(37, 91, 777, 613), 256, 256);
        let original = IntRect::new(10, 20, 58, 58);

        let full = space.analysis_to_full(original);
        let back = space.full_to_analysis(full);

        assert!((back.left - original.left).abs() <= 1);
        assert!((back.top - original.top).abs() <= 1);
        assert!((back.width - original.width).abs() <= 1);
        assert!((back.height - original.height).abs() <= 1);
    }

    #[test]
    fn uncropped_space_scales_by_image_extents_only() {
        let space = SpaceMap::new(IntRect::new(0, 0, 1024, 768), 256, 256);
        let full = space.analysis_to_full(IntRect::new(0, 0, 256, 256));
        assert_eq!(full, IntRect::new(0, 0, 1024, 768));
    }

    #[test]
    fn scale_between_spaces_is_consistent_with_space_map() {
        let r = IntRect::new(12, 34, 56, 78);
        let out = scale_rect_between_spaces(r, 256, 256, 512, 512);
        assert_eq!(out, IntRect::new(24, 68, 112, 156));
    }

    #[test]
    fn degenerate_target_space_collapses_gracefully() {
        let out = scale_rect_between_spaces(IntRect::new(1, 1, 4, 4), 256, 256, 0, 0);
        assert_eq!(out.area(), 0);
    }
}
