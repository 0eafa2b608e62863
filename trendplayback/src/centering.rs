//! Selection of the post that owns autoplay.
//!
//! A post qualifies when its layout overlaps the central band of the
//! viewport (30% to 70% of the height) by more than 40% of its own height,
//! and when it starts at or before 20% of the viewport width. The first
//! qualifying entry of the report wins.

use crate::model::{LayoutRect, ViewToken, Viewport};

pub const BAND_TOP_RATIO: f64 = 0.3;
pub const BAND_BOTTOM_RATIO: f64 = 0.7;
pub const MIN_OVERLAP_RATIO: f64 = 0.4;
pub const MAX_LEFT_RATIO: f64 = 0.2;

/// Height of `rect` that falls inside the central band
pub fn band_overlap(rect: &LayoutRect, viewport: &Viewport) -> f64 {
    let top = viewport.height * BAND_TOP_RATIO;
    let bottom = viewport.height * BAND_BOTTOM_RATIO;
    (rect.bottom().min(bottom) - rect.y.max(top)).max(0.0)
}

pub fn qualifies(rect: &LayoutRect, viewport: &Viewport) -> bool {
    let horizontally_placed = rect.x <= viewport.width * MAX_LEFT_RATIO;
    horizontally_placed && band_overlap(rect, viewport) > rect.height * MIN_OVERLAP_RATIO
}

/// Post id of the winning entry, if any
pub fn select_centered(items: &[ViewToken], viewport: &Viewport) -> Option<i64> {
    items
        .iter()
        .filter(|token| token.is_viewable)
        .find(|token| {
            token
                .layout
                .as_ref()
                .is_some_and(|rect| qualifies(rect, viewport))
        })
        .map(|token| token.post_id)
}
