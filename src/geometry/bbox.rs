//! Bounding-box reconciliation.
//!
//! An object's declared box describes the object as a whole. When the
//! object's segmentation splits into several disjoint shapes, one declared
//! box cannot be divided between them, so each shape gets its own tight box
//! instead and the declared value is dropped.

use crate::ir::{Rectangle, Shape};

/// Derives the rectangle labels for one object.
///
/// - No declared box: no rectangles.
/// - More than one shape: one rectangle per shape, each the shape's own
///   extent, in shape order.
/// - Otherwise: the declared `[x, y, w, h]` box as a single rectangle.
pub fn reconcile(declared: Option<[f64; 4]>, shapes: &[Shape]) -> Vec<Rectangle> {
    let Some([x, y, w, h]) = declared else {
        return Vec::new();
    };

    if shapes.len() > 1 {
        return shapes.iter().filter_map(Shape::bounding_rect).collect();
    }

    vec![Rectangle::from_xywh(x, y, w, h)]
}

/// Checks a raw `bbox` list for exactly four finite components.
pub fn parse_declared(raw: &[f64]) -> Option<[f64; 4]> {
    let bbox: [f64; 4] = raw.try_into().ok()?;
    bbox.iter().all(|v| v.is_finite()).then_some(bbox)
}
