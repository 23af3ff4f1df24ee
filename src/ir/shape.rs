//! Output geometry: rectangles and polygons with explicit holes.

use serde::{Deserialize, Serialize};

use super::point::Point;

/// An ordered sequence of points, implicitly closed (the last point connects
/// back to the first).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ring(pub Vec<Point>);

impl Ring {
    pub fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Pairs a flat COCO coordinate list `[x0, y0, x1, y1, ...]` into points.
    ///
    /// A trailing unpaired coordinate is dropped.
    pub fn from_flat(coords: &[f64]) -> Self {
        Self(
            coords
                .chunks_exact(2)
                .map(|pair| Point::new(pair[0], pair[1]))
                .collect(),
        )
    }

    pub fn points(&self) -> &[Point] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the tight axis-aligned extent of the ring, or `None` when the
    /// ring has no points.
    pub fn bounds(&self) -> Option<Rectangle> {
        let first = self.0.first()?;
        let mut rect = Rectangle::new(first.y, first.x, first.y, first.x);
        for p in &self.0[1..] {
            rect.top = rect.top.min(p.y);
            rect.left = rect.left.min(p.x);
            rect.bottom = rect.bottom.max(p.y);
            rect.right = rect.right.max(p.x);
        }
        Some(rect)
    }
}

/// An axis-aligned rectangle given by its edges.
///
/// Construction does not enforce `top <= bottom` or `left <= right`; a
/// malformed source box is carried through as-is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl Rectangle {
    #[inline]
    pub fn new(top: f64, left: f64, bottom: f64, right: f64) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    /// Converts a COCO `[x, y, width, height]` box (top-left origin).
    #[inline]
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(y, x, y + height, x + width)
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// A filled region with one exterior ring and zero or more holes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub exterior: Ring,
    #[serde(default)]
    pub interiors: Vec<Ring>,
}

impl Polygon {
    pub fn new(exterior: Ring, interiors: Vec<Ring>) -> Self {
        Self {
            exterior,
            interiors,
        }
    }

    /// A polygon with no holes.
    pub fn solid(exterior: Ring) -> Self {
        Self::new(exterior, Vec::new())
    }
}

/// A classified geometric figure.
///
/// Serialized adjacently tagged so a label reads
/// `{"geometry_type": "polygon", "geometry": {...}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "geometry_type", content = "geometry", rename_all = "snake_case")]
pub enum Shape {
    Rectangle(Rectangle),
    Polygon(Polygon),
}

impl Shape {
    /// The shape's own tight bounding extent.
    ///
    /// For polygons this is the extent of the exterior ring; holes always lie
    /// inside it.
    pub fn bounding_rect(&self) -> Option<Rectangle> {
        match self {
            Shape::Rectangle(rect) => Some(*rect),
            Shape::Polygon(polygon) => polygon.exterior.bounds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_from_flat_drops_odd_coordinate() {
        let ring = Ring::from_flat(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(ring.points(), &[Point::new(1.0, 2.0), Point::new(3.0, 4.0)]);
    }

    #[test]
    fn test_rectangle_from_xywh() {
        let rect = Rectangle::from_xywh(10.0, 20.0, 5.0, 8.0);
        assert_eq!(rect, Rectangle::new(20.0, 10.0, 28.0, 15.0));
        assert_eq!(rect.width(), 5.0);
        assert_eq!(rect.height(), 8.0);
    }

    #[test]
    fn test_polygon_bounding_rect_uses_exterior() {
        let shape = Shape::Polygon(Polygon::solid(Ring::from_flat(&[
            2.0, 3.0, 9.0, 1.0, 7.0, 6.0,
        ])));
        assert_eq!(
            shape.bounding_rect(),
            Some(Rectangle::new(1.0, 2.0, 6.0, 9.0))
        );
    }

    #[test]
    fn test_empty_ring_has_no_bounds() {
        assert_eq!(Ring::default().bounds(), None);
    }

    #[test]
    fn test_shape_serialization_is_adjacently_tagged() {
        let shape = Shape::Rectangle(Rectangle::new(1.0, 2.0, 3.0, 4.0));
        let value = serde_json::to_value(&shape).unwrap();
        assert_eq!(value["geometry_type"], "rectangle");
        assert_eq!(value["geometry"]["top"], 1.0);
        assert_eq!(value["geometry"]["right"], 4.0);

        let polygon = Shape::Polygon(Polygon::new(
            Ring::from_flat(&[0.0, 0.0, 4.0, 0.0, 4.0, 4.0]),
            vec![Ring::from_flat(&[1.0, 1.0, 2.0, 1.0, 2.0, 2.0])],
        ));
        let value = serde_json::to_value(&polygon).unwrap();
        assert_eq!(value["geometry_type"], "polygon");
        assert_eq!(value["geometry"]["exterior"][1], serde_json::json!([4.0, 0.0]));
        assert_eq!(
            value["geometry"]["interiors"][0][2],
            serde_json::json!([2.0, 2.0])
        );

        let back: Shape = serde_json::from_value(value).unwrap();
        assert_eq!(back, polygon);
    }
}
