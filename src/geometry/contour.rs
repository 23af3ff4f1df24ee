//! Boundary tracing, ring rasterization and containment tests.
//!
//! Tracing uses Suzuki-Abe border following via
//! `imageproc::contours::find_contours`; contour points are the integer
//! coordinates of boundary pixels.

use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point as GridPoint;

use super::rle::FOREGROUND;
use crate::ir::{ImageSize, Point, Ring};

/// Tolerance for treating a point as lying on a contour edge.
const EDGE_EPSILON: f64 = 1e-9;

/// Traces the outer boundary of every foreground region of `raster`.
///
/// Hole borders are not returned. Contours with fewer than three points
/// (single pixels, one-pixel lines) cannot bound an area and are dropped.
pub fn outer_contours(raster: &GrayImage) -> Vec<Ring> {
    if raster.width() == 0 || raster.height() == 0 {
        return Vec::new();
    }

    // find_contours never starts an outer border in column 0, so regions
    // touching the left edge are traced on a copy with a blank margin.
    let mut padded = GrayImage::new(raster.width() + 2, raster.height() + 2);
    for (x, y, pixel) in raster.enumerate_pixels() {
        padded.put_pixel(x + 1, y + 1, *pixel);
    }

    find_contours::<i32>(&padded)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.points.len() >= 3)
        .map(|c| {
            Ring::new(
                c.points
                    .into_iter()
                    .map(|p| Point::new(f64::from(p.x - 1), f64::from(p.y - 1)))
                    .collect(),
            )
        })
        .collect()
}

/// Fills `ring` onto a blank raster of the given size.
///
/// The ring is first clipped to one pixel beyond the raster on every side,
/// then vertices are rounded to the nearest pixel. Returns `None` if the ring
/// does not have three distinct vertices after clipping and rounding, or the
/// raster would be empty.
pub fn rasterize_ring(ring: &Ring, size: ImageSize) -> Option<GrayImage> {
    if size.width == 0 || size.height == 0 {
        return None;
    }
    if !ring.points().iter().all(|p| p.is_finite()) {
        return None;
    }

    let clipped = clip_to_window(ring.points(), size);
    let mut grid: Vec<GridPoint<i32>> = Vec::with_capacity(clipped.len());
    for p in clipped {
        if !p.is_finite() {
            return None;
        }
        let q = GridPoint::new(p.x.round() as i32, p.y.round() as i32);
        if grid.last() != Some(&q) {
            grid.push(q);
        }
    }
    // draw_polygon_mut rejects an explicitly closed ring.
    while grid.len() > 1 && grid.first() == grid.last() {
        grid.pop();
    }
    if grid.len() < 3 {
        return None;
    }

    let mut raster = GrayImage::new(size.width, size.height);
    draw_polygon_mut(&mut raster, &grid, Luma([FOREGROUND]));
    Some(raster)
}

/// Sutherland-Hodgman clip of a closed ring to `[-1, width] x [-1, height]`.
///
/// Inside the window the clipped ring covers exactly what the original does.
fn clip_to_window(points: &[Point], size: ImageSize) -> Vec<Point> {
    let right = f64::from(size.width);
    let bottom = f64::from(size.height);

    let at_x = |a: Point, b: Point, x: f64| {
        let t = (x - a.x) / (b.x - a.x);
        Point::new(x, a.y + t * (b.y - a.y))
    };
    let at_y = |a: Point, b: Point, y: f64| {
        let t = (y - a.y) / (b.y - a.y);
        Point::new(a.x + t * (b.x - a.x), y)
    };

    let clipped = clip_half_plane(points, |p| p.x >= -1.0, |a, b| at_x(a, b, -1.0));
    let clipped = clip_half_plane(&clipped, |p| p.x <= right, |a, b| at_x(a, b, right));
    let clipped = clip_half_plane(&clipped, |p| p.y >= -1.0, |a, b| at_y(a, b, -1.0));
    clip_half_plane(&clipped, |p| p.y <= bottom, |a, b| at_y(a, b, bottom))
}

fn clip_half_plane(
    points: &[Point],
    inside: impl Fn(Point) -> bool,
    crossing: impl Fn(Point, Point) -> Point,
) -> Vec<Point> {
    let mut out = Vec::with_capacity(points.len() + 2);
    let Some(&last) = points.last() else {
        return out;
    };

    let mut prev = last;
    for &cur in points {
        match (inside(prev), inside(cur)) {
            (true, true) => out.push(cur),
            (true, false) => out.push(crossing(prev, cur)),
            (false, true) => {
                out.push(crossing(prev, cur));
                out.push(cur);
            }
            (false, false) => {}
        }
        prev = cur;
    }
    out
}

/// Rasterizes `ring` alone and traces its boundary contour.
///
/// Returns `None` when nothing of the ring lands on the raster.
pub fn trace_ring(ring: &Ring, size: ImageSize) -> Option<Ring> {
    let raster = rasterize_ring(ring, size)?;
    outer_contours(&raster).into_iter().next()
}

/// Strict point-in-polygon test.
///
/// Points on an edge or vertex of `contour` are *not* inside.
pub fn contains_strictly(contour: &Ring, p: Point) -> bool {
    let pts = contour.points();
    if pts.len() < 3 || !p.is_finite() {
        return false;
    }

    let mut inside = false;
    let mut j = pts.len() - 1;
    for i in 0..pts.len() {
        let a = pts[i];
        let b = pts[j];
        if on_segment(a, b, p) {
            return false;
        }
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
    if cross.abs() > EDGE_EPSILON {
        return false;
    }
    p.x >= a.x.min(b.x) - EDGE_EPSILON
        && p.x <= a.x.max(b.x) + EDGE_EPSILON
        && p.y >= a.y.min(b.y) - EDGE_EPSILON
        && p.y <= a.y.max(b.y) + EDGE_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Ring {
        Ring::from_flat(&[x0, y0, x1, y0, x1, y1, x0, y1])
    }

    #[test]
    fn test_contains_strictly_excludes_boundary() {
        let ring = square(0.0, 0.0, 10.0, 10.0);
        assert!(contains_strictly(&ring, Point::new(5.0, 5.0)));
        assert!(!contains_strictly(&ring, Point::new(10.0, 5.0)));
        assert!(!contains_strictly(&ring, Point::new(0.0, 0.0)));
        assert!(!contains_strictly(&ring, Point::new(11.0, 5.0)));
    }

    #[test]
    fn test_contains_strictly_concave() {
        // An L shape: the notch at (7, 7) is outside.
        let ring = Ring::from_flat(&[0.0, 0.0, 10.0, 0.0, 10.0, 4.0, 4.0, 4.0, 4.0, 10.0, 0.0, 10.0]);
        assert!(contains_strictly(&ring, Point::new(2.0, 8.0)));
        assert!(contains_strictly(&ring, Point::new(8.0, 2.0)));
        assert!(!contains_strictly(&ring, Point::new(7.0, 7.0)));
    }

    #[test]
    fn test_rasterize_ring_fills_interior() {
        let raster = rasterize_ring(&square(2.0, 2.0, 5.0, 5.0), ImageSize::new(8, 8)).unwrap();
        assert_eq!(raster.get_pixel(3, 3)[0], FOREGROUND);
        assert_eq!(raster.get_pixel(2, 2)[0], FOREGROUND);
        assert_eq!(raster.get_pixel(6, 6)[0], 0);
    }

    #[test]
    fn test_rasterize_ring_accepts_explicit_closure() {
        let closed = Ring::from_flat(&[1.0, 1.0, 6.0, 1.0, 6.0, 6.0, 1.0, 1.0]);
        assert!(rasterize_ring(&closed, ImageSize::new(8, 8)).is_some());
    }

    #[test]
    fn test_rasterize_degenerate_ring() {
        let line = Ring::from_flat(&[1.0, 1.0, 5.0, 5.0]);
        assert!(rasterize_ring(&line, ImageSize::new(8, 8)).is_none());
        let square = square(0.0, 0.0, 3.0, 3.0);
        assert!(rasterize_ring(&square, ImageSize::new(0, 8)).is_none());
    }

    #[test]
    fn test_trace_ring_follows_square_outline() {
        let contour = trace_ring(&square(0.0, 0.0, 10.0, 10.0), ImageSize::new(20, 20)).unwrap();
        let bounds = contour.bounds().unwrap();
        assert_eq!((bounds.left, bounds.top), (0.0, 0.0));
        assert_eq!((bounds.right, bounds.bottom), (10.0, 10.0));
        assert!(contains_strictly(&contour, Point::new(3.0, 3.0)));
        assert!(contains_strictly(&contour, Point::new(7.0, 7.0)));
    }

    #[test]
    fn test_outer_contours_traces_region_on_left_edge() {
        let mut raster = GrayImage::new(10, 10);
        for x in 0..4 {
            for y in 2..6 {
                raster.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
        let contours = outer_contours(&raster);
        assert_eq!(contours.len(), 1);
        let bounds = contours[0].bounds().unwrap();
        assert_eq!((bounds.left, bounds.top), (0.0, 2.0));
        assert_eq!((bounds.right, bounds.bottom), (3.0, 5.0));
    }

    #[test]
    fn test_outer_contours_traces_region_filling_raster() {
        let raster = GrayImage::from_pixel(4, 3, Luma([FOREGROUND]));
        let contours = outer_contours(&raster);
        assert_eq!(contours.len(), 1);
        let bounds = contours[0].bounds().unwrap();
        assert_eq!((bounds.left, bounds.top), (0.0, 0.0));
        assert_eq!((bounds.right, bounds.bottom), (3.0, 2.0));
    }

    #[test]
    fn test_rasterize_ring_clips_far_vertices() {
        let huge = square(0.0, 0.0, 3e9, 3e9);
        let raster = rasterize_ring(&huge, ImageSize::new(16, 16)).unwrap();
        assert!(raster.pixels().all(|p| p[0] == FOREGROUND));

        let contour = trace_ring(&huge, ImageSize::new(16, 16)).unwrap();
        assert!(contains_strictly(&contour, Point::new(5.0, 5.0)));
    }

    #[test]
    fn test_rasterize_ring_clips_diagonal_edge() {
        // The hypotenuse runs from (-20, 0) to (20, 40); inside the raster it
        // passes through (0, 20) and (4, 24).
        let triangle = Ring::from_flat(&[-20.0, 0.0, 20.0, 40.0, -20.0, 40.0]);
        let raster = rasterize_ring(&triangle, ImageSize::new(32, 32)).unwrap();
        assert_eq!(raster.get_pixel(0, 24)[0], FOREGROUND);
        assert_eq!(raster.get_pixel(2, 28)[0], FOREGROUND);
        assert_eq!(raster.get_pixel(4, 10)[0], 0);
        assert_eq!(raster.get_pixel(10, 25)[0], 0);
    }

    #[test]
    fn test_ring_wholly_off_raster_traces_nothing() {
        let offscreen = square(100.0, 100.0, 110.0, 110.0);
        assert!(trace_ring(&offscreen, ImageSize::new(16, 16)).is_none());
    }

    #[test]
    fn test_outer_contours_skips_single_pixels() {
        let mut raster = GrayImage::new(5, 5);
        raster.put_pixel(2, 2, Luma([FOREGROUND]));
        assert!(outer_contours(&raster).is_empty());
    }
}
