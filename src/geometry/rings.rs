//! Grouping raw vertex rings into exteriors and holes.
//!
//! A COCO object may list several rings without saying which are outer
//! boundaries and which are holes. For each candidate exterior `R`, in input
//! order, `R` is rasterized on its own and its boundary contour traced; any
//! other unclaimed ring whose every vertex lies strictly inside that contour
//! becomes a hole of `R`. The first container wins and a claimed ring is never
//! considered again, neither as a hole of another ring nor as an exterior.
//!
//! Containment is decided by sampling vertices, not by intersecting edges,
//! so two partially overlapping rings can be misclassified. Clean nesting of
//! one level, which is what COCO exports contain, is resolved exactly.
//!
//! Cost is O(R² · V) for R rings of V vertices each.

use super::contour::{contains_strictly, trace_ring};
use crate::ir::{ImageSize, Polygon, Ring};

/// Resolves an object's raw rings into polygons with holes.
///
/// `size` is the extent of the raster each ring is traced on, normally the
/// image size. Rings with fewer than three points are dropped. Output order
/// follows the input order of the exterior rings; holes keep the order in
/// which they were claimed.
pub fn resolve_rings(rings: &[Vec<f64>], size: ImageSize) -> Vec<Polygon> {
    let rings: Vec<Ring> = rings
        .iter()
        .map(|coords| Ring::from_flat(coords))
        .filter(|ring| {
            let keep = ring.len() >= 3;
            if !keep {
                log::debug!("dropping ring with {} point(s)", ring.len());
            }
            keep
        })
        .collect();

    if rings.len() == 1 {
        return rings.into_iter().map(Polygon::solid).collect();
    }

    let mut claimed = vec![false; rings.len()];
    let mut holes: Vec<Vec<usize>> = vec![Vec::new(); rings.len()];

    for (idx, ring) in rings.iter().enumerate() {
        if claimed[idx] {
            continue;
        }
        let Some(contour) = trace_ring(ring, size) else {
            continue;
        };
        for (idy, other) in rings.iter().enumerate() {
            if idy == idx || claimed[idy] {
                continue;
            }
            if other.points().iter().all(|&p| contains_strictly(&contour, p)) {
                claimed[idy] = true;
                holes[idx].push(idy);
            }
        }
    }

    let mut slots: Vec<Option<Ring>> = rings.into_iter().map(Some).collect();
    let mut polygons = Vec::new();
    for idx in 0..slots.len() {
        if claimed[idx] {
            continue;
        }
        let Some(exterior) = slots[idx].take() else {
            continue;
        };
        let interiors = holes[idx]
            .iter()
            .filter_map(|&idy| slots[idy].take())
            .collect();
        polygons.push(Polygon::new(exterior, interiors));
    }
    polygons
}
