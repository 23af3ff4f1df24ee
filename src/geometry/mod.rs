//! Geometry reconstruction.
//!
//! - [`rle`]: run-length mask decoding into rasters and contours
//! - [`contour`]: boundary tracing, ring rasterization, containment
//! - [`rings`]: grouping vertex rings into exteriors with holes
//! - [`bbox`]: reconciling declared boxes with the shapes an object produced

pub mod bbox;
pub mod contour;
pub mod rings;
pub mod rle;

pub use bbox::reconcile;
pub use rings::resolve_rings;
pub use rle::mask_to_polygons;
