//! Data model for cocoshape.
//!
//! Source records (images, categories, object records) are read from a COCO
//! index by [`io_coco_json`]. The geometry engine turns them into the target
//! model: [`Shape`]s labelled with [`ClassDescriptor`]s and collected in a
//! per-image [`Annotation`], which [`io_ann_json`] writes out.
//!
//! All coordinates are pixel coordinates with the origin at the image's
//! top-left corner.
//!
//! # Example
//!
//! ```
//! use cocoshape::ir::{Polygon, Rectangle, Ring, Shape};
//!
//! let square = Shape::Polygon(Polygon::solid(Ring::from_flat(&[
//!     0.0, 0.0, 10.0, 0.0, 10.0, 10.0, 0.0, 10.0,
//! ])));
//! assert_eq!(square.bounding_rect(), Some(Rectangle::new(0.0, 0.0, 10.0, 10.0)));
//! ```

mod ids;
pub mod io_ann_json;
pub mod io_coco_json;
mod model;
mod point;
mod shape;

pub use ids::{CategoryId, ImageId, ObjectId};
pub use model::{
    Annotation, Category, ClassDescriptor, ImageRecord, ImageSize, Label, ObjectRecord, Rgb,
    RleCounts, RleMask, Segmentation, Tag, TagMeta,
};
pub use point::Point;
pub use shape::{Polygon, Rectangle, Ring, Shape};
