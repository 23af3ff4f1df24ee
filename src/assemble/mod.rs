//! Per-image annotation assembly.
//!
//! Each object of an image is routed by its segmentation variant: masks go
//! through the RLE decoder, vertex lists through the ring resolver, and
//! objects without a segmentation produce no shapes. Declared boxes are then
//! reconciled against the shapes the object produced, and captions become
//! image tags.

use std::collections::HashMap;

use crate::conversion::{ConversionIssue, ConversionIssueCode, ConversionReport};
use crate::error::CocoShapeError;
use crate::geometry::{bbox, mask_to_polygons, reconcile, resolve_rings};
use crate::ir::{
    Annotation, Category, CategoryId, ClassDescriptor, ImageRecord, ImageSize, Label,
    ObjectRecord, Segmentation, Shape, Tag,
};
use crate::registry::ClassRegistry;

/// Tag name under which object captions are recorded.
pub const CAPTION_TAG: &str = "caption";

/// Joins an image's objects into one [`Annotation`].
///
/// Category ids are mapped to descriptors up front; the registry must
/// already hold a descriptor for every category name of the dataset.
pub struct Assembler<'r> {
    classes: HashMap<CategoryId, &'r ClassDescriptor>,
    ignore_bbox: bool,
}

impl<'r> Assembler<'r> {
    /// Binds category ids to the registry's descriptors.
    ///
    /// A category whose name is not registered stays unmapped, and objects
    /// referencing it fail as unknown.
    pub fn new(registry: &'r ClassRegistry, categories: &[Category], ignore_bbox: bool) -> Self {
        let classes = categories
            .iter()
            .filter_map(|cat| registry.get(&cat.name).map(|class| (cat.id, class)))
            .collect();
        Self {
            classes,
            ignore_bbox,
        }
    }

    /// Builds the annotation for `image`.
    ///
    /// Labels follow object order, and within an object its shapes come
    /// before its rectangles. Objects with bad masks or bad boxes are
    /// reported and skipped in part or whole.
    ///
    /// # Errors
    /// Returns [`CocoShapeError::UnknownCategory`] when an object with a
    /// segmentation or a consumed box references an unmapped category, even
    /// if its geometry yields no labels.
    pub fn assemble(
        &self,
        image: &ImageRecord,
        size: ImageSize,
        objects: &[&ObjectRecord],
        report: &mut ConversionReport,
    ) -> Result<Annotation<'r>, CocoShapeError> {
        let mut annotation = Annotation::new(size);

        for object in objects {
            let shapes: Vec<Shape> = match &object.segmentation {
                Segmentation::Mask(mask) => match mask_to_polygons(mask) {
                    Ok(polygons) => polygons.into_iter().map(Shape::Polygon).collect(),
                    Err(err) => {
                        log::warn!(
                            "{}: skipping object {}: {err}",
                            image.file_name,
                            object.id
                        );
                        report.add(ConversionIssue::warning(
                            ConversionIssueCode::MalformedMask,
                            format!("{}: object {}: {err}", image.file_name, object.id),
                        ));
                        continue;
                    }
                },
                Segmentation::VertexRings(rings) => resolve_rings(rings, size)
                    .into_iter()
                    .map(Shape::Polygon)
                    .collect(),
                Segmentation::Absent => Vec::new(),
            };

            let rectangles = if self.ignore_bbox {
                Vec::new()
            } else {
                reconcile(self.declared_box(image, object, report), &shapes)
            };

            let has_geometry = !matches!(object.segmentation, Segmentation::Absent);
            if has_geometry || !rectangles.is_empty() {
                let class = self.class_of(image, object)?;
                annotation
                    .labels
                    .extend(shapes.into_iter().map(|shape| Label::new(shape, class)));
                annotation.labels.extend(
                    rectangles
                        .into_iter()
                        .map(|rect| Label::new(Shape::Rectangle(rect), class)),
                );
            }

            if let Some(caption) = &object.caption {
                annotation.tags.push(Tag::new(CAPTION_TAG, caption.as_str()));
            }
        }

        Ok(annotation)
    }

    fn class_of(
        &self,
        image: &ImageRecord,
        object: &ObjectRecord,
    ) -> Result<&'r ClassDescriptor, CocoShapeError> {
        self.classes
            .get(&object.category_id)
            .copied()
            .ok_or(CocoShapeError::UnknownCategory {
                image_id: image.id,
                category_id: object.category_id,
            })
    }

    fn declared_box(
        &self,
        image: &ImageRecord,
        object: &ObjectRecord,
        report: &mut ConversionReport,
    ) -> Option<[f64; 4]> {
        let raw = object.bbox.as_deref()?;
        let parsed = bbox::parse_declared(raw);
        if parsed.is_none() {
            log::warn!(
                "{}: ignoring malformed bbox {raw:?} of object {}",
                image.file_name,
                object.id
            );
            report.add(ConversionIssue::warning(
                ConversionIssueCode::MalformedBbox,
                format!(
                    "{}: object {} has bbox {raw:?}, expected four finite values",
                    image.file_name, object.id
                ),
            ));
        }
        parsed
    }
}
