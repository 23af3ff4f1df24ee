//! COCO JSON index reader.
//!
//! Reads the `images`, `categories` and `annotations` lists of a COCO
//! instances file into [`CocoIndex`]. Each annotation entry becomes an
//! [`ObjectRecord`] whose segmentation is classified here, once, into a
//! [`Segmentation`] variant:
//!
//! - `[[x0, y0, ...], [x0, y0, ...]]` or a flat `[x0, y0, ...]`: vertex rings
//! - `{"counts": "...", "size": [h, w]}` or `{"counts": [..], "size": [h, w]}`: mask
//! - missing, `null` or `[]`: absent
//!
//! A segmentation value matching none of these does not fail the index;
//! the object is set aside in [`CocoIndex::rejected`] so the caller can skip
//! it with a warning.
//!
//! COCO bounding boxes use `[x, y, width, height]` with `(x, y)` the top-left
//! corner in absolute pixel coordinates.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use super::model::{Category, ImageRecord, ObjectRecord, RleCounts, RleMask, Segmentation};
use super::{CategoryId, ImageId, ObjectId};
use crate::error::CocoShapeError;

// ============================================================================
// COCO Schema Types (internal to this module)
// ============================================================================

/// Top-level COCO dataset structure. Other top-level keys are ignored.
#[derive(Debug, Deserialize)]
struct CocoDataset {
    #[serde(default)]
    images: Vec<CocoImage>,

    #[serde(default)]
    annotations: Vec<CocoAnnotation>,

    #[serde(default)]
    categories: Vec<CocoCategory>,
}

#[derive(Debug, Deserialize)]
struct CocoImage {
    id: u64,
    file_name: String,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}

#[derive(Debug, Deserialize)]
struct CocoCategory {
    id: u64,
    name: String,
    #[serde(default)]
    supercategory: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CocoAnnotation {
    #[serde(default)]
    id: u64,
    image_id: u64,

    /// Caption-only entries omit this; the class is only resolved when the
    /// object produces a label.
    #[serde(default)]
    category_id: u64,

    #[serde(default)]
    bbox: Option<Vec<f64>>,

    /// Classified after parsing, see [`classify_segmentation`].
    #[serde(default)]
    segmentation: serde_json::Value,

    #[serde(default)]
    caption: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSegmentation {
    Rings(Vec<Vec<f64>>),
    Flat(Vec<f64>),
    Mask { counts: RawCounts, size: [u32; 2] },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCounts {
    Text(String),
    Runs(Vec<u64>),
}

// ============================================================================
// Public API
// ============================================================================

/// The parsed contents of one COCO index file.
#[derive(Clone, Debug, Default)]
pub struct CocoIndex {
    pub images: Vec<ImageRecord>,
    pub categories: Vec<Category>,
    /// Object records in file order.
    pub objects: Vec<ObjectRecord>,
    /// Objects whose segmentation could not be classified.
    pub rejected: Vec<RejectedObject>,
}

/// An object dropped at ingestion because its segmentation is unrecognizable.
#[derive(Clone, Debug, PartialEq)]
pub struct RejectedObject {
    pub id: ObjectId,
    pub image_id: ImageId,
    pub reason: String,
}

impl CocoIndex {
    /// Groups objects by image, keeping file order within each image.
    pub fn objects_by_image(&self) -> HashMap<ImageId, Vec<&ObjectRecord>> {
        let mut grouped: HashMap<ImageId, Vec<&ObjectRecord>> = HashMap::new();
        for object in &self.objects {
            grouped.entry(object.image_id).or_default().push(object);
        }
        grouped
    }

    /// Returns true if any object carries a caption.
    pub fn has_captions(&self) -> bool {
        self.objects.iter().any(|o| o.caption.is_some())
    }
}

/// Reads a COCO index from a JSON file.
///
/// # Errors
/// Returns an error if the file cannot be opened or is not a COCO document.
pub fn read_coco_json(path: &Path) -> Result<CocoIndex, CocoShapeError> {
    let file = File::open(path).map_err(CocoShapeError::Io)?;
    let reader = BufReader::new(file);

    let coco: CocoDataset =
        serde_json::from_reader(reader).map_err(|source| CocoShapeError::CocoJsonParse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(coco_to_index(coco))
}

/// Reads a COCO index from a JSON string.
///
/// Useful for testing without file I/O.
pub fn from_coco_str(json: &str) -> Result<CocoIndex, serde_json::Error> {
    let coco: CocoDataset = serde_json::from_str(json)?;
    Ok(coco_to_index(coco))
}

/// Reads a COCO index from a JSON byte slice.
pub fn from_coco_slice(bytes: &[u8]) -> Result<CocoIndex, serde_json::Error> {
    let coco: CocoDataset = serde_json::from_slice(bytes)?;
    Ok(coco_to_index(coco))
}

/// Classifies a raw segmentation value.
///
/// # Errors
/// Returns [`CocoShapeError::MalformedInput`] when the value is neither
/// vertex rings nor an RLE mask.
pub fn classify_segmentation(value: serde_json::Value) -> Result<Segmentation, CocoShapeError> {
    if value.is_null() {
        return Ok(Segmentation::Absent);
    }

    let raw: RawSegmentation = serde_json::from_value(value)
        .map_err(|_| {
            CocoShapeError::MalformedInput(
                "segmentation is neither a vertex list nor an RLE mask".to_string(),
            )
        })?;

    Ok(match raw {
        RawSegmentation::Rings(rings) if rings.is_empty() => Segmentation::Absent,
        RawSegmentation::Rings(rings) => Segmentation::VertexRings(rings),
        RawSegmentation::Flat(coords) if coords.is_empty() => Segmentation::Absent,
        RawSegmentation::Flat(coords) => Segmentation::VertexRings(vec![coords]),
        RawSegmentation::Mask {
            counts,
            size: [height, width],
        } => Segmentation::Mask(RleMask {
            height,
            width,
            counts: match counts {
                RawCounts::Text(text) => RleCounts::Compressed(text),
                RawCounts::Runs(runs) => RleCounts::Runs(runs),
            },
        }),
    })
}

// ============================================================================
// Conversion: COCO -> records
// ============================================================================

fn coco_to_index(coco: CocoDataset) -> CocoIndex {
    let images = coco
        .images
        .into_iter()
        .map(|img| ImageRecord {
            id: ImageId::new(img.id),
            file_name: img.file_name,
            width: img.width,
            height: img.height,
        })
        .collect();

    let categories = coco
        .categories
        .into_iter()
        .map(|cat| Category {
            id: CategoryId::new(cat.id),
            name: cat.name,
            supercategory: cat.supercategory,
        })
        .collect();

    let mut objects = Vec::with_capacity(coco.annotations.len());
    let mut rejected = Vec::new();
    for ann in coco.annotations {
        match classify_segmentation(ann.segmentation) {
            Ok(segmentation) => objects.push(ObjectRecord {
                id: ObjectId::new(ann.id),
                image_id: ImageId::new(ann.image_id),
                category_id: CategoryId::new(ann.category_id),
                segmentation,
                bbox: ann.bbox,
                caption: ann.caption,
            }),
            Err(err) => rejected.push(RejectedObject {
                id: ObjectId::new(ann.id),
                image_id: ImageId::new(ann.image_id),
                reason: err.to_string(),
            }),
        }
    }

    CocoIndex {
        images,
        categories,
        objects,
        rejected,
    }
}

// ============================================================================
// Tests
// ============================================================================
