//! Records read from a COCO index and the annotation model they become.
//!
//! Source side: [`ImageRecord`], [`Category`], [`ObjectRecord`] (with its
//! [`Segmentation`]). Target side: [`ClassDescriptor`], [`Label`], [`Tag`] and
//! the per-image [`Annotation`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{CategoryId, ImageId, ObjectId};
use super::shape::Shape;

// ============================================================================
// Source records
// ============================================================================

/// An image entry of a COCO index.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageRecord {
    pub id: ImageId,

    /// File name as written in the index. May contain directory components.
    pub file_name: String,

    /// Width in pixels; `0` when the index omits it.
    pub width: u32,

    /// Height in pixels; `0` when the index omits it.
    pub height: u32,
}

impl ImageRecord {
    pub fn new(id: impl Into<ImageId>, file_name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            width,
            height,
        }
    }

    /// The file name with any `/`-separated directory components removed.
    ///
    /// Images are looked up, copied and named by this base name.
    pub fn base_name(&self) -> &str {
        self.file_name
            .rsplit('/')
            .next()
            .unwrap_or(self.file_name.as_str())
    }

    /// The declared size, or `None` if either dimension is missing.
    pub fn size(&self) -> Option<ImageSize> {
        (self.width > 0 && self.height > 0).then(|| ImageSize::new(self.height, self.width))
    }
}

/// A source category.
#[derive(Clone, Debug, PartialEq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub supercategory: Option<String>,
}

impl Category {
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            supercategory: None,
        }
    }
}

/// A run-length-encoded binary mask in COCO layout.
///
/// Runs alternate background/foreground starting with background and walk
/// the raster in column-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct RleMask {
    pub height: u32,
    pub width: u32,
    pub counts: RleCounts,
}

/// The two spellings of RLE counts found in COCO exports.
#[derive(Clone, Debug, PartialEq)]
pub enum RleCounts {
    /// The compact textual encoding produced by COCO mask tools.
    Compressed(String),
    /// An explicit list of run lengths.
    Runs(Vec<u64>),
}

/// An object's segmentation, classified once when the index is read.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Segmentation {
    /// A raster mask.
    Mask(RleMask),
    /// One or more flat vertex lists `[x0, y0, x1, y1, ...]`.
    VertexRings(Vec<Vec<f64>>),
    /// No segmentation, `null`, or an empty list.
    #[default]
    Absent,
}

/// One object record (a COCO "annotation" entry).
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectRecord {
    pub id: ObjectId,
    pub image_id: ImageId,
    pub category_id: CategoryId,
    pub segmentation: Segmentation,

    /// Declared `[x, y, width, height]` box. Kept as a list so a box with the
    /// wrong number of components can be reported instead of failing the parse.
    pub bbox: Option<Vec<f64>>,

    pub caption: Option<String>,
}

impl ObjectRecord {
    pub fn new(
        id: impl Into<ObjectId>,
        image_id: impl Into<ImageId>,
        category_id: impl Into<CategoryId>,
    ) -> Self {
        Self {
            id: id.into(),
            image_id: image_id.into(),
            category_id: category_id.into(),
            segmentation: Segmentation::Absent,
            bbox: None,
            caption: None,
        }
    }

    pub fn with_segmentation(mut self, segmentation: Segmentation) -> Self {
        self.segmentation = segmentation;
        self
    }

    pub fn with_bbox(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.bbox = Some(vec![x, y, width, height]);
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }
}

// ============================================================================
// Target model
// ============================================================================

/// An RGB display color, written as `#rrggbb`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    /// Euclidean distance in RGB space.
    pub fn distance(&self, other: &Rgb) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(&a, &b)| {
                let d = f64::from(a) - f64::from(b);
                d * d
            })
            .sum::<f64>()
            .sqrt()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02X}{g:02X}{b:02X}")
    }
}

impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| format!("color '{s}' must start with '#'"))?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(format!("color '{s}' must have six hex digits"));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| format!("color '{s}' has invalid hex digits"))
        };
        Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
    }
}

impl Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A target class: a unique name and its display color.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassDescriptor {
    pub name: String,
    pub color: Rgb,
}

/// An image-level tag declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagMeta {
    pub name: String,
}

/// A shape assigned to a class.
///
/// The class is borrowed from the registry that issued it.
#[derive(Clone, Debug, PartialEq)]
pub struct Label<'r> {
    pub shape: Shape,
    pub class: &'r ClassDescriptor,
}

impl<'r> Label<'r> {
    pub fn new(shape: Shape, class: &'r ClassDescriptor) -> Self {
        Self { shape, class }
    }
}

impl Serialize for Label<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct LabelRef<'a> {
            #[serde(flatten)]
            shape: &'a Shape,
            class: &'a str,
        }
        LabelRef {
            shape: &self.shape,
            class: &self.class.name,
        }
        .serialize(serializer)
    }
}

/// Image-level metadata, e.g. a caption.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Image dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub height: u32,
    pub width: u32,
}

impl ImageSize {
    pub fn new(height: u32, width: u32) -> Self {
        Self { height, width }
    }
}

/// The converted annotation of one image.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Annotation<'r> {
    pub image_size: ImageSize,
    pub labels: Vec<Label<'r>>,
    pub tags: Vec<Tag>,
}

impl<'r> Annotation<'r> {
    pub fn new(image_size: ImageSize) -> Self {
        Self {
            image_size,
            labels: Vec::new(),
            tags: Vec::new(),
        }
    }
}
