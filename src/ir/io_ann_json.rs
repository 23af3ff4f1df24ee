//! JSON files on the destination side.
//!
//! Two documents are written:
//!
//! - One annotation file per image, `ann/{image file name}.json`:
//!   `{"image_size": {"height", "width"}, "labels": [{"geometry_type",
//!   "geometry", "class"}], "tags": [{"name", "value"}]}`.
//! - One project meta file per destination root, `meta.json`, declaring
//!   every class (title, shape kind, color) and tag.
//!
//! Both can be read back, the meta file so an existing project keeps its
//! class colors across runs.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::model::{Annotation, ImageSize, Rgb, Tag};
use super::shape::Shape;
use crate::error::CocoShapeError;

/// Shape kind recorded for every class: classes accept any geometry.
pub const ANY_SHAPE: &str = "any";

/// Value type recorded for every tag: free text.
pub const ANY_STRING: &str = "any_string";

/// An annotation file as read back from disk, with class names unresolved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotationFile {
    pub image_size: ImageSize,
    #[serde(default)]
    pub labels: Vec<LabelRecord>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// A label as stored on disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelRecord {
    #[serde(flatten)]
    pub shape: Shape,
    pub class: String,
}

/// The project-wide class and tag declarations.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectMeta {
    #[serde(default)]
    pub classes: Vec<MetaClass>,
    #[serde(default)]
    pub tags: Vec<MetaTag>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetaClass {
    pub title: String,
    pub shape: String,
    pub color: Rgb,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetaTag {
    pub name: String,
    pub value_type: String,
}

/// Writes one image's annotation.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_annotation(path: &Path, annotation: &Annotation<'_>) -> Result<(), CocoShapeError> {
    let file = File::create(path).map_err(CocoShapeError::Io)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer(writer, annotation).map_err(|source| CocoShapeError::AnnotationWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads an annotation file back.
pub fn read_annotation(path: &Path) -> Result<AnnotationFile, CocoShapeError> {
    let file = File::open(path).map_err(CocoShapeError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| CocoShapeError::AnnotationParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Serializes an annotation to a string.
///
/// Useful for testing without file I/O.
pub fn to_annotation_string(annotation: &Annotation<'_>) -> Result<String, serde_json::Error> {
    serde_json::to_string(annotation)
}

/// Parses an annotation from a string.
pub fn from_annotation_str(json: &str) -> Result<AnnotationFile, serde_json::Error> {
    serde_json::from_str(json)
}

/// Reads the project meta file.
///
/// # Errors
/// Returns an error if the file cannot be read, is not valid JSON, or a
/// class color is not `#rrggbb`.
pub fn read_meta(path: &Path) -> Result<ProjectMeta, CocoShapeError> {
    let file = File::open(path).map_err(CocoShapeError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| CocoShapeError::MetaParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes the project meta file.
pub fn write_meta(path: &Path, meta: &ProjectMeta) -> Result<(), CocoShapeError> {
    let file = File::create(path).map_err(CocoShapeError::Io)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, meta).map_err(|source| CocoShapeError::MetaWrite {
        path: path.to_path_buf(),
        source,
    })
}
