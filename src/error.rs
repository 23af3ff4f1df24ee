use std::path::PathBuf;
use thiserror::Error;

use crate::conversion::ConversionReport;
use crate::ir::{CategoryId, ImageId};

/// The main error type for cocoshape operations.
#[derive(Debug, Error)]
pub enum CocoShapeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse COCO JSON from {path}: {source}")]
    CocoJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write annotation JSON to {path}: {source}")]
    AnnotationWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse annotation JSON from {path}: {source}")]
    AnnotationParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse project meta from {path}: {source}")]
    MetaParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write project meta to {path}: {source}")]
    MetaWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Malformed RLE mask: {0}")]
    MalformedMask(String),

    #[error("Image {image_id} has an object with unknown category {category_id}")]
    UnknownCategory {
        image_id: ImageId,
        category_id: CategoryId,
    },

    #[error("File not found: {0}")]
    MissingFile(PathBuf),

    #[error("Conversion failed for {failed_images} image(s)")]
    ConversionFailed {
        failed_images: usize,
        report: ConversionReport,
    },
}
