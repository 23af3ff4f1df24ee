//! Converting a tree of COCO datasets into a shape-annotation project.
//!
//! The source root holds one directory per dataset:
//!
//! ```text
//! <src>/<dataset>/annotations/instances.json
//! <src>/<dataset>/images/<file_name>
//! ```
//!
//! The destination receives the same dataset names with an `img` and an
//! `ann` directory each, plus one `meta.json` shared by all datasets:
//!
//! ```text
//! <dst>/meta.json
//! <dst>/<dataset>/img/<file_name>
//! <dst>/<dataset>/ann/<file_name>.json
//! ```
//!
//! Problems are scoped to the smallest unit they affect and recorded in the
//! returned [`ConversionReport`]; only I/O failures on the destination side
//! abort the run.

pub mod report;

pub use report::{
    ConversionCounts, ConversionIssue, ConversionIssueCode, ConversionReport, ConversionSeverity,
};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::assemble::{Assembler, CAPTION_TAG};
use crate::error::CocoShapeError;
use crate::ir::io_ann_json::{read_meta, write_annotation, write_meta};
use crate::ir::io_coco_json::read_coco_json;
use crate::ir::{ImageRecord, ImageSize};
use crate::registry::{ClassRegistry, DEFAULT_COLOR_SEED};

/// Name of the project meta file at the destination root.
pub const META_FILE: &str = "meta.json";

/// Index file looked up first in a dataset's `annotations` directory.
pub const DEFAULT_INDEX_NAME: &str = "instances.json";

const ANNOTATIONS_DIR: &str = "annotations";
const IMAGES_DIR: &str = "images";
const OUT_IMAGES_DIR: &str = "img";
const OUT_ANNOTATIONS_DIR: &str = "ann";

/// Options for [`convert`].
#[derive(Clone, Debug)]
pub struct ConvertOptions {
    /// Emit no rectangle labels.
    pub ignore_bbox: bool,
    /// Regenerate the project meta even if `meta.json` exists.
    pub force_meta: bool,
    /// Preferred annotation index file name.
    pub index_name: String,
    /// Seed for class color generation.
    pub color_seed: u64,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            ignore_bbox: false,
            force_meta: false,
            index_name: DEFAULT_INDEX_NAME.to_string(),
            color_seed: DEFAULT_COLOR_SEED,
        }
    }
}

/// Converts every dataset under `src` into `dst`.
///
/// Datasets are visited in file-name order, images in index order.
///
/// # Errors
/// Fails if `src` is not a directory, if an existing `meta.json` cannot be
/// read, or on any write failure under `dst`. Per-dataset, per-image and
/// per-object problems are reported instead.
pub fn convert(
    src: &Path,
    dst: &Path,
    opts: &ConvertOptions,
) -> Result<ConversionReport, CocoShapeError> {
    if !src.is_dir() {
        return Err(CocoShapeError::MissingFile(src.to_path_buf()));
    }
    let mut report = ConversionReport::new(src.display().to_string(), dst.display().to_string());

    fs::create_dir_all(dst)?;
    let meta_path = dst.join(META_FILE);
    let (mut registry, reused) = load_registry(&meta_path, opts, &mut report)?;

    for dataset in dataset_dirs(src)? {
        report.counts.datasets += 1;
        convert_dataset(&dataset, dst, opts, &mut registry, &mut report)?;
    }

    if !reused || registry.is_dirty() {
        write_meta(&meta_path, &registry.to_meta())?;
        log::info!(
            "wrote {} with {} class(es)",
            meta_path.display(),
            registry.len()
        );
    }
    report.counts.classes = registry.len();

    Ok(report)
}

/// Returns the registry and whether it was restored from an existing
/// meta file.
fn load_registry(
    meta_path: &Path,
    opts: &ConvertOptions,
    report: &mut ConversionReport,
) -> Result<(ClassRegistry, bool), CocoShapeError> {
    if opts.force_meta || !meta_path.is_file() {
        return Ok((ClassRegistry::new(opts.color_seed), false));
    }

    let meta = read_meta(meta_path)?;
    let message = format!(
        "reusing {} with {} class(es)",
        meta_path.display(),
        meta.classes.len()
    );
    log::info!("{message}");
    report.add(ConversionIssue::info(ConversionIssueCode::MetaReused, message));
    Ok((ClassRegistry::from_meta(&meta, opts.color_seed), true))
}

/// Immediate subdirectories of `src`, sorted by name.
fn dataset_dirs(src: &Path) -> Result<Vec<PathBuf>, CocoShapeError> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(src)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_dir() {
            dirs.push(entry.into_path());
        }
    }
    Ok(dirs)
}

/// Locates a dataset's annotation index.
///
/// `annotations/<index_name>` wins; otherwise the first `*.json` file by
/// name is used.
pub fn find_index(dataset: &Path, index_name: &str) -> Result<Option<PathBuf>, CocoShapeError> {
    let annotations = dataset.join(ANNOTATIONS_DIR);
    let preferred = annotations.join(index_name);
    if preferred.is_file() {
        return Ok(Some(preferred));
    }
    if !annotations.is_dir() {
        return Ok(None);
    }

    for entry in WalkDir::new(&annotations)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(io::Error::from)?;
        let is_json = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if entry.file_type().is_file() && is_json {
            return Ok(Some(entry.into_path()));
        }
    }
    Ok(None)
}

fn convert_dataset(
    dataset: &Path,
    dst: &Path,
    opts: &ConvertOptions,
    registry: &mut ClassRegistry,
    report: &mut ConversionReport,
) -> Result<(), CocoShapeError> {
    let name = dataset
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let Some(index_path) = find_index(dataset, &opts.index_name)? else {
        log::warn!("skipping dataset '{name}': no annotation index");
        report.add(ConversionIssue::warning(
            ConversionIssueCode::IndexNotFound,
            format!("dataset '{name}' has no annotation index"),
        ));
        report.counts.datasets_skipped += 1;
        return Ok(());
    };

    let index = match read_coco_json(&index_path) {
        Ok(index) => index,
        Err(err) => {
            log::warn!("skipping dataset '{name}': {err}");
            report.add(ConversionIssue::warning(
                ConversionIssueCode::IndexParseFailed,
                format!("dataset '{name}': {err}"),
            ));
            report.counts.datasets_skipped += 1;
            return Ok(());
        }
    };
    log::info!(
        "dataset '{name}': {} image(s), {} object(s), {} category(ies)",
        index.images.len(),
        index.objects.len(),
        index.categories.len()
    );

    for rejected in &index.rejected {
        log::warn!(
            "dataset '{name}': skipping object {}: {}",
            rejected.id,
            rejected.reason
        );
        report.add(ConversionIssue::warning(
            ConversionIssueCode::MalformedSegmentation,
            format!(
                "dataset '{name}': object {} of image {}: {}",
                rejected.id, rejected.image_id, rejected.reason
            ),
        ));
    }

    for category in &index.categories {
        registry.ensure(&category.name);
    }
    if index.has_captions() {
        registry.ensure_tag(CAPTION_TAG);
    }

    let images_dir = dataset.join(IMAGES_DIR);
    let out_dir = dst.join(&name);
    let img_dir = out_dir.join(OUT_IMAGES_DIR);
    let ann_dir = out_dir.join(OUT_ANNOTATIONS_DIR);
    fs::create_dir_all(&img_dir)?;
    fs::create_dir_all(&ann_dir)?;

    let registry: &ClassRegistry = registry;
    let assembler = Assembler::new(registry, &index.categories, opts.ignore_bbox);
    let by_image = index.objects_by_image();
    let mut converted = 0usize;

    for image in &index.images {
        let base = image.base_name();
        let source = images_dir.join(base);
        if !source.is_file() {
            log::debug!("dataset '{name}': no file for image '{base}'");
            report.add(ConversionIssue::info(
                ConversionIssueCode::ImageFileMissing,
                format!("dataset '{name}': image '{base}' not found, skipped"),
            ));
            report.counts.images_missing += 1;
            continue;
        }

        let Some(size) = image_size(image, &source) else {
            log::warn!("dataset '{name}': size of image '{base}' is unknown");
            report.add(ConversionIssue::warning(
                ConversionIssueCode::ImageSizeUnknown,
                format!("dataset '{name}': image '{base}' has no readable size, skipped"),
            ));
            report.counts.images_skipped += 1;
            continue;
        };

        let objects = by_image.get(&image.id).map(Vec::as_slice).unwrap_or(&[]);
        let annotation = match assembler.assemble(image, size, objects, report) {
            Ok(annotation) => annotation,
            Err(err @ CocoShapeError::UnknownCategory { .. }) => {
                log::error!("dataset '{name}': {err}");
                report.add(ConversionIssue::error(
                    ConversionIssueCode::UnknownCategory,
                    format!("dataset '{name}': {err}"),
                ));
                report.counts.images_failed += 1;
                continue;
            }
            Err(err) => return Err(err),
        };

        write_annotation(&ann_dir.join(format!("{base}.json")), &annotation)?;
        transfer_image(&source, &img_dir.join(base))?;

        report.counts.images_converted += 1;
        report.counts.labels += annotation.labels.len();
        report.counts.tags += annotation.tags.len();
        converted += 1;
    }

    log::info!("dataset '{name}': converted {converted} image(s)");
    Ok(())
}

/// The declared image size, falling back to the file header.
fn image_size(image: &ImageRecord, path: &Path) -> Option<ImageSize> {
    if let Some(size) = image.size() {
        return Some(size);
    }
    match imagesize::size(path) {
        Ok(dim) => {
            let height = u32::try_from(dim.height).ok()?;
            let width = u32::try_from(dim.width).ok()?;
            (height > 0 && width > 0).then(|| ImageSize::new(height, width))
        }
        Err(err) => {
            log::debug!("cannot read dimensions of {}: {err}", path.display());
            None
        }
    }
}

/// Copies an image file into the destination.
///
/// # Errors
/// Returns [`CocoShapeError::MissingFile`] if `from` does not exist.
pub fn transfer_image(from: &Path, to: &Path) -> Result<(), CocoShapeError> {
    match fs::copy(from, to) {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Err(CocoShapeError::MissingFile(from.to_path_buf()))
        }
        Err(err) => Err(CocoShapeError::Io(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_index_prefers_configured_name() {
        let temp = tempfile::tempdir().unwrap();
        let ann = temp.path().join(ANNOTATIONS_DIR);
        fs::create_dir_all(&ann).unwrap();
        fs::write(ann.join("a.json"), "{}").unwrap();
        fs::write(ann.join(DEFAULT_INDEX_NAME), "{}").unwrap();

        let found = find_index(temp.path(), DEFAULT_INDEX_NAME).unwrap();
        assert_eq!(found, Some(ann.join(DEFAULT_INDEX_NAME)));
    }

    #[test]
    fn test_find_index_falls_back_to_first_json() {
        let temp = tempfile::tempdir().unwrap();
        let ann = temp.path().join(ANNOTATIONS_DIR);
        fs::create_dir_all(&ann).unwrap();
        fs::write(ann.join("notes.txt"), "").unwrap();
        fs::write(ann.join("val.json"), "{}").unwrap();
        fs::write(ann.join("train.json"), "{}").unwrap();

        let found = find_index(temp.path(), DEFAULT_INDEX_NAME).unwrap();
        assert_eq!(found, Some(ann.join("train.json")));
    }

    #[test]
    fn test_find_index_none_without_annotations_dir() {
        let temp = tempfile::tempdir().unwrap();
        assert_eq!(find_index(temp.path(), DEFAULT_INDEX_NAME).unwrap(), None);
    }

    #[test]
    fn test_transfer_missing_image() {
        let temp = tempfile::tempdir().unwrap();
        let err = transfer_image(&temp.path().join("gone.jpg"), &temp.path().join("out.jpg"))
            .unwrap_err();
        assert!(matches!(err, CocoShapeError::MissingFile(_)));
    }

    #[test]
    fn test_image_size_prefers_declared_dimensions() {
        let image = ImageRecord::new(1u64, "a.jpg", 640, 480);
        let size = image_size(&image, Path::new("does-not-exist.jpg"));
        assert_eq!(size, Some(ImageSize::new(480, 640)));
    }

    #[test]
    fn test_convert_rejects_missing_source() {
        let temp = tempfile::tempdir().unwrap();
        let err = convert(
            &temp.path().join("nope"),
            &temp.path().join("out"),
            &ConvertOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CocoShapeError::MissingFile(_)));
    }
}
