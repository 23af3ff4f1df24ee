#![allow(dead_code)]

use std::fs;
use std::path::Path;

pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bmp_bytes(width, height)).expect("write bmp file");
}

/// Writes `<root>/<name>/annotations/instances.json` and one BMP per entry
/// of `images` under `<root>/<name>/images/`.
pub fn write_dataset(root: &Path, name: &str, index: &serde_json::Value, images: &[(&str, u32, u32)]) {
    let dataset = root.join(name);
    let annotations = dataset.join("annotations");
    fs::create_dir_all(&annotations).expect("create annotations dir");
    fs::write(
        annotations.join("instances.json"),
        serde_json::to_string_pretty(index).expect("serialize index"),
    )
    .expect("write index");

    for &(file_name, width, height) in images {
        write_bmp(&dataset.join("images").join(file_name), width, height);
    }
}

/// A one-image dataset: a square polygon with a box, a caption-only entry.
pub fn single_polygon_index() -> serde_json::Value {
    serde_json::json!({
        "images": [
            {"id": 1, "file_name": "cat.bmp", "width": 32, "height": 24}
        ],
        "categories": [
            {"id": 1, "name": "cat"}
        ],
        "annotations": [
            {
                "id": 1, "image_id": 1, "category_id": 1,
                "segmentation": [[2, 2, 12, 2, 12, 12, 2, 12]],
                "bbox": [2, 2, 10, 10]
            },
            {"id": 2, "image_id": 1, "caption": "a cat sitting still"}
        ]
    })
}
