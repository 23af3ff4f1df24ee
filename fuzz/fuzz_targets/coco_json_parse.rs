//! Fuzz target for COCO index parsing and segmentation classification.
//!
//! Run with:
//!   cargo +nightly fuzz run coco_json_parse

#![no_main]

use cocoshape::ir::io_coco_json::from_coco_slice;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // 10MB is generous for an instances file.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(index) = from_coco_slice(data) {
        // Grouping must hold every accepted object exactly once.
        let grouped: usize = index.objects_by_image().values().map(Vec::len).sum();
        assert_eq!(grouped, index.objects.len());
    }
});
