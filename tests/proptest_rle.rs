use cocoshape::geometry::contour::rasterize_ring;
use cocoshape::geometry::rle::{decode, decode_counts, encode, encode_counts, mask_to_polygons};
use cocoshape::ir::{ImageSize, RleCounts, RleMask};
use proptest::prelude::*;

mod proptest_helpers;
use proptest_helpers::{arb_block, arb_runs, foreground_pixels};

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn compressed_counts_survive_encoding((_, _, runs) in arb_runs(40)) {
        let text = encode_counts(&runs);
        prop_assert!(text.bytes().all(|b| (b'0'..=b'o').contains(&b)), "{text}");
        prop_assert_eq!(decode_counts(&text).expect("decode counts"), runs);
    }

    #[test]
    fn decoded_foreground_matches_odd_runs((height, width, runs) in arb_runs(40)) {
        let expected: u64 = runs.iter().skip(1).step_by(2).sum();
        let mask = RleMask { height, width, counts: RleCounts::Runs(runs) };
        let raster = decode(&mask).expect("decode mask");
        prop_assert_eq!((raster.width(), raster.height()), (width, height));
        prop_assert_eq!(foreground_pixels(&raster).len() as u64, expected);
    }

    #[test]
    fn compressed_and_literal_masks_agree((height, width, runs) in arb_runs(24)) {
        let literal = RleMask { height, width, counts: RleCounts::Runs(runs.clone()) };
        let compressed = RleMask {
            height,
            width,
            counts: RleCounts::Compressed(encode_counts(&runs)),
        };
        prop_assert_eq!(
            decode(&literal).expect("decode literal"),
            decode(&compressed).expect("decode compressed")
        );
    }

    #[test]
    fn block_mask_encodes_losslessly(block in arb_block(48)) {
        let raster = block.raster();
        prop_assert_eq!(decode(&encode(&raster)).expect("decode"), raster);
    }

    #[test]
    fn block_contour_reproduces_foreground(block in arb_block(48)) {
        let raster = block.raster();
        let polygons = mask_to_polygons(&encode(&raster)).expect("trace mask");
        prop_assert_eq!(polygons.len(), 1);
        prop_assert!(polygons[0].interiors.is_empty());

        let size = ImageSize::new(block.height, block.width);
        let redrawn = rasterize_ring(&polygons[0].exterior, size).expect("rasterize contour");
        prop_assert_eq!(foreground_pixels(&redrawn), foreground_pixels(&raster));
    }
}
