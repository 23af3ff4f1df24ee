#![allow(dead_code)]

use image::GrayImage;
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

use cocoshape::geometry::rle::FOREGROUND;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// An axis-aligned block of foreground pixels inside a raster.
#[derive(Clone, Debug)]
pub struct Block {
    pub height: u32,
    pub width: u32,
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Block {
    /// Renders the block; `x1` and `y1` are inclusive.
    pub fn raster(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            let inside = (self.x0..=self.x1).contains(&x) && (self.y0..=self.y1).contains(&y);
            image::Luma([if inside { FOREGROUND } else { 0 }])
        })
    }
}

/// Blocks at least 2x2 pixels, inside rasters up to `max` pixels a side.
pub fn arb_block(max: u32) -> BoxedStrategy<Block> {
    assert!(max >= 3, "max must be >= 3");
    (3u32..=max, 3u32..=max)
        .prop_flat_map(|(width, height)| {
            (
                Just(width),
                Just(height),
                0..width - 1,
                0..height - 1,
                any::<u32>(),
                any::<u32>(),
            )
        })
        .prop_map(|(width, height, x0, y0, sw, sh)| {
            let x1 = x0 + 1 + sw % (width - x0 - 1);
            let y1 = y0 + 1 + sh % (height - y0 - 1);
            Block {
                height,
                width,
                x0,
                y0,
                x1,
                y1,
            }
        })
        .boxed()
}

/// Column-major run lengths that sum to `height * width`.
pub fn arb_runs(max_side: u32) -> BoxedStrategy<(u32, u32, Vec<u64>)> {
    (1u32..=max_side, 1u32..=max_side)
        .prop_flat_map(|(height, width)| {
            let total = u64::from(height) * u64::from(width);
            (
                Just(height),
                Just(width),
                proptest::collection::vec(1u64..=total, 0..12),
            )
        })
        .prop_map(|(height, width, cuts)| {
            let total = u64::from(height) * u64::from(width);
            let mut cuts: Vec<u64> = cuts.into_iter().filter(|&c| c < total).collect();
            cuts.sort_unstable();
            cuts.dedup();

            let mut runs = Vec::with_capacity(cuts.len() + 1);
            let mut last = 0;
            for cut in cuts {
                runs.push(cut - last);
                last = cut;
            }
            runs.push(total - last);
            (height, width, runs)
        })
        .boxed()
}

pub fn foreground_pixels(raster: &GrayImage) -> Vec<(u32, u32)> {
    raster
        .enumerate_pixels()
        .filter(|(_, _, p)| p[0] == FOREGROUND)
        .map(|(x, y, _)| (x, y))
        .collect()
}
