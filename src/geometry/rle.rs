//! Run-length mask decoding.
//!
//! COCO masks are stored column-major: run `i` covers the next `counts[i]`
//! pixels walking down each column in turn, and runs alternate background,
//! foreground, background, ... starting with background.
//!
//! The compact textual form packs each count into 5-bit groups, one
//! character per group (`'0' + group`). Bit `0x20` of a group marks that
//! another group follows; bit `0x10` of the final group is the sign. Counts
//! after the second are stored as the difference from the count two
//! positions earlier.

use image::{GrayImage, Luma};

use super::contour;
use crate::error::CocoShapeError;
use crate::ir::{Polygon, RleCounts, RleMask};

/// Pixel value used for foreground in decoded rasters.
pub const FOREGROUND: u8 = 255;

/// Longest group sequence a single count may use (60 bits).
const MAX_GROUPS: usize = 12;

/// Largest mask extent decoded, in pixels (a 16384 x 16384 raster).
pub const MAX_MASK_PIXELS: u64 = 1 << 28;

/// Decodes the compact textual counts into run lengths.
///
/// # Errors
/// Returns [`CocoShapeError::MalformedMask`] on characters outside `'0'..='o'`,
/// a truncated final count, or a count that decodes to a negative length.
pub fn decode_counts(text: &str) -> Result<Vec<u64>, CocoShapeError> {
    let bytes = text.as_bytes();
    let mut counts: Vec<i64> = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let mut value: i64 = 0;
        let mut groups = 0;
        loop {
            let Some(&byte) = bytes.get(pos) else {
                return Err(CocoShapeError::MalformedMask(format!(
                    "counts string ends inside a count at offset {pos}"
                )));
            };
            if !(b'0'..=b'o').contains(&byte) {
                return Err(CocoShapeError::MalformedMask(format!(
                    "invalid character {:?} at offset {pos}",
                    byte as char
                )));
            }
            if groups == MAX_GROUPS {
                return Err(CocoShapeError::MalformedMask(format!(
                    "count starting before offset {pos} is too long"
                )));
            }

            let group = i64::from(byte - b'0');
            value |= (group & 0x1f) << (5 * groups);
            groups += 1;
            pos += 1;

            if group & 0x20 == 0 {
                if group & 0x10 != 0 {
                    value |= -1i64 << (5 * groups);
                }
                break;
            }
        }

        if counts.len() > 2 {
            value = value
                .checked_add(counts[counts.len() - 2])
                .ok_or_else(|| {
                    CocoShapeError::MalformedMask(format!("run {} overflows", counts.len()))
                })?;
        }
        if value < 0 {
            return Err(CocoShapeError::MalformedMask(format!(
                "run {} has negative length {value}",
                counts.len()
            )));
        }
        counts.push(value);
    }

    Ok(counts.into_iter().map(|c| c as u64).collect())
}

/// Encodes run lengths into the compact textual form.
pub fn encode_counts(counts: &[u64]) -> String {
    let mut out = String::new();
    for (i, &count) in counts.iter().enumerate() {
        let mut value = count as i64;
        if i > 2 {
            value -= counts[i - 2] as i64;
        }
        loop {
            let mut group = (value & 0x1f) as u8;
            value >>= 5;
            let more = if group & 0x10 != 0 {
                value != -1
            } else {
                value != 0
            };
            if more {
                group |= 0x20;
            }
            out.push(char::from(group + b'0'));
            if !more {
                break;
            }
        }
    }
    out
}

/// Decodes a mask into a row-major raster of its stated extent.
///
/// Foreground pixels are [`FOREGROUND`], background pixels are `0`.
///
/// # Errors
/// Returns [`CocoShapeError::MalformedMask`] if the extent exceeds
/// [`MAX_MASK_PIXELS`], or the counts cannot be decoded or do not sum to
/// exactly `height * width`.
pub fn decode(mask: &RleMask) -> Result<GrayImage, CocoShapeError> {
    let height = u64::from(mask.height);
    let width = u64::from(mask.width);
    let expected = height * width;
    if expected > MAX_MASK_PIXELS {
        return Err(CocoShapeError::MalformedMask(format!(
            "mask extent {height}x{width} exceeds {MAX_MASK_PIXELS} pixels"
        )));
    }

    let decoded;
    let runs: &[u64] = match &mask.counts {
        RleCounts::Runs(runs) => runs,
        RleCounts::Compressed(text) => {
            decoded = decode_counts(text)?;
            &decoded
        }
    };

    let total = runs
        .iter()
        .try_fold(0u64, |acc, &run| acc.checked_add(run))
        .ok_or_else(|| CocoShapeError::MalformedMask("run lengths overflow".to_string()))?;
    if total != expected {
        return Err(CocoShapeError::MalformedMask(format!(
            "run lengths sum to {total}, expected {height}x{width} = {expected}"
        )));
    }

    let mut raster = GrayImage::new(mask.width, mask.height);
    let mut offset = 0u64;
    for (i, &run) in runs.iter().enumerate() {
        if i % 2 == 1 {
            for idx in offset..offset + run {
                let x = (idx / height) as u32;
                let y = (idx % height) as u32;
                raster.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
        offset += run;
    }

    Ok(raster)
}

/// Encodes a raster (any non-zero pixel is foreground) into explicit runs.
pub fn encode(raster: &GrayImage) -> RleMask {
    let (width, height) = raster.dimensions();
    let mut counts = Vec::new();
    let mut current = false;
    let mut run = 0u64;
    for x in 0..width {
        for y in 0..height {
            let fg = raster.get_pixel(x, y)[0] != 0;
            if fg != current {
                counts.push(run);
                run = 0;
                current = fg;
            }
            run += 1;
        }
    }
    counts.push(run);

    RleMask {
        height,
        width,
        counts: RleCounts::Runs(counts),
    }
}

/// Decodes a mask and traces each foreground region's outer boundary.
///
/// Every contour becomes its own hole-free polygon; holes inside a mask
/// region are not reconstructed. An empty mask yields no polygons.
pub fn mask_to_polygons(mask: &RleMask) -> Result<Vec<Polygon>, CocoShapeError> {
    let raster = decode(mask)?;
    Ok(contour::outer_contours(&raster)
        .into_iter()
        .map(Polygon::solid)
        .collect())
}

/// Fuzz-only entrypoint: decodes compressed counts as a small mask and
/// traces it.
#[cfg(feature = "fuzzing")]
pub fn fuzz_trace_mask(height: u8, width: u8, text: &str) -> Result<usize, CocoShapeError> {
    let mask = RleMask {
        height: u32::from(height),
        width: u32::from(width),
        counts: RleCounts::Compressed(text.to_string()),
    };
    Ok(mask_to_polygons(&mask)?.len())
}
