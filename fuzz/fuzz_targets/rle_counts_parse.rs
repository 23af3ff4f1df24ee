//! Fuzz target for compressed RLE counts and mask tracing.
//!
//! The first two bytes pick the mask height and width; the rest is the
//! counts string.
//!
//! Run with:
//!   cargo +nightly fuzz run rle_counts_parse

#![no_main]

use cocoshape::geometry::rle::{decode_counts, encode_counts, fuzz_trace_mask};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let [height, width, rest @ ..] = data else {
        return;
    };
    let Ok(text) = std::str::from_utf8(rest) else {
        return;
    };

    let _ = fuzz_trace_mask(*height, *width, text);

    // Accepted counts of realistic size re-encode to the same counts.
    let Ok(counts) = decode_counts(text) else {
        return;
    };
    if counts.iter().all(|&c| c < 1 << 40) {
        let again = decode_counts(&encode_counts(&counts)).expect("re-encoded counts decode");
        assert_eq!(again, counts);
    }
});
