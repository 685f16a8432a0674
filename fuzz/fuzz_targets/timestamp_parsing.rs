#![no_main]

//! Fuzz target for timestamp normalization.
//!
//! The normalizer is total: arbitrary text must always yield a display
//! string, and anything `parse` accepts must format without panicking.

use std::sync::Arc;

use hookline_core::{timestamp, TestClock, TimestampNormalizer};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);

    if let Ok(instant) = timestamp::parse(&raw) {
        let _ = timestamp::format(instant);
    }

    let normalizer = TimestampNormalizer::new(Arc::new(TestClock::new()));
    let display = normalizer.normalize(Some(&raw));
    assert!(display.ends_with(" UTC"), "unexpected display form: {display}");
});
