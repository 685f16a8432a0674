#![no_main]

//! Fuzz target for webhook payload normalization.
//!
//! Feeds arbitrary bytes through JSON parsing, both normalizers and the
//! validator. Any panic is a bug; every normalized record must validate.

use std::sync::Arc;

use hookline_core::{validate, Normalizer, TestClock};
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    let Ok(payload) = serde_json::from_slice::<Value>(data) else {
        return;
    };

    let normalizer = Normalizer::new(Arc::new(TestClock::new()));

    if let Ok(record) = normalizer.push(&payload) {
        assert_eq!(record.from_branch, record.to_branch);
        assert!(validate(&record).is_ok(), "push record failed validation: {record:?}");
    }

    if let Ok(record) = normalizer.pull_request(&payload) {
        assert!(validate(&record).is_ok(), "pull request record failed validation: {record:?}");
    }
});
