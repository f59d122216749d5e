#![no_main]

use libfuzzer_sys::fuzz_target;
use lastschrift::pain008::charset::{clip, to_sepa_charset};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let out = to_sepa_charset(s);
        assert!(out.chars().all(|c| c.is_ascii()));
        assert!(clip("Nm", &out, 70).chars().count() <= 70);
    }
});
