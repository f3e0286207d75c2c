#![no_main]

use libfuzzer_sys::fuzz_target;
use numrepro::hexfloat::{format_hex_f64, parse_sample};
use numrepro::probes::parse_probe_csv;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Any dump decodes without panicking
        let parsed = parse_probe_csv(input);

        // Decoded values render back to the same bits
        for record in &parsed.records {
            if let Ok(value) = parse_sample(&format_hex_f64(record.value)) {
                assert!(value.to_bits() == record.value.to_bits() || value.is_nan());
            }
        }
    }
});
