#![no_main]
use libfuzzer_sys::fuzz_target;

/// Fuzz canonical graph import and cycle detection.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(graph) = licscope::graph::LicenseGraph::from_canonical_json(s) {
            let _ = graph.detect_cycle();
            let _ = graph.to_canonical_json();
        }
    }
});
