#![no_main]
use libfuzzer_sys::fuzz_target;

/// Fuzz the SPDX expression parser.
///
/// Any expression that parses must render to text that parses back to an
/// equivalent tree.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(expr) = licscope::license::parse_expression(s) {
            let rendered = expr.to_string();
            let reparsed = licscope::license::parse_expression(&rendered)
                .expect("rendered expression must parse");
            assert!(reparsed.equivalent(&expr));
        }
    }
});
