#![no_main]
use libfuzzer_sys::fuzz_target;
use licscope::config::ParsingConfig;
use licscope::parsers::{GraphParser, ParseContext, Parser};
use licscope::rules::RuleStore;
use std::sync::OnceLock;

static RULES: OnceLock<RuleStore> = OnceLock::new();

/// Fuzz format detection and every input parser in permissive mode.
fuzz_target!(|data: &[u8]| {
    let rules = RULES.get_or_init(|| RuleStore::embedded().expect("embedded rules"));
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(parser) = Parser::detect(s) {
            let mut ctx = ParseContext::new(rules, true, ParsingConfig::default());
            let _ = parser.parse_str(s, &mut ctx);
        }
    }
});
