//! Parser selection.
//!
//! The set of input formats is closed: [`Parser`] is an enum over the three
//! implementations, chosen explicitly by [`ParserKind`] or by content
//! detection.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::native::NativeBuildParser;
use super::sbom::SbomParser;
use super::scancode::ScancodeParser;
use super::traits::{FormatConfidence, GraphParser, ParseContext};
use crate::error::{LicscopeError, ParseErrorKind, Result};

/// Input format identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParserKind {
    /// SPDX 2.x or CycloneDX JSON
    Sbom,
    /// GN-style build graph JSON
    #[value(alias = "gn")]
    Native,
    /// ScanCode JSON results
    Scancode,
}

impl ParserKind {
    pub const ALL: [Self; 3] = [Self::Sbom, Self::Native, Self::Scancode];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sbom => "sbom",
            Self::Native => "native",
            Self::Scancode => "scancode",
        }
    }
}

impl fmt::Display for ParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One of the supported input parsers.
#[derive(Debug, Clone, Copy)]
pub enum Parser {
    Sbom(SbomParser),
    Native(NativeBuildParser),
    Scancode(ScancodeParser),
}

impl Parser {
    #[must_use]
    pub const fn for_kind(kind: ParserKind) -> Self {
        match kind {
            ParserKind::Sbom => Self::Sbom(SbomParser::new()),
            ParserKind::Native => Self::Native(NativeBuildParser::new()),
            ParserKind::Scancode => Self::Scancode(ScancodeParser::new()),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ParserKind {
        match self {
            Self::Sbom(_) => ParserKind::Sbom,
            Self::Native(_) => ParserKind::Native,
            Self::Scancode(_) => ParserKind::Scancode,
        }
    }

    /// Pick the parser most confident it can handle `content`.
    ///
    /// # Errors
    ///
    /// Returns a parse error when no parser reaches the minimum confidence.
    pub fn detect(content: &str) -> Result<Self> {
        let best = ParserKind::ALL
            .into_iter()
            .map(Self::for_kind)
            .map(|parser| (parser.detect(content), parser))
            .filter(|(confidence, _)| confidence.can_parse())
            .max_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        match best {
            Some((confidence, parser)) => {
                tracing::debug!(
                    "Detected {} input (confidence {:.2})",
                    parser.kind(),
                    confidence.value()
                );
                Ok(parser)
            }
            None => Err(LicscopeError::parse(
                "input detection",
                ParseErrorKind::UnknownFormat(
                    "expected an SPDX/CycloneDX SBOM, a build graph or ScanCode results".to_string(),
                ),
            )),
        }
    }

    fn inner(&self) -> &dyn GraphParser {
        match self {
            Self::Sbom(parser) => parser,
            Self::Native(parser) => parser,
            Self::Scancode(parser) => parser,
        }
    }
}

impl GraphParser for Parser {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn detect(&self, content: &str) -> FormatConfidence {
        self.inner().detect(content)
    }

    fn parse_str(&self, content: &str, ctx: &mut ParseContext<'_>) -> Result<()> {
        self.inner().parse_str(content, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_each_format() {
        let spdx = r#"{"spdxVersion": "SPDX-2.3", "SPDXID": "SPDXRef-DOCUMENT", "packages": []}"#;
        let native = r#"{"targets": {"//a:a": {"type": "executable"}}}"#;
        let scan = r#"{"files": [{"path": "a/b.c", "detected_license_expression_spdx": "MIT"}]}"#;

        assert_eq!(Parser::detect(spdx).unwrap().kind(), ParserKind::Sbom);
        assert_eq!(Parser::detect(native).unwrap().kind(), ParserKind::Native);
        assert_eq!(Parser::detect(scan).unwrap().kind(), ParserKind::Scancode);
    }

    #[test]
    fn test_detect_unknown() {
        assert!(Parser::detect(r#"{"hello": "world"}"#).is_err());
        assert!(Parser::detect("not json").is_err());
    }

    #[test]
    fn test_names_match_kinds() {
        for kind in ParserKind::ALL {
            assert_eq!(Parser::for_kind(kind).name(), kind.name());
        }
    }
}
