//! Compatibility verdicts.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Compatibility classification, ordered from best to worst.
///
/// `AND` aggregation takes the worst (maximum) verdict and `OR` the best
/// (minimum), so the derived `Ord` is load-bearing.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    #[default]
    Compatible,
    Unknown,
    NeedsReview,
    Incompatible,
}

impl Verdict {
    #[must_use]
    pub fn worst(self, other: Self) -> Self {
        self.max(other)
    }

    #[must_use]
    pub fn best(self, other: Self) -> Self {
        self.min(other)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compatible => "compatible",
            Self::Unknown => "unknown",
            Self::NeedsReview => "needs-review",
            Self::Incompatible => "incompatible",
        }
    }

    #[must_use]
    pub const fn is_compatible(self) -> bool {
        matches!(self, Self::Compatible)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order() {
        assert!(Verdict::Compatible < Verdict::Unknown);
        assert!(Verdict::Unknown < Verdict::NeedsReview);
        assert!(Verdict::NeedsReview < Verdict::Incompatible);
        assert_eq!(Verdict::Compatible.worst(Verdict::NeedsReview), Verdict::NeedsReview);
        assert_eq!(Verdict::Incompatible.best(Verdict::Unknown), Verdict::Unknown);
    }

    #[test]
    fn test_serde_names() {
        let parsed: Verdict = serde_yaml::from_str("needs-review").unwrap();
        assert_eq!(parsed, Verdict::NeedsReview);
        assert_eq!(serde_json::to_string(&Verdict::Incompatible).unwrap(), "\"incompatible\"");
    }
}
