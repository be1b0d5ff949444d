//! Non-fatal license findings.
//!
//! These are attached to nodes and edges and surfaced in reports; they never
//! abort a run.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of id could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownKind {
    License,
    Exception,
    /// The whole expression failed to parse
    Malformed,
}

/// An id absent from the rule store, or an unparseable expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnknownLicenseWarning {
    pub kind: UnknownKind,
    pub id: String,
}

impl UnknownLicenseWarning {
    pub fn license(id: impl Into<String>) -> Self {
        Self {
            kind: UnknownKind::License,
            id: id.into(),
        }
    }

    pub fn exception(id: impl Into<String>) -> Self {
        Self {
            kind: UnknownKind::Exception,
            id: id.into(),
        }
    }

    pub fn malformed(text: impl Into<String>) -> Self {
        Self {
            kind: UnknownKind::Malformed,
            id: text.into(),
        }
    }
}

impl fmt::Display for UnknownLicenseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            UnknownKind::License => write!(f, "unknown license '{}'", self.id),
            UnknownKind::Exception => write!(f, "unknown exception '{}'", self.id),
            UnknownKind::Malformed => write!(f, "malformed license expression '{}'", self.id),
        }
    }
}

/// A leaf matched an exception's targets but already carried another one.
///
/// The existing exception is kept; the conflict is reported instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExceptionConflict {
    pub license: String,
    pub existing: String,
    pub requested: String,
}

impl fmt::Display for ExceptionConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} already carries {}, not applying {}",
            self.license, self.existing, self.requested
        )
    }
}
