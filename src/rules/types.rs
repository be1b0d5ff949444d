//! Rule store records and the YAML resource layout.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::graph::Relation;
use crate::infer::Verdict;

/// License family classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LicenseFamily {
    PublicDomain,
    Permissive,
    WeakCopyleft,
    StrongCopyleft,
    NetworkCopyleft,
    Proprietary,
}

impl LicenseFamily {
    #[must_use]
    pub const fn is_permissive(self) -> bool {
        matches!(self, Self::PublicDomain | Self::Permissive)
    }

    #[must_use]
    pub const fn is_copyleft(self) -> bool {
        matches!(
            self,
            Self::WeakCopyleft | Self::StrongCopyleft | Self::NetworkCopyleft
        )
    }

    /// 0 for non-copyleft families, rising with the reach of the obligations
    #[must_use]
    pub const fn copyleft_strength(self) -> u8 {
        match self {
            Self::PublicDomain | Self::Permissive | Self::Proprietary => 0,
            Self::WeakCopyleft => 1,
            Self::StrongCopyleft => 2,
            Self::NetworkCopyleft => 3,
        }
    }
}

impl fmt::Display for LicenseFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PublicDomain => write!(f, "public-domain"),
            Self::Permissive => write!(f, "permissive"),
            Self::WeakCopyleft => write!(f, "weak-copyleft"),
            Self::StrongCopyleft => write!(f, "strong-copyleft"),
            Self::NetworkCopyleft => write!(f, "network-copyleft"),
            Self::Proprietary => write!(f, "proprietary"),
        }
    }
}

/// Attributes of one license id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseTermRecord {
    pub spdx_id: String,
    #[serde(default)]
    pub name: String,
    pub family: LicenseFamily,
    /// Relations across which this license's obligations do not propagate
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub non_propagating: Vec<Relation>,
}

impl LicenseTermRecord {
    #[must_use]
    pub const fn is_permissive(&self) -> bool {
        self.family.is_permissive()
    }

    #[must_use]
    pub const fn is_copyleft(&self) -> bool {
        self.family.is_copyleft()
    }

    #[must_use]
    pub const fn copyleft_strength(&self) -> u8 {
        self.family.copyleft_strength()
    }

    #[must_use]
    pub fn propagates_over(&self, relation: Relation) -> bool {
        !self.non_propagating.contains(&relation)
    }
}

/// An exception (`WITH` clause) definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionClause {
    pub spdx_id: String,
    #[serde(default)]
    pub name: String,
    /// Licenses this exception attaches to when found unqualified
    #[serde(default)]
    pub default_target: Vec<String>,
    /// Relations under which the exception applies; empty means all
    #[serde(default)]
    pub protect_scope: Vec<Relation>,
    /// Relations under which the exception is waived
    #[serde(default)]
    pub escape_scope: Vec<Relation>,
}

impl ExceptionClause {
    /// Whether the exception relaxes obligations over `relation`
    #[must_use]
    pub fn applies_to(&self, relation: Relation) -> bool {
        (self.protect_scope.is_empty() || self.protect_scope.contains(&relation))
            && !self.escape_scope.contains(&relation)
    }
}

/// Selects one side of a leaf pair, by license id or by family.
///
/// Both fields empty matches anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<LicenseFamily>,
}

impl Selector {
    pub(crate) fn specificity(&self) -> u8 {
        if self.license.is_some() {
            2
        } else if self.family.is_some() {
            1
        } else {
            0
        }
    }

    pub(crate) fn matches(&self, id: &str, family: LicenseFamily) -> bool {
        match (&self.license, self.family) {
            (Some(license), _) => license == id,
            (None, Some(wanted)) => wanted == family,
            (None, None) => true,
        }
    }
}

/// One row of an action table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRule {
    #[serde(default)]
    pub source: Selector,
    #[serde(default)]
    pub target: Selector,
    pub verdict: Verdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ActionRule {
    pub(crate) fn specificity(&self) -> u8 {
        self.source.specificity() + self.target.specificity()
    }
}

/// Verdict rules for one relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTable {
    pub default: Verdict,
    #[serde(default)]
    pub rules: Vec<ActionRule>,
}

/// `licenses.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LicenseCatalog {
    pub licenses: Vec<LicenseTermRecord>,
}

/// `exceptions.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExceptionCatalog {
    #[serde(default)]
    pub exceptions: Vec<ExceptionClause>,
}

/// `actions.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionSchema {
    pub tables: IndexMap<Relation, ActionTable>,
}
