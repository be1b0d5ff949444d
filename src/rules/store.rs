//! Load-once rule store.

use indexmap::IndexMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use xxhash_rust::xxh3::xxh3_64;

use super::defaults::{ACTIONS_FILE, ACTIONS_YAML, EXCEPTIONS_FILE, EXCEPTIONS_YAML, LICENSES_FILE, LICENSES_YAML};
use super::types::{
    ActionRule, ActionSchema, ActionTable, ExceptionCatalog, ExceptionClause, LicenseCatalog,
    LicenseFamily, LicenseTermRecord,
};
use crate::error::{ErrorContext, LicscopeError, Result};
use crate::graph::Relation;
use crate::infer::Verdict;
use crate::license::LicenseTerm;

/// License attributes, exception definitions and per-relation action tables.
///
/// Immutable after loading. Shared by reference (or `Arc`) across the
/// resolver and the parallel inference workers.
#[derive(Debug)]
pub struct RuleStore {
    licenses: IndexMap<String, LicenseTermRecord>,
    exceptions: IndexMap<String, ExceptionClause>,
    tables: IndexMap<Relation, ActionTable>,
    fingerprint: u64,
    lookups: AtomicUsize,
}

impl RuleStore {
    // ========================================================================
    // Loading
    // ========================================================================

    /// Rule store built from the resources compiled into the binary.
    ///
    /// # Errors
    ///
    /// Only fails if the embedded resources are inconsistent.
    pub fn embedded() -> Result<Self> {
        Self::from_yaml(LICENSES_YAML, EXCEPTIONS_YAML, ACTIONS_YAML)
    }

    /// Load from a directory; each of the three files falls back to the
    /// embedded default when absent.
    ///
    /// # Errors
    ///
    /// Returns an IO error for unreadable files and a config error for
    /// inconsistent rules.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let read = |name: &str, fallback: &'static str| -> Result<String> {
            let path = dir.join(name);
            if path.is_file() {
                tracing::debug!("Loading rules from {}", path.display());
                std::fs::read_to_string(&path).map_err(|e| LicscopeError::io(&path, e))
            } else {
                tracing::debug!("{} not found in {}, using built-in", name, dir.display());
                Ok(fallback.to_string())
            }
        };

        let licenses = read(LICENSES_FILE, LICENSES_YAML)?;
        let exceptions = read(EXCEPTIONS_FILE, EXCEPTIONS_YAML)?;
        let actions = read(ACTIONS_FILE, ACTIONS_YAML)?;
        Self::from_yaml(&licenses, &exceptions, &actions)
            .with_context(|| format!("rules directory {}", dir.display()))
    }

    /// Load from `dir` when given, otherwise the embedded defaults.
    ///
    /// # Errors
    ///
    /// See [`RuleStore::from_dir`].
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        match dir {
            Some(dir) => Self::from_dir(dir),
            None => Self::embedded(),
        }
    }

    /// Parse the three YAML documents.
    ///
    /// # Errors
    ///
    /// Returns a config error when a document is malformed or references an
    /// undefined license or exception.
    pub fn from_yaml(licenses: &str, exceptions: &str, actions: &str) -> Result<Self> {
        let licenses: LicenseCatalog = serde_yaml::from_str(licenses)
            .map_err(|e| LicscopeError::config(format!("{LICENSES_FILE}: {e}")))?;
        let exceptions: ExceptionCatalog = serde_yaml::from_str(exceptions)
            .map_err(|e| LicscopeError::config(format!("{EXCEPTIONS_FILE}: {e}")))?;
        let actions: ActionSchema = serde_yaml::from_str(actions)
            .map_err(|e| LicscopeError::config(format!("{ACTIONS_FILE}: {e}")))?;
        Self::from_catalogs(licenses, exceptions, actions)
    }

    /// Build from already deserialized catalogs.
    ///
    /// # Errors
    ///
    /// Returns a config error for duplicate ids, references to undefined
    /// ids, or a relation without an action table.
    pub fn from_catalogs(
        licenses: LicenseCatalog,
        exceptions: ExceptionCatalog,
        actions: ActionSchema,
    ) -> Result<Self> {
        let mut license_map = IndexMap::with_capacity(licenses.licenses.len());
        for record in licenses.licenses {
            if spdx::license_id(&record.spdx_id).is_none() && !record.spdx_id.starts_with("LicenseRef-") {
                tracing::debug!("'{}' is not an SPDX license id", record.spdx_id);
            }
            if let Some(previous) = license_map.insert(record.spdx_id.clone(), record) {
                return Err(LicscopeError::config(format!(
                    "license '{}' defined twice",
                    previous.spdx_id
                )));
            }
        }

        let mut exception_map = IndexMap::with_capacity(exceptions.exceptions.len());
        for clause in exceptions.exceptions {
            for target in &clause.default_target {
                if !license_map.contains_key(target) {
                    return Err(LicscopeError::config(format!(
                        "exception '{}' targets undefined license '{}'",
                        clause.spdx_id, target
                    )));
                }
            }
            if let Some(previous) = exception_map.insert(clause.spdx_id.clone(), clause) {
                return Err(LicscopeError::config(format!(
                    "exception '{}' defined twice",
                    previous.spdx_id
                )));
            }
        }

        for relation in Relation::ALL {
            let Some(table) = actions.tables.get(&relation) else {
                return Err(LicscopeError::config(format!(
                    "no action table for relation '{relation}'"
                )));
            };
            for (idx, rule) in table.rules.iter().enumerate() {
                validate_rule(rule, &license_map).map_err(|message| {
                    LicscopeError::config(format!("{ACTIONS_FILE}: {relation} rule #{idx}: {message}"))
                })?;
            }
        }

        tracing::debug!(
            "Loaded {} licenses, {} exceptions, {} action tables",
            license_map.len(),
            exception_map.len(),
            actions.tables.len()
        );

        let fingerprint = serde_json::to_vec(&(&license_map, &exception_map, &actions.tables))
            .map(|bytes| xxh3_64(&bytes))
            .map_err(|e| LicscopeError::config(format!("cannot fingerprint rules: {e}")))?;

        Ok(Self {
            licenses: license_map,
            exceptions: exception_map,
            tables: actions.tables,
            fingerprint,
            lookups: AtomicUsize::new(0),
        })
    }

    /// Content hash of the loaded rules. Cached verdicts are only valid for
    /// the rule set with the same fingerprint.
    #[must_use]
    pub const fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// License record for `id`.
    ///
    /// # Errors
    ///
    /// Returns a config error when the id is not defined.
    pub fn term(&self, id: &str) -> Result<&LicenseTermRecord> {
        self.licenses
            .get(id)
            .ok_or_else(|| LicscopeError::config(format!("undefined license '{id}'")))
    }

    /// License record for `id`, if defined
    #[must_use]
    pub fn lookup_term(&self, id: &str) -> Option<&LicenseTermRecord> {
        self.licenses.get(id)
    }

    /// Exception definition for `id`, if defined
    #[must_use]
    pub fn exception(&self, id: &str) -> Option<&ExceptionClause> {
        self.exceptions.get(id)
    }

    #[must_use]
    pub fn contains_license(&self, id: &str) -> bool {
        self.licenses.contains_key(id)
    }

    #[must_use]
    pub fn contains_exception(&self, id: &str) -> bool {
        self.exceptions.contains_key(id)
    }

    pub fn licenses(&self) -> impl Iterator<Item = &LicenseTermRecord> {
        self.licenses.values()
    }

    pub fn exceptions(&self) -> impl Iterator<Item = &ExceptionClause> {
        self.exceptions.values()
    }

    /// Whether both the id and any exception of `term` are defined
    #[must_use]
    pub fn is_known(&self, term: &LicenseTerm) -> bool {
        self.contains_license(&term.id)
            && term
                .exception
                .as_deref()
                .map_or(true, |exception| self.contains_exception(exception))
    }

    /// Family of `term` as seen across `relation`.
    ///
    /// A copyleft license counts as permissive when its obligations do not
    /// propagate over the relation, either by its own definition or through an
    /// exception that applies to the relation.
    #[must_use]
    pub fn effective_family(&self, term: &LicenseTerm, relation: Relation) -> Option<LicenseFamily> {
        let record = self.licenses.get(&term.id)?;
        if !record.is_copyleft() {
            return Some(record.family);
        }
        let relaxed = !record.propagates_over(relation)
            || term
                .exception
                .as_deref()
                .and_then(|id| self.exceptions.get(id))
                .is_some_and(|clause| clause.applies_to(relation));
        Some(if relaxed {
            LicenseFamily::Permissive
        } else {
            record.family
        })
    }

    /// Verdict for `source` using `target` across `relation`.
    ///
    /// The most specific matching rule wins (license id over family, two
    /// sides over one); ties go to the rule listed first. Returns
    /// [`Verdict::Unknown`] for ids the store does not define.
    #[must_use]
    pub fn action(&self, relation: Relation, source: &LicenseTerm, target: &LicenseTerm) -> Verdict {
        self.lookups.fetch_add(1, Ordering::Relaxed);

        let (Some(source_family), Some(target_family)) = (
            self.effective_family(source, relation),
            self.effective_family(target, relation),
        ) else {
            return Verdict::Unknown;
        };
        let Some(table) = self.tables.get(&relation) else {
            return Verdict::Unknown;
        };

        let mut chosen: Option<&ActionRule> = None;
        for rule in &table.rules {
            if !rule.source.matches(&source.id, source_family)
                || !rule.target.matches(&target.id, target_family)
            {
                continue;
            }
            if chosen.map_or(true, |best| rule.specificity() > best.specificity()) {
                chosen = Some(rule);
            }
        }

        chosen.map_or(table.default, |rule| rule.verdict)
    }

    /// Number of [`RuleStore::action`] calls so far
    #[must_use]
    pub fn action_lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

fn validate_rule(
    rule: &ActionRule,
    licenses: &IndexMap<String, LicenseTermRecord>,
) -> std::result::Result<(), String> {
    for (side, selector) in [("source", &rule.source), ("target", &rule.target)] {
        if selector.license.is_some() && selector.family.is_some() {
            return Err(format!("{side} selects both a license and a family"));
        }
        if let Some(id) = &selector.license {
            if !licenses.contains_key(id) {
                return Err(format!("{side} references undefined license '{id}'"));
            }
        }
    }
    Ok(())
}
