//! Knowledge graph: the verdict cache.
//!
//! Keys are `(normalized source license, normalized target license, relation)`
//! and carry no node identity, so a cache file can be reused across runs and
//! across projects.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use super::verdict::Verdict;
use crate::error::{ErrorContext, LicscopeError, Result};
use crate::graph::Relation;
use crate::license::LicenseExpr;

/// On-disk format version
pub const KNOWLEDGE_GRAPH_VERSION: u32 = 1;

/// Cache key for one license pair under one relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KgKey {
    pub source: String,
    pub target: String,
    pub relation: Relation,
}

impl KgKey {
    #[must_use]
    pub fn new(source: &LicenseExpr, target: &LicenseExpr, relation: Relation) -> Self {
        Self {
            source: source.canonical_key(),
            target: target.canonical_key(),
            relation,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct KgEntry {
    #[serde(flatten)]
    key: KgKey,
    verdict: Verdict,
}

#[derive(Debug, Serialize, Deserialize)]
struct KgFile {
    version: u32,
    permissive_unknown: bool,
    /// Fingerprint of the rule set the verdicts were computed with
    #[serde(default)]
    rules_fingerprint: u64,
    entries: Vec<KgEntry>,
}

/// Thread-safe verdict cache.
///
/// Reads take a shared lock. Inserts take the write lock and keep the first
/// value stored for a key; a verdict is a pure function of its key, so a lost
/// race only costs a recomputation.
#[derive(Debug, Default)]
pub struct KnowledgeGraph {
    entries: RwLock<HashMap<KgKey, Verdict>>,
    permissive_unknown: bool,
    rules_fingerprint: u64,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl KnowledgeGraph {
    /// Empty cache for the given unknown-license mode
    #[must_use]
    pub fn new(permissive_unknown: bool) -> Self {
        Self {
            permissive_unknown,
            ..Self::default()
        }
    }

    /// Tag the cache with the fingerprint of the rule set filling it
    #[must_use]
    pub fn with_rules_fingerprint(mut self, fingerprint: u64) -> Self {
        self.rules_fingerprint = fingerprint;
        self
    }

    #[must_use]
    pub fn get(&self, key: &KgKey) -> Option<Verdict> {
        let found = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied();
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Store a verdict; returns the value now cached for the key.
    pub fn insert(&self, key: KgKey, verdict: Verdict) -> Verdict {
        *self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(verdict)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    #[must_use]
    pub const fn permissive_unknown(&self) -> bool {
        self.permissive_unknown
    }

    #[must_use]
    pub const fn rules_fingerprint(&self) -> u64 {
        self.rules_fingerprint
    }

    /// Load a persisted cache.
    ///
    /// A missing file yields an empty cache. A file written with another
    /// format version, unknown-license mode or rule set is discarded with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read or parsed.
    pub fn load(path: &Path, permissive_unknown: bool, rules_fingerprint: u64) -> Result<Self> {
        let empty = || Self::new(permissive_unknown).with_rules_fingerprint(rules_fingerprint);
        if !path.exists() {
            tracing::debug!("No knowledge graph at {}", path.display());
            return Ok(empty());
        }

        let data = fs::read_to_string(path).map_err(|e| LicscopeError::io(path, e))?;
        let file: KgFile = serde_json::from_str(&data)
            .with_context(|| format!("knowledge graph {}", path.display()))?;

        if file.version != KNOWLEDGE_GRAPH_VERSION {
            tracing::warn!(
                "Ignoring knowledge graph {} (format version {}, expected {})",
                path.display(),
                file.version,
                KNOWLEDGE_GRAPH_VERSION
            );
            return Ok(empty());
        }
        if file.permissive_unknown != permissive_unknown {
            tracing::warn!(
                "Ignoring knowledge graph {} (written with permissive_unknown = {})",
                path.display(),
                file.permissive_unknown
            );
            return Ok(empty());
        }
        if file.rules_fingerprint != rules_fingerprint {
            tracing::warn!(
                "Ignoring knowledge graph {} (computed with a different rule set)",
                path.display()
            );
            return Ok(empty());
        }

        let entries: HashMap<KgKey, Verdict> = file
            .entries
            .into_iter()
            .map(|entry| (entry.key, entry.verdict))
            .collect();
        tracing::info!(entries = entries.len(), "Loaded knowledge graph from {}", path.display());

        Ok(Self {
            entries: RwLock::new(entries),
            permissive_unknown,
            rules_fingerprint,
            ..Self::default()
        })
    }

    /// Persist the cache as JSON with entries in key order.
    ///
    /// # Errors
    ///
    /// Returns an IO error when the file or its directory cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut entries: Vec<KgEntry> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(key, verdict)| KgEntry {
                key: key.clone(),
                verdict: *verdict,
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        let file = KgFile {
            version: KNOWLEDGE_GRAPH_VERSION,
            permissive_unknown: self.permissive_unknown,
            rules_fingerprint: self.rules_fingerprint,
            entries,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| LicscopeError::io(parent, e))?;
            }
        }
        let data = serde_json::to_string_pretty(&file)?;
        fs::write(path, data).map_err(|e| LicscopeError::io(path, e))?;
        tracing::info!(entries = file.entries.len(), "Saved knowledge graph to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::license::parse_expression;

    fn key(a: &str, b: &str, relation: Relation) -> KgKey {
        KgKey::new(
            &parse_expression(a).unwrap(),
            &parse_expression(b).unwrap(),
            relation,
        )
    }

    #[test]
    fn test_key_is_order_insensitive() {
        assert_eq!(
            key("MIT AND Apache-2.0", "GPL-2.0-only", Relation::LinksStatic),
            key("Apache-2.0 AND MIT", "GPL-2.0-only", Relation::LinksStatic)
        );
        assert_ne!(
            key("MIT", "GPL-2.0-only", Relation::LinksStatic),
            key("MIT", "GPL-2.0-only", Relation::LinksDynamic)
        );
    }

    #[test]
    fn test_first_insert_wins() {
        let kg = KnowledgeGraph::new(false);
        let k = key("MIT", "ISC", Relation::Depends);
        assert_eq!(kg.insert(k.clone(), Verdict::Compatible), Verdict::Compatible);
        assert_eq!(kg.insert(k.clone(), Verdict::Incompatible), Verdict::Compatible);
        assert_eq!(kg.get(&k), Some(Verdict::Compatible));
        assert_eq!(kg.hits(), 1);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("kg.json");

        let kg = KnowledgeGraph::new(false).with_rules_fingerprint(7);
        kg.insert(key("MIT", "GPL-2.0-only", Relation::LinksStatic), Verdict::NeedsReview);
        kg.insert(key("MIT", "ISC", Relation::Depends), Verdict::Compatible);
        kg.save(&path).unwrap();

        let loaded = KnowledgeGraph::load(&path, false, 7).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(
            loaded.get(&key("MIT", "GPL-2.0-only", Relation::LinksStatic)),
            Some(Verdict::NeedsReview)
        );

        let other_mode = KnowledgeGraph::load(&path, true, 7).unwrap();
        assert!(other_mode.is_empty());

        let other_rules = KnowledgeGraph::load(&path, false, 8).unwrap();
        assert!(other_rules.is_empty());
        assert_eq!(other_rules.rules_fingerprint(), 8);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let kg = KnowledgeGraph::load(&dir.path().join("absent.json"), true, 0).unwrap();
        assert!(kg.is_empty());
        assert!(kg.permissive_unknown());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kg.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(KnowledgeGraph::load(&path, false, 0).is_err());
    }
}
