//! Per-run shared state.

use std::path::PathBuf;
use std::sync::Arc;

use super::engine::InferenceEngine;
use super::knowledge::KnowledgeGraph;
use crate::config::{AnalysisConfig, Validatable};
use crate::error::{LicscopeError, Result};
use crate::license::ExpressionParser;
use crate::rules::RuleStore;

/// Everything an analysis run shares: configuration, rules and the
/// knowledge graph. Built once and passed explicitly to every stage.
#[derive(Debug, Clone)]
pub struct RunContext {
    config: AnalysisConfig,
    rules: Arc<RuleStore>,
    knowledge: Arc<KnowledgeGraph>,
}

impl RunContext {
    /// Validate the configuration, load the rules and, unless `reinfer` is
    /// set, the persisted knowledge graph.
    ///
    /// # Errors
    ///
    /// Returns a config error for invalid settings or rule resources and an
    /// IO or parse error for an unreadable knowledge graph file.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        let rules = RuleStore::load(config.rules_dir.as_deref())?;
        Self::with_rules(config, Arc::new(rules))
    }

    /// Like [`RunContext::new`] with an already loaded rule store.
    ///
    /// # Errors
    ///
    /// See [`RunContext::new`].
    pub fn with_rules(config: AnalysisConfig, rules: Arc<RuleStore>) -> Result<Self> {
        let errors = config.validate();
        if !errors.is_empty() {
            let joined: Vec<String> = errors.iter().map(ToString::to_string).collect();
            return Err(LicscopeError::config(joined.join("; ")));
        }

        let fingerprint = rules.fingerprint();
        let knowledge = match config.effective_kg_path() {
            Some(path) if !config.reinfer => {
                KnowledgeGraph::load(&path, config.permissive_unknown, fingerprint)?
            }
            Some(path) => {
                tracing::info!("Ignoring knowledge graph {} (reinfer)", path.display());
                KnowledgeGraph::new(config.permissive_unknown).with_rules_fingerprint(fingerprint)
            }
            None => KnowledgeGraph::new(config.permissive_unknown).with_rules_fingerprint(fingerprint),
        };

        Ok(Self::from_parts(config, rules, Arc::new(knowledge)))
    }

    /// Assemble a context without validation or file access.
    #[must_use]
    pub const fn from_parts(
        config: AnalysisConfig,
        rules: Arc<RuleStore>,
        knowledge: Arc<KnowledgeGraph>,
    ) -> Self {
        Self {
            config,
            rules,
            knowledge,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    #[must_use]
    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    #[must_use]
    pub fn knowledge(&self) -> &KnowledgeGraph {
        &self.knowledge
    }

    #[must_use]
    pub const fn permissive_unknown(&self) -> bool {
        self.config.permissive_unknown
    }

    /// Inference engine bound to this context.
    #[must_use]
    pub fn engine(&self) -> InferenceEngine<'_> {
        InferenceEngine::new(&self.rules, &self.knowledge, self.config.permissive_unknown)
    }

    /// Expression parser honoring the unknown-license mode.
    #[must_use]
    pub fn expression_parser(&self) -> ExpressionParser<'_> {
        ExpressionParser::new(&self.rules, self.config.permissive_unknown)
    }

    /// Persist the knowledge graph if `save_kg` is set.
    ///
    /// Returns the file written, if any.
    ///
    /// # Errors
    ///
    /// Returns an IO error when the file cannot be written.
    pub fn finish(&self) -> Result<Option<PathBuf>> {
        if !self.config.save_kg {
            return Ok(None);
        }
        let Some(path) = self.config.effective_kg_path() else {
            tracing::warn!("save_kg is set but no knowledge graph path is available");
            return Ok(None);
        };
        self.knowledge.save(&path)?;
        Ok(Some(path))
    }
}
