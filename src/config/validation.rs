//! Configuration validation.

use super::types::{AnalysisConfig, OutputConfig, ParsingConfig};

// ============================================================================
// Configuration Error
// ============================================================================

/// A single configuration validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The field that failed validation
    pub field: String,
    /// Description of the validation error
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Validation Trait
// ============================================================================

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigError>;

    /// Check if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

// ============================================================================
// Validation Implementations
// ============================================================================

impl Validatable for AnalysisConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if let Some(dir) = &self.rules_dir {
            if !dir.is_dir() {
                errors.push(ConfigError::new(
                    "rules_dir",
                    format!("Rules directory does not exist: {}", dir.display()),
                ));
            }
        }
        if let Some(path) = &self.kg_path {
            if path.is_dir() {
                errors.push(ConfigError::new(
                    "kg_path",
                    format!("Knowledge graph path is a directory: {}", path.display()),
                ));
            }
        }
        if self.save_kg && self.effective_kg_path().is_none() {
            errors.push(ConfigError::new(
                "save_kg",
                "No kg_path given and no user cache directory is available",
            ));
        }

        errors.extend(self.parsing.validate());
        errors.extend(self.output.validate());
        errors
    }
}

impl Validatable for ParsingConfig {
    fn validate(&self) -> Vec<ConfigError> {
        Vec::new()
    }
}

impl Validatable for OutputConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if let (Some(file), Some(graph)) = (&self.file, &self.export_graph) {
            if file == graph {
                errors.push(ConfigError::new(
                    "output.export_graph",
                    "Graph export would overwrite the report file",
                ));
            }
        }
        errors
    }
}
