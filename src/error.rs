//! Unified error types for licscope.
//!
//! Structural and configuration problems are fatal and surface as
//! [`LicscopeError`]. Locally recoverable conditions (unknown licenses,
//! exception conflicts) are plain values attached to nodes and edges and never
//! travel through this type.

use std::path::PathBuf;
use thiserror::Error;

use crate::graph::NodeId;

/// Main error type for licscope operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LicscopeError {
    /// Malformed license expression or malformed graph input
    #[error("Parse failed: {context}")]
    Parse {
        context: String,
        #[source]
        source: ParseErrorKind,
    },

    /// A rule references an undefined license, exception or family
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The dependency graph contains a cycle
    #[error("Dependency cycle detected: {}", format_cycle(.path))]
    GraphCycle { path: Vec<NodeId> },

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Specific parse error kinds
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseErrorKind {
    #[error("Invalid license expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    #[error("Unknown license id '{0}'")]
    UnknownLicense(String),

    #[error("Unknown exception id '{0}'")]
    UnknownException(String),

    #[error("Invalid JSON structure: {0}")]
    InvalidJson(String),

    #[error("Invalid YAML structure: {0}")]
    InvalidYaml(String),

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("Edge references unknown node '{0}'")]
    DanglingEdge(String),

    #[error("Unknown input format: {0}")]
    UnknownFormat(String),
}

fn format_cycle(path: &[NodeId]) -> String {
    path.iter()
        .map(NodeId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

// ============================================================================
// Result type alias
// ============================================================================

/// Convenient Result type for licscope operations
pub type Result<T> = std::result::Result<T, LicscopeError>;

// ============================================================================
// Error construction helpers
// ============================================================================

impl LicscopeError {
    /// Create a parse error with context
    pub fn parse(context: impl Into<String>, source: ParseErrorKind) -> Self {
        Self::Parse {
            context: context.into(),
            source,
        }
    }

    /// Create a parse error for a malformed license expression
    pub fn invalid_expression(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::parse(
            "license expression",
            ParseErrorKind::InvalidExpression {
                expression: expression.into(),
                reason: reason.into(),
            },
        )
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        let message = format!("{source}");
        Self::Io {
            path: Some(path),
            message,
            source,
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether this error was raised by a dependency cycle
    #[must_use]
    pub const fn is_cycle(&self) -> bool {
        matches!(self, Self::GraphCycle { .. })
    }
}

// ============================================================================
// Conversions from existing error types
// ============================================================================

impl From<std::io::Error> for LicscopeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: format!("{err}"),
            source: err,
        }
    }
}

impl From<serde_json::Error> for LicscopeError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(
            "JSON deserialization",
            ParseErrorKind::InvalidJson(err.to_string()),
        )
    }
}

impl From<serde_yaml::Error> for LicscopeError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::parse(
            "YAML deserialization",
            ParseErrorKind::InvalidYaml(err.to_string()),
        )
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// ```ignore
/// use licscope::error::ErrorContext;
///
/// let graph = LicenseGraph::from_canonical_json(&text)
///     .with_context(|| format!("loading graph from {}", path.display()))?;
/// ```
pub trait ErrorContext<T> {
    /// Add context to an error.
    ///
    /// The context string is prepended to the error's existing context.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure, evaluated only on error.
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<LicscopeError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

/// Add context to an error, chaining with any existing context.
fn add_context_to_error(err: LicscopeError, new_ctx: &str) -> LicscopeError {
    match err {
        LicscopeError::Parse {
            context: existing,
            source,
        } => LicscopeError::Parse {
            context: chain_context(new_ctx, &existing),
            source,
        },
        LicscopeError::Io {
            path,
            message,
            source,
        } => LicscopeError::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
        LicscopeError::Config(msg) => LicscopeError::Config(chain_context(new_ctx, &msg)),
        LicscopeError::Validation(msg) => {
            LicscopeError::Validation(chain_context(new_ctx, &msg))
        }
        // The cycle path is the whole message.
        cycle @ LicscopeError::GraphCycle { .. } => cycle,
    }
}

/// Chain two context strings together as "`new`: `existing`".
fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}
