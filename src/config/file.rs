//! Configuration file loading and discovery.
//!
//! Supports loading configuration from YAML files with automatic discovery.

use super::defaults::APP_DIR_NAME;
use super::types::AnalysisConfig;
use crate::error::{LicscopeError, Result};
use std::path::{Path, PathBuf};

// ============================================================================
// Configuration File Discovery
// ============================================================================

/// Standard config file names to search for.
const CONFIG_FILE_NAMES: &[&str] = &[
    ".licscope.yaml",
    ".licscope.yml",
    "licscope.yaml",
    "licscope.yml",
];

/// Discover a config file by searching standard locations.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Current directory
/// 3. Git repository root (if in a repo)
/// 4. User config directory (~/.config/licscope/)
/// 5. Home directory
#[must_use]
pub fn discover_config_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd);
    }
    if let Some(git_root) = find_git_root() {
        candidates.push(git_root);
    }
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join(APP_DIR_NAME));
    }
    if let Some(home) = dirs::home_dir() {
        candidates.push(home);
    }

    candidates.iter().find_map(|dir| find_config_in_dir(dir))
}

/// Find a config file in a specific directory.
fn find_config_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Find the git repository root by walking up the directory tree.
fn find_git_root() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    let mut current = cwd.as_path();

    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        current = current.parent()?;
    }
}

// ============================================================================
// Configuration File Loading
// ============================================================================

/// Load an `AnalysisConfig` from a YAML file.
///
/// # Errors
///
/// Returns an IO error when the file cannot be read and a parse error when
/// it is not a valid configuration document.
pub fn load_config_file(path: &Path) -> Result<AnalysisConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| LicscopeError::io(path, e))?;
    let config: AnalysisConfig = serde_yaml::from_str(&content).map_err(|e| {
        LicscopeError::config(format!("Failed to parse config file {}: {e}", path.display()))
    })?;
    Ok(config)
}

/// Load config from discovered file, or return default.
#[must_use]
pub fn load_or_default(explicit_path: Option<&Path>) -> (AnalysisConfig, Option<PathBuf>) {
    discover_config_file(explicit_path).map_or_else(
        || (AnalysisConfig::default(), None),
        |path| match load_config_file(&path) {
            Ok(config) => (config, Some(path)),
            Err(e) => {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                (AnalysisConfig::default(), None)
            }
        },
    )
}

// ============================================================================
// Configuration Merging
// ============================================================================

impl AnalysisConfig {
    /// Merge another config into this one, with `other` taking precedence.
    ///
    /// Booleans only ever switch on and paths only override when set, so a
    /// default-valued `other` leaves `self` unchanged.
    pub fn merge(&mut self, other: &Self) {
        if other.permissive_unknown {
            self.permissive_unknown = true;
        }
        if other.reinfer {
            self.reinfer = true;
        }
        if other.save_kg {
            self.save_kg = true;
        }
        if other.kg_path.is_some() {
            self.kg_path.clone_from(&other.kg_path);
        }
        if other.rules_dir.is_some() {
            self.rules_dir.clone_from(&other.rules_dir);
        }

        if other.parsing.skip_testonly {
            self.parsing.skip_testonly = true;
        }
        if !other.parsing.strip_scancode_refs {
            self.parsing.strip_scancode_refs = false;
        }

        if other.output.format != crate::reports::ReportFormat::default() {
            self.output.format = other.output.format;
        }
        if other.output.file.is_some() {
            self.output.file.clone_from(&other.output.file);
        }
        if other.output.export_graph.is_some() {
            self.output.export_graph.clone_from(&other.output.export_graph);
        }
    }

    /// Load from file and merge with CLI overrides.
    #[must_use]
    pub fn from_file_with_overrides(
        config_path: Option<&Path>,
        cli_overrides: &Self,
    ) -> (Self, Option<PathBuf>) {
        let (mut config, loaded_from) = load_or_default(config_path);
        config.merge(cli_overrides);
        (config, loaded_from)
    }
}

// ============================================================================
// Example Config Generation
// ============================================================================

/// Generate a commented example config with all options.
#[must_use]
pub fn generate_example_config() -> String {
    r"# licscope configuration
# Place this file at .licscope.yaml in your project root or
# ~/.config/licscope/licscope.yaml for global settings.
# CLI arguments always override file settings.

# Treat unknown license ids as compatible instead of needs-review
permissive_unknown: false

# Recompute every verdict instead of reusing the knowledge graph
reinfer: false

# Persist the knowledge graph after each run
save_kg: false
# kg_path: .licscope/knowledge_graph.json

# Override the embedded licenses.yaml / exceptions.yaml / actions.yaml
# rules_dir: ./license-rules

parsing:
  # Ignore testonly targets in native build graphs
  skip_testonly: false
  # Rewrite LicenseRef-scancode-* ids to plain SPDX ids
  strip_scancode_refs: true

output:
  # summary or json
  format: summary
  # file: licscope-report.json
  # export_graph: resolved-graph.json
"
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::ReportFormat;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "permissive_unknown: true\noutput:\n  format: json").unwrap();

        let config = load_config_file(file.path()).unwrap();
        assert!(config.permissive_unknown);
        assert_eq!(config.output.format, ReportFormat::Json);
    }

    #[test]
    fn test_load_invalid_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "permissive_unknown: [not, a, bool").unwrap();
        assert!(load_config_file(file.path()).is_err());
    }

    #[test]
    fn test_find_config_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_config_in_dir(dir.path()).is_none());

        std::fs::write(dir.path().join("licscope.yml"), "reinfer: true\n").unwrap();
        let found = find_config_in_dir(dir.path()).unwrap();
        assert!(found.ends_with("licscope.yml"));
    }

    #[test]
    fn test_explicit_path_wins() {
        let file = NamedTempFile::new().unwrap();
        assert_eq!(
            discover_config_file(Some(file.path())),
            Some(file.path().to_path_buf())
        );
    }

    #[test]
    fn test_merge_cli_over_file() {
        let mut file_config = AnalysisConfig::builder()
            .save_kg(true)
            .kg_path(Some(PathBuf::from("file-kg.json")))
            .build();
        let cli = AnalysisConfig::builder()
            .kg_path(Some(PathBuf::from("cli-kg.json")))
            .output_format(ReportFormat::Json)
            .build();

        file_config.merge(&cli);
        assert!(file_config.save_kg);
        assert_eq!(file_config.kg_path, Some(PathBuf::from("cli-kg.json")));
        assert_eq!(file_config.output.format, ReportFormat::Json);
    }

    #[test]
    fn test_example_config_parses() {
        let config: AnalysisConfig = serde_yaml::from_str(&generate_example_config()).unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }
}
