//! Default values for licscope configuration.

use std::path::PathBuf;

use super::types::AnalysisConfig;

/// Application directory name under the user config and cache directories
pub const APP_DIR_NAME: &str = "licscope";

/// File name of the persisted knowledge graph
pub const DEFAULT_KG_FILE_NAME: &str = "knowledge_graph.json";

/// Default knowledge graph location (`<cache dir>/licscope/knowledge_graph.json`).
#[must_use]
pub fn default_kg_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join(APP_DIR_NAME).join(DEFAULT_KG_FILE_NAME))
}

/// Generate a JSON Schema for the `AnalysisConfig` configuration format.
///
/// This schema documents all options that can be set in `.licscope.yaml`
/// config files and can be used by editors for validation and completion.
#[must_use]
pub fn generate_json_schema() -> String {
    let schema = schemars::schema_for!(AnalysisConfig);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}
