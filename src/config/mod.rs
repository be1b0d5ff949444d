//! Configuration module for licscope.
//!
//! This module provides:
//! - the [`AnalysisConfig`] record describing one run
//! - validation through the [`Validatable`] trait
//! - YAML config file loading and discovery
//! - CLI argument merging
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use licscope::config::AnalysisConfig;
//!
//! let config = AnalysisConfig::builder()
//!     .permissive_unknown(true)
//!     .save_kg(true)
//!     .build();
//!
//! use licscope::config::file::load_or_default;
//! let (config, loaded_from) = load_or_default(None);
//! ```
//!
//! # Configuration File
//!
//! Place a `.licscope.yaml` file in your project root or `~/.config/licscope/`:
//!
//! ```yaml
//! permissive_unknown: false
//! save_kg: true
//! parsing:
//!   skip_testonly: true
//! ```

mod defaults;
pub mod file;
mod types;
mod validation;

pub use defaults::{default_kg_path, generate_json_schema, APP_DIR_NAME, DEFAULT_KG_FILE_NAME};
pub use types::{AnalysisConfig, AnalysisConfigBuilder, OutputConfig, ParsingConfig};
pub use validation::{ConfigError, Validatable};

pub use file::{discover_config_file, generate_example_config, load_config_file, load_or_default};
