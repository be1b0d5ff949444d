//! Built-in rule resources.

pub const LICENSES_FILE: &str = "licenses.yaml";
pub const EXCEPTIONS_FILE: &str = "exceptions.yaml";
pub const ACTIONS_FILE: &str = "actions.yaml";

pub const LICENSES_YAML: &str = include_str!("../../resources/licenses.yaml");
pub const EXCEPTIONS_YAML: &str = include_str!("../../resources/exceptions.yaml");
pub const ACTIONS_YAML: &str = include_str!("../../resources/actions.yaml");
