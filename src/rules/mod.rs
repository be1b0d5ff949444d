//! Rule store: license attributes, exception definitions and the
//! relation-keyed compatibility action tables.
//!
//! Three YAML documents make up a rule set:
//!
//! - `licenses.yaml`: one [`LicenseTermRecord`] per SPDX id
//! - `exceptions.yaml`: [`ExceptionClause`] definitions with their
//!   `default_target` and scope lists
//! - `actions.yaml`: one [`ActionTable`] per relation
//!
//! Defaults are compiled in; a rules directory can override any of the files.

pub(crate) mod defaults;
mod store;
mod types;

pub use defaults::{ACTIONS_FILE, EXCEPTIONS_FILE, LICENSES_FILE};
pub use store::RuleStore;
pub use types::{
    ActionRule, ActionSchema, ActionTable, ExceptionCatalog, ExceptionClause, LicenseCatalog,
    LicenseFamily, LicenseTermRecord, Selector,
};
