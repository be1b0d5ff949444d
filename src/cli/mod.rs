//! CLI command handlers.
//!
//! This module provides testable command handlers that are invoked by main.rs.
//! Each handler returns the process exit code instead of exiting itself.

mod check;
mod pair;

pub use check::{run_check, CheckOptions};
pub use pair::run_pair;
