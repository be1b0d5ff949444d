//! License expression model.
//!
//! Parses SPDX-style expressions (`AND`, `OR`, `WITH`, parentheses) into a
//! [`LicenseExpr`] tree and implements the algebra the resolver and inference
//! engine rely on: normalization, AND-merge and exception attachment.
//!
//! ```
//! use licscope::license::parse_expression;
//!
//! let a = parse_expression("MIT AND Apache-2.0").unwrap();
//! let b = parse_expression("Apache-2.0 AND MIT").unwrap();
//! assert_eq!(a.normalize(), b.normalize());
//! ```

mod diagnostics;
mod expression;
mod ops;
mod parse;

pub use diagnostics::{ExceptionConflict, UnknownKind, UnknownLicenseWarning};
pub use expression::{Leaves, LicenseExpr, LicenseTerm, Operator};
pub use ops::ExceptionApplication;
pub use parse::{ExpressionParser, ParsedExpression, is_no_license, parse_expression};
