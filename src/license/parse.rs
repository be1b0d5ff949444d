//! SPDX license expression parsing.
//!
//! [`parse_expression`] is a pure syntax parser. [`ExpressionParser`] adds id
//! validation against the rule store and the permissive/strict policy.

use super::diagnostics::UnknownLicenseWarning;
use super::expression::{LicenseExpr, LicenseTerm, Operator};
use crate::error::{LicscopeError, ParseErrorKind, Result};
use crate::rules::RuleStore;

/// Placeholder values SBOM producers use for "no license information".
const NO_LICENSE_MARKERS: &[&str] = &["NOASSERTION", "NONE"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    And,
    Or,
    With,
    Open,
    Close,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | ':' | '-' | '_')
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        match c {
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            c if is_ident_char(c) => {
                let mut end = start;
                while let Some(&(idx, c)) = chars.peek() {
                    if !is_ident_char(c) {
                        break;
                    }
                    end = idx + c.len_utf8();
                    chars.next();
                }
                let word = &text[start..end];
                let token = if word.eq_ignore_ascii_case("AND") {
                    Token::And
                } else if word.eq_ignore_ascii_case("OR") {
                    Token::Or
                } else if word.eq_ignore_ascii_case("WITH") {
                    Token::With
                } else {
                    Token::Ident(word.to_string())
                };
                tokens.push(token);
            }
            other => {
                return Err(LicscopeError::invalid_expression(
                    text,
                    format!("unexpected character '{other}' at offset {start}"),
                ));
            }
        }
    }

    Ok(tokens)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Op(Operator),
    Group,
}

const fn precedence(op: Operator) -> u8 {
    match op {
        Operator::And => 2,
        Operator::Or => 1,
    }
}

/// Join two operands, extending the left side when it already uses `op`.
fn join(op: Operator, mut left: LicenseExpr, right: LicenseExpr) -> LicenseExpr {
    if let Some(children) = left.children_mut(op) {
        children.push(right);
        return left;
    }
    op.build(vec![left, right])
}

fn reduce(text: &str, operands: &mut Vec<LicenseExpr>, op: Operator) -> Result<()> {
    let right = operands.pop();
    let left = operands.pop();
    match (left, right) {
        (Some(left), Some(right)) => {
            operands.push(join(op, left, right));
            Ok(())
        }
        _ => Err(LicscopeError::invalid_expression(
            text,
            "operator is missing an operand",
        )),
    }
}

/// Parse SPDX expression syntax without validating ids.
///
/// Precedence is `WITH` > `AND` > `OR`; operators are case-insensitive.
pub fn parse_expression(text: &str) -> Result<LicenseExpr> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(LicscopeError::invalid_expression(text, "empty expression"));
    }

    let mut operands: Vec<LicenseExpr> = Vec::new();
    let mut pending: Vec<Pending> = Vec::new();
    let mut expect_operand = true;
    let mut iter = tokens.into_iter().peekable();

    while let Some(token) = iter.next() {
        match token {
            Token::Ident(id) => {
                if !expect_operand {
                    return Err(LicscopeError::invalid_expression(
                        text,
                        format!("expected operator before '{id}'"),
                    ));
                }
                let term = if iter.peek() == Some(&Token::With) {
                    iter.next();
                    match iter.next() {
                        Some(Token::Ident(exception)) => LicenseTerm::with_exception(id, exception),
                        _ => {
                            return Err(LicscopeError::invalid_expression(
                                text,
                                format!("WITH after '{id}' must be followed by an exception id"),
                            ));
                        }
                    }
                } else {
                    LicenseTerm::new(id)
                };
                operands.push(LicenseExpr::License(term));
                expect_operand = false;
            }
            Token::With => {
                return Err(LicscopeError::invalid_expression(
                    text,
                    "WITH must follow a license id",
                ));
            }
            Token::Open => {
                if !expect_operand {
                    return Err(LicscopeError::invalid_expression(
                        text,
                        "expected operator before '('",
                    ));
                }
                pending.push(Pending::Group);
            }
            Token::Close => {
                if expect_operand {
                    return Err(LicscopeError::invalid_expression(
                        text,
                        "empty group or dangling operator before ')'",
                    ));
                }
                loop {
                    match pending.pop() {
                        Some(Pending::Op(op)) => reduce(text, &mut operands, op)?,
                        Some(Pending::Group) => break,
                        None => {
                            return Err(LicscopeError::invalid_expression(
                                text,
                                "unbalanced ')'",
                            ));
                        }
                    }
                }
            }
            Token::And | Token::Or => {
                if expect_operand {
                    return Err(LicscopeError::invalid_expression(
                        text,
                        "operator is missing its left operand",
                    ));
                }
                let op = if token == Token::And {
                    Operator::And
                } else {
                    Operator::Or
                };
                while let Some(&Pending::Op(top)) = pending.last() {
                    if precedence(top) < precedence(op) {
                        break;
                    }
                    pending.pop();
                    reduce(text, &mut operands, top)?;
                }
                pending.push(Pending::Op(op));
                expect_operand = true;
            }
        }
    }

    if expect_operand {
        return Err(LicscopeError::invalid_expression(text, "unexpected end of expression"));
    }

    while let Some(item) = pending.pop() {
        match item {
            Pending::Op(op) => reduce(text, &mut operands, op)?,
            Pending::Group => {
                return Err(LicscopeError::invalid_expression(text, "unbalanced '('"));
            }
        }
    }

    match (operands.pop(), operands.is_empty()) {
        (Some(expr), true) => Ok(expr),
        _ => Err(LicscopeError::invalid_expression(text, "dangling operand")),
    }
}

/// Whether the text means "no license information" rather than an expression.
#[must_use]
pub fn is_no_license(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty()
        || NO_LICENSE_MARKERS
            .iter()
            .any(|marker| trimmed.eq_ignore_ascii_case(marker))
}

/// Result of a validated parse.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedExpression {
    /// `None` when the input carried no license information
    pub expr: Option<LicenseExpr>,
    /// Unknown ids or malformed input downgraded in permissive mode
    pub warnings: Vec<UnknownLicenseWarning>,
}

/// Syntax parse plus id validation against the rule store.
#[derive(Debug, Clone, Copy)]
pub struct ExpressionParser<'a> {
    rules: &'a RuleStore,
    permissive: bool,
}

impl<'a> ExpressionParser<'a> {
    /// Create a parser; `permissive` downgrades unknown ids to warnings.
    #[must_use]
    pub const fn new(rules: &'a RuleStore, permissive: bool) -> Self {
        Self { rules, permissive }
    }

    /// Parse and validate `text`.
    ///
    /// # Errors
    ///
    /// In strict mode, returns a parse error for malformed syntax or ids the
    /// rule store does not define.
    pub fn parse(&self, text: &str) -> Result<ParsedExpression> {
        if is_no_license(text) {
            return Ok(ParsedExpression::default());
        }
        let trimmed = text.trim();

        let expr = match parse_expression(trimmed) {
            Ok(expr) => expr,
            Err(err) if self.permissive => {
                tracing::warn!("Malformed license expression '{}': {}", trimmed, err);
                return Ok(ParsedExpression {
                    expr: Some(LicenseExpr::Unknown(trimmed.to_string())),
                    warnings: vec![UnknownLicenseWarning::malformed(trimmed)],
                });
            }
            Err(err) => return Err(err),
        };

        if !self.permissive {
            self.validate_strict(&expr)?;
            return Ok(ParsedExpression {
                expr: Some(expr),
                warnings: Vec::new(),
            });
        }

        let mut warnings = Vec::new();
        let expr = expr.map_leaves(|leaf| match leaf {
            LicenseExpr::License(term) if !self.rules.contains_license(&term.id) => {
                warnings.push(UnknownLicenseWarning::license(&term.id));
                LicenseExpr::Unknown(term.to_string())
            }
            LicenseExpr::License(LicenseTerm {
                exception: Some(exception),
                ..
            }) if !self.rules.contains_exception(exception) => {
                warnings.push(UnknownLicenseWarning::exception(exception));
                LicenseExpr::Unknown(leaf.to_string())
            }
            other => other.clone(),
        });
        warnings.dedup();

        Ok(ParsedExpression {
            expr: Some(expr),
            warnings,
        })
    }

    fn validate_strict(&self, expr: &LicenseExpr) -> Result<()> {
        for term in expr.terms() {
            if !self.rules.contains_license(&term.id) {
                return Err(LicscopeError::parse(
                    "license expression",
                    ParseErrorKind::UnknownLicense(term.id.clone()),
                ));
            }
            if let Some(exception) = &term.exception {
                if !self.rules.contains_exception(exception) {
                    return Err(LicscopeError::parse(
                        "license expression",
                        ParseErrorKind::UnknownException(exception.clone()),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lic(id: &str) -> LicenseExpr {
        LicenseExpr::license(id)
    }

    #[test]
    fn test_single_license() {
        assert_eq!(parse_expression("MIT").unwrap(), lic("MIT"));
        assert_eq!(parse_expression("  GPL-2.0+ ").unwrap(), lic("GPL-2.0+"));
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let expr = parse_expression("MIT OR Apache-2.0 AND BSD-3-Clause").unwrap();
        assert_eq!(
            expr,
            LicenseExpr::Or(vec![
                lic("MIT"),
                LicenseExpr::And(vec![lic("Apache-2.0"), lic("BSD-3-Clause")]),
            ])
        );
    }

    #[test]
    fn test_with_forms_single_leaf() {
        let expr = parse_expression("GPL-2.0-only WITH Classpath-exception-2.0 OR MIT").unwrap();
        assert_eq!(
            expr,
            LicenseExpr::Or(vec![
                LicenseExpr::license_with("GPL-2.0-only", "Classpath-exception-2.0"),
                lic("MIT"),
            ])
        );
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let expr = parse_expression("(MIT OR Apache-2.0) AND ISC").unwrap();
        assert_eq!(
            expr,
            LicenseExpr::And(vec![
                LicenseExpr::Or(vec![lic("MIT"), lic("Apache-2.0")]),
                lic("ISC"),
            ])
        );
    }

    #[test]
    fn test_lowercase_operators_and_flat_chains() {
        let expr = parse_expression("MIT and ISC and Zlib").unwrap();
        assert_eq!(
            expr,
            LicenseExpr::And(vec![lic("MIT"), lic("ISC"), lic("Zlib")])
        );
    }

    #[test]
    fn test_malformed_inputs() {
        for text in [
            "",
            "MIT AND",
            "AND MIT",
            "MIT Apache-2.0",
            "(MIT",
            "MIT)",
            "()",
            "MIT WITH",
            "WITH LLVM-exception",
            "MIT / Apache-2.0",
        ] {
            let err = parse_expression(text).unwrap_err();
            assert!(
                matches!(
                    err,
                    LicscopeError::Parse {
                        source: ParseErrorKind::InvalidExpression { .. },
                        ..
                    }
                ),
                "expected syntax error for {text:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_deeply_nested_parentheses() {
        let depth = 50_000;
        let text = format!("{}MIT{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(parse_expression(&text).unwrap(), lic("MIT"));
    }

    #[test]
    fn test_no_license_markers() {
        assert!(is_no_license(""));
        assert!(is_no_license("  "));
        assert!(is_no_license("NOASSERTION"));
        assert!(is_no_license("none"));
        assert!(!is_no_license("MIT"));
    }
}
