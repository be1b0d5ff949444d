//! License expression tree.
//!
//! Every traversal in this module runs on an explicit stack. Aggregate
//! expressions (a whole distribution AND-merged from LICENSE files) can grow
//! arbitrarily deep before normalization flattens them.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::parse::parse_expression;

/// A single license leaf: an SPDX id with an optional `WITH` exception.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LicenseTerm {
    /// SPDX license id (or `LicenseRef-*`)
    pub id: String,
    /// Exception attached with `WITH`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
}

impl LicenseTerm {
    /// Create a term without exception
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            exception: None,
        }
    }

    /// Create a term carrying an exception
    pub fn with_exception(id: impl Into<String>, exception: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            exception: Some(exception.into()),
        }
    }
}

impl fmt::Display for LicenseTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.exception {
            Some(exception) => write!(f, "{} WITH {}", self.id, exception),
            None => write!(f, "{}", self.id),
        }
    }
}

/// Boolean combinator of a compound expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    And,
    Or,
}

impl Operator {
    /// Build a compound expression with this operator
    #[must_use]
    pub fn build(self, children: Vec<LicenseExpr>) -> LicenseExpr {
        match self {
            Self::And => LicenseExpr::And(children),
            Self::Or => LicenseExpr::Or(children),
        }
    }

    const fn separator(self) -> &'static str {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }

    const fn rank(self) -> u8 {
        match self {
            Self::And => 0,
            Self::Or => 1,
        }
    }
}

/// License expression ("dual license") tree.
///
/// Serialized as its SPDX text. Text that does not parse deserializes into a
/// single [`LicenseExpr::Unknown`] leaf rather than failing.
///
/// `Clone`, `Drop`, equality, ordering and hashing walk the tree on an
/// explicit stack, so nesting depth is bounded only by memory. Ordering is
/// structural: compound nodes sort before leaves, `AND` before `OR`, and
/// leaves by their SPDX text.
#[derive(Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LicenseExpr {
    /// Known-shape leaf
    License(LicenseTerm),
    /// Leaf whose id could not be resolved (permissive mode only)
    Unknown(String),
    /// Every child applies
    And(Vec<LicenseExpr>),
    /// Any one child may be chosen
    Or(Vec<LicenseExpr>),
}

impl LicenseExpr {
    /// Single-license leaf
    pub fn license(id: impl Into<String>) -> Self {
        Self::License(LicenseTerm::new(id))
    }

    /// Leaf with a `WITH` exception
    pub fn license_with(id: impl Into<String>, exception: impl Into<String>) -> Self {
        Self::License(LicenseTerm::with_exception(id, exception))
    }

    /// Children of a compound node using `op`
    pub(crate) fn children_mut(&mut self, op: Operator) -> Option<&mut Vec<Self>> {
        match (op, self) {
            (Operator::And, Self::And(children)) | (Operator::Or, Self::Or(children)) => Some(children),
            _ => None,
        }
    }

    /// Text segments of a leaf; empty for compound nodes.
    fn leaf_text(&self) -> [&str; 3] {
        match self {
            Self::License(term) => match &term.exception {
                Some(exception) => [term.id.as_str(), " WITH ", exception.as_str()],
                None => [term.id.as_str(), "", ""],
            },
            Self::Unknown(raw) => [raw.as_str(), "", ""],
            Self::And(_) | Self::Or(_) => ["", "", ""],
        }
    }

    /// Operator and children of a compound node
    #[must_use]
    pub fn as_compound(&self) -> Option<(Operator, &[Self])> {
        match self {
            Self::And(children) => Some((Operator::And, children)),
            Self::Or(children) => Some((Operator::Or, children)),
            Self::License(_) | Self::Unknown(_) => None,
        }
    }

    /// Whether this node is a leaf
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(self, Self::License(_) | Self::Unknown(_))
    }

    /// Iterate over leaves in left-to-right order.
    #[must_use]
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves { stack: vec![self] }
    }

    /// Leaf terms with a resolvable shape (skips `Unknown` leaves)
    pub fn terms(&self) -> impl Iterator<Item = &LicenseTerm> {
        self.leaves().filter_map(|leaf| match leaf {
            Self::License(term) => Some(term),
            _ => None,
        })
    }

    /// All license ids referenced by this expression
    pub fn license_ids(&self) -> impl Iterator<Item = &str> {
        self.terms().map(|term| term.id.as_str())
    }

    /// All exception ids referenced by this expression
    pub fn exception_ids(&self) -> impl Iterator<Item = &str> {
        self.terms().filter_map(|term| term.exception.as_deref())
    }

    /// Whether any leaf carries the given license id
    #[must_use]
    pub fn has_license(&self, id: &str) -> bool {
        self.license_ids().any(|candidate| candidate == id)
    }

    /// Whether the expression contains an unresolved leaf
    #[must_use]
    pub fn has_unknown(&self) -> bool {
        self.leaves().any(|leaf| matches!(leaf, Self::Unknown(_)))
    }

    /// Post-order fold over the tree without recursion.
    ///
    /// `leaf` maps every leaf; `combine` receives the operator of a compound
    /// node together with the already folded values of its children, in order.
    pub fn fold<T, L, C>(&self, mut leaf: L, mut combine: C) -> T
    where
        L: FnMut(&Self) -> T,
        C: FnMut(Operator, Vec<T>) -> T,
    {
        enum Frame<'a> {
            Enter(&'a LicenseExpr),
            Exit(Operator, usize),
        }

        let mut frames = vec![Frame::Enter(self)];
        let mut values: Vec<T> = Vec::new();

        while let Some(frame) = frames.pop() {
            match frame {
                Frame::Enter(expr) => match expr.as_compound() {
                    Some((op, children)) => {
                        frames.push(Frame::Exit(op, children.len()));
                        frames.extend(children.iter().rev().map(Frame::Enter));
                    }
                    None => values.push(leaf(expr)),
                },
                Frame::Exit(op, arity) => {
                    let args = values.split_off(values.len() - arity);
                    values.push(combine(op, args));
                }
            }
        }

        values
            .pop()
            .expect("fold leaves exactly one value for the root")
    }

    /// Rebuild the tree, replacing every leaf.
    pub fn map_leaves<F>(&self, f: F) -> Self
    where
        F: FnMut(&Self) -> Self,
    {
        self.fold(f, Operator::build)
    }

    /// Number of nodes in the tree
    #[must_use]
    pub fn size(&self) -> usize {
        self.fold(|_| 1, |_, children| 1 + children.into_iter().sum::<usize>())
    }

    /// Render as SPDX text.
    ///
    /// Compound children with a different operator than their parent are
    /// parenthesized.
    #[must_use]
    pub fn render(&self) -> String {
        enum Step<'a> {
            Visit(&'a LicenseExpr, bool),
            Text(&'static str),
        }

        let mut out = String::new();
        let mut stack = vec![Step::Visit(self, false)];

        while let Some(step) = stack.pop() {
            match step {
                Step::Text(text) => out.push_str(text),
                Step::Visit(Self::License(term), _) => out.push_str(&term.to_string()),
                Step::Visit(Self::Unknown(raw), _) => out.push_str(raw),
                Step::Visit(expr, parenthesize) => {
                    let Some((op, children)) = expr.as_compound() else {
                        continue;
                    };
                    if parenthesize {
                        out.push('(');
                        stack.push(Step::Text(")"));
                    }
                    for (idx, child) in children.iter().enumerate().rev() {
                        let nested = child
                            .as_compound()
                            .is_some_and(|(child_op, _)| child_op != op);
                        stack.push(Step::Visit(child, nested));
                        if idx > 0 {
                            stack.push(Step::Text(op.separator()));
                        }
                    }
                }
            }
        }

        out
    }
}

impl Clone for LicenseExpr {
    fn clone(&self) -> Self {
        match self {
            Self::License(term) => Self::License(term.clone()),
            Self::Unknown(raw) => Self::Unknown(raw.clone()),
            Self::And(_) | Self::Or(_) => self.fold(Self::clone, Operator::build),
        }
    }
}

impl Drop for LicenseExpr {
    fn drop(&mut self) {
        let mut pending = match self {
            Self::And(children) | Self::Or(children) => std::mem::take(children),
            Self::License(_) | Self::Unknown(_) => return,
        };
        while let Some(mut expr) = pending.pop() {
            if let Self::And(children) | Self::Or(children) = &mut expr {
                pending.append(children);
            }
        }
    }
}

impl PartialEq for LicenseExpr {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for LicenseExpr {}

impl PartialOrd for LicenseExpr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LicenseExpr {
    fn cmp(&self, other: &Self) -> Ordering {
        enum Step<'a> {
            Pair(&'a LicenseExpr, &'a LicenseExpr),
            Arity(usize, usize),
        }

        let mut steps = vec![Step::Pair(self, other)];
        while let Some(step) = steps.pop() {
            let ordering = match step {
                Step::Arity(left, right) => left.cmp(&right),
                Step::Pair(left, right) => match (left.as_compound(), right.as_compound()) {
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => {
                        let (a, b) = (left.leaf_text(), right.leaf_text());
                        a.iter()
                            .flat_map(|part| part.bytes())
                            .cmp(b.iter().flat_map(|part| part.bytes()))
                            .then_with(|| {
                                matches!(left, LicenseExpr::Unknown(_))
                                    .cmp(&matches!(right, LicenseExpr::Unknown(_)))
                            })
                    }
                    (Some((left_op, left_children)), Some((right_op, right_children))) => {
                        let ordering = left_op.rank().cmp(&right_op.rank());
                        if ordering == Ordering::Equal {
                            steps.push(Step::Arity(left_children.len(), right_children.len()));
                            steps.extend(
                                left_children
                                    .iter()
                                    .zip(right_children)
                                    .rev()
                                    .map(|(a, b)| Step::Pair(a, b)),
                            );
                        }
                        ordering
                    }
                },
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

impl Hash for LicenseExpr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut stack = vec![self];
        while let Some(expr) = stack.pop() {
            match expr {
                Self::License(term) => {
                    state.write_u8(0);
                    term.hash(state);
                }
                Self::Unknown(raw) => {
                    state.write_u8(1);
                    raw.hash(state);
                }
                Self::And(children) | Self::Or(children) => {
                    state.write_u8(if matches!(expr, Self::And(_)) { 2 } else { 3 });
                    state.write_usize(children.len());
                    stack.extend(children.iter().rev());
                }
            }
        }
    }
}

impl fmt::Debug for LicenseExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LicenseExpr").field(&self.render()).finish()
    }
}

impl fmt::Display for LicenseExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<String> for LicenseExpr {
    fn from(text: String) -> Self {
        parse_expression(&text).unwrap_or(Self::Unknown(text))
    }
}

impl From<LicenseExpr> for String {
    fn from(expr: LicenseExpr) -> Self {
        expr.render()
    }
}

impl From<LicenseTerm> for LicenseExpr {
    fn from(term: LicenseTerm) -> Self {
        Self::License(term)
    }
}

/// Left-to-right leaf iterator, see [`LicenseExpr::leaves`].
pub struct Leaves<'a> {
    stack: Vec<&'a LicenseExpr>,
}

impl<'a> Iterator for Leaves<'a> {
    type Item = &'a LicenseExpr;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(expr) = self.stack.pop() {
            match expr.as_compound() {
                Some((_, children)) => self.stack.extend(children.iter().rev()),
                None => return Some(expr),
            }
        }
        None
    }
}
