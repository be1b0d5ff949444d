//! License algebra: normalization, AND-merge and exception application.

use super::diagnostics::ExceptionConflict;
use super::expression::{LicenseExpr, LicenseTerm, Operator};

/// Outcome of [`LicenseExpr::apply_exception_to_targets`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionApplication {
    /// Normalized expression with the exception attached
    pub expr: LicenseExpr,
    /// Leaves that already carried a different exception
    pub conflicts: Vec<ExceptionConflict>,
}

/// Combine already-normalized children under `op`.
fn combine_normalized(op: Operator, children: Vec<LicenseExpr>) -> LicenseExpr {
    let mut flat: Vec<LicenseExpr> = Vec::with_capacity(children.len());
    for mut child in children {
        match child.children_mut(op) {
            Some(grandchildren) => flat.append(grandchildren),
            None => flat.push(child),
        }
    }

    flat.sort();
    flat.dedup();

    if flat.len() == 1 {
        if let Some(only) = flat.pop() {
            return only;
        }
    }
    op.build(flat)
}

impl LicenseExpr {
    /// Canonical form.
    ///
    /// Flattens same-operator nesting, removes duplicate children, sorts
    /// children by the structural [`Ord`] and collapses single-child
    /// combinators. Idempotent and insensitive to child order.
    #[must_use]
    pub fn normalize(&self) -> Self {
        self.fold(Self::clone, combine_normalized)
    }

    /// Text of the normalized form, used as cache and comparison key.
    #[must_use]
    pub fn canonical_key(&self) -> String {
        self.normalize().render()
    }

    /// Structural equality after normalization.
    #[must_use]
    pub fn equivalent(&self, other: &Self) -> bool {
        self.normalize() == other.normalize()
    }

    /// `normalize(AND(self, other))`
    #[must_use]
    pub fn merge_and(&self, other: &Self) -> Self {
        Self::And(vec![self.clone(), other.clone()]).normalize()
    }

    /// AND-merge where `None` (no license information) is the identity.
    #[must_use]
    pub fn merge_and_opt(current: Option<&Self>, other: &Self) -> Self {
        match current {
            Some(current) => current.merge_and(other),
            None => other.normalize(),
        }
    }

    /// Attach `exception_id` to every leaf whose id is in `targets` and which
    /// carries no exception yet.
    ///
    /// Leaves carrying a different exception are left untouched and reported
    /// as conflicts. Applying the same exception again yields the same result.
    #[must_use]
    pub fn apply_exception_to_targets<S: AsRef<str>>(
        &self,
        exception_id: &str,
        targets: &[S],
    ) -> ExceptionApplication {
        let is_target = |id: &str| targets.iter().any(|target| target.as_ref() == id);
        let mut conflicts = Vec::new();

        let expr = self.fold(
            |leaf| match leaf {
                Self::License(term) if is_target(&term.id) => match &term.exception {
                    None => Self::License(LicenseTerm::with_exception(&term.id, exception_id)),
                    Some(existing) if existing == exception_id => leaf.clone(),
                    Some(existing) => {
                        conflicts.push(ExceptionConflict {
                            license: term.id.clone(),
                            existing: existing.clone(),
                            requested: exception_id.to_string(),
                        });
                        leaf.clone()
                    }
                },
                other => other.clone(),
            },
            combine_normalized,
        );

        conflicts.sort();
        conflicts.dedup();
        ExceptionApplication { expr, conflicts }
    }
}
