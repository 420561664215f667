//! Worker kernel: folds a term function over one work range.

use super::op::ReduceOp;
use super::types::{PartialResult, WorkRange};
use crate::term::TermFn;

/// Sum `term_fn` over `range`.
///
/// An empty range returns `0.0` without calling `term_fn`.
pub fn compute_partial<T>(range: WorkRange, term_fn: &T) -> PartialResult
where
    T: TermFn + ?Sized,
{
    compute_partial_with(range, term_fn, ReduceOp::Sum)
}

/// Fold `term_fn` over `range` with `op`, starting from `op.identity()`.
///
/// Indices are visited from the top of the range down. For decaying series
/// such as zeta this adds the smallest terms first.
pub fn compute_partial_with<T>(range: WorkRange, term_fn: &T, op: ReduceOp) -> PartialResult
where
    T: TermFn + ?Sized,
{
    let value = range
        .indices()
        .rev()
        .fold(op.identity(), |acc, index| op.combine(acc, term_fn.term(index)));

    PartialResult { value }
}
