//! Combining operators for the collective reduction.

/// Associative, commutative operator used by both the kernel and the reducer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReduceOp {
    /// Floating-point sum
    #[default]
    Sum,
    /// Smallest contribution
    Min,
    /// Largest contribution
    Max,
}

impl ReduceOp {
    /// Value that leaves any other value unchanged under `combine`.
    /// Empty work ranges contribute exactly this.
    pub fn identity(self) -> f64 {
        match self {
            Self::Sum => 0.0,
            Self::Min => f64::INFINITY,
            Self::Max => f64::NEG_INFINITY,
        }
    }

    /// NaN is absorbing under every operator, so an undefined term always
    /// surfaces as a non-finite partial.
    pub fn combine(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Self::Sum => lhs + rhs,
            Self::Min | Self::Max if lhs.is_nan() || rhs.is_nan() => f64::NAN,
            Self::Min => lhs.min(rhs),
            Self::Max => lhs.max(rhs),
        }
    }

    /// Combine values with a fixed pairwise tree over their slice order.
    ///
    /// The tree shape depends only on `values.len()`, so the same inputs in
    /// the same order always produce the same bits.
    pub fn fold_tree(self, values: &[f64]) -> f64 {
        match values {
            [] => self.identity(),
            [single] => *single,
            _ => {
                let mid = values.len() / 2;
                self.combine(
                    self.fold_tree(&values[..mid]),
                    self.fold_tree(&values[mid..]),
                )
            }
        }
    }
}

impl std::fmt::Display for ReduceOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sum => write!(f, "sum"),
            Self::Min => write!(f, "min"),
            Self::Max => write!(f, "max"),
        }
    }
}
