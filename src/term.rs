//! Per-index term functions evaluated by the worker kernel.

/// A function evaluated once for every index of a worker's range.
///
/// The kernel knows nothing about what a term means; any
/// `Fn(u64) -> f64 + Send + Sync` closure qualifies.
pub trait TermFn: Send + Sync {
    fn term(&self, index: u64) -> f64;
}

impl<F> TermFn for F
where
    F: Fn(u64) -> f64 + Send + Sync,
{
    fn term(&self, index: u64) -> f64 {
        self(index)
    }
}

/// Term of the Riemann zeta series, `1 / i^n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZetaTerm {
    exponent: u32,
}

impl ZetaTerm {
    pub fn new(exponent: u32) -> Self {
        Self { exponent }
    }

    pub fn exponent(&self) -> u32 {
        self.exponent
    }
}

impl TermFn for ZetaTerm {
    fn term(&self, index: u64) -> f64 {
        1.0 / (index as f64).powf(f64::from(self.exponent))
    }
}
