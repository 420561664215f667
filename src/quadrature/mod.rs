//! Sparse-grid quadrature on top of the reduction engine
//!
//! Grid points and weights come from an external generator, consumed through
//! [`SparseGridGenerator`]. The quadrature sum `sum_k w_k * f(x_k)` is then an
//! ordinary term function over indices `1..=len`, so it is partitioned,
//! computed and reduced exactly like any other series.

use crate::error::{ErrorCode, ParsumError, Result};
use crate::reduction::{self, GlobalResult, ReductionPlan};
use crate::sink::{ResultLabel, ResultSink};
use crate::term::TermFn;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;
use tracing::debug;

/// Points and weights of a quadrature grid. Points are stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseGrid {
    dim: usize,
    points: Vec<f64>,
    weights: Vec<f64>,
}

impl SparseGrid {
    pub fn new(dim: usize, points: Vec<f64>, weights: Vec<f64>) -> Result<Self> {
        if dim == 0 {
            return Err(invalid_grid("grid dimension must be at least 1"));
        }
        if points.len() != dim * weights.len() {
            return Err(invalid_grid(format!(
                "{} coordinates do not make {} points of dimension {}",
                points.len(),
                weights.len(),
                dim
            )));
        }
        Ok(Self {
            dim,
            points,
            weights,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn point(&self, k: usize) -> Option<&[f64]> {
        self.points.get(k * self.dim..(k + 1) * self.dim)
    }

    pub fn weight(&self, k: usize) -> Option<f64> {
        self.weights.get(k).copied()
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

/// Parse the generator's text table: one point per line, `dim` coordinates
/// followed by the weight, separated by whitespace. Blank lines are skipped.
pub fn parse_grid_table(text: &str, dim: usize) -> Result<SparseGrid> {
    let mut points = Vec::new();
    let mut weights = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let values = line
            .split_whitespace()
            .map(str::parse::<f64>)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| {
                invalid_grid(format!("line {}: {}", line_no + 1, e)).with_source(e)
            })?;

        let Some((weight, coordinates)) = values.split_last() else {
            continue;
        };
        if coordinates.len() != dim {
            return Err(invalid_grid(format!(
                "line {}: expected {} columns, found {}",
                line_no + 1,
                dim + 1,
                values.len()
            )));
        }
        points.extend_from_slice(coordinates);
        weights.push(*weight);
    }

    SparseGrid::new(dim, points, weights)
}

/// Source of sparse-grid points and weights.
///
/// `generate` may block on a child process. From async code go through
/// [`generate_grid`].
pub trait SparseGridGenerator: Send + Sync {
    fn generate(&self, dim: usize, level: usize) -> Result<SparseGrid>;
}

/// Run `generator` on the blocking pool.
pub async fn generate_grid<G>(generator: Arc<G>, dim: usize, level: usize) -> Result<SparseGrid>
where
    G: SparseGridGenerator + ?Sized + 'static,
{
    tokio::task::spawn_blocking(move || generator.generate(dim, level))
        .await
        .map_err(|e| ParsumError::other("grid generator task failed").with_source(e))?
}

/// Runs an external generator program as `<program> -d <dim> -l <level>` and
/// parses its standard output.
#[derive(Debug, Clone)]
pub struct CommandGridGenerator {
    program: PathBuf,
    args: Vec<OsString>,
}

impl CommandGridGenerator {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Argument placed before `-d` and `-l`
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl SparseGridGenerator for CommandGridGenerator {
    fn generate(&self, dim: usize, level: usize) -> Result<SparseGrid> {
        debug!(
            "Running grid generator {} for dim={} level={}",
            self.program.display(),
            dim,
            level
        );
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg("-d")
            .arg(dim.to_string())
            .arg("-l")
            .arg(level.to_string())
            .output()
            .map_err(|e| {
                ParsumError::other(format!("failed to run {}", self.program.display()))
                    .with_source(e)
            })?;

        if !output.status.success() {
            return Err(ParsumError::other(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        parse_grid_table(&String::from_utf8_lossy(&output.stdout), dim)
    }
}

/// Precomputed grids looked up by `(dim, level)`
#[derive(Debug, Clone, Default)]
pub struct TabulatedGrid {
    grids: HashMap<(usize, usize), SparseGrid>,
}

impl TabulatedGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_grid(mut self, level: usize, grid: SparseGrid) -> Self {
        self.insert(level, grid);
        self
    }

    pub fn insert(&mut self, level: usize, grid: SparseGrid) {
        self.grids.insert((grid.dim(), level), grid);
    }
}

impl SparseGridGenerator for TabulatedGrid {
    fn generate(&self, dim: usize, level: usize) -> Result<SparseGrid> {
        self.grids
            .get(&(dim, level))
            .cloned()
            .ok_or_else(|| invalid_grid(format!("no grid for dim={dim} level={level}")))
    }
}

/// Term `w_k * f(x_k)` for 1-based index `k`.
///
/// An index past the end of the grid yields NaN, which the engine reports as
/// an arithmetic fault.
pub struct WeightedTerm<F> {
    grid: SparseGrid,
    integrand: F,
}

impl<F> WeightedTerm<F>
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    pub fn new(grid: SparseGrid, integrand: F) -> Self {
        Self { grid, integrand }
    }

    /// Iteration count covering every grid point
    pub fn total_iterations(&self) -> u64 {
        self.grid.len() as u64 + 1
    }
}

impl<F> TermFn for WeightedTerm<F>
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn term(&self, index: u64) -> f64 {
        let Some(k) = (index as usize).checked_sub(1) else {
            return f64::NAN;
        };
        match (self.grid.point(k), self.grid.weight(k)) {
            (Some(point), Some(weight)) => weight * (self.integrand)(point),
            _ => f64::NAN,
        }
    }
}

/// Integrate `integrand` over `grid` on `worker_count` workers and emit the
/// result through `sink`.
pub async fn integrate<F, S>(
    grid: SparseGrid,
    integrand: F,
    worker_count: usize,
    sink: Arc<S>,
    label: ResultLabel,
) -> Result<GlobalResult>
where
    F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    S: ResultSink + ?Sized + 'static,
{
    let term = WeightedTerm::new(grid, integrand);
    let plan = ReductionPlan::new(term.total_iterations(), worker_count);
    reduction::run(plan, Arc::new(term), sink, label).await
}

fn invalid_grid(message: impl Into<String>) -> ParsumError {
    ParsumError::validation_with_code(ErrorCode::VALIDATION_INVALID_GRID, message, None)
}
