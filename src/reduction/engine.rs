//! Runs a full partition, compute, reduce, emit pass over a world of workers.
//!
//! Each rank is a tokio task. The kernel itself is CPU bound and runs on the
//! blocking pool, so ranks compute in parallel on separate threads and only
//! meet again inside the collective.

use super::communicator::Communicator;
use super::kernel::compute_partial_with;
use super::op::ReduceOp;
use super::partition::partition_for;
use super::types::GlobalResult;
use crate::error::{ErrorCode, ParsumError, Result};
use crate::sink::{ResultLabel, ResultSink, ResultValue};
use crate::term::TermFn;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinError;
use tracing::{debug, error, info, trace};

/// Shape of one run, identical on every rank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReductionPlan {
    total_iterations: u64,
    worker_count: usize,
    coordinator: usize,
    op: ReduceOp,
}

impl ReductionPlan {
    /// Sum over `[1, total_iterations - 1]` with rank 0 as coordinator.
    pub fn new(total_iterations: u64, worker_count: usize) -> Self {
        Self {
            total_iterations,
            worker_count,
            coordinator: 0,
            op: ReduceOp::Sum,
        }
    }

    pub fn with_coordinator(mut self, coordinator: usize) -> Self {
        self.coordinator = coordinator;
        self
    }

    pub fn with_op(mut self, op: ReduceOp) -> Self {
        self.op = op;
        self
    }

    pub fn total_iterations(&self) -> u64 {
        self.total_iterations
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn coordinator(&self) -> usize {
        self.coordinator
    }

    pub fn op(&self) -> ReduceOp {
        self.op
    }

    pub fn validate(&self) -> Result<()> {
        if self.total_iterations == 0 {
            return Err(ParsumError::validation_with_code(
                ErrorCode::VALIDATION_EMPTY_ITERATION_SPACE,
                "total iterations must be at least 1",
                Some("total_iterations".to_string()),
            ));
        }
        if self.worker_count == 0 {
            return Err(ParsumError::validation_with_code(
                ErrorCode::VALIDATION_NO_WORKERS,
                "worker count must be at least 1",
                Some("workers".to_string()),
            ));
        }
        if self.coordinator >= self.worker_count {
            return Err(ParsumError::validation_with_code(
                ErrorCode::VALIDATION_RANK_OUT_OF_RANGE,
                format!(
                    "coordinator {} is not below worker count {}",
                    self.coordinator, self.worker_count
                ),
                Some("coordinator".to_string()),
            ));
        }
        Ok(())
    }
}

/// One rank's part of a run.
///
/// Returns the global result on the coordinator, which is also the only rank
/// that writes to `sink`. Every other rank returns `None`.
pub async fn run_worker<T, S>(
    comm: Communicator,
    plan: &ReductionPlan,
    term_fn: Arc<T>,
    sink: &S,
    label: &ResultLabel,
) -> Result<Option<GlobalResult>>
where
    T: TermFn + ?Sized + 'static,
    S: ResultSink + ?Sized,
{
    let identity = comm.identity();
    let rank = identity.rank();
    info!(
        "worker {} of {} running on {}",
        rank,
        identity.worker_count(),
        host_name()
    );

    let range = partition_for(plan.total_iterations(), &identity)?;
    debug!(rank, %range, "assigned range");

    let op = plan.op();
    let partial = tokio::task::spawn_blocking(move || {
        compute_partial_with(range, term_fn.as_ref(), op)
    })
    .await
    .map_err(|e| worker_join_error(rank, e))?;
    trace!(rank, value = partial.value, "partial computed");

    // Min and Max identities are infinite, so only evaluated terms are checked.
    if !range.is_empty() && !partial.value.is_finite() {
        return Err(ParsumError::non_finite(rank, partial.value).with_context(range));
    }

    let global = comm.reduce_with(partial, plan.coordinator(), op).await?;
    if let Some(result) = global {
        sink.emit_labeled(label, ResultValue::Float(result.value))?;
    }
    Ok(global)
}

/// Run every rank of `plan` and return the coordinator's result.
///
/// Fails if any rank fails. When several do, the error that caused the
/// others is reported.
pub async fn run<T, S>(
    plan: ReductionPlan,
    term_fn: Arc<T>,
    sink: Arc<S>,
    label: ResultLabel,
) -> Result<GlobalResult>
where
    T: TermFn + ?Sized + 'static,
    S: ResultSink + ?Sized + 'static,
{
    plan.validate()?;
    let started = Instant::now();
    debug!(
        iterations = plan.total_iterations(),
        workers = plan.worker_count(),
        coordinator = plan.coordinator(),
        op = %plan.op(),
        "starting run"
    );

    let handles: Vec<_> = Communicator::world(plan.worker_count(), plan.coordinator())?
        .into_iter()
        .map(|comm| {
            let rank = comm.rank();
            let term_fn = Arc::clone(&term_fn);
            let sink = Arc::clone(&sink);
            let label = label.clone();
            let handle = tokio::spawn(async move {
                run_worker(comm, &plan, term_fn, sink.as_ref(), &label).await
            });
            (rank, handle)
        })
        .collect();

    let mut global = None;
    let mut errors = Vec::new();
    for (rank, handle) in handles {
        match handle.await {
            Ok(Ok(Some(result))) => global = Some(result),
            Ok(Ok(None)) => {}
            Ok(Err(e)) => errors.push(e),
            Err(e) => errors.push(worker_join_error(rank, e)),
        }
    }

    if let Some(err) = root_cause(errors) {
        error!("run failed: {}", err);
        return Err(err);
    }

    let global = global.ok_or_else(|| {
        ParsumError::reduction_with_code(
            ErrorCode::REDUCTION_GENERIC,
            plan.coordinator(),
            "coordinator finished without a result",
        )
    })?;
    info!(
        value = global.value,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "reduction complete"
    );
    Ok(global)
}

/// Pick the error to report for a failed run: the first, in rank order, that
/// was not itself caused by another rank's failure.
pub fn root_cause(errors: Vec<ParsumError>) -> Option<ParsumError> {
    let position = errors
        .iter()
        .position(|e| !e.is_secondary())
        .unwrap_or(0);
    errors.into_iter().nth(position)
}

fn worker_join_error(rank: usize, err: JoinError) -> ParsumError {
    if err.is_cancelled() {
        return ParsumError::worker_with_code(ErrorCode::WORKER_CANCELLED, rank, "task cancelled");
    }
    let payload = err.into_panic();
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    ParsumError::worker_with_code(
        ErrorCode::WORKER_PANICKED,
        rank,
        format!("panicked: {message}"),
    )
}

fn host_name() -> String {
    hostname::get()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_string())
}
