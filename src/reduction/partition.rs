//! Pure static partitioning of the iteration space
//!
//! Every worker evaluates the same formula on its own rank, so no message
//! ever has to carry range boundaries between workers.

use super::types::{WorkRange, WorkerIdentity};
use crate::error::{ErrorCode, ParsumError, Result};

/// Pure: Compute the inclusive sub-range of `[1, total_iterations - 1]` owned by `rank`
///
/// ```text
/// lo = 1 + floor(rank * (total_iterations - 1) / worker_count)
/// hi = floor((rank + 1) * (total_iterations - 1) / worker_count)
/// ```
///
/// `hi < lo` yields an empty range, which happens whenever there are more
/// workers than indices.
pub fn partition(total_iterations: u64, rank: usize, worker_count: usize) -> Result<WorkRange> {
    if total_iterations == 0 {
        return Err(ParsumError::validation_with_code(
            ErrorCode::VALIDATION_EMPTY_ITERATION_SPACE,
            "total iterations must be at least 1",
            Some("total_iterations".to_string()),
        ));
    }
    let identity = WorkerIdentity::new(rank, worker_count)?;
    Ok(bounds(total_iterations, &identity))
}

/// Pure: Partition for an already validated worker identity
pub fn partition_for(total_iterations: u64, identity: &WorkerIdentity) -> Result<WorkRange> {
    partition(total_iterations, identity.rank(), identity.worker_count())
}

/// Pure: Ranges for every rank, in rank order
pub fn partition_all(total_iterations: u64, worker_count: usize) -> Result<Vec<WorkRange>> {
    (0..worker_count.max(1))
        .map(|rank| partition(total_iterations, rank, worker_count))
        .collect()
}

// rank * span can exceed u64 for large worlds, so the products are taken in u128.
fn bounds(total_iterations: u64, identity: &WorkerIdentity) -> WorkRange {
    let span = u128::from(total_iterations - 1);
    let rank = identity.rank() as u128;
    let workers = identity.worker_count() as u128;

    let lo = 1 + rank * span / workers;
    let hi = (rank + 1) * span / workers;

    WorkRange::new(lo as u64, hi as u64)
}
