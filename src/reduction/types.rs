//! Value types shared by the partition, kernel and reduce phases.

use crate::error::{ErrorCode, ParsumError, Result};
use std::ops::RangeInclusive;

/// Position of one worker inside a fixed-size world.
///
/// Created once when the world is set up and never mutated afterwards. Every
/// phase receives it explicitly instead of reading process-wide state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkerIdentity {
    rank: usize,
    worker_count: usize,
}

impl WorkerIdentity {
    pub fn new(rank: usize, worker_count: usize) -> Result<Self> {
        if worker_count == 0 {
            return Err(ParsumError::validation_with_code(
                ErrorCode::VALIDATION_NO_WORKERS,
                "worker count must be at least 1",
                Some("worker_count".to_string()),
            ));
        }
        if rank >= worker_count {
            return Err(ParsumError::validation_with_code(
                ErrorCode::VALIDATION_RANK_OUT_OF_RANGE,
                format!("rank {rank} is not below worker count {worker_count}"),
                Some("rank".to_string()),
            ));
        }
        Ok(Self { rank, worker_count })
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn is_coordinator(&self, coordinator: usize) -> bool {
        self.rank == coordinator
    }
}

/// Inclusive slice `[start, end]` of the global iteration space.
///
/// `end < start` encodes an empty range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkRange {
    start: u64,
    end: u64,
}

impl WorkRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Number of indices covered by this range
    pub fn len(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.end - self.start + 1
        }
    }

    pub fn indices(&self) -> RangeInclusive<u64> {
        self.start..=self.end
    }
}

impl std::fmt::Display for WorkRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "[] (empty)")
        } else {
            write!(f, "[{}, {}]", self.start, self.end)
        }
    }
}

/// One worker's locally accumulated contribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartialResult {
    pub value: f64,
}

/// The reduced value. Only the coordinator ever holds one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalResult {
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_rejects_rank_outside_world() {
        let err = WorkerIdentity::new(4, 4).unwrap_err();
        assert_eq!(err.code(), ErrorCode::VALIDATION_RANK_OUT_OF_RANGE);

        let err = WorkerIdentity::new(0, 0).unwrap_err();
        assert_eq!(err.code(), ErrorCode::VALIDATION_NO_WORKERS);
    }

    #[test]
    fn test_identity_coordinator_check() {
        let identity = WorkerIdentity::new(2, 3).unwrap();
        assert!(identity.is_coordinator(2));
        assert!(!identity.is_coordinator(0));
        assert_eq!(identity.worker_count(), 3);
    }

    #[test]
    fn test_empty_range() {
        let range = WorkRange::new(5, 4);
        assert!(range.is_empty());
        assert_eq!(range.len(), 0);
        assert_eq!(range.indices().count(), 0);
        assert_eq!(range.to_string(), "[] (empty)");
    }

    #[test]
    fn test_single_index_range() {
        let range = WorkRange::new(7, 7);
        assert!(!range.is_empty());
        assert_eq!(range.len(), 1);
        assert_eq!(range.indices().collect::<Vec<_>>(), vec![7]);
        assert_eq!(range.to_string(), "[7, 7]");
    }
}
