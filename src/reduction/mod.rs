//! Partitioned reduction engine
//!
//! A run goes through three phases on every worker:
//!
//! 1. [`partition`] computes the worker's slice of the iteration space from
//!    its rank alone.
//! 2. [`compute_partial`] folds the caller's term function over that slice.
//! 3. [`Communicator::reduce`] combines all partials onto the coordinator.
//!
//! [`run`] wires the phases together for a whole world of workers and hands
//! the coordinator's result to a [`ResultSink`](crate::sink::ResultSink).

pub mod communicator;
pub mod engine;
pub mod kernel;
pub mod op;
pub mod partition;
pub mod types;

pub use communicator::Communicator;
pub use engine::{root_cause, run, run_worker, ReductionPlan};
pub use kernel::{compute_partial, compute_partial_with};
pub use op::ReduceOp;
pub use partition::{partition, partition_all, partition_for};
pub use types::{GlobalResult, PartialResult, WorkRange, WorkerIdentity};
