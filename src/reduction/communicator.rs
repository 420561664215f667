//! Collective reduction over per-rank message inboxes
//!
//! A world is wired for one coordinator. Every contributor holds a single
//! sender into the coordinator's inbox, and the coordinator holds one sender
//! into each contributor's inbox. A reduction is a fan-in of contributions
//! followed by a release message back to every contributor, so each rank
//! leaves `reduce` only after all ranks have arrived.
//!
//! A rank gives up its senders as soon as it has contributed. If a rank dies
//! before contributing, the coordinator's inbox closes with slots still
//! missing and the reduction fails on every rank instead of hanging.

use super::op::ReduceOp;
use super::types::{GlobalResult, PartialResult, WorkerIdentity};
use crate::error::{ErrorCode, ParsumError, Result};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

#[derive(Debug)]
enum Envelope {
    Contribution { from: usize, value: f64 },
    Release,
}

/// One rank's endpoint into the world's collective
#[derive(Debug)]
pub struct Communicator {
    identity: WorkerIdentity,
    coordinator: usize,
    inbox: mpsc::UnboundedReceiver<Envelope>,
    /// The coordinator's inbox on a contributor; every contributor's inbox
    /// on the coordinator.
    outbox: Vec<mpsc::UnboundedSender<Envelope>>,
}

impl Communicator {
    /// Create the endpoints for a world of `worker_count` ranks reducing onto
    /// `coordinator`, in rank order.
    pub fn world(worker_count: usize, coordinator: usize) -> Result<Vec<Communicator>> {
        if worker_count == 0 {
            return Err(ParsumError::validation_with_code(
                ErrorCode::VALIDATION_NO_WORKERS,
                "a world needs at least one worker",
                Some("worker_count".to_string()),
            ));
        }
        if coordinator >= worker_count {
            return Err(ParsumError::validation_with_code(
                ErrorCode::VALIDATION_RANK_OUT_OF_RANGE,
                format!("coordinator {coordinator} is outside a world of {worker_count}"),
                Some("coordinator".to_string()),
            ));
        }

        let (senders, inboxes): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<Envelope>())
            .unzip();

        // The coordinator never holds a sender into its own inbox.
        let to_coordinator = senders[coordinator].clone();
        let mut releases = Some(
            senders
                .into_iter()
                .enumerate()
                .filter(|(rank, _)| *rank != coordinator)
                .map(|(_, tx)| tx)
                .collect::<Vec<_>>(),
        );

        inboxes
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| {
                let outbox = if rank == coordinator {
                    releases.take().unwrap_or_default()
                } else {
                    vec![to_coordinator.clone()]
                };
                Ok(Communicator {
                    identity: WorkerIdentity::new(rank, worker_count)?,
                    coordinator,
                    inbox,
                    outbox,
                })
            })
            .collect()
    }

    pub fn identity(&self) -> WorkerIdentity {
        self.identity
    }

    pub fn rank(&self) -> usize {
        self.identity.rank()
    }

    /// Rank this world was wired to reduce onto.
    pub fn coordinator(&self) -> usize {
        self.coordinator
    }

    /// Sum `local` across all ranks onto `coordinator`.
    ///
    /// Returns `Some` on the coordinator and `None` everywhere else. Blocks
    /// until every rank has contributed.
    pub async fn reduce(
        self,
        local: PartialResult,
        coordinator: usize,
    ) -> Result<Option<GlobalResult>> {
        self.reduce_with(local, coordinator, ReduceOp::Sum).await
    }

    /// Like [`Communicator::reduce`] with an explicit combining operator.
    ///
    /// `coordinator` must be the rank the world was wired for. A rank that
    /// names another one fails at once, and its dropped endpoints fail the
    /// rest of the world.
    pub async fn reduce_with(
        self,
        local: PartialResult,
        coordinator: usize,
        op: ReduceOp,
    ) -> Result<Option<GlobalResult>> {
        let rank = self.rank();
        if coordinator >= self.identity.worker_count() {
            return Err(ParsumError::reduction_with_code(
                ErrorCode::REDUCTION_COORDINATOR_OUT_OF_RANGE,
                rank,
                format!(
                    "coordinator {} is outside a world of {}",
                    coordinator,
                    self.identity.worker_count()
                ),
            ));
        }
        if coordinator != self.coordinator {
            return Err(ParsumError::reduction_with_code(
                ErrorCode::REDUCTION_PROTOCOL_VIOLATION,
                rank,
                format!(
                    "asked to reduce onto rank {coordinator}, but the world reduces onto rank {}",
                    self.coordinator
                ),
            ));
        }

        if self.identity.is_coordinator(coordinator) {
            self.gather(local, op).await.map(Some)
        } else {
            self.contribute(local).await.map(|()| None)
        }
    }

    async fn contribute(self, local: PartialResult) -> Result<()> {
        let Communicator {
            identity,
            coordinator,
            mut inbox,
            outbox,
        } = self;
        let rank = identity.rank();

        let to_coordinator = outbox.into_iter().next().ok_or_else(|| {
            ParsumError::reduction_with_code(
                ErrorCode::REDUCTION_GENERIC,
                rank,
                format!("no route to coordinator {coordinator}"),
            )
        })?;

        trace!(rank, coordinator, value = local.value, "sending contribution");
        to_coordinator
            .send(Envelope::Contribution {
                from: rank,
                value: local.value,
            })
            .map_err(|_| coordinator_lost(rank, coordinator))?;

        drop(to_coordinator);

        match inbox.recv().await {
            Some(Envelope::Release) => {
                debug!(rank, "released by coordinator");
                Ok(())
            }
            Some(Envelope::Contribution { from, .. }) => Err(ParsumError::reduction_with_code(
                ErrorCode::REDUCTION_PROTOCOL_VIOLATION,
                rank,
                format!(
                    "rank {from} sent its contribution here, but rank {coordinator} is the coordinator"
                ),
            )),
            None => Err(coordinator_lost(rank, coordinator)),
        }
    }

    async fn gather(self, local: PartialResult, op: ReduceOp) -> Result<GlobalResult> {
        let Communicator {
            identity,
            mut inbox,
            outbox,
            ..
        } = self;
        let rank = identity.rank();
        let worker_count = identity.worker_count();

        let mut slots: Vec<Option<f64>> = vec![None; worker_count];
        slots[rank] = Some(local.value);
        let mut pending = worker_count - 1;

        while pending > 0 {
            match inbox.recv().await {
                Some(Envelope::Contribution { from, value }) => {
                    let slot = slots
                        .get_mut(from)
                        .filter(|slot| slot.is_none())
                        .ok_or_else(|| {
                            ParsumError::reduction_with_code(
                                ErrorCode::REDUCTION_PROTOCOL_VIOLATION,
                                rank,
                                format!("unexpected contribution from rank {from}"),
                            )
                        })?;
                    *slot = Some(value);
                    pending -= 1;
                    trace!(rank, from, value, pending, "received contribution");
                }
                Some(Envelope::Release) => {
                    return Err(ParsumError::reduction_with_code(
                        ErrorCode::REDUCTION_PROTOCOL_VIOLATION,
                        rank,
                        "another rank acted as coordinator",
                    ))
                }
                None => {
                    let missing: Vec<usize> = slots
                        .iter()
                        .enumerate()
                        .filter(|(_, slot)| slot.is_none())
                        .map(|(peer, _)| peer)
                        .collect();
                    warn!(rank, ?missing, "workers left before contributing");
                    return Err(ParsumError::reduction_with_code(
                        ErrorCode::REDUCTION_PEER_LOST,
                        rank,
                        format!("ranks {missing:?} never contributed"),
                    ));
                }
            }
        }

        let values: Vec<f64> = slots.into_iter().flatten().collect();
        let value = op.fold_tree(&values);
        debug!(rank, %op, value, "all {} contributions combined", worker_count);

        for peer in outbox {
            // A peer that has already returned cannot be released; nothing is lost.
            let _ = peer.send(Envelope::Release);
        }

        Ok(GlobalResult { value })
    }
}

fn coordinator_lost(rank: usize, coordinator: usize) -> ParsumError {
    ParsumError::reduction_with_code(
        ErrorCode::REDUCTION_COORDINATOR_LOST,
        rank,
        format!("coordinator {coordinator} left the reduction"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::task::JoinSet;

    async fn reduce_all(
        world: Vec<Communicator>,
        locals: Vec<f64>,
        coordinator: usize,
    ) -> Vec<(usize, Result<Option<GlobalResult>>)> {
        let mut set = JoinSet::new();
        for (comm, value) in world.into_iter().zip(locals) {
            set.spawn(async move {
                let rank = comm.rank();
                (rank, comm.reduce(PartialResult { value }, coordinator).await)
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = set.join_next().await {
            results.push(joined.unwrap());
        }
        results.sort_by_key(|(rank, _)| *rank);
        results
    }

    #[tokio::test]
    async fn test_single_rank_world() {
        let mut world = Communicator::world(1, 0).unwrap();
        let comm = world.pop().unwrap();

        let global = comm.reduce(PartialResult { value: 4.5 }, 0).await.unwrap();
        assert_eq!(global, Some(GlobalResult { value: 4.5 }));
    }

    #[tokio::test]
    async fn test_only_coordinator_sees_the_sum() {
        let world = Communicator::world(4, 0).unwrap();
        let results = reduce_all(world, vec![1.0, 2.0, 3.0, 4.0], 0).await;

        for (rank, result) in results {
            let result = result.unwrap();
            if rank == 0 {
                assert_eq!(result, Some(GlobalResult { value: 10.0 }));
            } else {
                assert_eq!(result, None, "rank {rank} must not see the result");
            }
        }
    }

    #[tokio::test]
    async fn test_non_zero_coordinator() {
        let world = Communicator::world(3, 2).unwrap();
        let results = reduce_all(world, vec![0.5, 0.25, 0.125], 2).await;

        assert_eq!(results[2].1.as_ref().unwrap(), &Some(GlobalResult { value: 0.875 }));
        assert!(results[0].1.as_ref().unwrap().is_none());
        assert!(results[1].1.as_ref().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_identity_only_contributions() {
        let world = Communicator::world(5, 0).unwrap();
        let results = reduce_all(world, vec![0.0; 5], 0).await;

        let global = results[0].1.as_ref().unwrap().unwrap();
        assert_eq!(global.value.to_bits(), 0.0f64.to_bits());
    }

    #[tokio::test]
    async fn test_combination_ignores_arrival_order() {
        let values = vec![1e16, 1.0, -1e16, 1.0, 3.0];
        let expected = ReduceOp::Sum.fold_tree(&values);

        for _ in 0..20 {
            let world = Communicator::world(values.len(), 0).unwrap();
            let results = reduce_all(world, values.clone(), 0).await;
            let global = results[0].1.as_ref().unwrap().unwrap();
            assert_eq!(global.value.to_bits(), expected.to_bits());
        }
    }

    #[tokio::test]
    async fn test_lost_worker_fails_every_rank() {
        let mut world = Communicator::world(3, 0).unwrap();
        let dead = world.pop().unwrap();
        drop(dead);

        let results = reduce_all(world, vec![1.0, 2.0], 0).await;

        let coordinator_err = results[0].1.as_ref().unwrap_err();
        assert_eq!(coordinator_err.code(), ErrorCode::REDUCTION_PEER_LOST);
        assert!(coordinator_err.to_string().contains("[2]"));

        let peer_err = results[1].1.as_ref().unwrap_err();
        assert_eq!(peer_err.code(), ErrorCode::REDUCTION_COORDINATOR_LOST);
    }

    #[tokio::test]
    async fn test_lost_coordinator_fails_contributors() {
        let mut world = Communicator::world(3, 0).unwrap();
        let coordinator = world.remove(0);
        drop(coordinator);

        let mut set = JoinSet::new();
        for comm in world {
            set.spawn(async move { comm.reduce(PartialResult { value: 1.0 }, 0).await });
        }
        while let Some(joined) = set.join_next().await {
            let err = joined.unwrap().unwrap_err();
            assert_eq!(err.code(), ErrorCode::REDUCTION_COORDINATOR_LOST);
            assert!(err.is_secondary());
        }
    }

    #[tokio::test]
    async fn test_disagreeing_coordinators_fail_instead_of_hanging() {
        let world = Communicator::world(3, 0).unwrap();
        let mut set = JoinSet::new();
        for comm in world {
            let coordinator = if comm.rank() == 2 { 1 } else { 0 };
            set.spawn(async move { comm.reduce(PartialResult { value: 1.0 }, coordinator).await });
        }

        let mut failures = 0;
        while let Some(joined) = set.join_next().await {
            if joined.unwrap().is_err() {
                failures += 1;
            }
        }
        assert_eq!(failures, 3);
    }

    #[tokio::test]
    async fn test_coordinator_outside_world() {
        let mut world = Communicator::world(2, 0).unwrap();
        let comm = world.pop().unwrap();

        let err = comm.reduce(PartialResult { value: 1.0 }, 2).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::REDUCTION_COORDINATOR_OUT_OF_RANGE);
    }

    #[test]
    fn test_world_rejects_coordinator_outside() {
        let err = Communicator::world(3, 3).unwrap_err();
        assert_eq!(err.code(), ErrorCode::VALIDATION_RANK_OUT_OF_RANGE);
    }

    #[test]
    fn test_large_world_routes_grow_linearly() {
        let workers = 100_000;
        let world = Communicator::world(workers, 7).unwrap();

        assert_eq!(world.len(), workers);
        assert_eq!(world[7].outbox.len(), workers - 1);
        assert!(world
            .iter()
            .filter(|comm| comm.rank() != 7)
            .all(|comm| comm.outbox.len() == 1 && comm.coordinator() == 7));
    }

    #[tokio::test]
    async fn test_large_world_reduces() {
        let workers = 10_000;
        let world = Communicator::world(workers, 0).unwrap();
        let results = reduce_all(world, vec![1.0; workers], 0).await;

        assert_eq!(
            results[0].1.as_ref().unwrap(),
            &Some(GlobalResult {
                value: workers as f64
            })
        );
        assert!(results[1..].iter().all(|(_, r)| r.as_ref().unwrap().is_none()));
    }

    #[tokio::test]
    async fn test_wrong_coordinator_argument_is_protocol_violation() {
        let mut world = Communicator::world(2, 0).unwrap();
        let comm = world.pop().unwrap();

        let err = comm.reduce(PartialResult { value: 1.0 }, 1).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::REDUCTION_PROTOCOL_VIOLATION);
    }

    #[tokio::test]
    async fn test_max_reduction() {
        let world = Communicator::world(3, 1).unwrap();
        let mut set = JoinSet::new();
        for (comm, value) in world.into_iter().zip([2.0, 7.0, -1.0]) {
            set.spawn(async move {
                comm.reduce_with(PartialResult { value }, 1, ReduceOp::Max).await
            });
        }

        let mut globals = Vec::new();
        while let Some(joined) = set.join_next().await {
            if let Some(global) = joined.unwrap().unwrap() {
                globals.push(global);
            }
        }
        assert_eq!(globals, vec![GlobalResult { value: 7.0 }]);
    }
}
