use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, oneshot};

use super::{Cascade, Tier};
use crate::models::{Event, WhiteboardId};

// ============================================================================
// Persistence Queue - background writers, one per configured tier
// ============================================================================
//
// Contract: jobs are fire-and-forget for the caller. A worker applies its
// jobs in submission order; failures are logged and counted by the cascade,
// never surfaced and never retried.
//
// Saves are coalesced: each tier keeps at most one pending snapshot per id
// and the worker writes whatever is latest when it gets to the job. A slow
// store therefore costs one write per board per round, not one per mutation.
//
// ============================================================================

#[derive(Debug)]
enum PersistJob {
    /// Write the latest pending snapshot for `id`, if there still is one
    Save { id: WhiteboardId },
    Delete { id: WhiteboardId },
    /// Acknowledged once every job queued before it has been processed
    Barrier(oneshot::Sender<()>),
}

type Snapshots = Arc<Mutex<HashMap<WhiteboardId, Vec<Event>>>>;

#[derive(Clone)]
struct Lane {
    jobs: mpsc::UnboundedSender<PersistJob>,
    snapshots: Snapshots,
}

impl Lane {
    fn snapshots(&self) -> MutexGuard<'_, HashMap<WhiteboardId, Vec<Event>>> {
        lock(&self.snapshots)
    }
}

#[derive(Clone)]
pub struct PersistenceQueue {
    durable: Option<Lane>,
    file: Option<Lane>,
}

impl PersistenceQueue {
    /// Spawn a worker for each tier the cascade has. Needs a Tokio runtime.
    pub fn spawn(cascade: Arc<Cascade>) -> Self {
        let durable = cascade
            .has_tier(Tier::Durable)
            .then(|| spawn_worker(cascade.clone(), Tier::Durable));
        let file = cascade
            .has_tier(Tier::File)
            .then(|| spawn_worker(cascade.clone(), Tier::File));

        Self { durable, file }
    }

    /// Queue `events` as the snapshot to write for `id`, replacing any
    /// snapshot still waiting for that id.
    pub fn save(&self, tier: Tier, id: &WhiteboardId, events: Vec<Event>) {
        let Some(lane) = self.lane(tier) else {
            return;
        };

        let mut snapshots = lane.snapshots();
        if snapshots.insert(id.clone(), events).is_some() {
            tracing::trace!(whiteboard = %id, tier = tier.as_str(), "Coalesced pending save");
            return;
        }
        // Sent under the lock so the worker never sees a job without its snapshot
        submit(lane, tier, PersistJob::Save { id: id.clone() });
    }

    /// Delete `id` from every tier.
    pub fn delete(&self, id: &WhiteboardId) {
        for tier in [Tier::Durable, Tier::File] {
            let Some(lane) = self.lane(tier) else {
                continue;
            };

            // A save still waiting would be overwritten by the delete anyway
            let mut snapshots = lane.snapshots();
            snapshots.remove(id);
            submit(lane, tier, PersistJob::Delete { id: id.clone() });
        }
    }

    /// Wait until every job submitted so far has been processed.
    pub async fn settle(&self) {
        let mut pending = Vec::new();
        for lane in [&self.durable, &self.file].into_iter().flatten() {
            let (tx, rx) = oneshot::channel();
            if lane.jobs.send(PersistJob::Barrier(tx)).is_ok() {
                pending.push(rx);
            }
        }

        for rx in pending {
            // A dropped barrier means the worker is gone; nothing left to wait for
            let _ = rx.await;
        }
    }

    fn lane(&self, tier: Tier) -> Option<&Lane> {
        match tier {
            Tier::Durable => self.durable.as_ref(),
            Tier::File => self.file.as_ref(),
        }
    }
}

fn submit(lane: &Lane, tier: Tier, job: PersistJob) {
    if lane.jobs.send(job).is_err() {
        tracing::error!(tier = tier.as_str(), "Persistence worker stopped, job dropped");
    }
}

fn lock(snapshots: &Snapshots) -> MutexGuard<'_, HashMap<WhiteboardId, Vec<Event>>> {
    snapshots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn spawn_worker(cascade: Arc<Cascade>, tier: Tier) -> Lane {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let snapshots: Snapshots = Arc::default();
    let pending = snapshots.clone();

    tokio::spawn(async move {
        tracing::debug!(tier = tier.as_str(), "Persistence worker started");

        while let Some(job) = rx.recv().await {
            match job {
                PersistJob::Save { id } => {
                    let snapshot = lock(&pending).remove(&id);
                    if let Some(events) = snapshot {
                        cascade.save(tier, &id, &events).await;
                    }
                }
                PersistJob::Delete { id } => cascade.delete(tier, &id).await,
                PersistJob::Barrier(ack) => {
                    let _ = ack.send(());
                }
            }
        }

        tracing::debug!(tier = tier.as_str(), "Persistence worker stopped");
    });

    Lane { jobs: tx, snapshots }
}
