//! Background worker that runs triage pipelines for accepted webhooks.
//!
//! The webhook handler does nothing but verify, parse, and enqueue; this
//! worker owns everything slow: token exchange, the upstream checkout, and
//! the GitHub API calls. Jobs are processed serially, which keeps the bot's
//! API usage tame and means a burst of deliveries queues rather than
//! stampeding.
//!
//! GitHub redelivers webhooks with the original delivery ID, so the worker
//! keeps a bounded memory of recent IDs and drops duplicates. The bound
//! makes memory flat; a duplicate arriving after eviction would be
//! re-triaged, which is harmless (labels and review requests are
//! idempotent on GitHub's side).

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::auth::{CredentialBroker, CredentialError};
use crate::config::Config;
use crate::github::OctocrabClient;
use crate::triage::run_pipelines;
use crate::types::DeliveryId;
use crate::webhooks::{pipelines_for, PullRequestEvent, TriagePipeline};
use crate::workspace::PackageWorkspace;

/// Capacity of the job queue between the webhook handler and the worker.
pub const JOB_QUEUE_DEPTH: usize = 256;

/// How many recent delivery IDs are remembered for deduplication.
const SEEN_DELIVERY_CAPACITY: usize = 1024;

/// One accepted webhook, ready for triage.
#[derive(Debug, Clone)]
pub struct TriageJob {
    /// GitHub's delivery ID, used for deduplication and log correlation.
    pub delivery: DeliveryId,

    /// The parsed pull request event.
    pub event: PullRequestEvent,
}

/// Creates the bounded job channel shared by server and worker.
pub fn job_channel() -> (mpsc::Sender<TriageJob>, mpsc::Receiver<TriageJob>) {
    mpsc::channel(JOB_QUEUE_DEPTH)
}

/// Errors that abort a whole job (pipeline failures do not; they are logged
/// and the remaining pipelines still run).
#[derive(Debug, Error)]
pub enum JobError {
    /// Could not obtain an installation token.
    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),

    /// Could not construct an authenticated client.
    #[error("client construction failed: {0}")]
    Client(#[from] octocrab::Error),
}

/// FIFO set of recently seen delivery IDs, bounded by eviction.
struct SeenDeliveries {
    order: VecDeque<DeliveryId>,
    set: HashSet<DeliveryId>,
    capacity: usize,
}

impl SeenDeliveries {
    fn new(capacity: usize) -> Self {
        SeenDeliveries {
            order: VecDeque::with_capacity(capacity),
            set: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    /// Records `id`; returns false if it was already present.
    fn insert(&mut self, id: DeliveryId) -> bool {
        if self.set.contains(&id) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.set.remove(&evicted);
            }
        }
        self.order.push_back(id.clone());
        self.set.insert(id);
        true
    }
}

/// The triage worker. One per process.
pub struct TriageWorker {
    config: Arc<Config>,
    broker: CredentialBroker,
}

impl TriageWorker {
    pub fn new(config: Arc<Config>) -> Self {
        let broker = CredentialBroker::new(config.app_id, config.private_key_pem.clone())
            .with_exchange_timeout(config.api_timeout);
        TriageWorker { config, broker }
    }

    /// Consumes jobs until shutdown or until all senders are dropped.
    pub async fn run(self, mut rx: mpsc::Receiver<TriageJob>, shutdown: CancellationToken) {
        info!("triage worker started");
        let mut seen = SeenDeliveries::new(SEEN_DELIVERY_CAPACITY);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("shutdown signal received, stopping worker");
                    break;
                }

                job = rx.recv() => {
                    match job {
                        Some(job) => {
                            if !seen.insert(job.delivery.clone()) {
                                info!(delivery = %job.delivery, "duplicate delivery, skipping");
                                continue;
                            }
                            if let Err(e) = self.process(&job).await {
                                error!(
                                    delivery = %job.delivery,
                                    pr = %job.event.number,
                                    error = %e,
                                    "triage job failed"
                                );
                            }
                        }
                        None => {
                            info!("job channel closed");
                            break;
                        }
                    }
                }
            }
        }

        info!("triage worker stopped");
    }

    /// Runs every pipeline the event routes to, isolating their failures.
    #[instrument(skip(self, job), fields(delivery = %job.delivery, repo = %job.event.repo, pr = %job.event.number, head = %job.event.head_ref))]
    async fn process(&self, job: &TriageJob) -> Result<(), JobError> {
        let pipelines = pipelines_for(&job.event);
        if pipelines.is_empty() {
            info!(action = ?job.event.action, "no pipelines for action");
            return Ok(());
        }

        let token = self.broker.installation_token(job.event.installation).await?;
        let api = OctocrabClient::from_token(
            token.token,
            job.event.repo.clone(),
            self.config.api_timeout,
        )?;

        // The checkout is only worth paying for when reviewers will run; a
        // failed checkout degrades to labels-only rather than failing the job.
        let workspace = if pipelines.contains(&TriagePipeline::Reviewers) {
            match PackageWorkspace::checkout(
                &self.config.upstream_url,
                self.config.checkout_timeout,
            )
            .await
            {
                Ok(workspace) => Some(workspace),
                Err(e) => {
                    warn!(error = %e, "upstream checkout failed, skipping reviewer assignment");
                    None
                }
            }
        } else {
            None
        };

        let result = run_pipelines(
            &api,
            workspace.as_ref(),
            job.event.number,
            &job.event.author,
            &pipelines,
        )
        .await;

        info!(
            labels = result.labels.len(),
            maintained = result.resolution.maintained.len(),
            unmaintained = result.resolution.unmaintained.len(),
            direct = result.assignment.direct.len(),
            invited = result.assignment.invited.len(),
            "triage finished"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seen_deliveries_detects_duplicates() {
        let mut seen = SeenDeliveries::new(4);
        assert!(seen.insert(DeliveryId::new("a")));
        assert!(seen.insert(DeliveryId::new("b")));
        assert!(!seen.insert(DeliveryId::new("a")));
    }

    #[test]
    fn seen_deliveries_evicts_oldest_at_capacity() {
        let mut seen = SeenDeliveries::new(2);
        assert!(seen.insert(DeliveryId::new("a")));
        assert!(seen.insert(DeliveryId::new("b")));
        assert!(seen.insert(DeliveryId::new("c")));

        // "a" was evicted, so it reads as new again
        assert!(seen.insert(DeliveryId::new("a")));
        // "c" is still remembered
        assert!(!seen.insert(DeliveryId::new("c")));
    }

    #[test]
    fn seen_deliveries_set_and_order_stay_in_sync() {
        let mut seen = SeenDeliveries::new(3);
        for i in 0..10 {
            seen.insert(DeliveryId::new(format!("d-{i}")));
        }
        assert_eq!(seen.order.len(), 3);
        assert_eq!(seen.set.len(), 3);
    }
}
