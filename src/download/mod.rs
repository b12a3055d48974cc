// ─── Download Orchestrator ───
// Consumes an artifact plan: verifies what is already on disk, fetches the
// rest concurrently with bounded retry, and aggregates per-task outcomes.
// The asset index is the only ordering constraint: its expansion gates the
// individual asset tasks, nothing else waits on anything.

mod task;

use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::assets::AssetIndexDoc;
use crate::context::Context;
use crate::error::{FailedArtifact, LauncherError, LauncherResult};
use crate::plan::{ArtifactKind, ArtifactPlan, ArtifactRef};

use task::TaskOutcome;

/// Tuning knobs for the worker pool and retry policy.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Maximum number of tasks in flight at once.
    pub concurrency: usize,
    pub max_attempts: u32,
    /// First retry delay; doubles per subsequent attempt.
    pub initial_backoff: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
        }
    }
}

/// Progress events for an external renderer. Purely informational; the
/// orchestrator's result is aggregated from task outcomes, not from these.
#[derive(Debug, Clone)]
pub enum DownloadEvent {
    Started { total: usize },
    Verified { name: String },
    Fetched { name: String, bytes: u64 },
    Failed { name: String, reason: String },
    AssetsExpanded { count: usize },
}

/// Aggregate result of a fully successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    /// Artifacts satisfied by the existing install without network access.
    pub verified: usize,
    pub fetched: usize,
    pub bytes_fetched: u64,
}

/// Concurrent, hash-validated downloader over a bounded worker pool.
pub struct Downloader {
    client: reqwest::Client,
    config: DownloadConfig,
    cancel: CancellationToken,
    events: Option<mpsc::UnboundedSender<DownloadEvent>>,
}

impl Downloader {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            config: DownloadConfig::default(),
            cancel: CancellationToken::new(),
            events: None,
        }
    }

    pub fn with_config(mut self, config: DownloadConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_events(mut self, events: mpsc::UnboundedSender<DownloadEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Token a caller can clone and trigger to abort the run cooperatively:
    /// nothing new is scheduled, in-flight tasks settle, and `execute`
    /// returns `Cancelled`.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Materialize the plan under `context`'s install root.
    ///
    /// `Ok` only when every artifact verified; otherwise `DownloadFailed`
    /// naming every failed ref. Whatever fetched successfully stays on disk
    /// either way, so a later run re-verifies it for free.
    ///
    /// The plan is taken mutably so the asset index, once on disk, expands
    /// into individual asset refs (two-phase planning).
    pub async fn execute(
        &self,
        plan: &mut ArtifactPlan,
        context: &Context,
    ) -> LauncherResult<DownloadReport> {
        if self.cancel.is_cancelled() {
            return Err(LauncherError::Cancelled);
        }

        let mut outcomes: Vec<TaskOutcome> = Vec::new();
        let mut index_done = false;

        // Phase one: the asset index alone, so its expansion can join the
        // main pool below.
        if !plan.assets_expanded() {
            if let Some(index_ref) = plan.asset_index_ref().cloned() {
                let outcome = self.run_task(&index_ref, context).await;
                if matches!(
                    outcome,
                    TaskOutcome::Verified { .. } | TaskOutcome::Fetched { .. }
                ) {
                    let index_path = context.root().join(&index_ref.path);
                    let doc = AssetIndexDoc::load(&index_path).await?;
                    let added = plan.expand_assets(&doc);
                    info!("Asset index {} expanded to {} objects", plan.asset_index_id, added);
                    self.emit(DownloadEvent::AssetsExpanded { count: added });
                } else {
                    warn!(
                        "Asset index {} unavailable; skipping asset expansion",
                        plan.asset_index_id
                    );
                }
                outcomes.push(outcome);
                index_done = true;
            }
        }

        // Phase two: everything else across the worker pool, unordered.
        let pending: Vec<ArtifactRef> = plan
            .artifacts
            .iter()
            .filter(|a| !(index_done && a.kind == ArtifactKind::AssetIndex))
            .cloned()
            .collect();

        self.emit(DownloadEvent::Started {
            total: pending.len() + outcomes.len(),
        });
        info!(
            "Materializing {} artifacts (concurrency {})",
            pending.len() + outcomes.len(),
            self.config.concurrency
        );

        let pool = stream::iter(pending.into_iter().map(|artifact| async move {
            if self.cancel.is_cancelled() {
                return TaskOutcome::skipped(&artifact);
            }
            self.run_task(&artifact, context).await
        }))
        .buffer_unordered(self.config.concurrency)
        .collect::<Vec<_>>()
        .await;
        outcomes.extend(pool);

        if self.cancel.is_cancelled() {
            return Err(LauncherError::Cancelled);
        }

        let mut report = DownloadReport::default();
        let mut failures: Vec<FailedArtifact> = Vec::new();
        for outcome in outcomes {
            match outcome {
                TaskOutcome::Verified { .. } => report.verified += 1,
                TaskOutcome::Fetched { bytes, .. } => {
                    report.fetched += 1;
                    report.bytes_fetched += bytes;
                }
                TaskOutcome::Failed(failure) => failures.push(failure),
                TaskOutcome::Skipped { .. } => {}
            }
        }

        if !failures.is_empty() {
            return Err(LauncherError::DownloadFailed { failures });
        }

        info!(
            "Install root complete: {} cached, {} fetched ({} bytes)",
            report.verified, report.fetched, report.bytes_fetched
        );
        Ok(report)
    }

    async fn run_task(&self, artifact: &ArtifactRef, context: &Context) -> TaskOutcome {
        let outcome = task::run(
            &self.client,
            &self.config,
            &self.cancel,
            artifact,
            context.root(),
        )
        .await;

        match &outcome {
            TaskOutcome::Verified { name } => self.emit(DownloadEvent::Verified {
                name: name.clone(),
            }),
            TaskOutcome::Fetched { name, bytes, .. } => self.emit(DownloadEvent::Fetched {
                name: name.clone(),
                bytes: *bytes,
            }),
            TaskOutcome::Failed(failure) => self.emit(DownloadEvent::Failed {
                name: failure.name.clone(),
                reason: failure.reason.clone(),
            }),
            TaskOutcome::Skipped { .. } => {}
        }
        outcome
    }

    fn emit(&self, event: DownloadEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}
