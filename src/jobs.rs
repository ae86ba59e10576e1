//! Concurrent execution of configured synchronisation jobs.
//!
//! Each job owns its own session; one job's failure never affects another.
//! Successful results are merged into the known store once every job has
//! finished.

use crate::backend::BackendConnector;
use crate::config::{SyncConfig, SyncJob};
use crate::known_store::KnownFileStore;
use futures::future::join_all;
use remsync_core::sync::{
    DownloadResult, KnownFileSet, LogObserver, SessionConnector, SyncObserver, SyncOrchestrator,
    SyncRequest, SyncResult,
};

/// Result of one job.
#[derive(Debug)]
pub struct JobOutcome {
    pub name: String,
    pub result: SyncResult<DownloadResult>,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Run every job in `config` against the real backends.
pub async fn run_jobs(config: &SyncConfig, store: &mut KnownFileStore) -> Vec<JobOutcome> {
    run_jobs_with(&BackendConnector::new(), &LogObserver, &config.jobs, store).await
}

pub async fn run_jobs_with(
    connector: &dyn SessionConnector,
    observer: &dyn SyncObserver,
    jobs: &[SyncJob],
    store: &mut KnownFileStore,
) -> Vec<JobOutcome> {
    let outcomes = {
        let known = store.ids();
        join_all(
            jobs.iter()
                .map(|job| run_job(connector, observer, job, known)),
        )
        .await
    };

    for outcome in &outcomes {
        match &outcome.result {
            Ok(result) => {
                let added = store.merge(result);
                tracing::info!(job = %outcome.name, fetched = result.len(), added, "job finished");
            }
            Err(e) => tracing::warn!(job = %outcome.name, error = %e, "job failed"),
        }
    }
    outcomes
}

async fn run_job(
    connector: &dyn SessionConnector,
    observer: &dyn SyncObserver,
    job: &SyncJob,
    known: &KnownFileSet,
) -> JobOutcome {
    JobOutcome {
        name: job.name.clone(),
        result: synchronize_job(connector, observer, job, known).await,
    }
}

async fn synchronize_job(
    connector: &dyn SessionConnector,
    observer: &dyn SyncObserver,
    job: &SyncJob,
    known: &KnownFileSet,
) -> SyncResult<DownloadResult> {
    let spec = job.connection_spec()?;
    let request = SyncRequest {
        pattern: &job.pattern,
        local_prefix: &job.local_prefix,
        known,
        naming: job.naming,
    };
    SyncOrchestrator::new(connector, observer)
        .synchronize(&spec, &request)
        .await
}
