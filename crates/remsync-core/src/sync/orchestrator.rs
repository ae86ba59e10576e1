//! Synchronisation orchestrator.
//!
//! One call owns one session: open, list, diff, download, close. The session
//! is closed on every exit path, including a panic raised by the backend,
//! which is re-raised once the session is gone.

use crate::sync::error::{SyncError, SyncErrorKind, SyncResult};
use crate::sync::ident;
use crate::sync::naming::LocalNamer;
use crate::sync::observer::{SyncEvent, SyncObserver};
use crate::sync::pattern;
use crate::sync::session::{SessionConnector, TransferSession};
use crate::sync::types::{
    ConnectionSpec, DownloadResult, KnownFileSet, LocalNaming, TransferType, UploadReport,
};
use crate::sync::upload::{self, UploadOptions};
use futures::FutureExt;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

/// What to fetch and where to put it.
#[derive(Debug, Clone, Copy)]
pub struct SyncRequest<'a> {
    /// `dir/leaf-glob`
    pub pattern: &'a str,
    /// Existing local directory, or empty for a timestamp stem.
    pub local_prefix: &'a str,
    /// Qualified ids already processed.
    pub known: &'a KnownFileSet,
    pub naming: LocalNaming,
}

pub struct SyncOrchestrator<'a> {
    connector: &'a dyn SessionConnector,
    observer: &'a dyn SyncObserver,
}

impl<'a> SyncOrchestrator<'a> {
    pub fn new(connector: &'a dyn SessionConnector, observer: &'a dyn SyncObserver) -> Self {
        Self {
            connector,
            observer,
        }
    }

    /// Download every file matching the pattern that is not already known.
    ///
    /// Returns `[address]remote → local` for the files fetched. Any error
    /// voids the whole batch; files already written locally stay on disk.
    pub async fn synchronize(
        &self,
        spec: &ConnectionSpec,
        request: &SyncRequest<'_>,
    ) -> SyncResult<DownloadResult> {
        let mut session = self.open(spec).await?;
        let outcome = AssertUnwindSafe(reconcile(
            session.as_mut(),
            &spec.address,
            request,
            self.observer,
        ))
        .catch_unwind()
        .await;
        self.close(session, &spec.address, outcome).await
    }

    /// Upload `remote → local` pairs over one session. Per-file failures are
    /// in the report; only opening the session can fail the whole call.
    pub async fn push(
        &self,
        spec: &ConnectionSpec,
        files: &BTreeMap<String, String>,
        options: UploadOptions,
    ) -> SyncResult<UploadReport> {
        let mut session = self.open(spec).await?;
        let outcome = AssertUnwindSafe(async {
            Ok::<_, SyncError>(
                upload::upload_batch(session.as_mut(), files, options, self.observer).await,
            )
        })
        .catch_unwind()
        .await;
        self.close(session, &spec.address, outcome).await
    }

    async fn open(&self, spec: &ConnectionSpec) -> SyncResult<Box<dyn TransferSession>> {
        let session = self.connector.open(spec).await?;
        self.observer.on_event(&SyncEvent::Connected {
            address: &spec.address,
            protocol: spec.protocol,
        });
        Ok(session)
    }

    async fn close<T>(
        &self,
        mut session: Box<dyn TransferSession>,
        address: &str,
        outcome: Result<SyncResult<T>, Box<dyn Any + Send>>,
    ) -> SyncResult<T> {
        match session.quit().await {
            Ok(()) => self.observer.on_event(&SyncEvent::Closed { address }),
            Err(error) => self
                .observer
                .on_event(&SyncEvent::CloseFailed { address, error: &error }),
        }
        drop(session);
        match outcome {
            Ok(result) => result,
            Err(payload) => panic::resume_unwind(payload),
        }
    }
}

/// List, diff and download over an open session.
async fn reconcile(
    session: &mut dyn TransferSession,
    address: &str,
    request: &SyncRequest<'_>,
    observer: &dyn SyncObserver,
) -> SyncResult<DownloadResult> {
    let candidates: Vec<String> = pattern::resolve(session, request.pattern)
        .await?
        .iter()
        .map(|path| ident::qualify(address, path))
        .collect();
    observer.on_event(&SyncEvent::Listed {
        address,
        pattern: request.pattern,
        candidates: candidates.len(),
    });

    let to_fetch = ident::missing(&candidates, request.known);
    observer.on_event(&SyncEvent::Diffed {
        address,
        to_fetch: to_fetch.len(),
        already_known: candidates
            .iter()
            .filter(|id| request.known.contains(id.as_str()))
            .count(),
    });
    if to_fetch.is_empty() {
        return Ok(DownloadResult::new());
    }

    let remotes: Vec<String> = to_fetch
        .iter()
        .map(|id| ident::unqualify(address, id))
        .collect();
    let mut namer = LocalNamer::new(request.local_prefix, request.naming);
    let fetched = download_batch(session, &remotes, &mut namer, observer).await?;

    Ok(fetched
        .into_iter()
        .map(|(remote, local)| (ident::qualify(address, &remote), local))
        .collect())
}

/// Download `remotes` in order, stopping at the first failure. Returns
/// `(remote, local)` pairs; nothing is returned for a failed batch.
pub async fn download_batch(
    session: &mut dyn TransferSession,
    remotes: &[String],
    namer: &mut LocalNamer,
    observer: &dyn SyncObserver,
) -> SyncResult<Vec<(String, String)>> {
    namer.prepare()?;
    let mut fetched = Vec::with_capacity(remotes.len());
    for remote in remotes {
        let local = namer.resolve(remote)?;
        observer.on_event(&SyncEvent::Downloading {
            remote,
            local: &local,
        });
        let bytes = session
            .download_file(remote, Path::new(&local), TransferType::Binary)
            .await
            .map_err(|e| attribute_download(e, remote))?;
        observer.on_event(&SyncEvent::Downloaded {
            remote,
            local: &local,
            bytes,
        });
        fetched.push((remote.clone(), local));
    }
    Ok(fetched)
}

fn attribute_download(err: SyncError, remote: &str) -> SyncError {
    match err.kind {
        SyncErrorKind::DownloadFailed if err.path.is_some() => err,
        _ => SyncError::download_failed(remote, err.message),
    }
}
