//! # remsync
//!
//! Pulls new files from FTP and SFTP servers. A run lists a remote pattern,
//! drops every file already recorded as `[address]path` in the caller's known
//! set, downloads the rest and reports `[address]path → local path`.
//!
//!   • [`fetch_remote_files`]: one synchronisation against one server
//!   • [`push_local_files`]: per-file isolated upload batch
//!   • [`jobs::run_jobs`]: several configured servers at once, merged into a
//!     persisted [`known_store::KnownFileStore`]

pub mod backend;
pub mod config;
pub mod jobs;
pub mod known_store;
pub mod logging;

pub use backend::BackendConnector;
pub use remsync_core::sync::{
    ConnectionSpec, DownloadResult, KnownFileSet, LocalNaming, ProtocolKind, SyncError,
    SyncErrorKind, SyncResult, TransferMode, TransferType, UploadReport,
};

use remsync_core::sync::{LogObserver, SyncOrchestrator, SyncRequest, UploadOptions};
use std::collections::BTreeMap;

/// Download every file matching `pattern` on `address` that is not in
/// `known`.
///
/// The backend is picked by `protocol`; the session is closed before this
/// returns whatever the outcome. Any error voids the batch.
#[allow(clippy::too_many_arguments)]
pub async fn fetch_remote_files(
    protocol: ProtocolKind,
    address: &str,
    user: &str,
    password: &str,
    transfer_mode: TransferMode,
    pattern: &str,
    local_prefix: &str,
    known: &KnownFileSet,
) -> SyncResult<DownloadResult> {
    let spec = ConnectionSpec::new(protocol, address, user, password)
        .with_transfer_mode(transfer_mode);
    let request = SyncRequest {
        pattern,
        local_prefix,
        known,
        naming: LocalNaming::BaseName,
    };
    SyncOrchestrator::new(&BackendConnector::new(), &LogObserver)
        .synchronize(&spec, &request)
        .await
}

/// Upload `remote → local` pairs. Failures are reported per file; only
/// opening the session fails the whole call.
pub async fn push_local_files(
    spec: &ConnectionSpec,
    files: &BTreeMap<String, String>,
    transfer_type: TransferType,
    ensure_dirs: bool,
) -> SyncResult<UploadReport> {
    let options = UploadOptions {
        transfer_type,
        ensure_dirs,
    };
    SyncOrchestrator::new(&BackendConnector::new(), &LogObserver)
        .push(spec, files, options)
        .await
}
