//! Upload batches with per-file failure isolation.

use crate::sync::error::{SyncError, SyncErrorKind};
use crate::sync::observer::{SyncEvent, SyncObserver};
use crate::sync::remote_dir;
use crate::sync::remote_path;
use crate::sync::session::TransferSession;
use crate::sync::types::{TransferType, UploadReport};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Options for an upload batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct UploadOptions {
    pub transfer_type: TransferType,
    /// Create each target's remote parent directory first.
    pub ensure_dirs: bool,
}

/// Upload every `remote → local` pair. A failing file is recorded in the
/// report and the batch moves on; nothing here aborts the batch.
pub async fn upload_batch(
    session: &mut dyn TransferSession,
    files: &BTreeMap<String, String>,
    options: UploadOptions,
    observer: &dyn SyncObserver,
) -> UploadReport {
    let mut report = UploadReport::new();
    let mut ensured: HashSet<String> = HashSet::new();

    for (remote, local) in files {
        if options.ensure_dirs {
            if let Some(parent) = remote_path::parent(remote) {
                if !ensured.contains(&parent) {
                    if let Err(e) = remote_dir::ensure(session, &parent).await {
                        observer.on_event(&SyncEvent::UploadFailed { remote, error: &e });
                        report.insert(remote.clone(), Err(e));
                        continue;
                    }
                    ensured.insert(parent);
                }
            }
        }

        let outcome = session
            .upload_file(Path::new(local), remote, options.transfer_type, None)
            .await
            .map_err(|e| match e.kind {
                SyncErrorKind::UploadFailed => e,
                _ => SyncError::upload_failed(remote, e.message),
            });

        match outcome {
            Ok(bytes) => {
                observer.on_event(&SyncEvent::Uploaded { remote, bytes });
                report.insert(remote.clone(), Ok(()));
            }
            Err(e) => {
                observer.on_event(&SyncEvent::UploadFailed { remote, error: &e });
                report.insert(remote.clone(), Err(e));
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::observer::RecordingObserver;
    use crate::sync::testing::MemorySession;

    fn local_file(dir: &Path, name: &str, body: &str) -> String {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path.to_string_lossy().to_string()
    }

    #[tokio::test]
    async fn test_failures_are_isolated_per_file() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = MemorySession::new();
        session.add_dir("/out");
        session.fail_upload("/out/b.csv");

        let mut files = BTreeMap::new();
        files.insert("/out/a.csv".to_string(), local_file(tmp.path(), "a.csv", "a"));
        files.insert("/out/b.csv".to_string(), local_file(tmp.path(), "b.csv", "b"));
        files.insert("/out/c.csv".to_string(), local_file(tmp.path(), "c.csv", "c"));

        let observer = RecordingObserver::new();
        let report = upload_batch(&mut session, &files, UploadOptions::default(), &observer).await;

        assert_eq!(report.len(), 3);
        assert!(report["/out/a.csv"].is_ok());
        assert_eq!(
            report["/out/b.csv"].as_ref().unwrap_err().kind,
            SyncErrorKind::UploadFailed
        );
        assert!(report["/out/c.csv"].is_ok());
        assert_eq!(session.file("/out/c.csv").unwrap(), b"c");
        assert_eq!(observer.count("Uploaded"), 2);
        assert_eq!(observer.count("UploadFailed"), 1);
    }

    #[tokio::test]
    async fn test_missing_local_file_is_upload_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = MemorySession::new();
        session.add_dir("/out");
        let mut files = BTreeMap::new();
        files.insert(
            "/out/ghost".to_string(),
            tmp.path().join("ghost").to_string_lossy().to_string(),
        );
        let report = upload_batch(
            &mut session,
            &files,
            UploadOptions::default(),
            &crate::sync::observer::NoopObserver,
        )
        .await;
        assert_eq!(
            report["/out/ghost"].as_ref().unwrap_err().kind,
            SyncErrorKind::UploadFailed
        );
    }

    #[tokio::test]
    async fn test_ensure_dirs_creates_parents_once() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = MemorySession::new();

        let mut files = BTreeMap::new();
        files.insert("/out/2024/01/a".to_string(), local_file(tmp.path(), "a", "1"));
        files.insert("/out/2024/01/b".to_string(), local_file(tmp.path(), "b", "2"));

        let options = UploadOptions {
            ensure_dirs: true,
            ..UploadOptions::default()
        };
        let report = upload_batch(
            &mut session,
            &files,
            options,
            &crate::sync::observer::NoopObserver,
        )
        .await;

        assert!(report.values().all(|r| r.is_ok()));
        assert!(session.has_dir("/out/2024/01"));
        let ensures = session
            .calls()
            .iter()
            .filter(|c| c.as_str() == "mkdir /out/2024/01")
            .count();
        // One refused attempt, one after its parents; none for `b`.
        assert_eq!(ensures, 2);
        assert_eq!(session.file("/out/2024/01/b").unwrap(), b"2");
    }

    #[tokio::test]
    async fn test_directory_failure_reported_for_that_file_only() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = MemorySession::new();
        session.add_dir("/ok");
        session.fail_mkdir("/locked");

        let mut files = BTreeMap::new();
        files.insert("/locked/a".to_string(), local_file(tmp.path(), "a", "1"));
        files.insert("/ok/b".to_string(), local_file(tmp.path(), "b", "2"));

        let options = UploadOptions {
            ensure_dirs: true,
            ..UploadOptions::default()
        };
        let report = upload_batch(
            &mut session,
            &files,
            options,
            &crate::sync::observer::NoopObserver,
        )
        .await;

        assert_eq!(
            report["/locked/a"].as_ref().unwrap_err().kind,
            SyncErrorKind::DirectoryCreateFailed
        );
        assert!(report["/ok/b"].is_ok());
    }
}
