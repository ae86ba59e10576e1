//! `TransferSession` over ssh2's SFTP subsystem.
//!
//! ssh2 is blocking, so every call runs on tokio's blocking pool and the
//! calling task only awaits it. SFTP has no ASCII mode; the transfer type
//! is ignored and bytes move verbatim.

use crate::sftp::service::SftpHandle;
use crate::sftp::types::SftpConnectionConfig;
use async_trait::async_trait;
use remsync_core::sync::{
    ConnectionSpec, ProgressHook, SessionConnector, SyncError, SyncResult, TransferSession,
    TransferType,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub struct SftpSession {
    handle: Arc<Mutex<SftpHandle>>,
}

impl SftpSession {
    pub async fn open(config: SftpConnectionConfig) -> SyncResult<Self> {
        let handle = tokio::task::spawn_blocking(move || SftpHandle::connect(&config))
            .await
            .map_err(worker_failed)??;
        Ok(Self {
            handle: Arc::new(Mutex::new(handle)),
        })
    }

    /// Run `op` against the handle on the blocking pool.
    async fn run<T, F>(&self, op: F) -> SyncResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&SftpHandle) -> SyncResult<T> + Send + 'static,
    {
        let handle = Arc::clone(&self.handle);
        tokio::task::spawn_blocking(move || {
            let guard = handle.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            op(&guard)
        })
        .await
        .map_err(worker_failed)?
    }
}

fn worker_failed(e: tokio::task::JoinError) -> SyncError {
    SyncError::connection_failed(format!("SFTP worker failed: {}", e))
}

#[async_trait]
impl TransferSession for SftpSession {
    async fn list(&mut self, dir: &str) -> SyncResult<Vec<String>> {
        let dir = dir.to_string();
        self.run(move |h| h.list(&dir)).await
    }

    async fn make_directory(&mut self, path: &str) -> SyncResult<()> {
        let path = path.to_string();
        self.run(move |h| h.mkdir(&path)).await
    }

    async fn download_file(
        &mut self,
        remote: &str,
        local: &Path,
        _transfer_type: TransferType,
    ) -> SyncResult<u64> {
        let remote = remote.to_string();
        let local = local.to_path_buf();
        self.run(move |h| h.download(&remote, &local)).await
    }

    async fn upload_file(
        &mut self,
        local: &Path,
        remote: &str,
        _transfer_type: TransferType,
        progress: Option<ProgressHook<'_>>,
    ) -> SyncResult<u64> {
        let local: PathBuf = local.to_path_buf();
        let remote = remote.to_string();
        let (tx, mut rx) = mpsc::unbounded_channel::<(u64, Option<u64>)>();
        let upload = self.run(move |h| {
            let report = move |sent: u64, total: Option<u64>| {
                let _ = tx.send((sent, total));
            };
            h.upload(&local, &remote, Some(&report))
        });
        tokio::pin!(upload);

        // Relay progress from the worker until the upload settles.
        loop {
            tokio::select! {
                result = &mut upload => {
                    while let Ok((sent, total)) = rx.try_recv() {
                        if let Some(hook) = progress {
                            hook(sent, total);
                        }
                    }
                    return result;
                }
                Some((sent, total)) = rx.recv() => {
                    if let Some(hook) = progress {
                        hook(sent, total);
                    }
                }
            }
        }
    }

    async fn quit(&mut self) -> SyncResult<()> {
        self.run(|h| h.disconnect()).await
    }
}

/// Opens [`SftpSession`]s from connection parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct SftpConnector;

#[async_trait]
impl SessionConnector for SftpConnector {
    async fn open(&self, spec: &ConnectionSpec) -> SyncResult<Box<dyn TransferSession>> {
        let config = SftpConnectionConfig::from_spec(spec)?;
        Ok(Box::new(SftpSession::open(config).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remsync_core::sync::{ProtocolKind, SyncErrorKind};
    use std::net::TcpListener;

    #[tokio::test]
    async fn test_wrong_protocol_rejected_before_connecting() {
        let spec = ConnectionSpec::new(ProtocolKind::Ftp, "127.0.0.1:1", "u", "p");
        let err = match SftpConnector.open(&spec).await {
            Ok(_) => panic!("FTP spec must not open an SFTP session"),
            Err(e) => e,
        };
        assert_eq!(err.kind, SyncErrorKind::InvalidConfig);
    }

    #[tokio::test]
    async fn test_refused_connection_is_connection_failure() {
        // Bind then drop to get a port nothing listens on.
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let spec = ConnectionSpec::new(ProtocolKind::Sftp, format!("127.0.0.1:{}", port), "u", "p");
        let err = match SftpConnector.open(&spec).await {
            Ok(_) => panic!("nothing listens on port {}", port),
            Err(e) => e,
        };
        assert_eq!(err.kind, SyncErrorKind::ConnectionFailed);
    }

    #[tokio::test]
    async fn test_non_ssh_peer_fails_handshake() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                use std::io::Write;
                let _ = stream.write_all(b"220 definitely not ssh\r\n");
            }
        });
        let spec = ConnectionSpec::new(ProtocolKind::Sftp, format!("127.0.0.1:{}", port), "u", "p");
        let err = match SftpConnector.open(&spec).await {
            Ok(_) => panic!("handshake against a non-SSH peer must fail"),
            Err(e) => e,
        };
        assert_eq!(err.kind, SyncErrorKind::ConnectionFailed);
    }

    #[tokio::test]
    async fn test_stalled_handshake_does_not_block_the_runtime() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        // Accept, then say nothing until released.
        std::thread::spawn(move || {
            if let Ok((stream, _)) = listener.accept() {
                let _ = release_rx.recv();
                drop(stream);
            }
        });

        let spec = ConnectionSpec::new(ProtocolKind::Sftp, format!("127.0.0.1:{}", port), "u", "p");
        let open = SftpConnector.open(&spec);
        tokio::pin!(open);

        // A single-threaded runtime still runs the timer while ssh2 waits.
        let waited = tokio::time::timeout(std::time::Duration::from_millis(200), &mut open).await;
        assert!(waited.is_err(), "open must still be pending on a silent server");

        release_tx.send(()).unwrap();
        let err = match open.await {
            Ok(_) => panic!("handshake against a closed peer must fail"),
            Err(e) => e,
        };
        assert_eq!(err.kind, SyncErrorKind::ConnectionFailed);
    }
}
