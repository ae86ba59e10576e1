//! `TransferSession` over an FTP client.

use crate::ftp::client::FtpClient;
use crate::ftp::types::FtpConnectionConfig;
use async_trait::async_trait;
use remsync_core::sync::{
    ConnectionSpec, ProgressHook, SessionConnector, SyncError, SyncResult, TransferSession,
    TransferType,
};
use std::path::Path;

/// An open, logged-in FTP session.
pub struct FtpSession {
    client: FtpClient,
}

impl FtpSession {
    pub async fn open(config: FtpConnectionConfig) -> SyncResult<Self> {
        let client = FtpClient::connect(config)
            .await
            .map_err(|e| e.into_sync(|m| SyncError::connection_failed(m)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl TransferSession for FtpSession {
    async fn list(&mut self, dir: &str) -> SyncResult<Vec<String>> {
        let target = if dir.is_empty() { None } else { Some(dir) };
        self.client
            .nlst(target)
            .await
            .map_err(|e| e.into_sync(|m| SyncError::listing_failed(dir, m)))
    }

    async fn make_directory(&mut self, path: &str) -> SyncResult<()> {
        self.client
            .mkdir(path)
            .await
            .map(|_| ())
            .map_err(|e| e.into_sync(|m| SyncError::directory_create_failed(path, m)))
    }

    async fn download_file(
        &mut self,
        remote: &str,
        local: &Path,
        transfer_type: TransferType,
    ) -> SyncResult<u64> {
        self.client
            .download(remote, local, transfer_type)
            .await
            .map_err(|e| e.into_sync(|m| SyncError::download_failed(remote, m)))
    }

    async fn upload_file(
        &mut self,
        local: &Path,
        remote: &str,
        transfer_type: TransferType,
        progress: Option<ProgressHook<'_>>,
    ) -> SyncResult<u64> {
        self.client
            .upload(local, remote, transfer_type, progress)
            .await
            .map_err(|e| e.into_sync(|m| SyncError::upload_failed(remote, m)))
    }

    async fn quit(&mut self) -> SyncResult<()> {
        self.client
            .quit()
            .await
            .map_err(|e| SyncError::connection_failed(e.to_string()))
    }
}

/// Opens [`FtpSession`]s from connection parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct FtpConnector;

#[async_trait]
impl SessionConnector for FtpConnector {
    async fn open(&self, spec: &ConnectionSpec) -> SyncResult<Box<dyn TransferSession>> {
        let config = FtpConnectionConfig::from_spec(spec)
            .map_err(|e| SyncError::invalid_config(e.message))?;
        let session = FtpSession::open(config).await?;
        Ok(Box::new(session))
    }
}
