//! Backend selection by protocol kind.

use async_trait::async_trait;
use remsync_core::sync::{
    ConnectionSpec, ProtocolKind, SessionConnector, SyncResult, TransferSession,
};
use remsync_ftp::ftp::FtpConnector;
use remsync_sftp::sftp::SftpConnector;

/// Opens an FTP or SFTP session depending on `ConnectionSpec::protocol`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendConnector {
    ftp: FtpConnector,
    sftp: SftpConnector,
}

impl BackendConnector {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionConnector for BackendConnector {
    async fn open(&self, spec: &ConnectionSpec) -> SyncResult<Box<dyn TransferSession>> {
        log::debug!("opening {} session to {}", spec.protocol, spec.address);
        match spec.protocol {
            ProtocolKind::Ftp => self.ftp.open(spec).await,
            ProtocolKind::Sftp => self.sftp.open(spec).await,
        }
    }
}
