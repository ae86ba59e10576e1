//! Synchronisation error type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorised synchronisation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncError {
    pub kind: SyncErrorKind,
    pub message: String,
    /// Remote or local path the failure is attributed to, if any.
    pub path: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SyncErrorKind {
    /// Host/port unreachable or the protocol handshake failed.
    ConnectionFailed,
    /// Credentials were rejected.
    AuthenticationFailed,
    /// A remote directory could not be listed.
    ListingFailed,
    /// A remote directory could not be created, even after creating its parents.
    DirectoryCreateFailed,
    /// Transfer-level error while fetching a specific file.
    DownloadFailed,
    /// Transfer-level error while sending a specific file.
    UploadFailed,
    /// The local destination prefix does not exist.
    DirectoryMissing,
    /// Config / parameter validation error.
    InvalidConfig,
    /// Local I/O outside of a transfer (known-store persistence, config files).
    Io,
}

pub type SyncResult<T> = Result<T, SyncError>;

// ── Construction helpers ─────────────────────────────────────────────

impl SyncError {
    pub fn new(kind: SyncErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::new(SyncErrorKind::ConnectionFailed, msg)
    }

    pub fn auth_failed(msg: impl Into<String>) -> Self {
        Self::new(SyncErrorKind::AuthenticationFailed, msg)
    }

    pub fn listing_failed(dir: &str, msg: impl Into<String>) -> Self {
        Self::new(SyncErrorKind::ListingFailed, msg).with_path(dir)
    }

    pub fn directory_create_failed(path: &str, msg: impl Into<String>) -> Self {
        Self::new(SyncErrorKind::DirectoryCreateFailed, msg).with_path(path)
    }

    pub fn download_failed(remote: &str, msg: impl Into<String>) -> Self {
        Self::new(SyncErrorKind::DownloadFailed, msg).with_path(remote)
    }

    pub fn upload_failed(remote: &str, msg: impl Into<String>) -> Self {
        Self::new(SyncErrorKind::UploadFailed, msg).with_path(remote)
    }

    pub fn directory_missing(local: &str) -> Self {
        Self::new(
            SyncErrorKind::DirectoryMissing,
            format!("local directory '{}' does not exist", local),
        )
        .with_path(local)
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(SyncErrorKind::InvalidConfig, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(SyncErrorKind::Io, msg)
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "[{:?}] {}: {}", self.kind, path, self.message),
            None => write!(f, "[{:?}] {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for SyncError {}

impl From<std::io::Error> for SyncError {
    fn from(e: std::io::Error) -> Self {
        Self::io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_path() {
        let e = SyncError::download_failed("/in/b.csv", "550 gone");
        assert_eq!(e.to_string(), "[DownloadFailed] /in/b.csv: 550 gone");
    }

    #[test]
    fn test_display_without_path() {
        let e = SyncError::auth_failed("530 Login incorrect");
        assert_eq!(e.to_string(), "[AuthenticationFailed] 530 Login incorrect");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "nope");
        let e: SyncError = io.into();
        assert_eq!(e.kind, SyncErrorKind::Io);
    }

    #[test]
    fn test_serialises_kind() {
        let e = SyncError::directory_missing("/data/in");
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("DirectoryMissing"));
        assert!(json.contains("/data/in"));
    }
}
