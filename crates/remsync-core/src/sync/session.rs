//! The transfer capability boundary.
//!
//! Everything the core needs from a protocol goes through these two traits;
//! connection establishment, authentication and bytes on the wire live in
//! the backend crates.

use crate::sync::error::SyncResult;
use crate::sync::types::{ConnectionSpec, TransferType};
use async_trait::async_trait;
use std::path::Path;

/// Called with `(bytes_sent, total_bytes)` while an upload streams.
pub type ProgressHook<'a> = &'a (dyn Fn(u64, Option<u64>) + Send + Sync);

/// An open, authenticated connection. Single owner; used sequentially.
#[async_trait]
pub trait TransferSession: Send {
    /// Names in `dir` as the server reports them (bare names or full paths).
    /// An empty `dir` lists the current directory.
    async fn list(&mut self, dir: &str) -> SyncResult<Vec<String>>;

    /// Create one directory. Parents are not created.
    async fn make_directory(&mut self, path: &str) -> SyncResult<()>;

    /// Fetch `remote` into `local`, returning the bytes written.
    async fn download_file(
        &mut self,
        remote: &str,
        local: &Path,
        transfer_type: TransferType,
    ) -> SyncResult<u64>;

    /// Send `local` to `remote`, returning the bytes sent.
    async fn upload_file(
        &mut self,
        local: &Path,
        remote: &str,
        transfer_type: TransferType,
        progress: Option<ProgressHook<'_>>,
    ) -> SyncResult<u64>;

    /// Log out and release the connection.
    async fn quit(&mut self) -> SyncResult<()>;
}

/// Opens sessions: connect, authenticate and apply the transfer mode.
#[async_trait]
pub trait SessionConnector: Send + Sync {
    async fn open(&self, spec: &ConnectionSpec) -> SyncResult<Box<dyn TransferSession>>;
}
