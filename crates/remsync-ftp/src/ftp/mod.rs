//! FTP protocol backend (RFC 959).
//!
//! Architecture:
//! - `types`: connection config and reply type
//! - `error`: FTP-specific error type and its mapping into `SyncError`
//! - `protocol`: low-level command/response codec
//! - `connection`: TCP transport and banner
//! - `client`: stateful FTP client (login, TYPE, NLST, QUIT)
//! - `transfer`: data channel management (PASV/PORT)
//! - `directory`: MKD
//! - `file_ops`: RETR / STOR streaming with ASCII translation
//! - `session`: `TransferSession` / `SessionConnector` implementations

pub mod client;
pub mod connection;
pub mod directory;
pub mod error;
pub mod file_ops;
pub mod protocol;
pub mod session;
pub mod transfer;
pub mod types;

pub use client::FtpClient;
pub use error::{FtpError, FtpErrorKind, FtpResult};
pub use session::{FtpConnector, FtpSession};
pub use types::*;
