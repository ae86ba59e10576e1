//! # remsync – SFTP
//!
//! SFTP backend for the remsync transfer session:
//!   • TCP connect with timeout and SSH handshake
//!   • Password authentication with keyboard-interactive fallback
//!   • readdir / mkdir / streamed file download and upload
//!   • `SftpConnector` for the core's `SessionConnector` seam

pub mod sftp;
