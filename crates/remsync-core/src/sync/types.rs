//! Shared types for the synchronisation core.

use crate::sync::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

// ─── Connection ──────────────────────────────────────────────────────

/// Which transfer protocol backend serves a connection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ProtocolKind {
    /// Plain FTP (RFC 959).
    Ftp,
    /// SFTP over SSH.
    Sftp,
}

impl ProtocolKind {
    /// Port used when the address carries none.
    pub fn default_port(self) -> u16 {
        match self {
            Self::Ftp => 21,
            Self::Sftp => 22,
        }
    }
}

impl FromStr for ProtocolKind {
    type Err = SyncError;

    fn from_str(s: &str) -> SyncResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FTP" => Ok(Self::Ftp),
            "SFTP" => Ok(Self::Sftp),
            other => Err(SyncError::invalid_config(format!(
                "unknown protocol '{}' (expected FTP or SFTP)",
                other
            ))),
        }
    }
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ftp => f.write_str("FTP"),
            Self::Sftp => f.write_str("SFTP"),
        }
    }
}

/// Data-channel direction for FTP. SFTP ignores it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum TransferMode {
    /// Server opens the data port, client connects (PASV).
    #[default]
    Passive,
    /// Client opens the data port, server connects (PORT).
    Active,
}

impl TransferMode {
    /// Parse the legacy mode flag: `PORT` (or `active`) selects active mode,
    /// everything else is passive.
    pub fn from_flag(flag: &str) -> Self {
        let flag = flag.trim();
        if flag.eq_ignore_ascii_case("PORT") || flag.eq_ignore_ascii_case("active") {
            Self::Active
        } else {
            Self::Passive
        }
    }
}

/// Representation used on the wire for a single transfer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum TransferType {
    /// Line mode; line endings may be rewritten by the server.
    Ascii,
    /// Image mode, bytes verbatim.
    #[default]
    Binary,
}

/// Parameters for one remote connection. Immutable once a session is opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSpec {
    pub protocol: ProtocolKind,
    /// `host:port`; also the qualifier for remote file identifiers.
    pub address: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub transfer_mode: TransferMode,
    /// FTP `ACCT` information, passed through verbatim.
    #[serde(default)]
    pub account: Option<String>,
}

impl ConnectionSpec {
    pub fn new(
        protocol: ProtocolKind,
        address: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            protocol,
            address: address.into(),
            username: username.into(),
            password: password.into(),
            transfer_mode: TransferMode::Passive,
            account: None,
        }
    }

    pub fn with_transfer_mode(mut self, mode: TransferMode) -> Self {
        self.transfer_mode = mode;
        self
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    /// Split `address` into host and port.
    ///
    /// Accepts `host`, `host:port` and `[v6]:port`; a missing port falls back
    /// to the protocol default.
    pub fn host_port(&self) -> SyncResult<(String, u16)> {
        let addr = self.address.trim();
        if addr.is_empty() {
            return Err(SyncError::invalid_config("address must not be empty"));
        }

        let (host, port) = if let Some(rest) = addr.strip_prefix('[') {
            let (host, tail) = rest.split_once(']').ok_or_else(|| {
                SyncError::invalid_config(format!("unterminated IPv6 address '{}'", addr))
            })?;
            (host, tail.strip_prefix(':'))
        } else if addr.matches(':').count() == 1 {
            let (host, port) = addr.split_once(':').unwrap_or((addr, ""));
            (host, Some(port))
        } else {
            (addr, None)
        };

        if host.is_empty() {
            return Err(SyncError::invalid_config(format!(
                "address '{}' has no host",
                addr
            )));
        }

        let port = match port {
            Some(p) => p.parse::<u16>().map_err(|_| {
                SyncError::invalid_config(format!("invalid port in address '{}'", addr))
            })?,
            None => self.protocol.default_port(),
        };

        Ok((host.to_string(), port))
    }
}

// ─── Local naming ────────────────────────────────────────────────────

/// How local file names are derived from remote paths.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum LocalNaming {
    /// `<prefix><basename>`; equal base names under one prefix overwrite
    /// each other.
    #[default]
    BaseName,
    /// `<prefix><8 hex digits of sha256(remote path)>_<basename>`.
    PathDigest,
}

// ─── Results ─────────────────────────────────────────────────────────

/// Qualified remote ids a caller has already processed.
pub type KnownFileSet = HashSet<String>;

/// Qualified remote id → local path, one entry per downloaded file.
pub type DownloadResult = BTreeMap<String, String>;

/// Remote path → outcome, one entry per requested upload.
pub type UploadReport = BTreeMap<String, SyncResult<()>>;
