//! FTP connection configuration and reply type.

use crate::ftp::error::{FtpError, FtpResult};
use remsync_core::sync::{ConnectionSpec, ProtocolKind, TransferMode};
use serde::{Deserialize, Serialize};

/// How the data connection is established.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum DataChannelMode {
    /// PASV: server listens, client connects.
    #[default]
    Passive,
    /// PORT: client listens, server connects.
    Active,
}

impl From<TransferMode> for DataChannelMode {
    fn from(mode: TransferMode) -> Self {
        match mode {
            TransferMode::Passive => DataChannelMode::Passive,
            TransferMode::Active => DataChannelMode::Active,
        }
    }
}

/// Configuration for a single FTP connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FtpConnectionConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Sent with `ACCT` when the server asks for it (332).
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub data_channel_mode: DataChannelMode,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_sec: u64,
    /// Data-channel setup timeout in seconds. Transfers themselves are
    /// not bounded.
    #[serde(default = "default_data_timeout")]
    pub data_timeout_sec: u64,
    /// Local address to advertise for active-mode data connections.
    /// Defaults to the control connection's local address.
    #[serde(default)]
    pub active_bind_address: Option<String>,
}

fn default_connect_timeout() -> u64 {
    15
}
fn default_data_timeout() -> u64 {
    30
}

impl Default for FtpConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 21,
            username: "anonymous".into(),
            password: "anonymous@".into(),
            account: None,
            data_channel_mode: DataChannelMode::Passive,
            connect_timeout_sec: default_connect_timeout(),
            data_timeout_sec: default_data_timeout(),
            active_bind_address: None,
        }
    }
}

impl FtpConnectionConfig {
    /// Build from the protocol-agnostic connection parameters.
    pub fn from_spec(spec: &ConnectionSpec) -> FtpResult<Self> {
        if spec.protocol != ProtocolKind::Ftp {
            return Err(FtpError::invalid_config(format!(
                "{} connection handed to the FTP backend",
                spec.protocol
            )));
        }
        let (host, port) = spec
            .host_port()
            .map_err(|e| FtpError::invalid_config(e.message))?;
        Ok(Self {
            host,
            port,
            username: spec.username.clone(),
            password: spec.password.clone(),
            account: spec.account.clone(),
            data_channel_mode: spec.transfer_mode.into(),
            ..Self::default()
        })
    }
}

/// A complete FTP reply (possibly multi-line).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpResponse {
    pub code: u16,
    pub lines: Vec<String>,
}

impl FtpResponse {
    /// Full response text (all lines joined).
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Whether this is a positive-preliminary reply (1xx).
    pub fn is_preliminary(&self) -> bool {
        (100..200).contains(&self.code)
    }

    /// Whether this is a positive-completion reply (2xx).
    pub fn is_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }

    /// Whether this is a positive-intermediate reply (3xx).
    pub fn is_intermediate(&self) -> bool {
        (300..400).contains(&self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ftp::error::FtpErrorKind;

    #[test]
    fn test_from_spec_defaults_port_and_mode() {
        let spec = ConnectionSpec::new(ProtocolKind::Ftp, "ftp.example.com", "u", "p")
            .with_transfer_mode(TransferMode::Active)
            .with_account("billing");
        let cfg = FtpConnectionConfig::from_spec(&spec).unwrap();
        assert_eq!(cfg.host, "ftp.example.com");
        assert_eq!(cfg.port, 21);
        assert_eq!(cfg.data_channel_mode, DataChannelMode::Active);
        assert_eq!(cfg.account.as_deref(), Some("billing"));
    }

    #[test]
    fn test_from_spec_rejects_other_protocols_and_bad_ports() {
        let sftp = ConnectionSpec::new(ProtocolKind::Sftp, "h:22", "u", "p");
        assert_eq!(
            FtpConnectionConfig::from_spec(&sftp).unwrap_err().kind,
            FtpErrorKind::InvalidConfig
        );
        let bad = ConnectionSpec::new(ProtocolKind::Ftp, "h:ftp", "u", "p");
        assert_eq!(
            FtpConnectionConfig::from_spec(&bad).unwrap_err().kind,
            FtpErrorKind::InvalidConfig
        );
    }
}
