use remsync_core::sync::{ConnectionSpec, ProtocolKind, SyncError, SyncResult};
use serde::{Deserialize, Serialize};

/// Parameters for one SFTP connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SftpConnectionConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// TCP connect timeout.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Mode for directories created by `make_directory`.
    #[serde(default = "default_dir_mode")]
    pub dir_mode: i32,
}

fn default_timeout() -> u64 {
    15
}

fn default_dir_mode() -> i32 {
    0o755
}

impl SftpConnectionConfig {
    pub fn from_spec(spec: &ConnectionSpec) -> SyncResult<Self> {
        if spec.protocol != ProtocolKind::Sftp {
            return Err(SyncError::invalid_config(format!(
                "{} connection handed to the SFTP backend",
                spec.protocol
            )));
        }
        let (host, port) = spec.host_port()?;
        Ok(Self {
            host,
            port,
            username: spec.username.clone(),
            password: spec.password.clone(),
            timeout_secs: default_timeout(),
            dir_mode: default_dir_mode(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remsync_core::sync::{SyncErrorKind, TransferMode};

    #[test]
    fn test_from_spec_defaults_port() {
        let spec = ConnectionSpec::new(ProtocolKind::Sftp, "files.example.com", "u", "p")
            .with_transfer_mode(TransferMode::Active);
        let cfg = SftpConnectionConfig::from_spec(&spec).unwrap();
        assert_eq!(cfg.host, "files.example.com");
        assert_eq!(cfg.port, 22);
        assert_eq!(cfg.dir_mode, 0o755);
    }

    #[test]
    fn test_from_spec_ipv6_and_errors() {
        let spec = ConnectionSpec::new(ProtocolKind::Sftp, "[::1]:2222", "u", "p");
        let cfg = SftpConnectionConfig::from_spec(&spec).unwrap();
        assert_eq!((cfg.host.as_str(), cfg.port), ("::1", 2222));

        let ftp = ConnectionSpec::new(ProtocolKind::Ftp, "h:21", "u", "p");
        assert_eq!(
            SftpConnectionConfig::from_spec(&ftp).unwrap_err().kind,
            SyncErrorKind::InvalidConfig
        );
    }
}
