//! Job configuration loaded from a JSON file.
//!
//! ```json
//! {
//!   "knownStore": "/var/lib/remsync/known.json",
//!   "logLevel": "info",
//!   "jobs": [
//!     {
//!       "name": "partner-a",
//!       "protocol": "FTP",
//!       "address": "ftp.example.com:21",
//!       "username": "feed",
//!       "password": "secret",
//!       "transferMode": "PORT",
//!       "pattern": "/outgoing/*.csv",
//!       "localPrefix": "/srv/inbox"
//!     }
//!   ]
//! }
//! ```

use remsync_core::sync::{
    ConnectionSpec, LocalNaming, ProtocolKind, SyncError, SyncResult, TransferMode,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

fn default_log_level() -> String {
    "info".to_string()
}

fn default_known_store() -> PathBuf {
    PathBuf::from("remsync-known.json")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    #[serde(default)]
    pub jobs: Vec<SyncJob>,
    /// Where processed identifiers are persisted between runs.
    #[serde(default)]
    pub known_store: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            jobs: Vec::new(),
            known_store: None,
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

impl SyncConfig {
    pub fn load(path: &Path) -> SyncResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            SyncError::io(format!("cannot read config {}: {}", path.display(), e))
                .with_path(path.display().to_string())
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> SyncResult<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| SyncError::invalid_config(format!("malformed config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Every job must be valid and job names must be unique.
    pub fn validate(&self) -> SyncResult<()> {
        let mut names = HashSet::new();
        for job in &self.jobs {
            job.validate()?;
            if !names.insert(job.name.as_str()) {
                return Err(SyncError::invalid_config(format!(
                    "duplicate job name '{}'",
                    job.name
                )));
            }
        }
        Ok(())
    }

    pub fn known_store_path(&self) -> PathBuf {
        self.known_store.clone().unwrap_or_else(default_known_store)
    }
}

/// One remote source to synchronise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncJob {
    pub name: String,
    /// `FTP` or `SFTP`, case-insensitive.
    pub protocol: String,
    pub address: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// `PORT` for active FTP; anything else is passive.
    #[serde(default)]
    pub transfer_mode: String,
    #[serde(default)]
    pub account: Option<String>,
    pub pattern: String,
    #[serde(default)]
    pub local_prefix: String,
    #[serde(default)]
    pub naming: LocalNaming,
}

impl SyncJob {
    pub fn validate(&self) -> SyncResult<()> {
        if self.name.trim().is_empty() {
            return Err(SyncError::invalid_config("job name must not be empty"));
        }
        if self.address.trim().is_empty() {
            return Err(SyncError::invalid_config(format!(
                "job '{}': address must not be empty",
                self.name
            )));
        }
        if self.pattern.trim().is_empty() {
            return Err(SyncError::invalid_config(format!(
                "job '{}': pattern must not be empty",
                self.name
            )));
        }
        self.protocol_kind()?;
        Ok(())
    }

    pub fn protocol_kind(&self) -> SyncResult<ProtocolKind> {
        self.protocol.parse::<ProtocolKind>().map_err(|e| {
            SyncError::invalid_config(format!("job '{}': {}", self.name, e.message))
        })
    }

    pub fn connection_spec(&self) -> SyncResult<ConnectionSpec> {
        self.validate()?;
        let mut spec = ConnectionSpec::new(
            self.protocol_kind()?,
            self.address.trim(),
            self.username.as_str(),
            self.password.as_str(),
        )
        .with_transfer_mode(TransferMode::from_flag(&self.transfer_mode));
        if let Some(account) = &self.account {
            spec = spec.with_account(account.as_str());
        }
        // Port problems surface here rather than at connect time.
        spec.host_port()?;
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remsync_core::sync::SyncErrorKind;

    const SAMPLE: &str = r#"{
        "knownStore": "/tmp/known.json",
        "jobs": [
            {
                "name": "a",
                "protocol": "ftp",
                "address": "ftp.example.com:2121",
                "username": "u",
                "password": "p",
                "transferMode": "PORT",
                "account": "acct",
                "pattern": "/in/*.csv",
                "localPrefix": "/srv/in"
            },
            {
                "name": "b",
                "protocol": "SFTP",
                "address": "sftp.example.com",
                "pattern": "/out/*.xml",
                "naming": "pathDigest"
            }
        ]
    }"#;

    #[test]
    fn test_sample_config_parses_with_defaults() {
        let cfg = SyncConfig::from_json(SAMPLE).unwrap();
        assert_eq!(cfg.jobs.len(), 2);
        assert_eq!(cfg.log_level, "info");
        assert!(!cfg.json_logs);
        assert_eq!(cfg.known_store_path(), PathBuf::from("/tmp/known.json"));

        let a = cfg.jobs[0].connection_spec().unwrap();
        assert_eq!(a.protocol, ProtocolKind::Ftp);
        assert_eq!(a.transfer_mode, TransferMode::Active);
        assert_eq!(a.account.as_deref(), Some("acct"));

        let b = &cfg.jobs[1];
        assert_eq!(b.naming, LocalNaming::PathDigest);
        assert_eq!(b.local_prefix, "");
        let spec = b.connection_spec().unwrap();
        assert_eq!(spec.protocol, ProtocolKind::Sftp);
        assert_eq!(spec.transfer_mode, TransferMode::Passive);
        assert_eq!(spec.host_port().unwrap().1, 22);
    }

    #[test]
    fn test_unknown_protocol_rejected() {
        let text = r#"{"jobs":[{"name":"x","protocol":"gopher","address":"h","pattern":"/*"}]}"#;
        let err = SyncConfig::from_json(text).unwrap_err();
        assert_eq!(err.kind, SyncErrorKind::InvalidConfig);
        assert!(err.message.contains("job 'x'"));
    }

    #[test]
    fn test_empty_fields_and_duplicates_rejected() {
        let empty_addr = r#"{"jobs":[{"name":"x","protocol":"FTP","address":" ","pattern":"/*"}]}"#;
        assert!(SyncConfig::from_json(empty_addr).is_err());

        let empty_pattern = r#"{"jobs":[{"name":"x","protocol":"FTP","address":"h","pattern":""}]}"#;
        assert!(SyncConfig::from_json(empty_pattern).is_err());

        let dup = r#"{"jobs":[
            {"name":"x","protocol":"FTP","address":"h","pattern":"/*"},
            {"name":"x","protocol":"FTP","address":"g","pattern":"/*"}
        ]}"#;
        let err = SyncConfig::from_json(dup).unwrap_err();
        assert!(err.message.contains("duplicate"));
    }

    #[test]
    fn test_bad_port_caught_when_building_spec() {
        let job = SyncJob {
            name: "x".into(),
            protocol: "FTP".into(),
            address: "h:99999".into(),
            username: String::new(),
            password: String::new(),
            transfer_mode: String::new(),
            account: None,
            pattern: "/in/*".into(),
            local_prefix: String::new(),
            naming: LocalNaming::BaseName,
        };
        assert_eq!(
            job.connection_spec().unwrap_err().kind,
            SyncErrorKind::InvalidConfig
        );
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SyncConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert_eq!(err.kind, SyncErrorKind::Io);
    }
}
