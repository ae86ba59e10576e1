//! Local destination naming for downloaded files.
//!
//! A caller-supplied prefix is a directory: it must exist, and is turned into
//! an absolute path ending in a separator. With no prefix, a timestamp stem
//! `YYYYMMDDhhmmss_` is synthesised on first use and shared by every file of
//! the batch, so the files land in the working directory as
//! `20240131093000_a.csv`, `20240131093000_b.csv`, ...

use crate::sync::error::{SyncError, SyncResult};
use crate::sync::remote_path;
use crate::sync::types::LocalNaming;
use chrono::{DateTime, Local, TimeZone};
use sha2::{Digest, Sha256};
use std::path::{Path, MAIN_SEPARATOR};

/// Clock used for the synthesised prefix.
pub type Clock = fn() -> DateTime<Local>;

/// `YYYYMMDDhhmmss_`
pub fn timestamp_prefix<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}_", now.format("%Y%m%d%H%M%S"))
}

/// Resolves remote paths to local destinations for one download batch.
pub struct LocalNamer {
    requested: String,
    naming: LocalNaming,
    clock: Clock,
    effective: Option<String>,
}

impl LocalNamer {
    pub fn new(prefix: &str, naming: LocalNaming) -> Self {
        Self {
            requested: prefix.to_string(),
            naming,
            clock: Local::now,
            effective: None,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Validate a caller-supplied directory prefix. Called once per batch;
    /// a no-op when no prefix was supplied (the stem is synthesised lazily).
    pub fn prepare(&mut self) -> SyncResult<()> {
        if self.effective.is_none() && !self.requested.is_empty() {
            self.effective = Some(directory_prefix(&self.requested)?);
        }
        Ok(())
    }

    /// The prefix in use, synthesising the timestamp stem if needed.
    pub fn effective_prefix(&mut self) -> SyncResult<String> {
        self.prepare()?;
        if let Some(prefix) = &self.effective {
            return Ok(prefix.clone());
        }
        let stem = timestamp_prefix(&(self.clock)());
        self.effective = Some(stem.clone());
        Ok(stem)
    }

    /// Local destination for `remote`.
    pub fn resolve(&mut self, remote: &str) -> SyncResult<String> {
        let prefix = self.effective_prefix()?;
        let base = remote_path::base_name(remote);
        Ok(match self.naming {
            LocalNaming::BaseName => format!("{}{}", prefix, base),
            LocalNaming::PathDigest => format!("{}{}_{}", prefix, path_digest(remote), base),
        })
    }
}

/// Existing directory → absolute path with a trailing separator.
fn directory_prefix(prefix: &str) -> SyncResult<String> {
    let path = Path::new(prefix);
    if !path.is_dir() {
        return Err(SyncError::directory_missing(prefix));
    }
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let text = absolute.to_string_lossy();
    let mut normalised = text
        .trim_end_matches(|c: char| c == '/' || c == MAIN_SEPARATOR)
        .to_string();
    normalised.push(MAIN_SEPARATOR);
    Ok(normalised)
}

/// First 8 hex digits of sha256 over the remote path.
fn path_digest(remote: &str) -> String {
    let digest = Sha256::digest(remote.as_bytes());
    hex::encode(&digest[..4])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::error::SyncErrorKind;
    use chrono::NaiveDate;

    fn fixed_clock() -> DateTime<Local> {
        let naive = NaiveDate::from_ymd_opt(2024, 1, 31)
            .and_then(|d| d.and_hms_opt(9, 30, 5))
            .unwrap();
        Local.from_local_datetime(&naive).earliest().unwrap()
    }

    #[test]
    fn test_timestamp_prefix_format() {
        let prefix = timestamp_prefix(&fixed_clock());
        assert_eq!(prefix, "20240131093005_");
        assert_eq!(prefix.len(), 15);
    }

    #[test]
    fn test_synthesised_prefix_shared_by_batch() {
        let mut namer = LocalNamer::new("", LocalNaming::BaseName).with_clock(fixed_clock);
        assert_eq!(namer.resolve("/in/a.csv").unwrap(), "20240131093005_a.csv");
        assert_eq!(namer.resolve("/in/b.csv").unwrap(), "20240131093005_b.csv");
    }

    #[test]
    fn test_synthesised_prefix_is_stable_across_clock_ticks() {
        let mut namer = LocalNamer::new("", LocalNaming::BaseName);
        let first = namer.resolve("/x/one").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1100));
        let second = namer.resolve("/x/two").unwrap();
        assert_eq!(first.strip_suffix("one"), second.strip_suffix("two"));
    }

    #[test]
    fn test_directory_prefix_normalised() {
        let dir = tempfile::tempdir().unwrap();
        let with_slash = format!("{}{}", dir.path().display(), MAIN_SEPARATOR);
        let mut namer = LocalNamer::new(&with_slash, LocalNaming::BaseName);
        let local = namer.resolve("/in/b.csv").unwrap();
        assert_eq!(local, dir.path().join("b.csv").to_string_lossy());
    }

    #[test]
    fn test_missing_directory_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let mut namer = LocalNamer::new(&missing.to_string_lossy(), LocalNaming::BaseName);
        let err = namer.prepare().unwrap_err();
        assert_eq!(err.kind, SyncErrorKind::DirectoryMissing);
    }

    #[test]
    fn test_base_name_collisions_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let mut namer = LocalNamer::new(&dir.path().to_string_lossy(), LocalNaming::BaseName);
        assert_eq!(
            namer.resolve("/a/data.csv").unwrap(),
            namer.resolve("/b/data.csv").unwrap()
        );
    }

    #[test]
    fn test_path_digest_separates_collisions() {
        let mut namer = LocalNamer::new("", LocalNaming::PathDigest).with_clock(fixed_clock);
        let a = namer.resolve("/a/data.csv").unwrap();
        let b = namer.resolve("/b/data.csv").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("20240131093005_"));
        assert!(a.ends_with("_data.csv"));
        // prefix (15) + 8 hex + '_' + name
        assert_eq!(a.len(), 15 + 8 + 1 + "data.csv".len());
        assert_eq!(namer.resolve("/a/data.csv").unwrap(), a);
    }
}
