//! Persisted set of qualified identifiers already downloaded.
//!
//! Stored as a sorted, pretty-printed JSON array. A missing file is an empty
//! set. Saves write a sibling temp file and rename it over the target.

use remsync_core::sync::{DownloadResult, KnownFileSet, SyncError, SyncResult};
use std::fs;
use std::path::{Path, PathBuf};

pub struct KnownFileStore {
    path: PathBuf,
    ids: KnownFileSet,
}

impl KnownFileStore {
    pub fn load(path: impl Into<PathBuf>) -> SyncResult<Self> {
        let path = path.into();
        let ids = match fs::read_to_string(&path) {
            Ok(text) => {
                let list: Vec<String> = serde_json::from_str(&text).map_err(|e| {
                    SyncError::invalid_config(format!(
                        "known store {} is not a JSON string array: {}",
                        path.display(),
                        e
                    ))
                })?;
                list.into_iter().collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => KnownFileSet::new(),
            Err(e) => {
                return Err(SyncError::io(format!(
                    "cannot read known store {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        log::debug!("loaded {} known id(s) from {}", ids.len(), path.display());
        Ok(Self { path, ids })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ids(&self) -> &KnownFileSet {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Add the qualified ids of a download result; returns how many were new.
    pub fn merge(&mut self, result: &DownloadResult) -> usize {
        result
            .keys()
            .filter(|id| self.ids.insert((*id).clone()))
            .count()
    }

    pub fn save(&self) -> SyncResult<()> {
        let mut list: Vec<&String> = self.ids.iter().collect();
        list.sort();
        let json = serde_json::to_string_pretty(&list)
            .map_err(|e| SyncError::io(format!("cannot encode known store: {}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        log::debug!("saved {} known id(s) to {}", list.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remsync_core::sync::SyncErrorKind;

    #[test]
    fn test_missing_file_is_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let store = KnownFileStore::load(dir.path().join("known.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_merge_then_save_round_trip_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("known.json");
        let mut store = KnownFileStore::load(&path).unwrap();

        let mut result = DownloadResult::new();
        result.insert("[h:21]/in/b.csv".into(), "/srv/b.csv".into());
        result.insert("[h:21]/in/a.csv".into(), "/srv/a.csv".into());
        assert_eq!(store.merge(&result), 2);
        assert_eq!(store.merge(&result), 0);
        store.save().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let list: Vec<String> = serde_json::from_str(&text).unwrap();
        assert_eq!(list, vec!["[h:21]/in/a.csv", "[h:21]/in/b.csv"]);
        assert!(text.contains('\n'));
        assert!(!dir.path().join("state").join("known.json.tmp").exists());

        let reloaded = KnownFileStore::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.ids().contains("[h:21]/in/a.csv"));
    }

    #[test]
    fn test_corrupt_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("known.json");
        fs::write(&path, "{\"not\": \"a list\"}").unwrap();
        let err = match KnownFileStore::load(&path) {
            Ok(_) => panic!("object must not load as a known set"),
            Err(e) => e,
        };
        assert_eq!(err.kind, SyncErrorKind::InvalidConfig);
    }
}
