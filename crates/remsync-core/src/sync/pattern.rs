//! Remote pattern resolution.

use crate::sync::error::{SyncError, SyncResult};
use crate::sync::remote_path;
use crate::sync::session::TransferSession;
use glob::Pattern;

/// A remote path whose last segment is a shell glob (`*`, `?`, `[...]`).
/// The glob never crosses a directory boundary.
#[derive(Debug, Clone)]
pub struct RemotePattern {
    dir: String,
    leaf: Pattern,
}

impl RemotePattern {
    pub fn parse(pattern: &str) -> SyncResult<Self> {
        let (dir, leaf) = remote_path::split(pattern);
        let leaf = Pattern::new(leaf).map_err(|e| {
            SyncError::invalid_config(format!("bad glob '{}': {}", leaf, e)).with_path(pattern)
        })?;
        Ok(Self {
            dir: dir.to_string(),
            leaf,
        })
    }

    /// Directory prefix, with its trailing separator.
    pub fn dir(&self) -> &str {
        &self.dir
    }

    pub fn leaf(&self) -> &str {
        self.leaf.as_str()
    }

    /// Whether a listed entry's base name matches the leaf glob.
    pub fn matches(&self, entry: &str) -> bool {
        self.leaf.matches(remote_path::base_name(entry))
    }

    /// Matching entries as full paths, in listing order.
    pub fn select(&self, listing: &[String]) -> Vec<String> {
        listing
            .iter()
            .filter(|entry| self.matches(entry))
            .map(|entry| remote_path::join(&self.dir, remote_path::base_name(entry)))
            .collect()
    }
}

/// List the pattern's directory and return the matching full paths in the
/// order the server listed them. Listing errors are returned, not retried;
/// no match is an empty result.
pub async fn resolve(session: &mut dyn TransferSession, pattern: &str) -> SyncResult<Vec<String>> {
    let pattern = RemotePattern::parse(pattern)?;
    let listing = session.list(remote_path::listing_dir(pattern.dir())).await?;
    Ok(pattern.select(&listing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::testing::MemorySession;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_splits_at_last_separator() {
        let p = RemotePattern::parse("/data/in/*.csv").unwrap();
        assert_eq!(p.dir(), "/data/in/");
        assert_eq!(p.leaf(), "*.csv");
    }

    #[test]
    fn test_bad_glob_is_config_error() {
        let err = RemotePattern::parse("/in/[a.csv").unwrap_err();
        assert_eq!(err.kind, crate::sync::error::SyncErrorKind::InvalidConfig);
    }

    #[test]
    fn test_select_full_paths_and_bare_names() {
        let p = RemotePattern::parse("/in/*.csv").unwrap();
        let listing = names(&["/in/a.csv", "b.csv", "/in/readme.txt", "/in/sub/"]);
        assert_eq!(p.select(&listing), names(&["/in/a.csv", "/in/b.csv"]));
    }

    #[test]
    fn test_select_keeps_listing_order() {
        let p = RemotePattern::parse("/in/*").unwrap();
        let listing = names(&["z", "a", "m"]);
        assert_eq!(p.select(&listing), names(&["/in/z", "/in/a", "/in/m"]));
    }

    #[test]
    fn test_character_class_and_single_char() {
        let p = RemotePattern::parse("/in/r[0-9]?.log").unwrap();
        let listing = names(&["r1a.log", "rxa.log", "r22.log", "r1.log"]);
        assert_eq!(p.select(&listing), names(&["/in/r1a.log", "/in/r22.log"]));
    }

    #[test]
    fn test_literal_pattern_matches_exact_name_only() {
        let p = RemotePattern::parse("/in/a.csv").unwrap();
        assert_eq!(p.select(&names(&["a.csv", "a.csvx", "ba.csv"])), names(&["/in/a.csv"]));
        assert!(p.select(&names(&["b.csv"])).is_empty());
    }

    #[test]
    fn test_sound_and_complete_against_listing() {
        let p = RemotePattern::parse("/in/*.c?v").unwrap();
        let listing = names(&["a.csv", "b.tsv", "c.cxv", "d.txt", "e.csvv"]);
        let got = p.select(&listing);
        for entry in &listing {
            let full = format!("/in/{}", entry);
            assert_eq!(got.contains(&full), p.matches(entry), "{}", entry);
        }
    }

    #[tokio::test]
    async fn test_resolve_lists_pattern_dir() {
        let mut session = MemorySession::new();
        session.add_files("/in", &["a.csv", "b.csv", "readme.txt"]);
        let got = resolve(&mut session, "/in/*.csv").await.unwrap();
        assert_eq!(got, names(&["/in/a.csv", "/in/b.csv"]));
        assert_eq!(session.calls(), names(&["list /in"]));
    }

    #[tokio::test]
    async fn test_resolve_relative_pattern_lists_current_dir() {
        let mut session = MemorySession::new();
        session.add_files("", &["x.dat"]);
        let got = resolve(&mut session, "*.dat").await.unwrap();
        assert_eq!(got, names(&["x.dat"]));
    }

    #[tokio::test]
    async fn test_resolve_surfaces_listing_failure() {
        let mut session = MemorySession::new();
        let err = resolve(&mut session, "/missing/*.csv").await.unwrap_err();
        assert_eq!(err.kind, crate::sync::error::SyncErrorKind::ListingFailed);
    }
}
