//! `/`-separated remote path helpers.
//!
//! Remote paths are always slash-separated regardless of the local OS, so
//! these never go through `std::path`.

/// Split at the last `/`. The directory part keeps its trailing slash
/// (`"/in/*.csv"` → `("/in/", "*.csv")`); without a slash the directory is
/// empty.
pub fn split(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(idx) => (&path[..=idx], &path[idx + 1..]),
        None => ("", path),
    }
}

/// Form of a directory to hand to a `list` call: trailing slashes removed
/// except for the root itself.
pub fn listing_dir(dir: &str) -> &str {
    let trimmed = dir.trim_end_matches('/');
    if trimmed.is_empty() && dir.starts_with('/') {
        "/"
    } else {
        trimmed
    }
}

/// Join a directory and a name with exactly one separator.
pub fn join(dir: &str, name: &str) -> String {
    let dir = listing_dir(dir);
    if dir.is_empty() {
        name.to_string()
    } else if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Last segment of a path, ignoring trailing slashes.
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.is_empty() { "" } else { "/" };
    }
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Collapse repeated separators and drop trailing ones (the root stays `/`).
pub fn clean(path: &str) -> String {
    let absolute = path.starts_with('/');
    let joined = path
        .split('/')
        .filter(|seg| !seg.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// Parent of a cleaned path; `None` for the root and for a bare name whose
/// parent is the session's current directory.
pub fn parent(path: &str) -> Option<String> {
    let path = clean(path);
    if path.is_empty() || path == "/" {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some("/".to_string()),
        Some(idx) => Some(path[..idx].to_string()),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split() {
        assert_eq!(split("/in/*.csv"), ("/in/", "*.csv"));
        assert_eq!(split("*.csv"), ("", "*.csv"));
        assert_eq!(split("/a.csv"), ("/", "a.csv"));
        assert_eq!(split("/in/"), ("/in/", ""));
    }

    #[test]
    fn test_listing_dir() {
        assert_eq!(listing_dir("/in/"), "/in");
        assert_eq!(listing_dir("/"), "/");
        assert_eq!(listing_dir("//"), "/");
        assert_eq!(listing_dir(""), "");
        assert_eq!(listing_dir("in"), "in");
    }

    #[test]
    fn test_join() {
        assert_eq!(join("/in/", "a.csv"), "/in/a.csv");
        assert_eq!(join("/in", "a.csv"), "/in/a.csv");
        assert_eq!(join("/", "a.csv"), "/a.csv");
        assert_eq!(join("", "a.csv"), "a.csv");
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("/in/a.csv"), "a.csv");
        assert_eq!(base_name("a.csv"), "a.csv");
        assert_eq!(base_name("/in/sub/"), "sub");
        assert_eq!(base_name("/"), "/");
        assert_eq!(base_name(""), "");
    }

    #[test]
    fn test_clean_and_parent() {
        assert_eq!(clean("/a//b/"), "/a/b");
        assert_eq!(clean("a/b/"), "a/b");
        assert_eq!(clean("///"), "/");
        assert_eq!(parent("/a/b"), Some("/a".into()));
        assert_eq!(parent("/a"), Some("/".into()));
        assert_eq!(parent("/"), None);
        assert_eq!(parent("a/b/"), Some("a".into()));
        assert_eq!(parent("a"), None);
    }
}
