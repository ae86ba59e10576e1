//! Host-qualified remote file identifiers.
//!
//! A remote path only identifies a file within one connection. Prefixing it
//! with `[address]` makes it unique across hosts, which is the form callers
//! persist between runs. Qualify before comparing against a known set,
//! unqualify before issuing protocol calls.

use std::collections::HashSet;

/// `[address]path`
pub fn qualify(address: &str, path: &str) -> String {
    format!("[{}]{}", address, path)
}

/// Strip a leading `[address]` once. Ids carrying another (or no) qualifier
/// come back unchanged. Brackets inside the path itself are not escaped and
/// survive the round trip.
pub fn unqualify(address: &str, id: &str) -> String {
    id.strip_prefix('[')
        .and_then(|rest| rest.strip_prefix(address))
        .and_then(|rest| rest.strip_prefix(']'))
        .unwrap_or(id)
        .to_string()
}

/// Candidates that are not in `known`, in candidate order. Duplicate
/// candidates are kept once (first occurrence).
pub fn missing(candidates: &[String], known: &HashSet<String>) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(candidates.len());
    candidates
        .iter()
        .filter(|id| !known.contains(id.as_str()))
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}
