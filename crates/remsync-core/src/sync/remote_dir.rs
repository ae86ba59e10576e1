//! Remote directory creation with parent fallback.
//!
//! Servers commonly refuse to create `a/b/c` when `a/b` is missing and have
//! no `mkdir -p`. [`ensure`] first checks whether the directory is already
//! listed in its parent, then tries to create it, and on failure walks up one
//! segment at a time until something can be created, then back down.
//!
//! The walk is an explicit stack rather than recursion. Each path pushes its
//! parent at most once; a creation that still fails after its parent has been
//! ensured is fatal and returned as `DirectoryCreateFailed`.

use crate::sync::error::{SyncError, SyncResult};
use crate::sync::remote_path;
use crate::sync::session::TransferSession;

/// Upper bound on pending segments, far above any real directory depth.
pub const MAX_DEPTH: usize = 64;

struct Pending {
    path: String,
    parent_ensured: bool,
}

/// Make sure `path` exists as a directory on the remote side.
///
/// Idempotent: a directory that is already listed costs one `list` and no
/// `make_directory`.
pub async fn ensure(session: &mut dyn TransferSession, path: &str) -> SyncResult<()> {
    let target = remote_path::clean(path);
    if target.is_empty() || target == "/" {
        return Ok(());
    }

    let mut stack = vec![Pending {
        path: target,
        parent_ensured: false,
    }];

    while let Some(top) = stack.last() {
        let current = top.path.clone();
        let parent_ensured = top.parent_ensured;

        // Present now; the entry below it (if any) can be created next.
        if is_listed(session, &current).await {
            stack.pop();
            continue;
        }

        let err = match session.make_directory(&current).await {
            Ok(()) => {
                stack.pop();
                continue;
            }
            Err(e) => e,
        };

        if parent_ensured {
            return Err(creation_failed(&current, &err));
        }
        let parent = match remote_path::parent(&current) {
            Some(p) if p != "/" => p,
            _ => return Err(creation_failed(&current, &err)),
        };
        if stack.len() >= MAX_DEPTH {
            return Err(SyncError::directory_create_failed(
                &current,
                format!("gave up after {} nested segments: {}", MAX_DEPTH, err.message),
            ));
        }
        if let Some(top) = stack.last_mut() {
            top.parent_ensured = true;
        }
        stack.push(Pending {
            path: parent,
            parent_ensured: false,
        });
    }

    Ok(())
}

fn creation_failed(path: &str, cause: &SyncError) -> SyncError {
    SyncError::directory_create_failed(path, cause.message.clone())
}

/// Whether `path` shows up in its parent's listing. A listing failure (the
/// parent itself may be missing) counts as absent.
async fn is_listed(session: &mut dyn TransferSession, path: &str) -> bool {
    let (dir, _) = remote_path::split(path);
    let listing_dir = remote_path::listing_dir(dir);
    let entries = match session.list(listing_dir).await {
        Ok(entries) => entries,
        Err(_) => return false,
    };
    entries.iter().any(|entry| {
        let full = if entry.contains('/') {
            remote_path::clean(entry)
        } else {
            remote_path::join(listing_dir, entry)
        };
        full == path
    })
}
