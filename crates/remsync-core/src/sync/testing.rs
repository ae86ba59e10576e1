//! In-memory transfer session for driving the core without a server.
//!
//! Directories map to the entries a listing returns, verbatim, so a test can
//! choose between bare names and full paths the way different servers do.
//! Every call is recorded in a log shared by all clones, which survives the
//! session being boxed and handed to the orchestrator.

use crate::sync::error::{SyncError, SyncResult};
use crate::sync::remote_path;
use crate::sync::session::{ProgressHook, SessionConnector, TransferSession};
use crate::sync::types::{ConnectionSpec, TransferType};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct State {
    dirs: BTreeMap<String, Vec<String>>,
    files: BTreeMap<String, Vec<u8>>,
    fail_download: HashSet<String>,
    fail_upload: HashSet<String>,
    fail_mkdir: HashSet<String>,
    panic_on_download: Option<String>,
    fail_quit: bool,
    discard_downloads: bool,
    calls: Vec<String>,
    closed: bool,
}

#[derive(Clone)]
pub struct MemorySession {
    state: Arc<Mutex<State>>,
}

impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySession {
    pub fn new() -> Self {
        let mut state = State::default();
        state.dirs.insert("/".to_string(), Vec::new());
        state.dirs.insert(String::new(), Vec::new());
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a directory and its ancestors, each listed in its parent by
    /// full path.
    pub fn add_dir(&mut self, dir: &str) {
        let dir = remote_path::clean(dir);
        let mut chain = vec![dir.clone()];
        let mut cursor = dir;
        while let Some(parent) = remote_path::parent(&cursor) {
            chain.push(parent.clone());
            cursor = parent;
        }
        let mut state = self.state();
        for d in chain.into_iter().rev() {
            if d.is_empty() || d == "/" || state.dirs.contains_key(&d) {
                continue;
            }
            let parent = remote_path::parent(&d).unwrap_or_default();
            state.dirs.entry(parent).or_default().push(d.clone());
            state.dirs.insert(d, Vec::new());
        }
    }

    /// Register files in `dir`. Each entry is listed exactly as given and its
    /// contents are the entry text itself.
    pub fn add_files(&mut self, dir: &str, entries: &[&str]) {
        self.add_dir(dir);
        let key = remote_path::clean(dir);
        let mut state = self.state();
        for entry in entries {
            let full = remote_path::join(&key, remote_path::base_name(entry));
            state.files.insert(full, entry.as_bytes().to_vec());
            if let Some(listing) = state.dirs.get_mut(&key) {
                listing.push(entry.to_string());
            }
        }
    }

    pub fn fail_download(&mut self, remote: &str) {
        self.state().fail_download.insert(remote.to_string());
    }

    pub fn fail_upload(&mut self, remote: &str) {
        self.state().fail_upload.insert(remote.to_string());
    }

    pub fn fail_mkdir(&mut self, path: &str) {
        self.state().fail_mkdir.insert(path.to_string());
    }

    pub fn panic_on_download(&mut self, remote: &str) {
        self.state().panic_on_download = Some(remote.to_string());
    }

    pub fn fail_quit(&mut self) {
        self.state().fail_quit = true;
    }

    /// Downloads report their size but write nothing locally.
    pub fn discard_downloads(&mut self) {
        self.state().discard_downloads = true;
    }

    pub fn has_dir(&self, dir: &str) -> bool {
        self.state().dirs.contains_key(&remote_path::clean(dir))
    }

    pub fn file(&self, remote: &str) -> Option<Vec<u8>> {
        self.state().files.get(remote).cloned()
    }

    /// Recorded calls, e.g. `list /in`, `mkdir /a`, `download /in/a -> /tmp/a`.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    fn record(&self, call: String) {
        self.state().calls.push(call);
    }
}

#[async_trait]
impl TransferSession for MemorySession {
    async fn list(&mut self, dir: &str) -> SyncResult<Vec<String>> {
        self.record(format!("list {}", dir));
        self.state()
            .dirs
            .get(&remote_path::clean(dir))
            .cloned()
            .ok_or_else(|| SyncError::listing_failed(dir, "550 No such directory"))
    }

    async fn make_directory(&mut self, path: &str) -> SyncResult<()> {
        self.record(format!("mkdir {}", path));
        let key = remote_path::clean(path);
        let mut state = self.state();
        if state.fail_mkdir.contains(path) || state.fail_mkdir.contains(&key) {
            return Err(SyncError::directory_create_failed(path, "550 Permission denied"));
        }
        if state.dirs.contains_key(&key) {
            return Err(SyncError::directory_create_failed(path, "550 File exists"));
        }
        let parent = remote_path::parent(&key).unwrap_or_default();
        match state.dirs.get_mut(&parent) {
            Some(listing) => listing.push(key.clone()),
            None => {
                return Err(SyncError::directory_create_failed(
                    path,
                    "550 Parent directory missing",
                ))
            }
        }
        state.dirs.insert(key, Vec::new());
        Ok(())
    }

    async fn download_file(
        &mut self,
        remote: &str,
        local: &Path,
        _transfer_type: TransferType,
    ) -> SyncResult<u64> {
        self.record(format!("download {} -> {}", remote, local.display()));
        let (crash, fail, discard, data) = {
            let state = self.state();
            (
                state.panic_on_download.as_deref() == Some(remote),
                state.fail_download.contains(remote),
                state.discard_downloads,
                state.files.get(remote).cloned(),
            )
        };
        if crash {
            panic!("transfer engine crashed on {}", remote);
        }
        if fail {
            return Err(SyncError::download_failed(
                remote,
                "426 Connection closed; transfer aborted",
            ));
        }
        let data = data.ok_or_else(|| SyncError::download_failed(remote, "550 No such file"))?;
        if discard {
            return Ok(data.len() as u64);
        }
        std::fs::write(local, &data).map_err(|e| SyncError::download_failed(remote, e.to_string()))?;
        Ok(data.len() as u64)
    }

    async fn upload_file(
        &mut self,
        local: &Path,
        remote: &str,
        _transfer_type: TransferType,
        progress: Option<ProgressHook<'_>>,
    ) -> SyncResult<u64> {
        self.record(format!("upload {} -> {}", local.display(), remote));
        let data =
            std::fs::read(local).map_err(|e| SyncError::upload_failed(remote, e.to_string()))?;
        let len = data.len() as u64;
        {
            let mut state = self.state();
            if state.fail_upload.contains(remote) {
                return Err(SyncError::upload_failed(remote, "553 Could not create file"));
            }
            let parent = remote_path::parent(remote).unwrap_or_default();
            let listing = state
                .dirs
                .get_mut(&parent)
                .ok_or_else(|| SyncError::upload_failed(remote, "553 No such directory"))?;
            listing.push(remote.to_string());
            state.files.insert(remote.to_string(), data);
        }
        if let Some(hook) = progress {
            hook(len, Some(len));
        }
        Ok(len)
    }

    async fn quit(&mut self) -> SyncResult<()> {
        self.record("quit".to_string());
        let mut state = self.state();
        state.closed = true;
        if state.fail_quit {
            return Err(SyncError::connection_failed("421 Service not available"));
        }
        Ok(())
    }
}

/// Hands out clones of one `MemorySession`, or a fixed error.
#[derive(Clone)]
pub struct MemoryConnector {
    session: MemorySession,
    error: Option<SyncError>,
    opened: Arc<AtomicUsize>,
}

impl MemoryConnector {
    pub fn new(session: MemorySession) -> Self {
        Self {
            session,
            error: None,
            opened: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(error: SyncError) -> Self {
        Self {
            session: MemorySession::new(),
            error: Some(error),
            opened: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn session(&self) -> &MemorySession {
        &self.session
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionConnector for MemoryConnector {
    async fn open(&self, _spec: &ConnectionSpec) -> SyncResult<Box<dyn TransferSession>> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.session.clone()))
    }
}
