// ── SFTP connection handle – connect, authenticate, file operations ─────────

use crate::sftp::types::SftpConnectionConfig;
use log::{debug, info};
use remsync_core::sync::{remote_path, ProgressHook, SyncError, SyncResult};
use ssh2::{Session, Sftp};
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

const CHUNK: usize = 65_536;

pub struct SftpHandle {
    session: Session,
    sftp: Sftp,
    #[allow(dead_code)] // held to keep the TCP connection alive
    tcp: TcpStream,
    dir_mode: i32,
}

impl SftpHandle {
    // ── Connect ──────────────────────────────────────────────────────────────

    pub fn connect(config: &SftpConnectionConfig) -> SyncResult<Self> {
        let addr = (config.host.as_str(), config.port)
            .to_socket_addrs()
            .map_err(|e| {
                SyncError::connection_failed(format!(
                    "Cannot resolve {}:{}: {}",
                    config.host, config.port, e
                ))
            })?
            .next()
            .ok_or_else(|| {
                SyncError::connection_failed(format!(
                    "{}:{} resolved to no address",
                    config.host, config.port
                ))
            })?;
        info!("SFTP connecting to {}", addr);

        let tcp = TcpStream::connect_timeout(&addr, Duration::from_secs(config.timeout_secs))
            .map_err(|e| {
                SyncError::connection_failed(format!("TCP connection to {} failed: {}", addr, e))
            })?;

        let mut session = Session::new().map_err(|e| {
            SyncError::connection_failed(format!("Failed to create SSH session: {}", e))
        })?;
        session.set_tcp_stream(
            tcp.try_clone()
                .map_err(|e| SyncError::connection_failed(e.to_string()))?,
        );
        session
            .handshake()
            .map_err(|e| SyncError::connection_failed(format!("SSH handshake failed: {}", e)))?;

        let method = authenticate(&session, config)?;
        info!("SFTP authenticated to {} via {}", addr, method);

        let sftp = session
            .sftp()
            .map_err(|e| SyncError::connection_failed(format!("SFTP channel error: {}", e)))?;

        Ok(Self {
            session,
            sftp,
            tcp,
            dir_mode: config.dir_mode,
        })
    }

    // ── Directory operations ─────────────────────────────────────────────────

    /// Entries of `dir` as `dir/name` (bare names for the current
    /// directory), without `.` and `..`.
    pub fn list(&self, dir: &str) -> SyncResult<Vec<String>> {
        let target = if dir.is_empty() { "." } else { dir };
        let raw = self
            .sftp
            .readdir(Path::new(target))
            .map_err(|e| SyncError::listing_failed(dir, format!("readdir failed: {}", e)))?;

        Ok(raw
            .into_iter()
            .filter_map(|(entry_path, _stat)| {
                let name = entry_path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())?;
                if name == "." || name == ".." {
                    return None;
                }
                Some(remote_path::join(dir, &name))
            })
            .collect())
    }

    pub fn mkdir(&self, path: &str) -> SyncResult<()> {
        self.sftp
            .mkdir(Path::new(path), self.dir_mode)
            .map_err(|e| SyncError::directory_create_failed(path, format!("mkdir failed: {}", e)))?;
        info!("SFTP mkdir: {}", path);
        Ok(())
    }

    // ── Transfers ────────────────────────────────────────────────────────────

    pub fn download(&self, remote: &str, local: &Path) -> SyncResult<u64> {
        let fail = |msg: String| SyncError::download_failed(remote, msg);

        let mut remote_file = self
            .sftp
            .open(Path::new(remote))
            .map_err(|e| fail(format!("Failed to open remote: {}", e)))?;

        prepare_local_parent(remote, local)?;
        let mut local_file = std::fs::File::create(local)
            .map_err(|e| fail(format!("Failed to create local '{}': {}", local.display(), e)))?;

        let mut transferred = 0u64;
        let mut buf = vec![0u8; CHUNK];
        loop {
            let n = remote_file
                .read(&mut buf)
                .map_err(|e| fail(format!("Read error: {}", e)))?;
            if n == 0 {
                break;
            }
            local_file
                .write_all(&buf[..n])
                .map_err(|e| fail(format!("Write error: {}", e)))?;
            transferred += n as u64;
        }
        local_file
            .flush()
            .map_err(|e| fail(format!("Write error: {}", e)))?;
        debug!("SFTP downloaded {} ({} bytes)", remote, transferred);
        Ok(transferred)
    }

    pub fn upload(
        &self,
        local: &Path,
        remote: &str,
        progress: Option<ProgressHook<'_>>,
    ) -> SyncResult<u64> {
        let fail = |msg: String| SyncError::upload_failed(remote, msg);

        let mut local_file = std::fs::File::open(local)
            .map_err(|e| fail(format!("Failed to open '{}': {}", local.display(), e)))?;
        let total = local_file.metadata().ok().map(|m| m.len());

        let mut remote_file = self
            .sftp
            .open_mode(
                Path::new(remote),
                ssh2::OpenFlags::WRITE | ssh2::OpenFlags::CREATE | ssh2::OpenFlags::TRUNCATE,
                0o644,
                ssh2::OpenType::File,
            )
            .map_err(|e| fail(format!("Failed to open remote: {}", e)))?;

        let mut transferred = 0u64;
        let mut buf = vec![0u8; CHUNK];
        loop {
            let n = local_file
                .read(&mut buf)
                .map_err(|e| fail(format!("Read error: {}", e)))?;
            if n == 0 {
                break;
            }
            remote_file
                .write_all(&buf[..n])
                .map_err(|e| fail(format!("Write error: {}", e)))?;
            transferred += n as u64;
            if let Some(hook) = progress {
                hook(transferred, total);
            }
        }
        debug!("SFTP uploaded {} ({} bytes)", remote, transferred);
        Ok(transferred)
    }

    // ── Disconnect ───────────────────────────────────────────────────────────

    pub fn disconnect(&self) -> SyncResult<()> {
        self.session
            .disconnect(None, "Client disconnecting", None)
            .map_err(|e| SyncError::connection_failed(format!("SSH disconnect failed: {}", e)))
    }
}

/// Create the directories above `local`; failures count against `remote`.
fn prepare_local_parent(remote: &str, local: &Path) -> SyncResult<()> {
    match local.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => std::fs::create_dir_all(parent).map_err(|e| {
            SyncError::download_failed(
                remote,
                format!("Failed to create '{}': {}", parent.display(), e),
            )
        }),
        None => Ok(()),
    }
}

// ── Authentication ───────────────────────────────────────────────────────────

/// Password, then keyboard-interactive answering every prompt with the
/// password.
fn authenticate(session: &Session, config: &SftpConnectionConfig) -> SyncResult<&'static str> {
    if session
        .userauth_password(&config.username, &config.password)
        .is_ok()
        && session.authenticated()
    {
        return Ok("password");
    }

    struct SimpleKbdHandler {
        password: String,
    }

    impl ssh2::KeyboardInteractivePrompt for SimpleKbdHandler {
        fn prompt(
            &mut self,
            _username: &str,
            _instructions: &str,
            prompts: &[ssh2::Prompt],
        ) -> Vec<String> {
            prompts.iter().map(|_| self.password.clone()).collect()
        }
    }

    let mut handler = SimpleKbdHandler {
        password: config.password.clone(),
    };
    if session
        .userauth_keyboard_interactive(&config.username, &mut handler)
        .is_ok()
        && session.authenticated()
    {
        return Ok("keyboard-interactive");
    }

    Err(SyncError::auth_failed(format!(
        "No authentication method succeeded for {}",
        config.username
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_parent_failure_is_attributed_to_remote() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("plain-file");
        std::fs::write(&blocker, "x").unwrap();

        let err = prepare_local_parent("/in/a.csv", &blocker.join("sub").join("a.csv")).unwrap_err();
        assert_eq!(err.kind, remsync_core::sync::SyncErrorKind::DownloadFailed);
        assert_eq!(err.path.as_deref(), Some("/in/a.csv"));
    }

    #[test]
    fn test_local_parent_created_when_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let local = tmp.path().join("x").join("y").join("a.csv");
        prepare_local_parent("/in/a.csv", &local).unwrap();
        assert!(tmp.path().join("x").join("y").is_dir());
        prepare_local_parent("/in/a.csv", Path::new("a.csv")).unwrap();
    }
}
