//! File-level operations: RETR and STOR with streaming and progress.

use crate::ftp::client::FtpClient;
use crate::ftp::error::{FtpError, FtpResult};
use remsync_core::sync::{ProgressHook, TransferType};
use std::path::Path;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Default chunk size for streaming transfers (64 KiB).
const DEFAULT_CHUNK: usize = 65_536;

impl FtpClient {
    // ─── DOWNLOAD (RETR) ─────────────────────────────────────────

    /// Download a remote file to a local path. Returns the bytes written.
    pub async fn download(
        &mut self,
        remote_path: &str,
        local_path: &Path,
        transfer_type: TransferType,
    ) -> FtpResult<u64> {
        self.set_type(transfer_type).await?;

        let data = self.begin_transfer(&format!("RETR {}", remote_path)).await?;
        let received = receive_to_file(data, local_path, transfer_type).await;
        let written = self.complete_transfer(received).await?;

        log::info!(
            "Downloaded {} -> {} ({} bytes)",
            remote_path,
            local_path.display(),
            written
        );
        Ok(written)
    }

    // ─── UPLOAD (STOR) ───────────────────────────────────────────

    /// Upload a local file to a remote path. Returns the local bytes read.
    pub async fn upload(
        &mut self,
        local_path: &Path,
        remote_path: &str,
        transfer_type: TransferType,
        progress: Option<ProgressHook<'_>>,
    ) -> FtpResult<u64> {
        let mut file = fs::File::open(local_path).await.map_err(|e| {
            FtpError::io_error(format!("Cannot open {}: {}", local_path.display(), e))
        })?;
        let total = file.metadata().await.ok().map(|m| m.len());

        self.set_type(transfer_type).await?;
        let data = self.begin_transfer(&format!("STOR {}", remote_path)).await?;
        let sent = send_from_file(data, &mut file, transfer_type, progress, total).await;
        let sent = self.complete_transfer(sent).await?;

        log::info!("Uploaded {} -> {} ({} bytes)", local_path.display(), remote_path, sent);
        Ok(sent)
    }
}

// ─── Data stream pumps ───────────────────────────────────────────────
//
// Both take the data stream by value so it is closed before the control
// channel is read again.

async fn receive_to_file(
    mut data: TcpStream,
    local_path: &Path,
    transfer_type: TransferType,
) -> FtpResult<u64> {
    if let Some(parent) = local_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let mut file = fs::File::create(local_path).await?;

    let mut buf = vec![0u8; DEFAULT_CHUNK];
    let mut ascii = AsciiDecoder::default();
    let mut written = 0u64;
    loop {
        let n = data.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        let chunk = match transfer_type {
            TransferType::Binary => buf[..n].to_vec(),
            TransferType::Ascii => ascii.decode(&buf[..n]),
        };
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    if ascii.pending_cr {
        file.write_all(b"\r").await?;
        written += 1;
    }
    file.flush().await?;
    Ok(written)
}

async fn send_from_file(
    mut data: TcpStream,
    file: &mut fs::File,
    transfer_type: TransferType,
    progress: Option<ProgressHook<'_>>,
    total: Option<u64>,
) -> FtpResult<u64> {
    let mut buf = vec![0u8; DEFAULT_CHUNK];
    let mut ascii = AsciiEncoder::default();
    let mut sent = 0u64;
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        match transfer_type {
            TransferType::Binary => data.write_all(&buf[..n]).await?,
            TransferType::Ascii => data.write_all(&ascii.encode(&buf[..n])).await?,
        }
        sent += n as u64;
        if let Some(hook) = progress {
            hook(sent, total);
        }
    }
    data.flush().await?;
    data.shutdown().await?;
    Ok(sent)
}

// ─── ASCII line-ending translation ───────────────────────────────────

/// Local `\n` → network `\r\n`, leaving existing `\r\n` alone.
#[derive(Default)]
struct AsciiEncoder {
    last_was_cr: bool,
}

impl AsciiEncoder {
    fn encode(&mut self, input: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(input.len() + input.len() / 16);
        for &b in input {
            if b == b'\n' && !self.last_was_cr {
                out.push(b'\r');
            }
            out.push(b);
            self.last_was_cr = b == b'\r';
        }
        out
    }
}

/// Network `\r\n` → local `\n`. A `\r` at a chunk boundary is held until
/// the next byte is seen.
#[derive(Default)]
struct AsciiDecoder {
    pending_cr: bool,
}

impl AsciiDecoder {
    fn decode(&mut self, input: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(input.len());
        for &b in input {
            if self.pending_cr {
                self.pending_cr = false;
                if b != b'\n' {
                    out.push(b'\r');
                }
            }
            if b == b'\r' {
                self.pending_cr = true;
            } else {
                out.push(b);
            }
        }
        out
    }
}
