//! Stateful FTP client: owns the control connection and issues commands.
//!
//! Lifecycle: `connect()` → USER/PASS/ACCT → per-transfer TYPE → QUIT.
//!
//! The client exposes low-level command helpers used by `directory.rs`
//! and `file_ops.rs` for higher-level operations.

use crate::ftp::connection;
use crate::ftp::error::{FtpError, FtpResult};
use crate::ftp::protocol::FtpCodec;
use crate::ftp::transfer::{self, DataChannel};
use crate::ftp::types::*;
use remsync_core::sync::TransferType;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

/// A connected, authenticated FTP client session.
pub struct FtpClient {
    pub codec: FtpCodec,
    pub config: FtpConnectionConfig,
    /// TYPE last acknowledged by the server.
    transfer_type: Option<TransferType>,
    connected: bool,
}

impl FtpClient {
    /// Connect and log in.
    pub async fn connect(config: FtpConnectionConfig) -> FtpResult<Self> {
        if config.host.is_empty() {
            return Err(FtpError::invalid_config("Host must not be empty"));
        }

        let (codec, _banner) = connection::connect(&config).await?;
        let mut client = Self {
            codec,
            config,
            transfer_type: None,
            connected: true,
        };
        client.login().await?;
        Ok(client)
    }

    /// USER, then PASS / ACCT as the server asks for them.
    async fn login(&mut self) -> FtpResult<()> {
        let mut resp = self
            .codec
            .execute(&format!("USER {}", self.config.username))
            .await?;

        if resp.code == 331 {
            resp = self
                .codec
                .execute(&format!("PASS {}", self.config.password))
                .await?;
        }

        if resp.code == 332 {
            let account = self.config.account.clone().ok_or_else(|| {
                FtpError::auth_failed("Server requires an account (ACCT) but none is configured")
                    .with_code(332)
            })?;
            resp = self.codec.execute(&format!("ACCT {}", account)).await?;
        }

        if !resp.is_completion() {
            return Err(FtpError::auth_failed(format!("Login failed: {}", resp.text()))
                .with_code(resp.code));
        }
        log::info!(
            "Logged in to {}:{} as {}",
            self.config.host,
            self.config.port,
            self.config.username
        );
        Ok(())
    }

    // ─── TYPE command ────────────────────────────────────────────

    /// Switch transfer type; skipped when the server is already there.
    pub async fn set_type(&mut self, tt: TransferType) -> FtpResult<()> {
        if self.transfer_type == Some(tt) {
            return Ok(());
        }
        let cmd = match tt {
            TransferType::Ascii => "TYPE A",
            TransferType::Binary => "TYPE I",
        };
        self.codec.expect_ok(cmd).await?;
        self.transfer_type = Some(tt);
        Ok(())
    }

    // ─── Data channel helpers ────────────────────────────────────

    fn data_timeout(&self) -> Duration {
        Duration::from_secs(self.config.data_timeout_sec)
    }

    /// Prepare a data channel with the current configuration.
    pub async fn open_data_channel(&mut self) -> FtpResult<DataChannel> {
        let active_bind = self.config.active_bind_address.clone();
        let data_timeout = self.data_timeout();
        transfer::open_data_channel(
            &mut self.codec,
            self.config.data_channel_mode,
            data_timeout,
            active_bind.as_deref(),
        )
        .await
    }

    /// Open a data channel, send `cmd`, and return the connected stream once
    /// the server has acknowledged with 1xx.
    pub async fn begin_transfer(&mut self, cmd: &str) -> FtpResult<TcpStream> {
        let channel = self.open_data_channel().await?;
        let resp = self.codec.execute(cmd).await?;
        if !resp.is_preliminary() {
            return Err(FtpError::from_reply(resp.code, &resp.text()));
        }
        let established = channel.establish(self.data_timeout()).await;
        self.abandon_on_error(established).await
    }

    /// Read the completion reply (226/250) after the data stream closed.
    pub async fn finish_transfer(&mut self) -> FtpResult<()> {
        let done = self.codec.read_response().await?;
        if !done.is_completion() {
            return Err(FtpError::from_reply(done.code, &done.text()));
        }
        Ok(())
    }

    /// Settle a transfer the server already accepted with 1xx.
    ///
    /// `outcome` is the local side of the transfer; its data stream must be
    /// dropped by now. On success the completion reply is checked. On
    /// failure the completion reply is still consumed, so the next command
    /// does not read it as its own answer, and the local error is returned.
    pub async fn complete_transfer<T>(&mut self, outcome: FtpResult<T>) -> FtpResult<T> {
        let value = self.abandon_on_error(outcome).await?;
        self.finish_transfer().await?;
        Ok(value)
    }

    async fn abandon_on_error<T>(&mut self, outcome: FtpResult<T>) -> FtpResult<T> {
        if let Err(e) = &outcome {
            match self.codec.read_response().await {
                Ok(reply) => log::debug!(
                    "Transfer abandoned ({}); server said {} {}",
                    e,
                    reply.code,
                    reply.text()
                ),
                Err(drain) => {
                    log::warn!("Control channel lost after failed transfer: {}", drain);
                    self.connected = false;
                }
            }
        }
        outcome
    }

    // ─── Listing ─────────────────────────────────────────────────

    /// `NLST [dir]`: names as the server reports them (bare or full paths).
    ///
    /// Servers that answer an empty directory with `450`/`550 No files
    /// found` yield an empty listing.
    pub async fn nlst(&mut self, dir: Option<&str>) -> FtpResult<Vec<String>> {
        self.set_type(TransferType::Ascii).await?;
        let cmd = match dir {
            Some(d) if !d.is_empty() => format!("NLST {}", d),
            _ => "NLST".to_string(),
        };

        let channel = self.open_data_channel().await?;
        let resp = self.codec.execute(&cmd).await?;
        if (resp.code == 450 || resp.code == 550) && is_empty_listing_reply(&resp.text()) {
            return Ok(Vec::new());
        }
        if !resp.is_preliminary() {
            return Err(FtpError::from_reply(resp.code, &resp.text()));
        }
        let established = channel.establish(self.data_timeout()).await;
        let stream = self.abandon_on_error(established).await?;
        let data = read_data_stream(stream).await;
        let data = self.complete_transfer(data).await?;

        Ok(parse_name_list(&data))
    }

    // ─── QUIT ────────────────────────────────────────────────────

    /// Gracefully close the session.
    pub async fn quit(&mut self) -> FtpResult<()> {
        if !self.connected {
            return Ok(());
        }
        self.connected = false;
        let resp = self.codec.execute("QUIT").await?;
        if !resp.is_completion() {
            return Err(FtpError::from_reply(resp.code, &resp.text()));
        }
        Ok(())
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────

fn is_empty_listing_reply(text: &str) -> bool {
    text.to_lowercase().contains("no files")
}

/// One name per line; CR and blank lines dropped. Lines that are not
/// UTF-8 are skipped with a warning so the rest of the listing survives.
pub fn parse_name_list(data: &[u8]) -> Vec<String> {
    data.split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .filter_map(|line| match std::str::from_utf8(line) {
            Ok(name) => Some(name),
            Err(e) => {
                log::warn!(
                    "Skipping listing entry that is not UTF-8 ({}): {}",
                    e,
                    String::from_utf8_lossy(line)
                );
                None
            }
        })
        .filter(|name| !name.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Read an entire data stream; the stream is closed on return.
async fn read_data_stream(mut stream: TcpStream) -> FtpResult<Vec<u8>> {
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    Ok(buf)
}
