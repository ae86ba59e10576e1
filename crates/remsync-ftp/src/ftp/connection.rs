//! TCP transport: establishes the FTP control connection.

use crate::ftp::error::{FtpError, FtpResult};
use crate::ftp::protocol::FtpCodec;
use crate::ftp::types::{FtpConnectionConfig, FtpResponse};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Establish the control connection and return a ready-to-use codec
/// **plus** the server welcome banner.
pub async fn connect(config: &FtpConnectionConfig) -> FtpResult<(FtpCodec, FtpResponse)> {
    let addr = if config.host.contains(':') {
        format!("[{}]:{}", config.host, config.port)
    } else {
        format!("{}:{}", config.host, config.port)
    };
    let dur = Duration::from_secs(config.connect_timeout_sec);

    let tcp = timeout(dur, TcpStream::connect(&addr))
        .await
        .map_err(|_| FtpError::timeout(format!("TCP connect to {} timed out", addr)))?
        .map_err(|e| FtpError::connection_failed(format!("TCP connect to {}: {}", addr, e)))?;

    tcp.set_nodelay(true).ok();

    let mut codec = FtpCodec::from_tcp(tcp);
    let mut banner = codec.read_response().await?;
    // 120: service ready in nnn minutes; the real greeting follows.
    while banner.is_preliminary() {
        banner = codec.read_response().await?;
    }
    if !banner.is_completion() {
        return Err(FtpError::connection_failed(format!(
            "Server refused connection: {}",
            banner.text()
        ))
        .with_code(banner.code));
    }
    log::info!("Connected to FTP server {}", addr);
    Ok((codec, banner))
}
