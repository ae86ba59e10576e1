//! Data-channel management for FTP transfers.
//!
//! - **PASV**: server opens a port, client connects before the command
//! - **PORT**: client opens a port and tells the server; the server
//!   connects only after the transfer command, so the accept is deferred
//!   until [`DataChannel::establish`]

use crate::ftp::error::{FtpError, FtpResult};
use crate::ftp::protocol::FtpCodec;
use crate::ftp::types::DataChannelMode;
use lazy_static::lazy_static;
use regex::Regex;
use std::net::{IpAddr, SocketAddr};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{timeout, Duration};

lazy_static! {
    static ref PASV_RE: Regex =
        Regex::new(r"\((\d+),(\d+),(\d+),(\d+),(\d+),(\d+)\)").expect("valid PASV pattern");
}

/// A data connection that is either open or waiting for the server.
pub enum DataChannel {
    Connected(TcpStream),
    Pending(TcpListener),
}

impl DataChannel {
    /// Turn the channel into a connected stream. Call after the transfer
    /// command has been accepted with a 1xx reply.
    pub async fn establish(self, data_timeout: Duration) -> FtpResult<TcpStream> {
        match self {
            DataChannel::Connected(tcp) => Ok(tcp),
            DataChannel::Pending(listener) => {
                let (tcp, peer) = timeout(data_timeout, listener.accept())
                    .await
                    .map_err(|_| FtpError::data_channel("PORT accept timed out"))?
                    .map_err(|e| FtpError::data_channel(format!("PORT accept: {}", e)))?;
                log::debug!("Active data connection from {}", peer);
                Ok(tcp)
            }
        }
    }
}

/// Prepare a data channel according to the configured mode.
pub async fn open_data_channel(
    codec: &mut FtpCodec,
    mode: DataChannelMode,
    data_timeout: Duration,
    active_bind: Option<&str>,
) -> FtpResult<DataChannel> {
    match mode {
        DataChannelMode::Passive => Ok(DataChannel::Connected(
            open_pasv(codec, data_timeout).await?,
        )),
        DataChannelMode::Active => Ok(DataChannel::Pending(open_port(codec, active_bind).await?)),
    }
}

// ─── PASV ────────────────────────────────────────────────────────────

/// Issue `PASV`, parse the response, connect to the returned address.
///
/// Response format: `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)`
async fn open_pasv(codec: &mut FtpCodec, data_timeout: Duration) -> FtpResult<TcpStream> {
    let resp = codec.expect_ok("PASV").await?;
    let addr = parse_pasv_response(&resp.text())?;
    let tcp = timeout(data_timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| FtpError::data_channel("PASV data connect timed out"))?
        .map_err(|e| FtpError::data_channel(format!("PASV data connect: {}", e)))?;
    Ok(tcp)
}

/// Parse `(h1,h2,h3,h4,p1,p2)` from a 227 response.
pub fn parse_pasv_response(text: &str) -> FtpResult<SocketAddr> {
    let caps = PASV_RE
        .captures(text)
        .ok_or_else(|| FtpError::protocol_error(format!("Cannot parse PASV: {}", text)))?;

    let nums: Vec<u8> = (1..=6)
        .map(|i| {
            caps[i]
                .parse::<u8>()
                .map_err(|_| FtpError::protocol_error("PASV number out of range"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let ip = IpAddr::from([nums[0], nums[1], nums[2], nums[3]]);
    let port = (nums[4] as u16) * 256 + (nums[5] as u16);
    Ok(SocketAddr::new(ip, port))
}

// ─── PORT ────────────────────────────────────────────────────────────

/// Bind a local TCP listener and announce it via `PORT`.
async fn open_port(codec: &mut FtpCodec, bind_addr: Option<&str>) -> FtpResult<TcpListener> {
    let bind_ip: IpAddr = match bind_addr {
        Some(addr) => addr
            .parse()
            .map_err(|_| FtpError::invalid_config(format!("Bad active bind address '{}'", addr)))?,
        None => codec
            .local_addr()
            .map(|a| a.ip())
            .ok_or_else(|| FtpError::data_channel("PORT needs the control connection address"))?,
    };
    let listener = TcpListener::bind(SocketAddr::new(bind_ip, 0))
        .await
        .map_err(|e| FtpError::data_channel(format!("PORT bind: {}", e)))?;
    let local = listener
        .local_addr()
        .map_err(|e| FtpError::data_channel(format!("PORT local_addr: {}", e)))?;

    codec.expect_ok(&format_port_command(local)?).await?;
    Ok(listener)
}

/// `PORT h1,h2,h3,h4,p1,p2` for an IPv4 socket address.
pub fn format_port_command(addr: SocketAddr) -> FtpResult<String> {
    let ip = match addr.ip() {
        IpAddr::V4(v4) => v4,
        IpAddr::V6(_) => return Err(FtpError::data_channel("PORT requires IPv4")),
    };
    let o = ip.octets();
    let port = addr.port();
    Ok(format!(
        "PORT {},{},{},{},{},{}",
        o[0],
        o[1],
        o[2],
        o[3],
        port / 256,
        port % 256
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ftp::error::FtpErrorKind;

    #[test]
    fn test_parse_pasv() {
        let addr = parse_pasv_response("227 Entering Passive Mode (192,168,1,20,19,137)").unwrap();
        assert_eq!(addr, "192.168.1.20:5001".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_parse_pasv_rejects_garbage() {
        let err = parse_pasv_response("227 Entering Passive Mode").unwrap_err();
        assert_eq!(err.kind, FtpErrorKind::ProtocolError);
        let err = parse_pasv_response("227 (300,1,1,1,1,1)").unwrap_err();
        assert_eq!(err.kind, FtpErrorKind::ProtocolError);
    }

    #[test]
    fn test_port_command_encoding() {
        let cmd = format_port_command("10.0.0.7:5001".parse().unwrap()).unwrap();
        assert_eq!(cmd, "PORT 10,0,0,7,19,137");
        assert!(format_port_command("[::1]:21".parse().unwrap()).is_err());
    }
}
