//! # remsync – FTP
//!
//! Plain FTP backend for the remsync transfer session:
//!   • Control-channel codec with multi-line replies
//!   • USER / PASS / ACCT login
//!   • Passive (PASV) and active (PORT) data channels
//!   • NLST listings, MKD, RETR and STOR with ASCII/binary TYPE
//!   • `FtpConnector` for the core's `SessionConnector` seam

pub mod ftp;
