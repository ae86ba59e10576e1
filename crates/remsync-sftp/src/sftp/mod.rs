pub mod service;
pub mod session;
pub mod types;

pub use service::SftpHandle;
pub use session::{SftpConnector, SftpSession};
pub use types::SftpConnectionConfig;
