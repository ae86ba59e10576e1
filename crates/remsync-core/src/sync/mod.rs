pub mod error;
pub mod ident;
pub mod naming;
pub mod observer;
pub mod orchestrator;
pub mod pattern;
pub mod remote_dir;
pub mod remote_path;
pub mod session;
pub mod types;
pub mod upload;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use error::{SyncError, SyncErrorKind, SyncResult};
pub use naming::LocalNamer;
pub use observer::{LogObserver, NoopObserver, SyncEvent, SyncObserver};
pub use orchestrator::{SyncOrchestrator, SyncRequest};
pub use pattern::RemotePattern;
pub use session::{ProgressHook, SessionConnector, TransferSession};
pub use types::*;
pub use upload::UploadOptions;
