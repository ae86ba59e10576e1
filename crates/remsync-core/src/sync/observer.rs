//! Observer capability for progress reporting.
//!
//! The core never logs on its own; callers pass an observer and decide where
//! events go.

use crate::sync::error::SyncError;
use crate::sync::types::ProtocolKind;

/// Something notable happened during a synchronisation or upload call.
#[derive(Debug, Clone, Copy)]
pub enum SyncEvent<'a> {
    Connected {
        address: &'a str,
        protocol: ProtocolKind,
    },
    Listed {
        address: &'a str,
        pattern: &'a str,
        candidates: usize,
    },
    Diffed {
        address: &'a str,
        to_fetch: usize,
        already_known: usize,
    },
    Downloading {
        remote: &'a str,
        local: &'a str,
    },
    Downloaded {
        remote: &'a str,
        local: &'a str,
        bytes: u64,
    },
    Uploaded {
        remote: &'a str,
        bytes: u64,
    },
    UploadFailed {
        remote: &'a str,
        error: &'a SyncError,
    },
    /// `quit` failed; the call's own result is unaffected.
    CloseFailed {
        address: &'a str,
        error: &'a SyncError,
    },
    Closed {
        address: &'a str,
    },
}

pub trait SyncObserver: Send + Sync {
    fn on_event(&self, event: &SyncEvent<'_>);
}

/// Discards every event.
pub struct NoopObserver;

impl SyncObserver for NoopObserver {
    fn on_event(&self, _event: &SyncEvent<'_>) {}
}

/// Forwards events to the `log` facade.
pub struct LogObserver;

impl SyncObserver for LogObserver {
    fn on_event(&self, event: &SyncEvent<'_>) {
        match *event {
            SyncEvent::Connected { address, protocol } => {
                log::info!("{} session opened to {}", protocol, address)
            }
            SyncEvent::Listed {
                address,
                pattern,
                candidates,
            } => log::info!("{}: {} matches {} file(s)", address, pattern, candidates),
            SyncEvent::Diffed {
                address,
                to_fetch,
                already_known,
            } => log::info!(
                "{}: {} new, {} already known",
                address,
                to_fetch,
                already_known
            ),
            SyncEvent::Downloading { remote, local } => {
                log::debug!("downloading {} to {}", remote, local)
            }
            SyncEvent::Downloaded {
                remote,
                local,
                bytes,
            } => log::info!("downloaded {} to {} ({} bytes)", remote, local, bytes),
            SyncEvent::Uploaded { remote, bytes } => {
                log::info!("uploaded {} ({} bytes)", remote, bytes)
            }
            SyncEvent::UploadFailed { remote, error } => {
                log::warn!("upload of {} failed: {}", remote, error)
            }
            SyncEvent::CloseFailed { address, error } => {
                log::warn!("closing session to {} failed: {}", address, error)
            }
            SyncEvent::Closed { address } => log::debug!("session to {} closed", address),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use recording::RecordingObserver;

#[cfg(any(test, feature = "test-support"))]
mod recording {
    use super::*;
    use std::sync::Mutex;

    /// Keeps a `Debug` rendering of every event.
    #[derive(Default)]
    pub struct RecordingObserver {
        events: Mutex<Vec<String>>,
    }

    impl RecordingObserver {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> Vec<String> {
            self.events.lock().map(|e| e.clone()).unwrap_or_default()
        }

        pub fn count(&self, variant: &str) -> usize {
            self.events()
                .iter()
                .filter(|e| e.starts_with(variant))
                .count()
        }
    }

    impl SyncObserver for RecordingObserver {
        fn on_event(&self, event: &SyncEvent<'_>) {
            if let Ok(mut events) = self.events.lock() {
                events.push(format!("{:?}", event));
            }
        }
    }
}
