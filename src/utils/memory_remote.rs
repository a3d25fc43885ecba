//! In-memory remote store implementation for testing and development

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::traits::{RemarksSource, TransferClient};
use crate::types::*;

/// In-memory file store implementing both boundary traits
///
/// Behaves like the remote store the core publishes to: `send` writes a
/// named file, `fetch_previous` reads the configured previous-table name.
/// Failure toggles let tests exercise the degraded paths.
#[derive(Debug, Clone)]
pub struct MemoryRemote {
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    previous_name: String,
    unreachable: Arc<AtomicBool>,
    reject_sends: Arc<AtomicBool>,
}

impl MemoryRemote {
    /// Create an empty store that serves `previous_name` as the previous
    /// remarks table
    pub fn new(previous_name: impl Into<String>) -> Self {
        Self {
            files: Arc::new(RwLock::new(HashMap::new())),
            previous_name: previous_name.into(),
            unreachable: Arc::new(AtomicBool::new(false)),
            reject_sends: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Pre-load a file into the store
    pub fn put(&self, name: impl Into<String>, bytes: Vec<u8>) {
        self.files.write().unwrap().insert(name.into(), bytes);
    }

    /// Read a stored file back
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.files.read().unwrap().get(name).cloned()
    }

    /// Simulate the store being unreachable for fetches
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Simulate the store rejecting uploads
    pub fn set_reject_sends(&self, reject: bool) {
        self.reject_sends.store(reject, Ordering::SeqCst);
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        self.files.write().unwrap().clear();
    }
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new("user_remark_vendor_report.csv")
    }
}

#[async_trait]
impl RemarksSource for MemoryRemote {
    async fn fetch_previous(&self) -> ReconResult<Vec<u8>> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(ReconError::SourceUnavailable(
                "Store unreachable".to_string(),
            ));
        }
        self.get(&self.previous_name).ok_or_else(|| {
            ReconError::SourceUnavailable(format!("Not found: {}", self.previous_name))
        })
    }
}

#[async_trait]
impl TransferClient for MemoryRemote {
    async fn send(&self, bytes: &[u8], destination: &str) -> ReconResult<String> {
        if self.reject_sends.load(Ordering::SeqCst) {
            return Err(ReconError::Transfer("Upload rejected".to_string()));
        }
        self.put(destination, bytes.to_vec());
        Ok("Upload successful.".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_then_fetch_round_trips() {
        let remote = MemoryRemote::new("prev.csv");
        remote.send(b"a,b\n1,2\n", "prev.csv").await.unwrap();
        assert_eq!(remote.fetch_previous().await.unwrap(), b"a,b\n1,2\n");
    }

    #[tokio::test]
    async fn missing_previous_is_source_unavailable() {
        let remote = MemoryRemote::new("prev.csv");
        assert!(matches!(
            remote.fetch_previous().await,
            Err(ReconError::SourceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn toggles_simulate_failures() {
        let remote = MemoryRemote::new("prev.csv");
        remote.put("prev.csv", b"x".to_vec());

        remote.set_unreachable(true);
        assert!(remote.fetch_previous().await.is_err());

        remote.set_reject_sends(true);
        assert!(matches!(
            remote.send(b"y", "out.csv").await,
            Err(ReconError::Transfer(_))
        ));
        assert!(remote.get("out.csv").is_none());
    }
}
