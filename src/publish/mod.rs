//! Publish module: CSV serialization and delivery to the remote store

pub mod writer;

pub use writer::*;

use crate::traits::TransferClient;
use crate::types::*;

/// Receipt for a successful publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    /// Destination the bytes were delivered under
    pub destination: String,
    /// The transfer client's success message
    pub message: String,
    /// Size of the delivered payload
    pub bytes_sent: usize,
}

/// Publisher that hands serialized tables to the transfer client
///
/// Exactly one delivery attempt per call; on failure the error carries the
/// client's message and the caller decides about retries or notification.
pub struct Publisher<T: TransferClient> {
    client: T,
}

impl<T: TransferClient> Publisher<T> {
    /// Create a publisher over the given transfer client
    pub fn new(client: T) -> Self {
        Self { client }
    }

    /// Deliver already-serialized bytes under `destination`
    pub async fn publish_bytes(
        &self,
        bytes: &[u8],
        destination: &str,
    ) -> ReconResult<PublishReceipt> {
        let message = self.client.send(bytes, destination).await?;
        Ok(PublishReceipt {
            destination: destination.to_string(),
            message,
            bytes_sent: bytes.len(),
        })
    }

    /// Serialize a merged table and deliver it under `destination`
    pub async fn publish(
        &self,
        table: &MergedTable,
        destination: &str,
    ) -> ReconResult<PublishReceipt> {
        let bytes = to_csv(table)?;
        self.publish_bytes(&bytes, destination).await
    }
}
