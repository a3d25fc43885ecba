//! Run orchestrator that threads one upload end-to-end
//!
//! One invocation is a pure function of (uploaded bytes, fetched previous
//! table) to (result table, status), plus the publish side effect. The
//! classified table is an explicit value handed back to the caller and
//! passed into the merge step; nothing is carried in ambient session state,
//! and concurrent runs against the same history are left to the store's
//! last-write-wins semantics.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::classify::classify;
use crate::engine::merge::{fetch_previous, merge};
use crate::ingest::LedgerParser;
use crate::publish::{to_csv, Publisher};
use crate::traits::{RemarksSource, TransferClient};
use crate::types::*;

/// Outcome of the publish step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublishStatus {
    /// Delivered; carries the transfer client's message
    Published { destination: String, message: String },
    /// Delivery failed; the run's bytes are still in [`RunOutput::csv_bytes`]
    /// so the caller can retry or offer a manual download
    Failed { message: String },
}

impl PublishStatus {
    /// True when the table reached the remote store
    pub fn is_published(&self) -> bool {
        matches!(self, PublishStatus::Published { .. })
    }
}

/// Everything one run produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutput {
    /// Identifier for this run, for logs and audit trails
    pub run_id: Uuid,
    /// When the run finished computing (UTC)
    pub generated_at: NaiveDateTime,
    /// The merged result table
    pub table: MergedTable,
    /// The table serialized to the canonical CSV shape; kept even when
    /// publishing fails so work is never lost
    pub csv_bytes: Vec<u8>,
    /// Whether the publish attempt succeeded
    pub publish: PublishStatus,
    /// Recovered problems, e.g. an unreachable previous-remarks source
    pub warnings: Vec<String>,
}

/// End-to-end reconciliation pipeline over injected boundary collaborators
pub struct Reconciler<R: RemarksSource, T: TransferClient> {
    source: R,
    publisher: Publisher<T>,
    config: ReconConfig,
}

impl<R: RemarksSource, T: TransferClient> Reconciler<R, T> {
    /// Create a reconciler with default run configuration
    pub fn new(source: R, client: T) -> Self {
        Self::with_config(source, client, ReconConfig::default())
    }

    /// Create a reconciler with explicit run configuration
    pub fn with_config(source: R, client: T, config: ReconConfig) -> Self {
        Self {
            source,
            publisher: Publisher::new(client),
            config,
        }
    }

    /// The active run configuration
    pub fn config(&self) -> &ReconConfig {
        &self.config
    }

    /// Parse and classify an uploaded export (step one of the legacy flow)
    ///
    /// The returned value is the caller's to keep; feed it back into
    /// [`Reconciler::merge_and_publish`] when the user proceeds.
    pub fn process(&self, raw: &[u8]) -> ReconResult<ClassifiedLedger> {
        let parser = LedgerParser::from_config(&self.config)?;
        let parsed = parser.parse(raw)?;
        tracing::debug!(rows = parsed.rows.len(), "parsed vendor export");
        Ok(classify(parsed))
    }

    /// Merge a classified table with the published history and publish the
    /// result (step two of the legacy flow)
    pub async fn merge_and_publish(&self, classified: &ClassifiedLedger) -> ReconResult<RunOutput> {
        let run_id = Uuid::new_v4();
        let mut warnings = Vec::new();

        let (previous, warning) = fetch_previous(&self.source).await;
        warnings.extend(warning);

        let table = merge(&previous, classified);
        let csv_bytes = to_csv(&table)?;

        let publish = match self
            .publisher
            .publish_bytes(&csv_bytes, &self.config.destination)
            .await
        {
            Ok(receipt) => PublishStatus::Published {
                destination: receipt.destination,
                message: receipt.message,
            },
            Err(e) => PublishStatus::Failed {
                message: e.to_string(),
            },
        };

        tracing::info!(
            %run_id,
            previous_rows = previous.records.len(),
            new_rows = classified.rows.len(),
            bank_rows = classified.bank_payment_count(),
            merged_rows = table.len(),
            published = publish.is_published(),
            "reconciliation run complete"
        );

        Ok(RunOutput {
            run_id,
            generated_at: chrono::Utc::now().naive_utc(),
            table,
            csv_bytes,
            publish,
            warnings,
        })
    }

    /// Process, merge, and publish one upload in a single call
    pub async fn run(&self, raw: &[u8]) -> ReconResult<RunOutput> {
        let classified = self.process(raw)?;
        self.merge_and_publish(&classified).await
    }
}
