//! # Recon Core
//!
//! Core vendor-ledger reconciliation: parse a vendor's ledger export,
//! classify each line as duplicate, contra, bank-payment, or unique, merge
//! the result with the previously published remarks table without clobbering
//! human annotations, and publish the merged table to a remote file store.
//!
//! ## Features
//!
//! - **Ledger parsing**: legacy-encoded CSV exports with a fixed report
//!   preamble, tolerant monetary coercion, passthrough columns preserved
//! - **Dedup classification**: key building over vendor/voucher/invoice,
//!   bank-payment separation, contra detection with exact decimal zero tests
//! - **Additive reconciliation**: previously published rows are carried
//!   forward verbatim; only unseen keys are appended
//! - **Publishing**: canonical UTF-8 CSV handed to an injected transfer
//!   client, with the bytes returned to the caller on failure
//! - **Boundary abstraction**: trait-based remarks source, transfer client,
//!   and authentication gate so the surrounding shell stays external
//!
//! ## Quick Start
//!
//! ```rust
//! use recon_core::{utils::MemoryRemote, Reconciler};
//!
//! // The upload shell calls the core with raw export bytes:
//! // let reconciler = Reconciler::new(remote.clone(), remote);
//! // let output = reconciler.run(&uploaded_bytes).await?;
//! ```

pub mod engine;
pub mod ingest;
pub mod publish;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use engine::*;
pub use ingest::*;
pub use publish::*;
pub use traits::*;
pub use types::*;
