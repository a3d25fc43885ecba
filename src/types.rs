//! Core types and data structures for the reconciliation system

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator used when joining key parts into a dedup key
pub const KEY_SEPARATOR: &str = "-";

/// Classification attached to every postable ledger row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Remark {
    /// Voucher carries a bank payment/receipt prefix; excluded from grouping
    BankPayment,
    /// Only row under its dedup key
    NotDuplicate,
    /// Multiple rows under one key with a nonzero combined total
    Duplicate,
    /// Multiple rows under one key whose totals net to exactly zero
    Contra,
}

impl Remark {
    /// The label written to the published Remarks column
    pub fn as_str(&self) -> &'static str {
        match self {
            Remark::BankPayment => "BANK PAYMENT",
            Remark::NotDuplicate => "NOT DUPLICATE",
            Remark::Duplicate => "DUPLICATE",
            Remark::Contra => "CONTRA",
        }
    }
}

impl fmt::Display for Remark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a vendor's transaction export, as parsed from the upload
///
/// Monetary columns are already coerced; `fields` keeps the complete original
/// record (aligned with [`ParsedLedger::columns`]) so passthrough columns
/// reach the published output unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    /// Vendor code column value
    pub vendor_code: String,
    /// Voucher code column value
    pub voucher: String,
    /// Invoice number exactly as exported (original case kept for display)
    pub invoice_no: String,
    /// Debit amount; unparseable or empty cells coerce to zero
    pub debit: BigDecimal,
    /// Credit amount; unparseable or empty cells coerce to zero
    pub credit: BigDecimal,
    /// Full original record in source column order
    pub fields: Vec<String>,
}

impl LedgerRow {
    /// Debit + credit, the amount the dedup rules inspect
    pub fn total(&self) -> BigDecimal {
        &self.debit + &self.credit
    }

    /// Invoice number with every non-alphanumeric character removed,
    /// uppercased (the canonical key-normalization policy)
    pub fn invoice_clean(&self) -> String {
        clean_invoice(&self.invoice_no)
    }

    /// Composite reconciliation identity: vendor, voucher and cleaned
    /// invoice number joined by [`KEY_SEPARATOR`]
    pub fn dedup_key(&self) -> String {
        build_key(&self.vendor_code, &self.voucher, &self.invoice_clean())
    }

    /// True iff the voucher starts with a bank payment (`BP`) or bank
    /// receipt (`BR`) prefix, case-insensitively
    pub fn is_bank_payment(&self) -> bool {
        let v = self.voucher.trim().to_uppercase();
        v.starts_with("BP") || v.starts_with("BR")
    }

    /// True iff the invoice number marks an opening-balance line, which is
    /// not a ledger transaction and is dropped before classification
    pub fn is_opening_balance(&self) -> bool {
        self.invoice_no
            .trim()
            .to_lowercase()
            .starts_with("opening")
    }
}

/// Normalize an invoice number for key construction: strip every
/// non-alphanumeric character, then uppercase
pub fn clean_invoice(invoice_no: &str) -> String {
    invoice_no
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}

/// Join key parts into a dedup key
pub fn build_key(vendor_code: &str, voucher: &str, invoice_clean: &str) -> String {
    [vendor_code.trim(), voucher.trim(), invoice_clean].join(KEY_SEPARATOR)
}

/// Typed row set produced by the parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedLedger {
    /// Header names in source order
    pub columns: Vec<String>,
    /// Data rows in source order
    pub rows: Vec<LedgerRow>,
}

/// A ledger row with all derived fields attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedRow {
    /// The underlying parsed row
    pub row: LedgerRow,
    /// Normalized invoice number
    pub invoice_clean: String,
    /// Reconciliation identity
    pub dedup_key: String,
    /// Debit + credit
    pub total: BigDecimal,
    /// Assigned classification
    pub remark: Remark,
}

/// Output of the classifier: one annotated row per surviving input row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedLedger {
    /// Source header names, passed through to the published output
    pub columns: Vec<String>,
    /// Annotated rows in source order
    pub rows: Vec<ClassifiedRow>,
}

impl ClassifiedLedger {
    /// Number of bank-payment rows
    pub fn bank_payment_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.remark == Remark::BankPayment)
            .count()
    }

    /// Keys of all rows, in row order (with repeats for grouped rows)
    pub fn keys(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.dedup_key.as_str()).collect()
    }
}

/// One row of a previously published remarks table
///
/// Created externally (a prior run's output or a user-annotated copy), read
/// once per merge and carried forward verbatim — the remark text may have
/// been hand-edited and is never reinterpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemarksRecord {
    /// Reconciliation identity, reconstructed from whichever key columns the
    /// stored file carries
    pub dedup_key: String,
    /// Stored remark text, verbatim
    pub remark: String,
    /// Full stored record in stored column order
    pub fields: Vec<String>,
}

/// The last published reconciliation output
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PreviousTable {
    /// Stored header names
    pub columns: Vec<String>,
    /// Stored rows, in stored order
    pub records: Vec<RemarksRecord>,
}

impl PreviousTable {
    /// An empty history, used when the previous source is unavailable
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether a dedup key already appears in the published history
    pub fn contains_key(&self, key: &str) -> bool {
        self.records.iter().any(|r| r.dedup_key == key)
    }
}

/// The merged table handed to the publisher: previous rows first (stored
/// order), then new rows (classification order)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedTable {
    /// Output header names
    pub columns: Vec<String>,
    /// Cell values, aligned with `columns`
    pub rows: Vec<Vec<String>>,
}

impl MergedTable {
    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell lookup by column name, for callers that inspect the result
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(idx).map(String::as_str)
    }
}

/// Run-level configuration resolved at the boundary
///
/// Destination and source locations are injected here by the caller; nothing
/// is compiled into the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconConfig {
    /// Non-data preamble lines to skip before the header row
    pub preamble_lines: usize,
    /// Encoding label of the vendor export (WHATWG label, e.g. "windows-1252")
    pub encoding: String,
    /// File name the merged table is published under
    pub destination: String,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            preamble_lines: 8,
            encoding: "windows-1252".to_string(),
            destination: "user_remark_vendor_report.csv".to_string(),
        }
    }
}

/// Errors that can occur in the reconciliation system
#[derive(Debug, thiserror::Error)]
pub enum ReconError {
    /// Input bytes could not be decoded or the table shape is unusable;
    /// fatal to the run, no partial output
    #[error("Parse error: {0}")]
    Parse(String),
    /// A column the dedup key needs is missing; fatal to the run
    #[error("Configuration error: {0}")]
    Config(String),
    /// The previous remarks table could not be fetched; recoverable by
    /// degrading to an empty history
    #[error("Previous remarks source unavailable: {0}")]
    SourceUnavailable(String),
    /// Publishing failed; the computed table is still returned to the caller
    #[error("Transfer failed: {0}")]
    Transfer(String),
    /// Underlying CSV reader/writer failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for reconciliation operations
pub type ReconResult<T> = Result<T, ReconError>;
