//! Additive-only reconciliation against the previously published table
//!
//! The merge contract downstream auditors rely on: previous rows first, in
//! their stored order and byte-for-byte untouched (human edits included),
//! then the rows of this run whose dedup key the history has not seen.

use std::collections::HashMap;

use crate::traits::RemarksSource;
use crate::types::*;

/// Derived columns appended to the passthrough columns on publish
pub const CLEAN_COLUMN: &str = "Invoice_No_clean";
pub const REMARKS_COLUMN: &str = "Remarks";
pub const TOTAL_COLUMN: &str = "Total";
/// Internal key column; stripped before final emission when present
pub const KEY_COLUMN: &str = "KEY";

/// Read a previously published remarks table from raw CSV bytes
///
/// History files come in variants: some carry `Invoice_No_clean`, older ones
/// only `Invoice No`, user-annotated copies sometimes neither. The joinable
/// key is reconstructed from whichever key columns are present; vendor and
/// voucher are the minimum, and their absence makes the file unusable.
pub fn read_previous(bytes: &[u8]) -> ReconResult<PreviousTable> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);

    let headers = reader.headers().map_err(|e| {
        ReconError::SourceUnavailable(format!("Previous table header unreadable: {e}"))
    })?;
    let columns: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();

    let find = |name: &str| columns.iter().position(|c| c == name);
    let vendor_idx = find("Vendor code");
    let voucher_idx = find("Voucher");
    if vendor_idx.is_none() || voucher_idx.is_none() {
        return Err(ReconError::SourceUnavailable(
            "Previous table is missing the Vendor code/Voucher key columns".to_string(),
        ));
    }
    let clean_idx = find(CLEAN_COLUMN);
    let invoice_idx = find("Invoice No");
    let remarks_idx = find(REMARKS_COLUMN);

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| {
            ReconError::SourceUnavailable(format!("Previous table row unreadable: {e}"))
        })?;
        let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
        fields.resize(columns.len().max(fields.len()), String::new());

        let at = |idx: Option<usize>| idx.map(|i| fields[i].trim().to_string());
        let vendor = at(vendor_idx).unwrap_or_default();
        let voucher = at(voucher_idx).unwrap_or_default();
        // Prefer the stored clean column; recompute from the raw invoice
        // number if only that is present; fall back to vendor+voucher alone
        let dedup_key = match (at(clean_idx), at(invoice_idx)) {
            (Some(clean), _) => build_key(&vendor, &voucher, &clean),
            (None, Some(invoice)) => build_key(&vendor, &voucher, &clean_invoice(&invoice)),
            (None, None) => [vendor.trim(), voucher.trim()].join(KEY_SEPARATOR),
        };

        let remark = at(remarks_idx).unwrap_or_default();
        records.push(RemarksRecord {
            dedup_key,
            remark,
            fields,
        });
    }

    Ok(PreviousTable { columns, records })
}

/// Fetch and parse the previous table through the source boundary
///
/// Degrades gracefully: any failure (not found, unreachable, malformed)
/// yields an empty history plus a warning, so the run never blocks on an
/// unreachable remote.
pub async fn fetch_previous<R>(source: &R) -> (PreviousTable, Option<String>)
where
    R: RemarksSource + ?Sized,
{
    let fetched = match source.fetch_previous().await {
        Ok(bytes) => read_previous(&bytes),
        Err(e) => Err(e),
    };
    match fetched {
        Ok(table) => (table, None),
        Err(e) => {
            let err = match e {
                ReconError::SourceUnavailable(_) => e,
                other => ReconError::SourceUnavailable(other.to_string()),
            };
            tracing::warn!(error = %err, "merging against an empty history");
            (PreviousTable::empty(), Some(err.to_string()))
        }
    }
}

/// Output column set for this run's rows: passthrough columns followed by
/// the derived columns (skipping any name the source already used)
pub fn output_columns(classified: &ClassifiedLedger) -> Vec<String> {
    let mut columns = classified.columns.clone();
    for derived in [CLEAN_COLUMN, REMARKS_COLUMN, TOTAL_COLUMN] {
        if !columns.iter().any(|c| c == derived) {
            columns.push(derived.to_string());
        }
    }
    columns
}

/// Merge this run's classified rows into the published history
///
/// `result = previous ∪ { rows of this run whose key is absent from previous }`,
/// previous rows first in stored order, new rows after in classification
/// order. Previous rows are never re-classified, re-ordered, or dropped.
pub fn merge(previous: &PreviousTable, classified: &ClassifiedLedger) -> MergedTable {
    let run_columns = output_columns(classified);

    // Output header: the stored shape wins when a history exists, with any
    // new passthrough columns appended; the internal KEY column never leaks
    let mut columns: Vec<String> = if previous.columns.is_empty() {
        run_columns.clone()
    } else {
        previous.columns.clone()
    };
    columns.retain(|c| c != KEY_COLUMN);
    for col in &run_columns {
        if !columns.contains(col) {
            columns.push(col.clone());
        }
    }

    let mut rows = Vec::with_capacity(previous.records.len() + classified.rows.len());

    // Previous rows, projected by column name onto the output header
    let stored_idx: HashMap<&str, usize> = previous
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();
    for record in &previous.records {
        rows.push(
            columns
                .iter()
                .map(|col| {
                    stored_idx
                        .get(col.as_str())
                        .and_then(|&i| record.fields.get(i))
                        .cloned()
                        .unwrap_or_default()
                })
                .collect(),
        );
    }

    // New rows: only keys the history has not published yet
    let run_idx: HashMap<&str, usize> = classified
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();
    for row in &classified.rows {
        if previous.contains_key(&row.dedup_key) {
            continue;
        }
        rows.push(
            columns
                .iter()
                .map(|col| match col.as_str() {
                    CLEAN_COLUMN => row.invoice_clean.clone(),
                    REMARKS_COLUMN => row.remark.to_string(),
                    TOTAL_COLUMN => row.total.to_string(),
                    name => run_idx
                        .get(name)
                        .and_then(|&i| row.row.fields.get(i))
                        .cloned()
                        .unwrap_or_default(),
                })
                .collect(),
        );
    }

    MergedTable { columns, rows }
}
