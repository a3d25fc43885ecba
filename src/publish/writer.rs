//! Canonical CSV serialization of result tables

use crate::engine::merge::KEY_COLUMN;
use crate::types::*;

/// Serialize a merged table to the canonical published shape: header row
/// plus one record per row, UTF-8. Any internal KEY column is stripped here
/// as the last step before emission.
pub fn to_csv(table: &MergedTable) -> ReconResult<Vec<u8>> {
    let keep: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.as_str() != KEY_COLUMN)
        .map(|(i, _)| i)
        .collect();

    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(keep.iter().map(|&i| table.columns[i].as_str()))?;
    for row in &table.rows {
        writer.write_record(keep.iter().map(|&i| row.get(i).map(String::as_str).unwrap_or("")))?;
    }

    writer
        .into_inner()
        .map_err(|e| ReconError::Csv(e.into_error().into()))
}

/// Serialize this run's classified table (pre-merge), the downloadable
/// artifact offered between the process and merge steps
pub fn classified_to_csv(classified: &ClassifiedLedger) -> ReconResult<Vec<u8>> {
    let empty = PreviousTable::empty();
    to_csv(&crate::engine::merge::merge(&empty, classified))
}
