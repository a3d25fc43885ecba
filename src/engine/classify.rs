//! Key building and duplicate classification
//!
//! Rows are grouped by dedup key over the postable set only; bank
//! payment/receipt vouchers bypass grouping with a fixed remark, and
//! opening-balance lines are dropped before anything else. Every surviving
//! input row comes back annotated — classification never drops, duplicates,
//! or summarizes rows.

use bigdecimal::BigDecimal;
use std::collections::HashMap;

use crate::types::*;

/// Amount sum and row count for one dedup key
struct GroupStats {
    total: BigDecimal,
    count: usize,
}

/// Classify a parsed row set
///
/// Infallible by design: the parser has already guaranteed the key columns
/// exist, and every remaining decision is a pure function of the row data.
pub fn classify(parsed: ParsedLedger) -> ClassifiedLedger {
    let ParsedLedger { columns, rows } = parsed;

    // Opening-balance lines are not ledger transactions
    let rows: Vec<LedgerRow> = rows.into_iter().filter(|r| !r.is_opening_balance()).collect();

    // First pass: per-key totals over postable rows only
    let mut groups: HashMap<String, GroupStats> = HashMap::new();
    for row in rows.iter().filter(|r| !r.is_bank_payment()) {
        let stats = groups.entry(row.dedup_key()).or_insert_with(|| GroupStats {
            total: BigDecimal::from(0),
            count: 0,
        });
        stats.total += row.total();
        stats.count += 1;
    }

    // Second pass: annotate every row in input order
    let classified = rows
        .into_iter()
        .map(|row| {
            let invoice_clean = row.invoice_clean();
            let dedup_key = row.dedup_key();
            let total = row.total();
            let remark = if row.is_bank_payment() {
                Remark::BankPayment
            } else {
                // Key always present: it was inserted from this same row set
                group_remark(&groups[&dedup_key])
            };
            ClassifiedRow {
                row,
                invoice_clean,
                dedup_key,
                total,
                remark,
            }
        })
        .collect();

    ClassifiedLedger {
        columns,
        rows: classified,
    }
}

/// Remark for a non-bank group
///
/// Count dominates over amount: a singleton is NOT DUPLICATE even when its
/// total is zero. The zero test is decimal-exact — debit and credit are
/// fixed-precision monetary values, so no epsilon applies.
fn group_remark(stats: &GroupStats) -> Remark {
    if stats.count <= 1 {
        Remark::NotDuplicate
    } else if stats.total == BigDecimal::from(0) {
        Remark::Contra
    } else {
        Remark::Duplicate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(vendor: &str, voucher: &str, invoice: &str, debit: i64, credit: i64) -> LedgerRow {
        LedgerRow {
            vendor_code: vendor.to_string(),
            voucher: voucher.to_string(),
            invoice_no: invoice.to_string(),
            debit: BigDecimal::from(debit),
            credit: BigDecimal::from(credit),
            fields: vec![
                vendor.to_string(),
                voucher.to_string(),
                invoice.to_string(),
                debit.to_string(),
                credit.to_string(),
            ],
        }
    }

    fn ledger(rows: Vec<LedgerRow>) -> ParsedLedger {
        ParsedLedger {
            columns: ["Vendor code", "Voucher", "Invoice No", "Debit", "Credit"]
                .map(String::from)
                .to_vec(),
            rows,
        }
    }

    fn remarks(classified: &ClassifiedLedger) -> Vec<Remark> {
        classified.rows.iter().map(|r| r.remark).collect()
    }

    #[test]
    fn singleton_group_is_not_duplicate() {
        let out = classify(ledger(vec![row("V1", "JV1", "INV-1", 100, 0)]));
        assert_eq!(remarks(&out), vec![Remark::NotDuplicate]);
    }

    #[test]
    fn offsetting_pair_is_contra_on_both_rows() {
        let out = classify(ledger(vec![
            row("V1", "JV1", "INV-1", 100, 0),
            row("V1", "JV1", "INV-1", -100, 0),
        ]));
        assert_eq!(remarks(&out), vec![Remark::Contra, Remark::Contra]);
    }

    #[test]
    fn nonzero_pair_is_duplicate_on_both_rows() {
        let out = classify(ledger(vec![
            row("V1", "JV1", "INV-1", 100, 0),
            row("V1", "JV1", "INV-1", 50, 0),
        ]));
        assert_eq!(remarks(&out), vec![Remark::Duplicate, Remark::Duplicate]);
    }

    #[test]
    fn singleton_with_zero_total_is_still_not_duplicate() {
        // Count dominates over amount
        let out = classify(ledger(vec![row("V1", "JV1", "INV-1", 0, 0)]));
        assert_eq!(remarks(&out), vec![Remark::NotDuplicate]);
    }

    #[test]
    fn bank_payment_voucher_bypasses_grouping() {
        // Same invoice as the postable row, but BP rows never join a group
        let out = classify(ledger(vec![
            row("V1", "BP1001", "INV-1", 100, 0),
            row("V1", "JV1", "INV-1", 100, 0),
        ]));
        assert_eq!(remarks(&out), vec![Remark::BankPayment, Remark::NotDuplicate]);
    }

    #[test]
    fn bank_payment_remark_ignores_amounts() {
        let out = classify(ledger(vec![
            row("V1", "BP1001", "INV-9", 100, 0),
            row("V1", "BP1001", "INV-9", -100, 0),
        ]));
        assert_eq!(remarks(&out), vec![Remark::BankPayment, Remark::BankPayment]);
    }

    #[test]
    fn opening_balance_rows_are_dropped_before_classification() {
        let out = classify(ledger(vec![
            row("V1", "JV1", "Opening Balance", 500, 0),
            row("V1", "JV1", "INV-1", 100, 0),
        ]));
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].row.invoice_no, "INV-1");
    }

    #[test]
    fn every_postable_row_survives_with_exactly_one_remark() {
        let input = vec![
            row("V1", "JV1", "INV-1", 100, 0),
            row("V1", "JV1", "INV-1", 50, 0),
            row("V2", "JV2", "INV-2", 10, 0),
            row("V2", "BR77", "INV-3", 25, 0),
        ];
        let out = classify(ledger(input.clone()));
        assert_eq!(out.rows.len(), input.len());
        // Input order is preserved
        for (classified, original) in out.rows.iter().zip(&input) {
            assert_eq!(classified.row, *original);
        }
    }

    #[test]
    fn mixed_case_invoices_group_together() {
        let out = classify(ledger(vec![
            row("V1", "JV1", "inv-7a", 100, 0),
            row("V1", "JV1", "INV/7A", 60, 0),
        ]));
        assert_eq!(remarks(&out), vec![Remark::Duplicate, Remark::Duplicate]);
        assert_eq!(out.rows[0].dedup_key, out.rows[1].dedup_key);
    }

    #[test]
    fn contra_across_debit_and_credit_columns() {
        let out = classify(ledger(vec![
            row("V1", "JV1", "INV-1", 250, 0),
            row("V1", "JV1", "INV-1", 0, -250),
        ]));
        assert_eq!(remarks(&out), vec![Remark::Contra, Remark::Contra]);
    }
}
