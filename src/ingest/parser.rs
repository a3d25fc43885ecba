//! Vendor ledger export parser
//!
//! The export is a delimited table preceded by a fixed-length report
//! preamble (title block, date range, vendor header) in a legacy single-byte
//! encoding. The parser decodes, skips the preamble, and yields typed rows;
//! it is a pure transform with no side effects.

use bigdecimal::BigDecimal;
use encoding_rs::Encoding;

use crate::types::*;

/// Column headers the parser requires after the preamble
const INVOICE_COLUMN: &str = "Invoice No";
const DEBIT_COLUMN: &str = "Debit";
const CREDIT_COLUMN: &str = "Credit";
/// Column headers the key builder requires; their absence is a
/// configuration error rather than a parse error
const VENDOR_COLUMN: &str = "Vendor code";
const VOUCHER_COLUMN: &str = "Voucher";

/// Parser for the vendor ledger export
pub struct LedgerParser {
    encoding: &'static Encoding,
    preamble_lines: usize,
    delimiter: u8,
}

impl Default for LedgerParser {
    fn default() -> Self {
        Self {
            encoding: encoding_rs::WINDOWS_1252,
            preamble_lines: 8,
            delimiter: b',',
        }
    }
}

impl LedgerParser {
    /// Create a parser with the legacy export defaults (windows-1252,
    /// 8 preamble lines, comma delimiter)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser from run configuration
    pub fn from_config(config: &ReconConfig) -> ReconResult<Self> {
        let encoding = Encoding::for_label(config.encoding.as_bytes()).ok_or_else(|| {
            ReconError::Config(format!("Unknown encoding label: {}", config.encoding))
        })?;
        Ok(Self {
            encoding,
            preamble_lines: config.preamble_lines,
            ..Self::default()
        })
    }

    /// Set the number of preamble lines to skip
    pub fn with_preamble_lines(mut self, lines: usize) -> Self {
        self.preamble_lines = lines;
        self
    }

    /// Set a custom delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Parse raw export bytes into a typed row set
    pub fn parse(&self, bytes: &[u8]) -> ReconResult<ParsedLedger> {
        let (text, _, had_errors) = self.encoding.decode(bytes);
        if had_errors {
            return Err(ReconError::Parse(format!(
                "Input is not valid {}",
                self.encoding.name()
            )));
        }

        let table = self.skip_preamble(&text)?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(table.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| ReconError::Parse(format!("Failed to read header row: {e}")))?;
        let columns: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();

        let invoice_idx = self.require_column(&columns, INVOICE_COLUMN)?;
        let debit_idx = self.require_column(&columns, DEBIT_COLUMN)?;
        let credit_idx = self.require_column(&columns, CREDIT_COLUMN)?;
        // Key columns are checked here so classification itself never fails
        let vendor_idx = self.require_key_column(&columns, VENDOR_COLUMN)?;
        let voucher_idx = self.require_key_column(&columns, VOUCHER_COLUMN)?;

        let mut rows = Vec::new();
        for (line, result) in reader.records().enumerate() {
            let record =
                result.map_err(|e| ReconError::Parse(format!("Bad record at row {line}: {e}")))?;

            // Pad short records so fields stay aligned with the header row
            let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
            fields.resize(columns.len().max(fields.len()), String::new());

            rows.push(LedgerRow {
                vendor_code: fields[vendor_idx].trim().to_string(),
                voucher: fields[voucher_idx].trim().to_string(),
                // Invoice numbers stay strings even when all-digit
                invoice_no: fields[invoice_idx].trim().to_string(),
                debit: coerce_amount(&fields[debit_idx]),
                credit: coerce_amount(&fields[credit_idx]),
                fields,
            });
        }

        Ok(ParsedLedger { columns, rows })
    }

    fn skip_preamble<'a>(&self, text: &'a str) -> ReconResult<&'a str> {
        let mut rest = text;
        for skipped in 0..self.preamble_lines {
            match rest.find('\n') {
                Some(pos) => rest = &rest[pos + 1..],
                None => {
                    return Err(ReconError::Parse(format!(
                        "Input ended inside the preamble ({} of {} lines)",
                        skipped, self.preamble_lines
                    )))
                }
            }
        }
        Ok(rest)
    }

    fn require_column(&self, columns: &[String], name: &str) -> ReconResult<usize> {
        columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| ReconError::Parse(format!("Required column missing: {name}")))
    }

    fn require_key_column(&self, columns: &[String], name: &str) -> ReconResult<usize> {
        columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| ReconError::Config(format!("Key column missing: {name}")))
    }
}

/// Coerce a monetary cell to a decimal amount
///
/// Malformed cells are tolerated, not rejected: anything that does not parse
/// (after trimming and dropping thousands separators) maps to zero.
pub fn coerce_amount(cell: &str) -> BigDecimal {
    let normalized: String = cell.trim().chars().filter(|c| *c != ',').collect();
    normalized
        .parse::<BigDecimal>()
        .unwrap_or_else(|_| BigDecimal::from(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREAMBLE: &str = "Vendor Ledger Report\n\
        Acme Traders Pvt Ltd\n\
        Period: 01-04-2024 to 31-03-2025\n\
        \n\
        All amounts in INR\n\
        Generated by legacy export v7\n\
        \n\
        \n";

    fn export(body: &str) -> Vec<u8> {
        format!("{PREAMBLE}{body}").into_bytes()
    }

    #[test]
    fn parses_rows_after_the_eight_line_preamble() {
        let bytes = export(
            "Date,Vendor code,Voucher,Invoice No,Description,Debit,Credit\n\
             01-04-2024,V001,JV10,INV-1,Goods,100.50,0\n\
             02-04-2024,V001,JV11,INV-2,Goods,0,75\n",
        );
        let parsed = LedgerParser::new().parse(&bytes).unwrap();

        assert_eq!(parsed.columns.len(), 7);
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].vendor_code, "V001");
        assert_eq!(parsed.rows[0].invoice_no, "INV-1");
        assert_eq!(parsed.rows[0].debit, "100.50".parse::<BigDecimal>().unwrap());
        assert_eq!(parsed.rows[1].credit, BigDecimal::from(75));
    }

    #[test]
    fn invoice_numbers_stay_strings_even_when_all_digit() {
        let bytes = export(
            "Vendor code,Voucher,Invoice No,Debit,Credit\n\
             V001,JV10,00123,10,0\n",
        );
        let parsed = LedgerParser::new().parse(&bytes).unwrap();
        assert_eq!(parsed.rows[0].invoice_no, "00123");
    }

    #[test]
    fn malformed_monetary_cells_coerce_to_zero() {
        let bytes = export(
            "Vendor code,Voucher,Invoice No,Debit,Credit\n\
             V001,JV10,INV-1,abc,\n\
             V001,JV11,INV-2,\"1,200.50\",-75\n",
        );
        let parsed = LedgerParser::new().parse(&bytes).unwrap();
        assert_eq!(parsed.rows[0].debit, BigDecimal::from(0));
        assert_eq!(parsed.rows[0].credit, BigDecimal::from(0));
        assert_eq!(parsed.rows[1].debit, "1200.50".parse::<BigDecimal>().unwrap());
        assert_eq!(parsed.rows[1].credit, BigDecimal::from(-75));
    }

    #[test]
    fn decodes_windows_1252_description_bytes() {
        let mut bytes = export(
            "Vendor code,Voucher,Invoice No,Description,Debit,Credit\n\
             V001,JV10,INV-1,Caf,10,0\n",
        );
        // 0xE9 is é in windows-1252 and invalid UTF-8 on its own
        let caf = bytes.windows(3).rposition(|w| w == b"Caf").unwrap();
        bytes.insert(caf + 3, 0xE9);

        let parsed = LedgerParser::new().parse(&bytes).unwrap();
        assert_eq!(parsed.rows[0].fields[3], "Café");
    }

    #[test]
    fn missing_required_column_is_a_parse_error() {
        let bytes = export("Vendor code,Voucher,Invoice No,Credit\nV001,JV10,INV-1,5\n");
        let err = LedgerParser::new().parse(&bytes).unwrap_err();
        assert!(matches!(err, ReconError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn missing_key_column_is_a_config_error() {
        let bytes = export("Vendor code,Invoice No,Debit,Credit\nV001,INV-1,5,0\n");
        let err = LedgerParser::new().parse(&bytes).unwrap_err();
        assert!(matches!(err, ReconError::Config(_)), "got {err:?}");
    }

    #[test]
    fn truncated_preamble_is_a_parse_error() {
        let err = LedgerParser::new().parse(b"only\nthree\nlines").unwrap_err();
        assert!(matches!(err, ReconError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn short_records_are_padded_to_the_header_width() {
        let bytes = export(
            "Vendor code,Voucher,Invoice No,Debit,Credit,Notes\n\
             V001,JV10,INV-1,5,0\n",
        );
        let parsed = LedgerParser::new().parse(&bytes).unwrap();
        assert_eq!(parsed.rows[0].fields.len(), 6);
        assert_eq!(parsed.rows[0].fields[5], "");
    }

    #[test]
    fn unknown_encoding_label_is_a_config_error() {
        let config = ReconConfig {
            encoding: "not-an-encoding".to_string(),
            ..ReconConfig::default()
        };
        assert!(matches!(
            LedgerParser::from_config(&config),
            Err(ReconError::Config(_))
        ));
    }
}
