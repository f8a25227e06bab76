use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::cleaner::normalize_column_name;
use crate::error::{CleanError, Result};
use crate::models::{Column, Field, RawTable, SalesTable, Transaction, COMPUTED_TOTAL};

// ---------------------------------------------------------------------------
// Missing-value sentinels
// ---------------------------------------------------------------------------

/// Literal cell values that stand in for "no data" in the raw export. The
/// last four are the null tokens a CSV reader typically applies on load.
pub const DEFAULT_SENTINELS: &[&str] = &[
    "NA", "N/A", "null", "NULL", "None",
    "", " ", "-", "?",
    "Unknown", "UNKNOWN", "unknown",
    "ERROR", "Error", "error", "nan",
    "NaN", "-NaN", "-nan", "n/a", "<NA>", "#NA", "#N/A", "#N/A N/A",
    "1.#IND", "-1.#IND", "1.#QNAN", "-1.#QNAN",
];

#[derive(Debug, Clone)]
pub struct Sentinels {
    values: HashSet<String>,
}

impl Default for Sentinels {
    fn default() -> Self {
        Self {
            values: DEFAULT_SENTINELS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Sentinels {
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut sentinels = Self::default();
        sentinels.values.extend(extra.into_iter().map(Into::into));
        sentinels
    }

    /// Exact match only: `" NA"` is a value, `"NA"` is missing.
    pub fn is_missing(&self, cell: &str) -> bool {
        self.values.contains(cell)
    }
}

/// Clear every cell that is a sentinel. Returns how many were cleared.
pub fn normalize_missing(table: &mut RawTable, sentinels: &Sentinels) -> usize {
    let mut cleared = 0usize;
    for cell in table.rows.iter_mut().flat_map(|row| row.iter_mut()) {
        if cell.as_deref().is_some_and(|v| sentinels.is_missing(v)) {
            *cell = None;
            cleared += 1;
        }
    }
    cleared
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

pub fn read_raw_table<R: Read>(reader: R) -> Result<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let width = headers.len();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let mut row: Vec<Option<String>> = record
            .iter()
            .take(width)
            .map(|cell| Some(cell.to_string()))
            .collect();
        // Short rows are padded the way a missing trailing cell reads: empty.
        row.resize(width, None);
        rows.push(row);
    }
    Ok(RawTable { headers, rows })
}

pub fn load_raw_table(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).map_err(|e| {
        CleanError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {e}", path.display()),
        ))
    })?;
    let table = read_raw_table(std::io::BufReader::new(file))?;
    debug!(path = %path.display(), rows = table.rows.len(), columns = table.headers.len(), "loaded raw export");
    Ok(table)
}

// ---------------------------------------------------------------------------
// Coercion helpers
// ---------------------------------------------------------------------------

/// Parse a price or total. Thousands separators and currency symbols are
/// stripped first, so `"3,50"` reads as 350.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw.replace(',', "").replace('₹', "").replace('$', "");
    parse_number(&s)
}

pub fn parse_quantity(raw: &str) -> Option<f64> {
    parse_number(raw)
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d.%m.%Y",
    "%Y%m%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    {
        return Some(date);
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt.date());
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

// ---------------------------------------------------------------------------
// coerce
// ---------------------------------------------------------------------------

/// Non-null cells that failed to parse and were nulled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoercionFailures {
    pub quantity: usize,
    pub price_per_unit: usize,
    pub total_spent: usize,
    pub transaction_date: usize,
}

impl CoercionFailures {
    pub fn total(&self) -> usize {
        self.quantity + self.price_per_unit + self.total_spent + self.transaction_date
    }
}

fn coerce_cell<T>(cell: Option<String>, parse: fn(&str) -> Option<T>, failures: &mut usize) -> Option<T> {
    let text = cell?;
    let value = parse(&text);
    if value.is_none() {
        *failures += 1;
    }
    value
}

/// Convert the raw text table into typed transactions. Headers are left as
/// they appear in the export; renaming is a separate step.
pub fn coerce(raw: RawTable) -> Result<(SalesTable, CoercionFailures)> {
    for field in Field::ALL {
        if !raw.headers.iter().any(|h| h == field.source_header()) {
            return Err(CleanError::MissingColumn(field.source_header().to_string()));
        }
    }

    let mut headers = Vec::new();
    let mut columns = Vec::new();
    // (raw index, column) for every column that is kept
    let mut sources: Vec<(usize, Column)> = Vec::new();
    let mut claimed: HashSet<Field> = HashSet::new();
    let mut extra_count = 0usize;

    for (i, header) in raw.headers.iter().enumerate() {
        let field = Field::ALL
            .iter()
            .copied()
            .find(|f| f.source_header() == header && !claimed.contains(f));
        let column = match field {
            Some(f) => {
                claimed.insert(f);
                Column::Field(f)
            }
            None if normalize_column_name(header) == COMPUTED_TOTAL => continue,
            None => {
                extra_count += 1;
                Column::Passthrough(extra_count - 1)
            }
        };
        headers.push(header.clone());
        columns.push(column);
        sources.push((i, column));
    }

    let mut failures = CoercionFailures::default();
    let mut rows = Vec::with_capacity(raw.rows.len());

    for mut raw_row in raw.rows {
        let mut txn = Transaction {
            extra: vec![None; extra_count],
            ..Default::default()
        };
        for &(i, column) in &sources {
            let cell = raw_row.get_mut(i).and_then(Option::take);
            match column {
                Column::Field(Field::Item) => txn.item = cell,
                Column::Field(Field::PaymentMethod) => txn.payment_method = cell,
                Column::Field(Field::Location) => txn.location = cell,
                Column::Field(Field::Quantity) => {
                    txn.quantity = coerce_cell(cell, parse_quantity, &mut failures.quantity)
                }
                Column::Field(Field::PricePerUnit) => {
                    txn.price_per_unit = coerce_cell(cell, parse_amount, &mut failures.price_per_unit)
                }
                Column::Field(Field::TotalSpent) => {
                    txn.total_spent = coerce_cell(cell, parse_amount, &mut failures.total_spent)
                }
                Column::Field(Field::TransactionDate) => {
                    txn.transaction_date =
                        coerce_cell(cell, parse_date, &mut failures.transaction_date)
                }
                Column::Passthrough(slot) => txn.extra[slot] = cell,
            }
        }
        rows.push(txn);
    }

    Ok((SalesTable { headers, columns, rows }, failures))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "Transaction ID,Item,Quantity,Price Per Unit,Total Spent,Payment Method,Location,Transaction Date";

    fn raw(body: &str) -> RawTable {
        read_raw_table(format!("{HEADER}\n{body}").as_bytes()).unwrap()
    }

    #[test]
    fn test_parse_amount_currency_symbols() {
        assert_eq!(parse_amount("$3.50"), Some(3.5));
        assert_eq!(parse_amount("₹3.50"), Some(3.5));
        assert_eq!(parse_amount("1,234.56"), Some(1234.56));
    }

    #[test]
    fn test_parse_amount_comma_is_thousands_separator() {
        // "3,50" is read as three hundred fifty, not three and a half
        assert_eq!(parse_amount("3,50"), Some(350.0));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert_eq!(parse_amount("ERROR"), None);
        assert_eq!(parse_amount("<NA>"), None);
        assert_eq!(parse_amount("inf"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("3"), Some(3.0));
        assert_eq!(parse_quantity(" 2.0 "), Some(2.0));
        assert_eq!(parse_quantity("three"), None);
        assert_eq!(parse_quantity("NaN"), None);
    }

    #[test]
    fn test_parse_date_common_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 9, 8);
        assert_eq!(parse_date("2023-09-08"), expected);
        assert_eq!(parse_date("2023/09/08"), expected);
        assert_eq!(parse_date("09/08/2023"), expected);
        assert_eq!(parse_date("9/8/2023"), expected);
        assert_eq!(parse_date("08.09.2023"), expected);
        assert_eq!(parse_date("20230908"), expected);
        assert_eq!(parse_date("Sep 8, 2023"), expected);
        assert_eq!(parse_date("8 September 2023"), expected);
        assert_eq!(parse_date("2023-09-08 14:30:00"), expected);
        assert_eq!(parse_date("2023-09-08T14:30:00+02:00"), expected);
    }

    #[test]
    fn test_parse_date_rejects_invalid() {
        assert_eq!(parse_date("2023-02-30"), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("  "), None);
    }

    #[test]
    fn test_read_pads_short_rows() {
        let table = raw("T1,Coffee,2");
        assert_eq!(table.rows[0].len(), 8);
        assert_eq!(table.rows[0][2].as_deref(), Some("2"));
        assert_eq!(table.rows[0][7], None);
    }

    #[test]
    fn test_normalize_missing_exact_match_only() {
        let mut table = raw("T1,NA,?,-,ERROR, ,UNKNOWN, NA\nT2,Tea,1,2.0,2.0,Cash,null,2023-01-01");
        let cleared = normalize_missing(&mut table, &Sentinels::default());
        assert_eq!(cleared, 7);
        assert!(table.rows[0][1..7].iter().all(Option::is_none));
        // Leading space means it is not the "NA" sentinel
        assert_eq!(table.rows[0][7].as_deref(), Some(" NA"));
        assert_eq!(table.rows[1][6], None);
        assert_eq!(table.rows[1][1].as_deref(), Some("Tea"));
    }

    #[test]
    fn test_normalize_missing_reader_null_tokens() {
        let mut table = raw("T1,#NA,-nan,1.#QNAN,-1.#IND,#N/A N/A,<NA>,-NaN");
        assert_eq!(normalize_missing(&mut table, &Sentinels::default()), 7);
        assert!(table.rows[0][1..].iter().all(Option::is_none));
        assert_eq!(table.rows[0][0].as_deref(), Some("T1"));
    }

    #[test]
    fn test_normalize_missing_extra_sentinels() {
        let mut table = raw("T1,Coffee,2,2.0,4.0,Cash,In-store,2023-01-01");
        let sentinels = Sentinels::with_extra(["In-store"]);
        assert_eq!(normalize_missing(&mut table, &sentinels), 1);
        assert_eq!(table.rows[0][6], None);
    }

    #[test]
    fn test_coerce_types_and_failures() {
        let mut table = raw("T1,Coffee,two,$2.00,\"1,000\",Cash,Takeaway,not a date");
        normalize_missing(&mut table, &Sentinels::default());
        let (sales, failures) = coerce(table).unwrap();
        let txn = &sales.rows[0];
        assert_eq!(txn.item.as_deref(), Some("Coffee"));
        assert_eq!(txn.quantity, None);
        assert_eq!(txn.price_per_unit, Some(2.0));
        assert_eq!(txn.total_spent, Some(1000.0));
        assert_eq!(txn.transaction_date, None);
        assert_eq!(txn.extra, vec![Some("T1".to_string())]);
        assert_eq!(failures.quantity, 1);
        assert_eq!(failures.transaction_date, 1);
        assert_eq!(failures.total(), 2);
    }

    #[test]
    fn test_coerce_null_cells_are_not_failures() {
        let mut table = raw("T1,Coffee,,,,Cash,Takeaway,");
        normalize_missing(&mut table, &Sentinels::default());
        let (_, failures) = coerce(table).unwrap();
        assert_eq!(failures, CoercionFailures::default());
    }

    #[test]
    fn test_coerce_keeps_header_order() {
        let (sales, _) = coerce(raw("")).unwrap();
        assert_eq!(sales.headers[0], "Transaction ID");
        assert_eq!(sales.columns[0], Column::Passthrough(0));
        assert_eq!(sales.columns[3], Column::Field(Field::PricePerUnit));
    }

    #[test]
    fn test_coerce_discards_existing_computed_total() {
        let csv = "Item,Quantity,Price Per Unit,Total Spent,Payment Method,Location,Transaction Date,Computed Total\n\
                   Tea,1,1.5,1.5,Cash,Takeaway,2023-01-01,1.5\n";
        let (sales, _) = coerce(read_raw_table(csv.as_bytes()).unwrap()).unwrap();
        assert_eq!(sales.headers.len(), 7);
        assert!(sales.rows[0].extra.is_empty());
    }

    #[test]
    fn test_coerce_missing_column_is_fatal() {
        let csv = "Item,Quantity,Price Per Unit,Total Spent,Payment Method,Location\nTea,1,1.5,1.5,Cash,Takeaway\n";
        let err = coerce(read_raw_table(csv.as_bytes()).unwrap()).unwrap_err();
        assert!(matches!(err, CleanError::MissingColumn(ref c) if c == "Transaction Date"));
    }

    #[test]
    fn test_load_raw_table_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_raw_table(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, CleanError::Io(_)));
        assert!(err.to_string().contains("nope.csv"));
    }
}
