use std::io::{Read, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{CleanError, Result};
use crate::fmt::number;
use crate::models::{Column, Field, SalesTable, Transaction, COMPUTED_TOTAL};
use crate::reports::RevenueRow;

fn cell(row: &Transaction, column: Column) -> String {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    let num = |v: Option<f64>| v.map(number).unwrap_or_default();
    match column {
        Column::Field(Field::Item) => text(&row.item),
        Column::Field(Field::PaymentMethod) => text(&row.payment_method),
        Column::Field(Field::Location) => text(&row.location),
        Column::Field(Field::Quantity) => num(row.quantity),
        Column::Field(Field::PricePerUnit) => num(row.price_per_unit),
        Column::Field(Field::TotalSpent) => num(row.total_spent),
        Column::Field(Field::TransactionDate) => row
            .transaction_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        Column::Passthrough(slot) => row.extra.get(slot).and_then(|v| v.clone()).unwrap_or_default(),
    }
}

/// Write the cleaned table as CSV: header row, no index, `computed_total`
/// last. Missing values are written as empty cells.
pub fn write_cleaned<W: Write>(table: &SalesTable, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut header: Vec<&str> = table.headers.iter().map(String::as_str).collect();
    header.push(COMPUTED_TOTAL);
    wtr.write_record(&header)?;

    for row in &table.rows {
        let mut record: Vec<String> = table.columns.iter().map(|c| cell(row, *c)).collect();
        record.push(row.computed_total.map(number).unwrap_or_default());
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn save_cleaned(table: &SalesTable, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_cleaned(table, std::io::BufWriter::new(file))?;
    debug!(path = %path.display(), rows = table.len(), "saved cleaned table");
    Ok(())
}

/// Read back the columns of a cleaned file that the revenue reports use.
pub fn read_revenue_rows<R: Read>(reader: R) -> Result<Vec<RevenueRow>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    for required in [Field::Item.key(), Field::TotalSpent.key()] {
        if !headers.iter().any(|h| h == required) {
            return Err(CleanError::MissingColumn(required.to_string()));
        }
    }
    let mut rows = Vec::new();
    for result in rdr.deserialize::<RevenueRow>() {
        rows.push(result?);
    }
    Ok(rows)
}

pub fn load_revenue_rows(path: &Path) -> Result<Vec<RevenueRow>> {
    if !path.exists() {
        return Err(CleanError::Other(format!(
            "Cleaned file not found: {} (run `cafe-clean clean` first)",
            path.display()
        )));
    }
    let file = std::fs::File::open(path)?;
    read_revenue_rows(std::io::BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::clean;
    use crate::importer::{read_raw_table, Sentinels};

    const DIRTY: &str = "\
Transaction ID,Item,Quantity,Price Per Unit,Total Spent,Payment Method,Location,Transaction Date
TXN_1,Coffee,2,2.0,4.0,Credit Card,Takeaway,2023-09-08
TXN_2,Cake,4,$3.0,,Cash,In-store,2023-05-16
TXN_3,Cookie,4,1.0,ERROR,,In-store,2023-07-19
TXN_4,Salad,2,5.0,10.0,UNKNOWN,UNKNOWN,2023-04-27
TXN_5,Coffee,2,,4.0,Digital Wallet,In-store,2023-06-11
TXN_6,,1,,3.0,Cash,Takeaway,2023-01-01
TXN_7,Smoothie,five,4.0,,Cash,Takeaway,2023-03-31
TXN_8,Tea,1,1.5,1.5,Cash,Takeaway,never
";

    fn cleaned(csv: &str) -> SalesTable {
        let raw = read_raw_table(csv.as_bytes()).unwrap();
        clean(raw, &Sentinels::default()).unwrap().0
    }

    fn to_csv(table: &SalesTable) -> String {
        let mut buf = Vec::new();
        write_cleaned(table, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_write_cleaned_layout() {
        let out = to_csv(&cleaned(DIRTY));
        let mut lines = out.lines();
        assert_eq!(
            lines.next().unwrap(),
            "transaction_id,item,quantity,price_per_unit,total_spent,payment_method,location,transaction_date,computed_total"
        );
        assert_eq!(
            lines.next().unwrap(),
            "TXN_1,Coffee,2.0,2.0,4.0,Credit Card,Takeaway,2023-09-08,4.0"
        );
        assert_eq!(
            lines.next().unwrap(),
            "TXN_2,Cake,4.0,3.0,12.0,Cash,In-store,2023-05-16,12.0"
        );
        assert_eq!(
            lines.next().unwrap(),
            "TXN_3,Cookie,4.0,1.0,4.0,unknown,In-store,2023-07-19,4.0"
        );
        assert_eq!(
            lines.next().unwrap(),
            "TXN_4,Salad,2.0,5.0,10.0,unknown,unknown,2023-04-27,10.0"
        );
        assert_eq!(
            lines.next().unwrap(),
            "TXN_5,Coffee,2.0,2.0,4.0,Digital Wallet,In-store,2023-06-11,4.0"
        );
        // TXN_6 has no price to recover, TXN_7 no quantity, TXN_8 no date
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_rerun_on_cleaned_output_is_stable() {
        let first = cleaned(DIRTY);
        let out = to_csv(&first);

        // Restore the export's header spelling, then clean again
        let (header, body) = out.split_once('\n').unwrap();
        let restored: Vec<String> = header
            .split(',')
            .map(|h| {
                Field::ALL
                    .iter()
                    .find(|f| f.key() == h)
                    .map(|f| f.source_header().to_string())
                    .unwrap_or_else(|| h.to_string())
            })
            .collect();
        let second = cleaned(&format!("{}\n{body}", restored.join(",")));

        assert_eq!(second.len(), first.len());
        for (a, b) in first.rows.iter().zip(&second.rows) {
            assert_eq!(a.quantity, b.quantity);
            assert_eq!(a.price_per_unit, b.price_per_unit);
            assert_eq!(a.total_spent, b.total_spent);
            assert_eq!(a.computed_total, b.computed_total);
            assert_eq!(a.transaction_date, b.transaction_date);
        }
        assert_eq!(to_csv(&second), out);
    }

    #[test]
    fn test_read_revenue_rows() {
        let rows = read_revenue_rows(to_csv(&cleaned(DIRTY)).as_bytes()).unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[1].item.as_deref(), Some("Cake"));
        assert_eq!(rows[1].total_spent, Some(12.0));
    }

    #[test]
    fn test_read_revenue_rows_requires_columns() {
        let err = read_revenue_rows("item,quantity\nTea,1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, CleanError::MissingColumn(ref c) if c == "total_spent"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("cleaned.csv");
        save_cleaned(&cleaned(DIRTY), &path).unwrap();
        let rows = load_revenue_rows(&path).unwrap();
        assert_eq!(rows.len(), 5);
    }

    #[test]
    fn test_load_missing_cleaned_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_revenue_rows(&dir.path().join("missing.csv")).unwrap_err();
        assert!(err.to_string().contains("missing.csv"));
    }
}
