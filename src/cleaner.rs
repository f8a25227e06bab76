use std::collections::HashMap;

use tracing::debug;

use crate::error::Result;
use crate::importer::{coerce, normalize_missing, CoercionFailures, Sentinels};
use crate::models::{RawTable, SalesTable, Transaction, UNKNOWN, UNKNOWN_ITEM};
use crate::reports::{unknown_ratios, UnknownRatio};

/// Everything the pipeline observed while cleaning one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleaningReport {
    pub input_rows: usize,
    pub sentinels_cleared: usize,
    pub coercion_failures: CoercionFailures,
    pub prices_filled: usize,
    pub payment_methods_filled: usize,
    pub locations_filled: usize,
    pub dropped_missing_date: usize,
    pub dropped_missing_price: usize,
    pub items_filled: usize,
    pub dropped_missing_quantity: usize,
    pub totals_derived: usize,
    pub retained_rows: usize,
    pub unknown: Vec<UnknownRatio>,
}

impl CleaningReport {
    pub fn dropped(&self) -> usize {
        self.dropped_missing_date + self.dropped_missing_price + self.dropped_missing_quantity
    }
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// `" Price Per Unit "` -> `"price_per_unit"`
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

pub fn rename_columns(table: &mut SalesTable) {
    for header in &mut table.headers {
        *header = normalize_column_name(header);
    }
}

/// Fill a missing price with the first price seen for the same item, in
/// table order. Rows without an item are left alone.
pub fn fill_price_by_item(rows: &mut [Transaction]) -> usize {
    let mut first_price: HashMap<String, f64> = HashMap::new();
    for row in rows.iter() {
        if let (Some(item), Some(price)) = (&row.item, row.price_per_unit) {
            first_price.entry(item.clone()).or_insert(price);
        }
    }

    let mut filled = 0usize;
    for row in rows.iter_mut().filter(|r| r.price_per_unit.is_none()) {
        if let Some(&price) = row.item.as_ref().and_then(|item| first_price.get(item)) {
            row.price_per_unit = Some(price);
            filled += 1;
        }
    }
    filled
}

fn fill_text(value: &mut Option<String>, placeholder: &str) -> bool {
    if value.is_none() {
        *value = Some(placeholder.to_string());
        return true;
    }
    false
}

/// Returns (payment methods filled, locations filled).
pub fn fill_categorical(rows: &mut [Transaction]) -> (usize, usize) {
    let mut payments = 0usize;
    let mut locations = 0usize;
    for row in rows.iter_mut() {
        payments += fill_text(&mut row.payment_method, UNKNOWN) as usize;
        locations += fill_text(&mut row.location, UNKNOWN) as usize;
    }
    (payments, locations)
}

pub fn fill_item(rows: &mut [Transaction]) -> usize {
    let mut filled = 0usize;
    for row in rows.iter_mut() {
        filled += fill_text(&mut row.item, UNKNOWN_ITEM) as usize;
    }
    filled
}

pub fn derive_computed_total(rows: &mut [Transaction]) {
    for row in rows.iter_mut() {
        row.computed_total = match (row.price_per_unit, row.quantity) {
            (Some(price), Some(qty)) => Some(price * qty),
            _ => None,
        };
    }
}

pub fn fill_total_spent(rows: &mut [Transaction]) -> usize {
    let mut filled = 0usize;
    for row in rows.iter_mut().filter(|r| r.total_spent.is_none()) {
        if row.computed_total.is_some() {
            row.total_spent = row.computed_total;
            filled += 1;
        }
    }
    filled
}

/// Drop rows where `keep` is false. Returns how many were dropped.
pub fn drop_rows(rows: &mut Vec<Transaction>, keep: impl Fn(&Transaction) -> bool) -> usize {
    let before = rows.len();
    rows.retain(|r| keep(r));
    before - rows.len()
}

// ---------------------------------------------------------------------------
// clean
// ---------------------------------------------------------------------------

/// Run the whole pipeline over an in-memory table. No files are touched.
///
/// The fill and drop steps run in a fixed order; moving any of them changes
/// which rows survive:
///
/// 1. price fill by item, over every row
/// 2. payment method / location fill
/// 3. drop rows without a transaction date
/// 4. computed total
/// 5. drop rows without a price
/// 6. item fill
/// 7. drop rows without a quantity
/// 8. total spent fill from the computed total
pub fn clean(mut raw: RawTable, sentinels: &Sentinels) -> Result<(SalesTable, CleaningReport)> {
    let mut report = CleaningReport {
        input_rows: raw.rows.len(),
        ..Default::default()
    };

    report.sentinels_cleared = normalize_missing(&mut raw, sentinels);
    let (mut table, failures) = coerce(raw)?;
    report.coercion_failures = failures;
    rename_columns(&mut table);
    debug!(
        cleared = report.sentinels_cleared,
        failures = report.coercion_failures.total(),
        "normalized and coerced"
    );

    let rows = &mut table.rows;
    report.prices_filled = fill_price_by_item(rows);
    (report.payment_methods_filled, report.locations_filled) = fill_categorical(rows);

    report.dropped_missing_date = drop_rows(rows, |r| r.transaction_date.is_some());
    derive_computed_total(rows);
    report.dropped_missing_price = drop_rows(rows, |r| r.price_per_unit.is_some());
    report.items_filled = fill_item(rows);
    report.dropped_missing_quantity = drop_rows(rows, |r| r.quantity.is_some());
    report.totals_derived = fill_total_spent(rows);
    debug!(
        prices_filled = report.prices_filled,
        dropped_date = report.dropped_missing_date,
        dropped_price = report.dropped_missing_price,
        dropped_quantity = report.dropped_missing_quantity,
        totals_derived = report.totals_derived,
        "filled and dropped"
    );

    report.retained_rows = table.len();
    report.unknown = unknown_ratios(&table);
    Ok((table, report))
}
