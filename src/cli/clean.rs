use tracing::{debug, info, warn};

use crate::cleaner::{clean, CleaningReport};
use crate::error::Result;
use crate::exporter::save_cleaned;
use crate::importer::load_raw_table;
use crate::settings::Settings;

pub fn run(settings: &Settings) -> Result<CleaningReport> {
    let input = settings.input_path();
    let raw = load_raw_table(&input)?;
    let (table, report) = clean(raw, &settings.sentinels())?;

    for ratio in &report.unknown {
        println!("{ratio}");
    }

    let output = settings.output_path();
    save_cleaned(&table, &output)?;

    debug!(
        sentinels = report.sentinels_cleared,
        bad_quantity = report.coercion_failures.quantity,
        bad_price = report.coercion_failures.price_per_unit,
        bad_total = report.coercion_failures.total_spent,
        bad_date = report.coercion_failures.transaction_date,
        payment_methods_filled = report.payment_methods_filled,
        locations_filled = report.locations_filled,
        items_filled = report.items_filled,
        no_date = report.dropped_missing_date,
        no_price = report.dropped_missing_price,
        no_quantity = report.dropped_missing_quantity,
        "cleaning breakdown"
    );
    if table.is_empty() {
        warn!(input = %input.display(), "no rows survived cleaning");
    }
    info!(
        input_rows = report.input_rows,
        retained = report.retained_rows,
        dropped = report.dropped(),
        prices_filled = report.prices_filled,
        totals_derived = report.totals_derived,
        unparseable = report.coercion_failures.total(),
        output = %output.display(),
        "cleaned sales export"
    );
    Ok(report)
}
