use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::exporter::load_revenue_rows;
use crate::fmt::money;
use crate::reports::revenue_by_item;
use crate::settings::Settings;

pub fn run(settings: &Settings, top: usize) -> Result<()> {
    let rows = load_revenue_rows(&settings.output_path())?;
    let data = revenue_by_item(&rows);

    let mut table = Table::new();
    table.set_header(vec!["Item", "Revenue", "%", "Count"]);
    for item in data.top(top) {
        table.add_row(vec![
            Cell::new(&item.item),
            Cell::new(money(item.total)),
            Cell::new(format!("{:.1}%", data.pct(item))),
            Cell::new(item.count),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(money(data.total)),
        Cell::new(""),
        Cell::new(data.count()),
    ]);
    println!("Revenue by Item\n{table}");
    Ok(())
}
