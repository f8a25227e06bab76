use crate::charts::{render_revenue_charts, SvgRenderer};
use crate::error::Result;
use crate::exporter::load_revenue_rows;
use crate::reports::revenue_by_item;
use crate::settings::Settings;

/// Reload the cleaned file from disk and chart it.
pub fn run(settings: &Settings) -> Result<()> {
    let rows = load_revenue_rows(&settings.output_path())?;
    let revenue = revenue_by_item(&rows);
    render_revenue_charts(&revenue, &settings.plots_path(), &SvgRenderer::default())?;
    Ok(())
}
