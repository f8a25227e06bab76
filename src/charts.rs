use std::f64::consts::PI;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::{info, warn};

use crate::error::{CleanError, Result};
use crate::reports::RevenueBreakdown;

pub const BAR_FILE: &str = "top_items_bar.svg";
pub const PIE_FILE: &str = "revenue_share_pie.svg";
const BAR_TOP: usize = 10;
const PIE_TOP: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieChart {
    pub title: String,
    pub slices: Vec<(String, f64)>,
    /// Degrees, counter-clockwise from 3 o'clock.
    pub start_angle: f64,
}

impl PieChart {
    /// Each slice's share of the pie, as a percentage.
    pub fn shares(&self) -> Vec<f64> {
        let total: f64 = self.slices.iter().map(|(_, v)| v.max(0.0)).sum();
        self.slices
            .iter()
            .map(|(_, v)| if total > 0.0 { v.max(0.0) / total * 100.0 } else { 0.0 })
            .collect()
    }
}

/// Something that can turn chart data into an image file.
pub trait ChartRenderer {
    fn bar_chart(&self, chart: &BarChart, path: &Path) -> Result<()>;
    fn pie_chart(&self, chart: &PieChart, path: &Path) -> Result<()>;
}

fn chart_err<E: std::fmt::Display>(e: E) -> CleanError {
    CleanError::Chart(e.to_string())
}

// ---------------------------------------------------------------------------
// SVG rendering
// ---------------------------------------------------------------------------

pub struct SvgRenderer {
    pub width: u32,
    pub height: u32,
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 700,
        }
    }
}

impl ChartRenderer for SvgRenderer {
    fn bar_chart(&self, chart: &BarChart, path: &Path) -> Result<()> {
        let root = SVGBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let n = chart.bars.len().max(1);
        let max = chart.bars.iter().map(|(_, v)| *v).fold(0.0, f64::max);
        let y_max = if max > 0.0 { max * 1.1 } else { 1.0 };

        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(90)
            .y_label_area_size(80)
            .build_cartesian_2d((0..n).into_segmented(), 0f64..y_max)
            .map_err(chart_err)?;

        let label = |v: &SegmentValue<usize>| match v {
            SegmentValue::CenterOf(i) => chart
                .bars
                .get(*i)
                .map(|(name, _)| name.clone())
                .unwrap_or_default(),
            _ => String::new(),
        };
        ctx.configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&label)
            .x_desc(chart.x_label.as_str())
            .y_desc(chart.y_label.as_str())
            .draw()
            .map_err(chart_err)?;

        ctx.draw_series(chart.bars.iter().enumerate().map(|(i, (_, value))| {
            let mut bar = Rectangle::new(
                [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *value)],
                BLUE.mix(0.8).filled(),
            );
            bar.set_margin(0, 0, 8, 8);
            bar
        }))
        .map_err(chart_err)?;

        root.present().map_err(chart_err)?;
        Ok(())
    }

    fn pie_chart(&self, chart: &PieChart, path: &Path) -> Result<()> {
        let root = SVGBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;
        let area = root
            .titled(&chart.title, ("sans-serif", 28).into_font())
            .map_err(chart_err)?;

        let (w, h) = area.dim_in_pixel();
        let center = (w as f64 / 2.0, h as f64 / 2.0);
        // Equal axes: the pie is a circle whatever the canvas shape
        let radius = w.min(h) as f64 * 0.36;
        let point = |deg: f64, r: f64| -> (i32, i32) {
            let rad = deg * PI / 180.0;
            (
                (center.0 + r * rad.cos()).round() as i32,
                (center.1 - r * rad.sin()).round() as i32,
            )
        };

        let mut angle = chart.start_angle;
        for (i, ((name, _), share)) in chart.slices.iter().zip(chart.shares()).enumerate() {
            let sweep = share / 100.0 * 360.0;
            let steps = sweep.ceil().max(1.0) as usize;
            let mut wedge = vec![point(0.0, 0.0)];
            wedge.extend((0..=steps).map(|s| point(angle + sweep * s as f64 / steps as f64, radius)));
            area.draw(&Polygon::new(wedge, Palette99::pick(i).filled()))
                .map_err(chart_err)?;

            let mid = angle + sweep / 2.0;
            area.draw(&Text::new(
                format!("{share:.1}%"),
                point(mid, radius * 0.6),
                ("sans-serif", 16).into_font(),
            ))
            .map_err(chart_err)?;
            area.draw(&Text::new(
                name.clone(),
                point(mid, radius * 1.12),
                ("sans-serif", 16).into_font(),
            ))
            .map_err(chart_err)?;
            angle += sweep;
        }

        root.present().map_err(chart_err)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Revenue charts
// ---------------------------------------------------------------------------

pub fn top_items_bar(revenue: &RevenueBreakdown) -> BarChart {
    BarChart {
        title: format!("Top {BAR_TOP} Items by Revenue"),
        x_label: "Item".to_string(),
        y_label: "Total Revenue".to_string(),
        bars: revenue
            .top(BAR_TOP)
            .iter()
            .map(|i| (i.item.clone(), i.total))
            .collect(),
    }
}

pub fn revenue_share_pie(revenue: &RevenueBreakdown) -> PieChart {
    PieChart {
        title: format!("Revenue Share by Top {PIE_TOP} Items"),
        slices: revenue
            .top(PIE_TOP)
            .iter()
            .map(|i| (i.item.clone(), i.total))
            .collect(),
        start_angle: 90.0,
    }
}

/// Draw both revenue charts into `plots_dir`. Returns the files written.
pub fn render_revenue_charts(
    revenue: &RevenueBreakdown,
    plots_dir: &Path,
    renderer: &dyn ChartRenderer,
) -> Result<Vec<PathBuf>> {
    if revenue.items.is_empty() {
        warn!("no revenue rows to chart");
        return Ok(Vec::new());
    }
    std::fs::create_dir_all(plots_dir)?;

    let bar_path = plots_dir.join(BAR_FILE);
    renderer.bar_chart(&top_items_bar(revenue), &bar_path)?;
    info!(path = %bar_path.display(), "wrote bar chart");

    let pie_path = plots_dir.join(PIE_FILE);
    renderer.pie_chart(&revenue_share_pie(revenue), &pie_path)?;
    info!(path = %pie_path.display(), "wrote pie chart");

    Ok(vec![bar_path, pie_path])
}
