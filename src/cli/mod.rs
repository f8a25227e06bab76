pub mod clean;
pub mod config;
pub mod plot;
pub mod revenue;
pub mod run;

use clap::{Parser, Subcommand};

use crate::settings::Overrides;

#[derive(Parser)]
#[command(
    name = "cafe-clean",
    about = "Clean a raw cafe sales export and chart revenue by item."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Raw export to clean (default: data/dirty_cafe_sales.csv)
    #[arg(long, global = true)]
    pub input: Option<String>,

    /// Where to write the cleaned CSV (default: cleaned_cafe_sales.csv)
    #[arg(long, global = true)]
    pub output: Option<String>,

    /// Directory for chart images (default: plots)
    #[arg(long = "plots-dir", global = true)]
    pub plots_dir: Option<String>,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            input: self.input.clone(),
            output: self.output.clone(),
            plots_dir: self.plots_dir.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean the export, report unknowns, save it, and draw the charts (default).
    Run,
    /// Clean the export, report unknowns, and save it. No charts.
    Clean,
    /// Draw the revenue charts from an existing cleaned file.
    Plot,
    /// Print revenue by item from an existing cleaned file.
    Revenue {
        /// Number of items to show
        #[arg(long, default_value = "10")]
        top: usize,
    },
    /// Show the effective settings.
    Config {
        /// Write the current settings to the settings file
        #[arg(long)]
        init: bool,
    },
}
