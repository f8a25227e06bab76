mod charts;
mod cleaner;
mod cli;
mod error;
mod exporter;
mod fmt;
mod importer;
mod logging;
mod models;
mod reports;
mod settings;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    logging::init_logging();

    let settings = settings::load_settings().with_overrides(cli.overrides());

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => cli::run::run(&settings),
        Commands::Clean => cli::clean::run(&settings).map(|_| ()),
        Commands::Plot => cli::plot::run(&settings),
        Commands::Revenue { top } => cli::revenue::run(&settings, top),
        Commands::Config { init } => cli::config::run(&settings, init),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
