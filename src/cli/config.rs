use std::path::Path;

use crate::error::Result;
use crate::settings::{save_settings, settings_file_exists, settings_path, Settings};

fn presence(path: &Path) -> &'static str {
    if path.exists() {
        "found"
    } else {
        "missing"
    }
}

pub fn run(settings: &Settings, init: bool) -> Result<()> {
    if init {
        save_settings(settings)?;
        println!("Wrote {}", settings_path().display());
    }

    let input = settings.input_path();
    let output = settings.output_path();
    let config = if settings_file_exists() { "found" } else { "not set, using defaults" };

    println!("Settings:   {} ({config})", settings_path().display());
    println!("Input:      {} ({})", input.display(), presence(&input));
    println!("Output:     {} ({})", output.display(), presence(&output));
    println!("Plots dir:  {}", settings.plots_path().display());
    if !settings.extra_sentinels.is_empty() {
        println!("Sentinels:  {}", settings.extra_sentinels.join(", "));
    }
    Ok(())
}
