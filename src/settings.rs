use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CleanError, Result};
use crate::importer::Sentinels;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_input_file")]
    pub input_file: String,
    #[serde(default = "default_output_file")]
    pub output_file: String,
    #[serde(default = "default_plots_dir")]
    pub plots_dir: String,
    /// Added to the built-in missing-value sentinels.
    #[serde(default)]
    pub extra_sentinels: Vec<String>,
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_input_file() -> String {
    "dirty_cafe_sales.csv".to_string()
}

fn default_output_file() -> String {
    "cleaned_cafe_sales.csv".to_string()
}

fn default_plots_dir() -> String {
    "plots".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            input_file: default_input_file(),
            output_file: default_output_file(),
            plots_dir: default_plots_dir(),
            extra_sentinels: Vec::new(),
        }
    }
}

/// Command-line overrides; `None` keeps the configured value.
#[derive(Debug, Default)]
pub struct Overrides {
    pub input: Option<String>,
    pub output: Option<String>,
    pub plots_dir: Option<String>,
}

impl Settings {
    pub fn input_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.input_file)
    }

    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.output_file)
    }

    pub fn plots_path(&self) -> PathBuf {
        PathBuf::from(&self.plots_dir)
    }

    pub fn sentinels(&self) -> Sentinels {
        Sentinels::with_extra(self.extra_sentinels.iter().cloned())
    }

    /// An `--input` path replaces both the data dir and the file name.
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(input) = overrides.input {
            let path = PathBuf::from(input);
            self.data_dir = path
                .parent()
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_default();
            self.input_file = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
        }
        if let Some(output) = overrides.output {
            self.output_file = output;
        }
        if let Some(plots_dir) = overrides.plots_dir {
            self.plots_dir = plots_dir;
        }
        self
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("cafe-clean")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

/// Missing or unreadable settings fall back to the defaults.
pub fn load_settings_from(path: &Path) -> Settings {
    if path.exists() {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(settings, &settings_path())
}

pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| CleanError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}
