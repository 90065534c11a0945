pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use crate::config::toml_config::AppConfig;
#[cfg(feature = "cli")]
use crate::domain::ports::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};

#[cfg(feature = "cli")]
pub const DEFAULT_DATA_DIR: &str = "./data";

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "collector")]
#[command(about = "Card catalog manager: import CSVs, track ownership, report stats")]
pub struct CliConfig {
    /// Directory holding the catalog snapshot and export bundles
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: String,

    /// Catalog snapshot file, relative to the data directory
    #[arg(long, default_value = "catalog.json")]
    pub catalog_file: String,

    /// Card artwork directories, highest priority first
    #[arg(long, value_delimiter = ',')]
    pub images_dir: Vec<String>,

    /// Optional TOML settings file
    #[arg(long)]
    pub config: Option<String>,

    /// Cap on imported data rows
    #[arg(long)]
    pub max_rows: Option<usize>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log as JSON instead of compact text")]
    pub log_json: bool,

    #[arg(long, help = "Log system usage while importing")]
    pub monitor: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Import cards from a CSV file or URL
    Import { source: String },

    /// List catalog cards, optionally filtered
    List {
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "type")]
        card_type: Option<String>,
        #[arg(long)]
        rarity: Option<String>,
    },

    /// Mark a card as owned (or clear the mark with --remove)
    Own {
        id: String,
        #[arg(long)]
        remove: bool,
    },

    /// Print aggregate collection statistics
    Stats,

    /// Write a zip bundle with the catalog CSV and stats JSON
    Export {
        #[arg(long, default_value = "collection_export.zip")]
        output: String,
    },
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Fill in anything the command line left unset from the TOML settings
    /// file. Flags always win over file values.
    pub fn apply_file_settings(&mut self, file: &AppConfig) {
        if let Some(catalog) = &file.catalog {
            if self.data_dir == DEFAULT_DATA_DIR {
                if let Some(data_dir) = &catalog.data_dir {
                    self.data_dir = data_dir.clone();
                }
            }
            if self.catalog_file == "catalog.json" {
                if let Some(file_name) = &catalog.file {
                    self.catalog_file = file_name.clone();
                }
            }
        }

        if self.images_dir.is_empty() {
            if let Some(images) = &file.images {
                if let Some(directories) = &images.directories {
                    self.images_dir = directories.clone();
                }
            }
        }

        if self.max_rows.is_none() {
            if let Some(import) = &file.import {
                self.max_rows = import.max_rows;
            }
        }

        if let Some(monitoring) = &file.monitoring {
            self.monitor = self.monitor || monitoring.enabled;
        }
    }
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn catalog_file(&self) -> &str {
        &self.catalog_file
    }

    fn max_rows(&self) -> Option<usize> {
        self.max_rows
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("data_dir", &self.data_dir)?;
        validation::validate_non_empty_string("catalog_file", &self.catalog_file)?;
        for dir in &self.images_dir {
            validation::validate_path("images_dir", dir)?;
        }
        if let Some(max_rows) = self.max_rows {
            validation::validate_positive_number("max_rows", max_rows, 1)?;
        }
        Ok(())
    }
}
