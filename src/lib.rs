pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::{CliConfig, Command};

pub use crate::config::{cli::LocalStorage, toml_config::AppConfig};
pub use crate::core::{catalog::Catalog, engine::ImportEngine, pipeline::CsvImportPipeline};
pub use crate::utils::error::{CollectorError, Result};
