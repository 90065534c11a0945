use std::path::Path;

use clap::Parser;

use collector::config::Command;
use collector::core::{export, images, stats};
use collector::domain::model::{CardFilter, ImportSource};
use collector::domain::ports::Storage;
use collector::utils::{logger, validation::Validate};
use collector::{AppConfig, Catalog, CliConfig, CsvImportPipeline, ImportEngine, LocalStorage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = CliConfig::parse();

    logger::init_cli_logger(config.verbose, config.log_json);

    tracing::info!("Starting collector");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Some(path) = config.config.clone() {
        let file = AppConfig::from_file(&path)?;
        file.validate()?;
        config.apply_file_settings(&file);
        tracing::debug!("Applied settings from {path}");
    }

    if config.images_dir.is_empty() {
        if let Ok(dir) = std::env::var(images::IMAGES_DIR_ENV) {
            config.images_dir.push(dir);
        }
    }

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {e}");
        eprintln!("❌ {e}");
        std::process::exit(1);
    }

    let storage = LocalStorage::new(config.data_dir.clone());

    match config.command.clone() {
        Command::Import { source } => {
            let source = ImportSource::from_arg(&source);
            let monitor = config.monitor;
            let pipeline = CsvImportPipeline::new(storage, config);
            let engine = ImportEngine::new_with_monitoring(pipeline, monitor);

            let report = engine.run(&source).await?;
            println!(
                "✅ Import finished: {} created, {} updated, {} skipped",
                report.created, report.updated, report.skipped
            );
            for error in &report.errors {
                println!("  row {}: {}", error.row, error.reason);
            }
        }

        Command::List { name, card_type, rarity } => {
            let catalog = Catalog::load(&storage, &config.catalog_file).await?;
            let filter = CardFilter { name, card_type, rarity };
            let roots = images::search_roots(&config.images_dir);

            let matches = catalog.list(&filter);
            println!("{} card(s)", matches.len());
            for card in matches {
                let owned = if catalog.is_owned(&card.id) { "owned" } else { "missing" };
                let thumbnail = card
                    .image_file
                    .as_deref()
                    .and_then(|file| images::resolve_card_image(file, &roots))
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{} | {} | {} | {} | {} | {}",
                    card.id, card.name, card.card_type, card.rarity, owned, thumbnail
                );
            }
        }

        Command::Own { id, remove } => {
            let mut catalog = Catalog::load(&storage, &config.catalog_file).await?;
            catalog.set_owned(&id, !remove)?;
            catalog.save(&storage, &config.catalog_file).await?;
            println!("{} is now {}", id, if remove { "missing" } else { "owned" });
        }

        Command::Stats => {
            let catalog = Catalog::load(&storage, &config.catalog_file).await?;
            let stats = stats::collection_stats(&catalog);

            println!(
                "Cards: {} | Owned: {} ({:.1}%)",
                stats.total, stats.owned, stats.percent
            );
            if !stats.by_type.is_empty() {
                println!("By type:");
                for group in &stats.by_type {
                    println!(
                        "  {}: {}/{} ({:.1}%)",
                        group.key, group.owned, group.total, group.percent
                    );
                }
            }
            if !stats.by_rarity.is_empty() {
                println!("By rarity:");
                for group in &stats.by_rarity {
                    println!(
                        "  {}: {}/{} ({:.1}%)",
                        group.key, group.owned, group.total, group.percent
                    );
                }
            }
        }

        Command::Export { output } => {
            let catalog = Catalog::load(&storage, &config.catalog_file).await?;
            let bundle = export::export_bundle(&catalog)?;
            storage.write_file(&output, &bundle).await?;
            println!(
                "📁 Export saved to {}",
                Path::new(&config.data_dir).join(&output).display()
            );
        }
    }

    Ok(())
}
