use std::io::Write;

use zip::write::{FileOptions, ZipWriter};

use crate::core::catalog::Catalog;
use crate::core::stats;
use crate::domain::model::CardFilter;
use crate::utils::error::{CollectorError, Result};

/// Bundle the full catalog (CSV) and the aggregate stats (JSON) into a zip,
/// ready to hand to a spreadsheet or another tool.
pub fn export_bundle(catalog: &Catalog) -> Result<Vec<u8>> {
    let csv_output = catalog_csv(catalog)?;
    let stats_json = serde_json::to_string_pretty(&stats::collection_stats(catalog))?;

    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    zip.start_file::<_, ()>("catalog.csv", FileOptions::default())?;
    zip.write_all(csv_output.as_bytes())?;

    zip.start_file::<_, ()>("stats.json", FileOptions::default())?;
    zip.write_all(stats_json.as_bytes())?;

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

fn catalog_csv(catalog: &Catalog) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["id", "name", "type", "rarity", "set_name", "number", "image", "owned"])?;

    for card in catalog.list(&CardFilter::default()) {
        writer.write_record([
            card.id.as_str(),
            card.name.as_str(),
            card.card_type.as_str(),
            card.rarity.as_str(),
            card.set_name.as_deref().unwrap_or(""),
            card.number.as_deref().unwrap_or(""),
            card.image_file.as_deref().unwrap_or(""),
            if catalog.is_owned(&card.id) { "true" } else { "false" },
        ])?;
    }

    let bytes = writer.into_inner().map_err(|e| CollectorError::ProcessingError {
        message: e.to_string(),
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
