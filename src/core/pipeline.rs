use reqwest::Client;

use crate::core::catalog::{Catalog, UpsertOutcome};
use crate::domain::model::{Card, ImportReport, ImportSource, ParsedBatch, RowError};
use crate::domain::ports::{ConfigProvider, ImportPipeline, Storage};
use crate::utils::error::{CollectorError, Result};
use crate::utils::validation;

const NAME_ALIASES: &[&str] = &["name", "nome"];
const TYPE_ALIASES: &[&str] = &["type", "types", "tipo"];
const RARITY_ALIASES: &[&str] = &["rarity", "raridade"];
const ID_ALIASES: &[&str] = &["id", "card_id"];
const SET_ID_ALIASES: &[&str] = &["set_id", "setid"];
const SET_NAME_ALIASES: &[&str] = &["set_name", "set"];
const NUMBER_ALIASES: &[&str] = &["number", "card_number", "numero"];
const IMAGE_ALIASES: &[&str] = &["image", "imagem", "image_path", "images_small"];

/// Fetches, parses and commits one CSV batch against the catalog.
pub struct CsvImportPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: Client,
}

impl<S: Storage, C: ConfigProvider> CsvImportPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self {
            storage,
            config,
            client: Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> ImportPipeline for CsvImportPipeline<S, C> {
    async fn fetch(&self, source: &ImportSource) -> Result<Vec<u8>> {
        match source {
            ImportSource::File(path) => {
                tracing::debug!("Reading CSV from {}", path.display());
                Ok(tokio::fs::read(path).await?)
            }
            ImportSource::Url(url) => {
                validation::validate_url("source", url)?;
                tracing::debug!("Fetching CSV from {url}");
                let response = self.client.get(url).send().await?.error_for_status()?;
                Ok(response.bytes().await?.to_vec())
            }
        }
    }

    async fn parse(&self, raw: Vec<u8>) -> Result<ParsedBatch> {
        let text = decode(&raw);
        let delimiter = sniff_delimiter(&text);
        tracing::debug!("Using delimiter {:?}", delimiter as char);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let columns = ColumnMap::from_headers(&headers)?;

        let mut records = Vec::new();
        let mut errors = Vec::new();
        for (index, row) in reader.records().enumerate() {
            let row_number = index + 1;

            if let Some(max) = self.config.max_rows() {
                if records.len() >= max {
                    tracing::warn!("Row cap of {max} reached, remaining rows ignored");
                    break;
                }
            }

            match row {
                Ok(record) => match columns.card_from_row(&record) {
                    Ok(card) => records.push(card),
                    Err(reason) => errors.push(RowError {
                        row: row_number,
                        reason,
                    }),
                },
                Err(e) => errors.push(RowError {
                    row: row_number,
                    reason: e.to_string(),
                }),
            }
        }

        Ok(ParsedBatch { records, errors })
    }

    /// Row errors are carried into the report as skips; the rest of the batch
    /// proceeds. Applying records in order makes a duplicate id within one
    /// file resolve to its last row.
    async fn commit(&self, batch: ParsedBatch) -> Result<ImportReport> {
        let mut catalog = Catalog::load(&self.storage, self.config.catalog_file()).await?;

        let mut report = ImportReport {
            skipped: batch.errors.len(),
            errors: batch.errors,
            ..Default::default()
        };

        for card in batch.records {
            match catalog.upsert(card) {
                UpsertOutcome::Created => report.created += 1,
                UpsertOutcome::Updated => report.updated += 1,
            }
        }

        catalog.save(&self.storage, self.config.catalog_file()).await?;
        Ok(report)
    }
}

/// Strip a UTF-8 BOM and decode, falling back to Latin-1 when the bytes are
/// not valid UTF-8 (older spreadsheet exports).
fn decode(raw: &[u8]) -> String {
    let bytes = raw.strip_prefix(b"\xEF\xBB\xBF".as_slice()).unwrap_or(raw);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            tracing::warn!("CSV is not valid UTF-8, falling back to Latin-1");
            bytes.iter().map(|&b| b as char).collect()
        }
    }
}

/// Spreadsheets exported with European locale settings use `;`.
fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or("");
    if header.matches(';').count() > header.matches(',').count() {
        b';'
    } else {
        b','
    }
}

fn slug(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.trim().to_lowercase().chars() {
        if ch.is_alphanumeric() {
            out.push(ch);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// Header indices resolved once per batch. Aliases cover the column names the
/// common exports use, including the Portuguese ones (nome, tipo, raridade,
/// imagem).
struct ColumnMap {
    id: Option<usize>,
    name: usize,
    card_type: usize,
    rarity: usize,
    set_id: Option<usize>,
    set_name: Option<usize>,
    number: Option<usize>,
    image: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let find = |aliases: &[&str]| {
            headers
                .iter()
                .position(|h| aliases.iter().any(|a| h.trim().eq_ignore_ascii_case(a)))
        };

        let name = find(NAME_ALIASES);
        let card_type = find(TYPE_ALIASES);
        let rarity = find(RARITY_ALIASES);

        let mut missing = Vec::new();
        if name.is_none() {
            missing.push("name");
        }
        if card_type.is_none() {
            missing.push("type");
        }
        if rarity.is_none() {
            missing.push("rarity");
        }
        if !missing.is_empty() {
            return Err(CollectorError::MissingColumnsError {
                columns: missing.join(", "),
            });
        }

        Ok(Self {
            id: find(ID_ALIASES),
            name: name.unwrap(),
            card_type: card_type.unwrap(),
            rarity: rarity.unwrap(),
            set_id: find(SET_ID_ALIASES),
            set_name: find(SET_NAME_ALIASES),
            number: find(NUMBER_ALIASES),
            image: find(IMAGE_ALIASES),
        })
    }

    fn card_from_row(&self, row: &csv::StringRecord) -> std::result::Result<Card, String> {
        let field = |idx: usize| row.get(idx).map(str::trim).filter(|v| !v.is_empty());
        let optional = |idx: Option<usize>| idx.and_then(field).map(str::to_string);

        let name = field(self.name).ok_or("missing name")?.to_string();
        let card_type = field(self.card_type).ok_or("missing type")?.to_string();
        let rarity = field(self.rarity).ok_or("missing rarity")?.to_string();

        let set_id = optional(self.set_id);
        let set_name = optional(self.set_name);
        let number = optional(self.number);

        let id = match optional(self.id) {
            Some(explicit) => explicit,
            None => derive_id(set_id.as_deref(), number.as_deref(), &name, set_name.as_deref()),
        };

        let mut card = Card::new(id, name, card_type, rarity);
        card.set_name = set_name;
        card.number = number;
        card.image_file = optional(self.image);
        Ok(card)
    }
}

fn derive_id(set_id: Option<&str>, number: Option<&str>, name: &str, set_name: Option<&str>) -> String {
    if let (Some(set_id), Some(number)) = (set_id, number) {
        return format!("{}-{}", slug(set_id), slug(number));
    }
    match set_name {
        Some(set) => format!("{}-{}", slug(name), slug(set)),
        None => slug(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                CollectorError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        catalog_file: String,
        max_rows: Option<usize>,
    }

    impl MockConfig {
        fn new() -> Self {
            Self {
                catalog_file: "catalog.json".to_string(),
                max_rows: None,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn catalog_file(&self) -> &str {
            &self.catalog_file
        }

        fn max_rows(&self) -> Option<usize> {
            self.max_rows
        }
    }

    fn pipeline() -> CsvImportPipeline<MockStorage, MockConfig> {
        CsvImportPipeline::new(MockStorage::default(), MockConfig::new())
    }

    #[tokio::test]
    async fn test_parse_reports_malformed_rows_without_aborting() {
        let csv = "\
name,type,rarity,set_id,number
Charizard,Fire,Rare Holo,base1,4
Pikachu,Lightning,,base1,58
Squirtle,Water,Common,base1,63
";
        let batch = pipeline().parse(csv.as_bytes().to_vec()).await.unwrap();

        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.errors.len(), 1);
        assert_eq!(batch.errors[0].row, 2);
        assert_eq!(batch.errors[0].reason, "missing rarity");
    }

    #[tokio::test]
    async fn test_parse_semicolon_delimited() {
        let csv = "name;type;rarity\nCharizard;Fire;Rare\n";
        let batch = pipeline().parse(csv.as_bytes().to_vec()).await.unwrap();

        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].card_type, "Fire");
    }

    #[tokio::test]
    async fn test_parse_portuguese_headers() {
        let csv = "Nome,Tipo,Raridade,Imagem\nPikachu,Lightning,Common,pikachu.png\n";
        let batch = pipeline().parse(csv.as_bytes().to_vec()).await.unwrap();

        assert_eq!(batch.records.len(), 1);
        let card = &batch.records[0];
        assert_eq!(card.name, "Pikachu");
        assert_eq!(card.rarity, "Common");
        assert_eq!(card.image_file.as_deref(), Some("pikachu.png"));
    }

    #[tokio::test]
    async fn test_parse_missing_required_header_fails_batch() {
        let csv = "name,set_id,number\nCharizard,base1,4\n";
        let err = pipeline().parse(csv.as_bytes().to_vec()).await.unwrap_err();

        match err {
            CollectorError::MissingColumnsError { columns } => {
                assert_eq!(columns, "type, rarity");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_parse_strips_bom() {
        let mut bytes = b"\xEF\xBB\xBF".to_vec();
        bytes.extend_from_slice(b"name,type,rarity\nPikachu,Lightning,Common\n");

        let batch = pipeline().parse(bytes).await.unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].name, "Pikachu");
    }

    #[tokio::test]
    async fn test_parse_latin1_fallback() {
        // "Éclair" with a Latin-1 encoded É (0xC9), invalid as UTF-8.
        let mut bytes = b"name,type,rarity\n".to_vec();
        bytes.extend_from_slice(&[0xC9]);
        bytes.extend_from_slice(b"clair,Fairy,Rare\n");

        let batch = pipeline().parse(bytes).await.unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].name, "Éclair");
    }

    #[tokio::test]
    async fn test_id_derivation() {
        let csv = "\
id,name,type,rarity,set_id,number,set_name
explicit-1,Charizard,Fire,Rare,base1,4,Base Set
,Pikachu,Lightning,Common,base1,58,Base Set
,Mew,Psychic,Promo,,,Black Star
,Ditto,Normal,Common,,,
";
        let batch = pipeline().parse(csv.as_bytes().to_vec()).await.unwrap();
        let ids: Vec<&str> = batch.records.iter().map(|c| c.id.as_str()).collect();

        assert_eq!(ids, vec!["explicit-1", "base1-58", "mew-black_star", "ditto"]);
    }

    #[tokio::test]
    async fn test_parse_respects_row_cap() {
        let csv = "name,type,rarity\nA,Fire,Common\nB,Fire,Common\nC,Fire,Common\n";
        let config = MockConfig {
            max_rows: Some(2),
            ..MockConfig::new()
        };
        let pipeline = CsvImportPipeline::new(MockStorage::default(), config);

        let batch = pipeline.parse(csv.as_bytes().to_vec()).await.unwrap();
        assert_eq!(batch.records.len(), 2);
    }

    #[tokio::test]
    async fn test_commit_counts_created_and_updated() {
        let storage = MockStorage::default();
        let pipeline = CsvImportPipeline::new(storage.clone(), MockConfig::new());

        let csv = "name,type,rarity,set_id,number\nCharizard,Fire,Rare,base1,4\nPikachu,Lightning,Common,base1,58\n";
        let batch = pipeline.parse(csv.as_bytes().to_vec()).await.unwrap();
        let report = pipeline.commit(batch).await.unwrap();

        assert_eq!(report.created, 2);
        assert_eq!(report.updated, 0);
        assert_eq!(report.skipped, 0);

        // Re-importing the identical file touches the same ids: idempotent.
        let batch = pipeline.parse(csv.as_bytes().to_vec()).await.unwrap();
        let report = pipeline.commit(batch).await.unwrap();

        assert_eq!(report.created, 0);
        assert_eq!(report.updated, 2);

        let catalog = Catalog::load(&storage, "catalog.json").await.unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[tokio::test]
    async fn test_commit_preserves_ownership_across_reimport() {
        let storage = MockStorage::default();
        let pipeline = CsvImportPipeline::new(storage.clone(), MockConfig::new());

        let csv = "name,type,rarity,set_id,number\nCharizard,Fire,Rare,base1,4\n";
        let batch = pipeline.parse(csv.as_bytes().to_vec()).await.unwrap();
        pipeline.commit(batch).await.unwrap();

        let mut catalog = Catalog::load(&storage, "catalog.json").await.unwrap();
        catalog.set_owned("base1-4", true).unwrap();
        catalog.save(&storage, "catalog.json").await.unwrap();

        let batch = pipeline.parse(csv.as_bytes().to_vec()).await.unwrap();
        pipeline.commit(batch).await.unwrap();

        let catalog = Catalog::load(&storage, "catalog.json").await.unwrap();
        assert!(catalog.is_owned("base1-4"));
    }

    #[tokio::test]
    async fn test_commit_carries_row_errors_as_skips() {
        let pipeline = pipeline();
        let csv = "name,type,rarity\nCharizard,Fire,Rare\nNoType,,Common\n";

        let batch = pipeline.parse(csv.as_bytes().to_vec()).await.unwrap();
        let report = pipeline.commit(batch).await.unwrap();

        assert_eq!(report.created, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].row, 2);
    }

    #[tokio::test]
    async fn test_fetch_from_url() {
        let server = MockServer::start();
        let csv_body = "name,type,rarity\nCharizard,Fire,Rare\n";

        let csv_mock = server.mock(|when, then| {
            when.method(GET).path("/cards.csv");
            then.status(200)
                .header("Content-Type", "text/csv")
                .body(csv_body);
        });

        let source = ImportSource::Url(server.url("/cards.csv"));
        let raw = pipeline().fetch(&source).await.unwrap();

        csv_mock.assert();
        assert_eq!(raw, csv_body.as_bytes());
    }

    #[tokio::test]
    async fn test_fetch_rejects_bad_url() {
        let source = ImportSource::Url("ftp://example.com/cards.csv".to_string());
        let err = pipeline().fetch(&source).await.unwrap_err();
        assert!(matches!(err, CollectorError::InvalidConfigValueError { .. }));
    }

    #[tokio::test]
    async fn test_fetch_surfaces_http_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/cards.csv");
            then.status(500);
        });

        let source = ImportSource::Url(server.url("/cards.csv"));
        let err = pipeline().fetch(&source).await.unwrap_err();
        assert!(matches!(err, CollectorError::ApiError(_)));
    }

    #[tokio::test]
    async fn test_fetch_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cards.csv");
        std::fs::write(&path, "name,type,rarity\n").unwrap();

        let source = ImportSource::File(path);
        let raw = pipeline().fetch(&source).await.unwrap();
        assert_eq!(raw, b"name,type,rarity\n");
    }
}
