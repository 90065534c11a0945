use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single catalog entry. `id` is the deduplication key: the explicit `id`
/// column when the CSV carries one, otherwise set id + card number, otherwise
/// a slug of name + set. No two catalog entries share an id after import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub name: String,
    pub card_type: String,
    pub rarity: String,
    pub set_name: Option<String>,
    pub number: Option<String>,
    pub image_file: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        card_type: impl Into<String>,
        rarity: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            card_type: card_type.into(),
            rarity: rarity.into(),
            set_name: None,
            number: None,
            image_file: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Where an import batch comes from.
#[derive(Debug, Clone)]
pub enum ImportSource {
    File(PathBuf),
    Url(String),
}

impl ImportSource {
    pub fn from_arg(arg: &str) -> Self {
        if arg.starts_with("http://") || arg.starts_with("https://") {
            Self::Url(arg.to_string())
        } else {
            Self::File(PathBuf::from(arg))
        }
    }
}

impl fmt::Display for ImportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize,
    pub reason: String,
}

/// Rows parsed out of one uploaded CSV. Transient: lives only for the
/// duration of a single import run.
#[derive(Debug, Clone, Default)]
pub struct ParsedBatch {
    pub records: Vec<Card>,
    pub errors: Vec<RowError>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportReport {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: Vec<RowError>,
}

/// Listing filter. Name is a case-insensitive substring match, type and
/// rarity are case-insensitive equality.
#[derive(Debug, Clone, Default)]
pub struct CardFilter {
    pub name: Option<String>,
    pub card_type: Option<String>,
    pub rarity: Option<String>,
}

impl CardFilter {
    pub fn matches(&self, card: &Card) -> bool {
        if let Some(name) = &self.name {
            if !card.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }
        if let Some(card_type) = &self.card_type {
            if !card.card_type.eq_ignore_ascii_case(card_type) {
                return false;
            }
        }
        if let Some(rarity) = &self.rarity {
            if !card.rarity.eq_ignore_ascii_case(rarity) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupStats {
    pub key: String,
    pub total: usize,
    pub owned: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionStats {
    pub total: usize,
    pub owned: usize,
    pub percent: f64,
    pub by_type: Vec<GroupStats>,
    pub by_rarity: Vec<GroupStats>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_detection() {
        assert!(matches!(
            ImportSource::from_arg("https://example.com/cards.csv"),
            ImportSource::Url(_)
        ));
        assert!(matches!(
            ImportSource::from_arg("./downloads/cards.csv"),
            ImportSource::File(_)
        ));
        assert!(matches!(ImportSource::from_arg("httpish.csv"), ImportSource::File(_)));
    }

    #[test]
    fn test_filter_name_is_substring_case_insensitive() {
        let card = Card::new("base1-58", "Pikachu", "Lightning", "Common");

        let filter = CardFilter {
            name: Some("pika".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&card));

        let filter = CardFilter {
            name: Some("charizard".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&card));
    }

    #[test]
    fn test_filter_type_and_rarity_are_exact() {
        let card = Card::new("base1-4", "Charizard", "Fire", "Rare Holo");

        let filter = CardFilter {
            rarity: Some("rare holo".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&card));

        // "Rare" must not match "Rare Holo"
        let filter = CardFilter {
            rarity: Some("Rare".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&card));

        let filter = CardFilter {
            card_type: Some("Fire".to_string()),
            rarity: Some("Rare Holo".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&card));
    }
}
