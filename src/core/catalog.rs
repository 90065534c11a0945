use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::domain::model::{Card, CardFilter};
use crate::domain::ports::Storage;
use crate::utils::error::{CollectorError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// The universe of known cards plus the user's ownership marks.
///
/// Ownership is a separate relation rather than a card field so that
/// re-importing a CSV (which rewrites card fields, last write wins) cannot
/// clobber what the user already marked.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Catalog {
    cards: BTreeMap<String, Card>,
    owned: BTreeSet<String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Card> {
        self.cards.get(id)
    }

    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.values()
    }

    /// Merge by id, last write wins. Optional fields only overwrite when the
    /// incoming record actually carries a value, matching how a sparse CSV
    /// re-export should not erase data a fuller one provided earlier.
    pub fn upsert(&mut self, card: Card) -> UpsertOutcome {
        match self.cards.get_mut(&card.id) {
            Some(existing) => {
                existing.name = card.name;
                existing.card_type = card.card_type;
                existing.rarity = card.rarity;
                if card.set_name.is_some() {
                    existing.set_name = card.set_name;
                }
                if card.number.is_some() {
                    existing.number = card.number;
                }
                if card.image_file.is_some() {
                    existing.image_file = card.image_file;
                }
                existing.updated_at = Utc::now();
                UpsertOutcome::Updated
            }
            None => {
                self.cards.insert(card.id.clone(), card);
                UpsertOutcome::Created
            }
        }
    }

    /// Matching cards ordered by name (id as tiebreak so listing order is
    /// stable across runs).
    pub fn list(&self, filter: &CardFilter) -> Vec<&Card> {
        let mut matches: Vec<&Card> = self.cards.values().filter(|c| filter.matches(c)).collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        matches
    }

    /// Idempotent: marking an owned card owned (or clearing an unmarked one)
    /// is a no-op.
    pub fn set_owned(&mut self, id: &str, owned: bool) -> Result<()> {
        if !self.cards.contains_key(id) {
            return Err(CollectorError::UnknownCardError { id: id.to_string() });
        }
        if owned {
            self.owned.insert(id.to_string());
        } else {
            self.owned.remove(id);
        }
        Ok(())
    }

    pub fn is_owned(&self, id: &str) -> bool {
        self.owned.contains(id)
    }

    pub fn owned_count(&self) -> usize {
        self.owned.len()
    }

    /// Load a catalog snapshot. A missing file is an empty catalog, not an
    /// error: the first import of a fresh data directory starts from nothing.
    pub async fn load<S: Storage>(storage: &S, path: &str) -> Result<Self> {
        match storage.read_file(path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(CollectorError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No catalog snapshot at {path}, starting empty");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn save<S: Storage>(&self, storage: &S, path: &str) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(self)?;
        storage.write_file(path, &bytes).await
    }
}
