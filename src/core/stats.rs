use std::collections::BTreeMap;

use crate::core::catalog::Catalog;
use crate::domain::model::{Card, CollectionStats, GroupStats};

/// Aggregate completion figures for the whole collection. Pure function of
/// the current catalog + ownership state.
pub fn collection_stats(catalog: &Catalog) -> CollectionStats {
    let total = catalog.len();
    let owned = catalog.owned_count();

    CollectionStats {
        total,
        owned,
        percent: percent(owned, total),
        by_type: group_by(catalog, |card| card.card_type.clone()),
        by_rarity: group_by(catalog, |card| card.rarity.clone()),
    }
}

fn percent(owned: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        owned as f64 / total as f64 * 100.0
    }
}

fn group_by<F>(catalog: &Catalog, key: F) -> Vec<GroupStats>
where
    F: Fn(&Card) -> String,
{
    let mut groups: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for card in catalog.cards() {
        let entry = groups.entry(key(card)).or_default();
        entry.0 += 1;
        if catalog.is_owned(&card.id) {
            entry.1 += 1;
        }
    }

    groups
        .into_iter()
        .map(|(key, (total, owned))| GroupStats {
            key,
            total,
            owned,
            percent: percent(owned, total),
        })
        .collect()
}
