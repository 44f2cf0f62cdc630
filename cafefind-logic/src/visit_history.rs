use std::collections::BTreeMap;

use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::{fix::UtcDT, geo::Location, place::Place, store::KvStore};

/// Store key for the viewed-places history
pub const HISTORY_KEY: &str = "cafeFinderHistory";
/// Only the most recent places are kept
pub const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisitEntry {
    pub id: String,
    pub name: String,
    pub address: String,
    pub categories: String,
    pub photo: Option<String>,
    pub location: Location,
    pub viewed_at: UtcDT,
}

fn read(store: &impl KvStore) -> Vec<VisitEntry> {
    store
        .get(HISTORY_KEY)
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

fn write(store: &impl KvStore, history: &[VisitEntry]) {
    match serde_json::to_string(history) {
        Ok(raw) => store.set(HISTORY_KEY, &raw),
        Err(why) => warn!("Failed to serialize history: {why:?}"),
    }
}

/// The stored history, most recently viewed first.
pub fn load_history(store: &impl KvStore) -> Vec<VisitEntry> {
    read(store)
}

/// Record a viewed place. Re-viewing moves the place to the front instead of
/// duplicating it; the list is capped at [HISTORY_LIMIT].
pub fn record_visit(store: &impl KvStore, place: &Place, now: UtcDT) {
    let mut history = read(store);

    if let Some(existing) = history.iter().position(|item| item.id == place.id) {
        history.remove(existing);
    }

    history.insert(
        0,
        VisitEntry {
            id: place.id.clone(),
            name: place.name.clone(),
            address: place.address.clone(),
            categories: place.categories.clone(),
            photo: place.photo.clone(),
            location: place.location,
            viewed_at: now,
        },
    );

    history.truncate(HISTORY_LIMIT);
    write(store, &history);
}

pub fn remove_visit(store: &impl KvStore, id: &str) {
    let history = read(store)
        .into_iter()
        .filter(|item| item.id != id)
        .collect::<Vec<_>>();
    write(store, &history);
}

pub fn clear_history(store: &impl KvStore) {
    store.remove(HISTORY_KEY);
}

/// Group entries by the UTC day they were viewed, newest first within a day.
pub fn grouped_by_day(entries: &[VisitEntry]) -> BTreeMap<NaiveDate, Vec<VisitEntry>> {
    let mut grouped: BTreeMap<NaiveDate, Vec<VisitEntry>> = BTreeMap::new();
    for entry in entries {
        grouped
            .entry(entry.viewed_at.date_naive())
            .or_default()
            .push(entry.clone());
    }
    for day in grouped.values_mut() {
        day.sort_by(|a, b| b.viewed_at.cmp(&a.viewed_at));
    }
    grouped
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::tests::MemoryStore;

    fn place(id: &str, name: &str) -> Place {
        Place {
            id: id.to_string(),
            name: name.to_string(),
            location: Location::new(-6.2, 106.8),
            address: "Jl. Sudirman 1, Jakarta".to_string(),
            categories: "Coffee Shop".to_string(),
            distance_km: 0.4,
            photo: None,
        }
    }

    fn at(secs: i64) -> UtcDT {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn record_puts_newest_first() {
        let store = MemoryStore::default();
        record_visit(&store, &place("a", "First"), at(0));
        record_visit(&store, &place("b", "Second"), at(10));

        let history = load_history(&store);
        assert_eq!(history[0].id, "b");
        assert_eq!(history[1].id, "a");
    }

    #[test]
    fn reviewing_moves_to_front_without_duplicating() {
        let store = MemoryStore::default();
        record_visit(&store, &place("a", "A"), at(0));
        record_visit(&store, &place("b", "B"), at(10));
        record_visit(&store, &place("a", "A"), at(20));

        let history = load_history(&store);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, "a");
        assert_eq!(history[0].viewed_at, at(20));
    }

    #[test]
    fn history_is_capped() {
        let store = MemoryStore::default();
        for i in 0..60 {
            record_visit(&store, &place(&format!("p{i}"), "P"), at(i));
        }

        let history = load_history(&store);
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0].id, "p59");
        assert_eq!(history.last().unwrap().id, "p10");
    }

    #[test]
    fn remove_and_clear() {
        let store = MemoryStore::default();
        record_visit(&store, &place("a", "A"), at(0));
        record_visit(&store, &place("b", "B"), at(1));

        remove_visit(&store, "a");
        assert_eq!(load_history(&store).len(), 1);

        clear_history(&store);
        assert!(load_history(&store).is_empty());
        assert!(store.get(HISTORY_KEY).is_none());
    }

    #[test]
    fn grouping_splits_on_utc_day() {
        let store = MemoryStore::default();
        let day1 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let day1_later = Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2024, 3, 2, 8, 0, 0).unwrap();

        record_visit(&store, &place("a", "A"), day1);
        record_visit(&store, &place("b", "B"), day1_later);
        record_visit(&store, &place("c", "C"), day2);

        let grouped = grouped_by_day(&load_history(&store));
        assert_eq!(grouped.len(), 2);

        let first_day = &grouped[&day1.date_naive()];
        assert_eq!(first_day.len(), 2);
        // Newest first within the day
        assert_eq!(first_day[0].id, "b");
        assert_eq!(grouped[&day2.date_naive()][0].id, "c");
    }
}
