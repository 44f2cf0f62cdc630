use log::warn;
use serde::{Deserialize, Serialize};

use crate::{fix::UtcDT, store::KvStore};

/// Store key for the favorites list
pub const FAVORITES_KEY: &str = "cafeFinderFavorites";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FavoriteEntry {
    pub id: String,
    pub name: String,
    /// When the place was favorited
    pub date: UtcDT,
}

fn read(store: &impl KvStore) -> Vec<FavoriteEntry> {
    store
        .get(FAVORITES_KEY)
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

fn write(store: &impl KvStore, favorites: &[FavoriteEntry]) {
    match serde_json::to_string(favorites) {
        Ok(raw) => store.set(FAVORITES_KEY, &raw),
        Err(why) => warn!("Failed to serialize favorites: {why:?}"),
    }
}

/// All favorites, newest first.
pub fn load_favorites(store: &impl KvStore) -> Vec<FavoriteEntry> {
    let mut favorites = read(store);
    favorites.sort_by(|a, b| b.date.cmp(&a.date));
    favorites
}

/// Add the place to favorites, or remove it if it's already there.
/// Returns true when the place was added.
pub fn toggle_favorite(store: &impl KvStore, id: &str, name: &str, now: UtcDT) -> bool {
    let mut favorites = read(store);

    let added = if let Some(existing) = favorites.iter().position(|fav| fav.id == id) {
        favorites.remove(existing);
        false
    } else {
        favorites.push(FavoriteEntry {
            id: id.to_string(),
            name: name.to_string(),
            date: now,
        });
        true
    };

    write(store, &favorites);
    added
}

pub fn remove_favorite(store: &impl KvStore, id: &str) {
    let favorites = read(store)
        .into_iter()
        .filter(|fav| fav.id != id)
        .collect::<Vec<_>>();
    write(store, &favorites);
}

pub fn is_favorite(store: &impl KvStore, id: &str) -> bool {
    read(store).iter().any(|fav| fav.id == id)
}
