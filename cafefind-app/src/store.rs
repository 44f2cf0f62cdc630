use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use log::error;

use cafefind_logic::{KvStore, prelude::*};

/// [KvStore] over a single JSON object file, written through on every
/// mutation. The file plays the role the browser's local storage does: flat
/// string values, no schema.
pub struct JsonStore {
    path: PathBuf,
    data: Mutex<BTreeMap<String, String>>,
}

impl JsonStore {
    pub fn open(path: &Path) -> Result<Self> {
        let data = if path.exists() {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Failed to read store file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Store file {} is not valid JSON", path.display()))?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            data: Mutex::new(data),
        })
    }

    fn save(&self, data: &BTreeMap<String, String>) {
        let raw = match serde_json::to_string_pretty(data) {
            Ok(raw) => raw,
            Err(why) => {
                error!("Failed to serialize store: {why:?}");
                return;
            }
        };
        if let Err(why) = fs::write(&self.path, raw) {
            error!("Failed to write store file {}: {why:?}", self.path.display());
        }
    }
}

impl KvStore for JsonStore {
    fn get(&self, key: &str) -> Option<String> {
        self.data.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut data = self.data.lock().unwrap();
        data.insert(key.to_string(), value.to_string());
        self.save(&data);
    }

    fn remove(&self, key: &str) {
        let mut data = self.data.lock().unwrap();
        if data.remove(key).is_some() {
            self.save(&data);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("cafefind-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn values_survive_a_reopen() {
        let path = temp_store_path("reopen");
        let _ = fs::remove_file(&path);

        let store = JsonStore::open(&path).unwrap();
        store.set("cafeFinderFavorites", "[]");
        store.set("locationPermissionStatus", "granted");
        drop(store);

        let reopened = JsonStore::open(&path).unwrap();
        assert_eq!(reopened.get("cafeFinderFavorites").as_deref(), Some("[]"));
        assert_eq!(
            reopened.get("locationPermissionStatus").as_deref(),
            Some("granted")
        );

        reopened.remove("locationPermissionStatus");
        let reopened = JsonStore::open(&path).unwrap();
        assert!(reopened.get("locationPermissionStatus").is_none());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn missing_file_starts_empty() {
        let path = temp_store_path("missing");
        let _ = fs::remove_file(&path);

        let store = JsonStore::open(&path).unwrap();
        assert!(store.get("anything").is_none());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let path = temp_store_path("corrupt");
        fs::write(&path, "not json at all").unwrap();

        assert!(JsonStore::open(&path).is_err());

        let _ = fs::remove_file(&path);
    }
}
