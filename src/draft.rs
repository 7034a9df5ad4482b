//! Persistence of the airdrop form between sessions.
//!
//! Each text field is stored verbatim under its own key, read once at startup
//! and written back on every edit. Values are not parsed or validated here.

use crate::user_settings::app_data_dir;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, warn};

const DRAFT_FILE: &str = "tsender_drafts.json";

#[derive(Debug, Error)]
pub enum DraftStoreError {
    #[error("failed to access draft file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("draft file {path:?} is not a JSON object of strings: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Key/value storage for form drafts
pub trait DraftStore {
    fn get(&self, key: &str) -> Result<Option<String>, DraftStoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), DraftStoreError>;

    fn remove(&self, key: &str) -> Result<(), DraftStoreError>;
}

/// Drafts kept in a flat JSON object on disk
pub struct FileDraftStore {
    path: PathBuf,
}

impl FileDraftStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store in the application data directory
    pub fn in_app_data_dir() -> Self {
        Self::new(app_data_dir().join(DRAFT_FILE))
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, DraftStoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|source| DraftStoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|source| DraftStoreError::Format {
            path: self.path.clone(),
            source,
        })
    }

    /// Entries to start a write from. A file that no longer parses is
    /// replaced rather than blocking every later save.
    fn read_for_write(&self) -> Result<BTreeMap<String, String>, DraftStoreError> {
        match self.read_all() {
            Err(DraftStoreError::Format { path, source }) => {
                warn!("Discarding unreadable draft file {}: {}", path.display(), source);
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), DraftStoreError> {
        let content = serde_json::to_string_pretty(entries).map_err(|source| DraftStoreError::Format {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, content).map_err(|source| DraftStoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl DraftStore for FileDraftStore {
    fn get(&self, key: &str) -> Result<Option<String>, DraftStoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DraftStoreError> {
        let mut entries = self.read_for_write()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), DraftStoreError> {
        let mut entries = self.read_for_write()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// Process-local store that never touches the disk
#[derive(Default)]
pub struct MemoryDraftStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryDraftStore {
    // A panic elsewhere cannot leave a half-written String behind
    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DraftStore for MemoryDraftStore {
    fn get(&self, key: &str) -> Result<Option<String>, DraftStoreError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DraftStoreError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), DraftStoreError> {
        self.entries().remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    TokenAddress,
    Recipients,
    Amounts,
}

impl FormField {
    pub const ALL: [FormField; 3] = [FormField::TokenAddress, FormField::Recipients, FormField::Amounts];

    pub fn storage_key(&self) -> &'static str {
        match self {
            FormField::TokenAddress => "tokenAddress",
            FormField::Recipients => "recipients",
            FormField::Amounts => "amounts",
        }
    }
}

/// The three raw text fields of the airdrop form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormDraft {
    pub token_address: String,
    pub recipients: String,
    pub amounts: String,
}

impl FormDraft {
    pub fn field(&self, field: FormField) -> &str {
        match field {
            FormField::TokenAddress => &self.token_address,
            FormField::Recipients => &self.recipients,
            FormField::Amounts => &self.amounts,
        }
    }

    pub fn field_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::TokenAddress => &mut self.token_address,
            FormField::Recipients => &mut self.recipients,
            FormField::Amounts => &mut self.amounts,
        }
    }

    /// Seed a draft from the store. Missing or empty entries leave the field
    /// empty; a failing store is logged and treated as empty.
    pub fn load<S: DraftStore + ?Sized>(store: &S) -> Self {
        let mut draft = Self::default();
        for field in FormField::ALL {
            match store.get(field.storage_key()) {
                Ok(Some(value)) if !value.is_empty() => *draft.field_mut(field) = value,
                Ok(_) => {}
                Err(e) => warn!("Could not read draft field {}: {}", field.storage_key(), e),
            }
        }
        debug!("Loaded form draft ({} bytes)", draft.token_address.len() + draft.recipients.len() + draft.amounts.len());
        draft
    }

    /// Write one field back under its key
    pub fn persist<S: DraftStore + ?Sized>(&self, field: FormField, store: &S) -> Result<(), DraftStoreError> {
        store.set(field.storage_key(), self.field(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_draft_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tsender_drafts_{}_{}.json", name, std::process::id()))
    }

    // ==================== FormField tests ====================

    #[test]
    fn test_storage_keys() {
        assert_eq!(FormField::TokenAddress.storage_key(), "tokenAddress");
        assert_eq!(FormField::Recipients.storage_key(), "recipients");
        assert_eq!(FormField::Amounts.storage_key(), "amounts");
    }

    // ==================== MemoryDraftStore tests ====================

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryDraftStore::new();
        let draft = FormDraft {
            token_address: "0xabc".to_string(),
            recipients: "0x1,\n 0x2 ,".to_string(),
            amounts: "not even numbers".to_string(),
        };
        for field in FormField::ALL {
            draft.persist(field, &store).unwrap();
        }
        assert_eq!(FormDraft::load(&store), draft);
    }

    #[test]
    fn test_load_from_empty_store() {
        assert_eq!(FormDraft::load(&MemoryDraftStore::new()), FormDraft::default());
    }

    #[test]
    fn test_persist_writes_only_that_field() {
        let store = MemoryDraftStore::new();
        let mut draft = FormDraft::default();
        draft.amounts = "1,2".to_string();
        draft.recipients = "unsaved".to_string();
        draft.persist(FormField::Amounts, &store).unwrap();

        assert_eq!(store.get("amounts").unwrap().as_deref(), Some("1,2"));
        assert!(store.get("recipients").unwrap().is_none());
    }

    #[test]
    fn test_memory_store_remove() {
        let store = MemoryDraftStore::new();
        store.set("tokenAddress", "0xabc").unwrap();
        store.remove("tokenAddress").unwrap();
        assert!(store.get("tokenAddress").unwrap().is_none());
    }

    // ==================== FileDraftStore tests ====================

    #[test]
    fn test_file_store_round_trip_across_instances() {
        let path = temp_draft_path("round_trip");
        let _ = fs::remove_file(&path);

        let draft = FormDraft {
            token_address: "0x00000000000000000000000000000000000000aa".to_string(),
            recipients: "0x01\n0x02".to_string(),
            amounts: "100,200\n300".to_string(),
        };
        {
            let store = FileDraftStore::new(path.clone());
            for field in FormField::ALL {
                draft.persist(field, &store).unwrap();
            }
        }
        let reopened = FileDraftStore::new(path.clone());
        let loaded = FormDraft::load(&reopened);
        let _ = fs::remove_file(&path);

        assert_eq!(loaded, draft);
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let store = FileDraftStore::new(temp_draft_path("missing"));
        assert!(store.get("amounts").unwrap().is_none());
    }

    #[test]
    fn test_file_store_remove() {
        let path = temp_draft_path("remove");
        let _ = fs::remove_file(&path);
        let store = FileDraftStore::new(path.clone());
        store.set("amounts", "1").unwrap();
        store.set("recipients", "0x1").unwrap();
        store.remove("amounts").unwrap();

        let amounts = store.get("amounts").unwrap();
        let recipients = store.get("recipients").unwrap();
        let _ = fs::remove_file(&path);

        assert!(amounts.is_none());
        assert_eq!(recipients.as_deref(), Some("0x1"));
    }

    #[test]
    fn test_file_store_corrupt_file_reports_format_error() {
        let path = temp_draft_path("corrupt");
        fs::write(&path, "[1, 2, 3]").unwrap();
        let store = FileDraftStore::new(path.clone());
        let result = store.get("amounts");
        // Loading a draft from a broken store still yields an empty form
        let draft = FormDraft::load(&store);
        let _ = fs::remove_file(&path);

        assert!(matches!(result, Err(DraftStoreError::Format { .. })));
        assert_eq!(draft, FormDraft::default());
    }

    #[test]
    fn test_file_store_write_replaces_corrupt_file() {
        let path = temp_draft_path("overwrite_corrupt");
        fs::write(&path, r#"{"amounts": 5}"#).unwrap();
        let store = FileDraftStore::new(path.clone());

        let draft = FormDraft {
            token_address: "0xabc".to_string(),
            recipients: String::new(),
            amounts: "100,200".to_string(),
        };
        let amounts = draft.persist(FormField::Amounts, &store);
        let token = draft.persist(FormField::TokenAddress, &store);
        let loaded = FormDraft::load(&FileDraftStore::new(path.clone()));
        let _ = fs::remove_file(&path);

        assert!(amounts.is_ok());
        assert!(token.is_ok());
        assert_eq!(loaded, draft);
    }

    #[test]
    fn test_memory_store_writes_after_poisoned_lock() {
        let store = std::sync::Arc::new(MemoryDraftStore::new());
        let poisoner = std::sync::Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.entries.lock().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert!(store.entries.is_poisoned());

        store.set("amounts", "7").unwrap();
        assert_eq!(store.get("amounts").unwrap().as_deref(), Some("7"));
        store.remove("amounts").unwrap();
        assert!(store.get("amounts").unwrap().is_none());
    }
}
