//! In-memory host backends for testing and development

use crate::core::store::{OptionBackend, RecordBackend};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// In-memory global key/value namespace
///
/// Uses RwLock for thread-safe access; clones share the same namespace.
#[derive(Clone, Default)]
pub struct InMemoryOptions {
    options: Arc<RwLock<IndexMap<String, Value>>>,
}

impl InMemoryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored option
    pub fn snapshot(&self) -> IndexMap<String, Value> {
        self.options
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl OptionBackend for InMemoryOptions {
    fn get_option(&self, key: &str) -> Option<Value> {
        self.options
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn add_option(&self, key: &str, value: &Value) -> bool {
        let mut options = self.options.write().unwrap_or_else(PoisonError::into_inner);
        if options.contains_key(key) {
            return false;
        }
        options.insert(key.to_string(), value.clone());
        true
    }

    fn update_option(&self, key: &str, value: &Value) -> bool {
        self.options
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.clone());
        true
    }

    fn delete_option(&self, key: &str) -> bool {
        self.options
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .shift_remove(key)
            .is_some()
    }
}

#[derive(Default)]
struct RecordTables {
    next_id: i64,
    records: IndexMap<String, IndexMap<i64, Map<String, Value>>>,
    meta: HashMap<i64, Map<String, Value>>,
}

/// In-memory structured records with side-storage
///
/// Ids are positive integers assigned on insert. Records live in named
/// containers; side-storage is shared across containers and keyed by id.
#[derive(Clone)]
pub struct InMemoryRecords {
    id_key: String,
    core_keys: Vec<String>,
    tables: Arc<RwLock<RecordTables>>,
}

/// Record keys of the host platform's content table
pub const DEFAULT_CORE_KEYS: [&str; 8] = [
    "ID",
    "post_title",
    "post_content",
    "post_excerpt",
    "post_status",
    "post_author",
    "post_date",
    "post_type",
];

impl InMemoryRecords {
    pub fn new() -> Self {
        Self::with_core_keys("ID", DEFAULT_CORE_KEYS)
    }

    /// Use a custom id key and record key set (the id key is always a core key)
    pub fn with_core_keys<I, S>(id_key: impl Into<String>, core_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id_key = id_key.into();
        let mut core_keys: Vec<String> = core_keys.into_iter().map(Into::into).collect();
        if !core_keys.contains(&id_key) {
            core_keys.push(id_key.clone());
        }
        Self {
            id_key,
            core_keys,
            tables: Arc::new(RwLock::new(RecordTables::default())),
        }
    }

    /// Number of records in a container
    pub fn count(&self, container: &str) -> usize {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .get(container)
            .map_or(0, IndexMap::len)
    }

    fn with_id(&self, id: i64, mut record: Map<String, Value>) -> Map<String, Value> {
        record.insert(self.id_key.clone(), Value::from(id));
        record
    }
}

impl Default for InMemoryRecords {
    fn default() -> Self {
        Self::new()
    }
}

fn record_id(id: &Value) -> Option<i64> {
    match id {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Shallow match: every filter key must equal the record's value
fn matches_filter(record: &Map<String, Value>, filter: Option<&Value>) -> bool {
    match filter.and_then(Value::as_object) {
        Some(conditions) => conditions
            .iter()
            .all(|(key, expected)| record.get(key) == Some(expected)),
        None => true,
    }
}

impl RecordBackend for InMemoryRecords {
    fn id_key(&self) -> &str {
        &self.id_key
    }

    fn core_keys(&self) -> &[String] {
        &self.core_keys
    }

    fn list_records(&self, container: &str, filter: Option<&Value>) -> Vec<Map<String, Value>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables
            .records
            .get(container)
            .map(|records| {
                records
                    .iter()
                    .map(|(id, record)| self.with_id(*id, record.clone()))
                    .filter(|record| matches_filter(record, filter))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn get_record(&self, container: &str, id: &Value) -> Option<Map<String, Value>> {
        let id = record_id(id)?;
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let record = tables.records.get(container)?.get(&id)?;
        Some(self.with_id(id, record.clone()))
    }

    fn get_meta(&self, id: &Value) -> Map<String, Value> {
        let Some(id) = record_id(id) else {
            return Map::new();
        };
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .meta
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }

    fn insert_record(&self, container: &str, mut record: Map<String, Value>) -> Option<Value> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        tables.next_id += 1;
        let id = tables.next_id;
        record.remove(&self.id_key);
        tables
            .records
            .entry(container.to_string())
            .or_default()
            .insert(id, record);
        Some(Value::from(id))
    }

    fn update_record(&self, container: &str, id: &Value, record: Map<String, Value>) -> bool {
        let Some(id) = record_id(id) else {
            return false;
        };
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let Some(existing) = tables
            .records
            .get_mut(container)
            .and_then(|records| records.get_mut(&id))
        else {
            return false;
        };
        for (key, value) in record {
            if key != self.id_key {
                existing.insert(key, value);
            }
        }
        true
    }

    fn set_meta(&self, id: &Value, key: &str, value: &Value) -> bool {
        let Some(id) = record_id(id) else {
            return false;
        };
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        tables
            .meta
            .entry(id)
            .or_default()
            .insert(key.to_string(), value.clone());
        true
    }

    fn delete_record(&self, container: &str, id: &Value) -> bool {
        let Some(id) = record_id(id) else {
            return false;
        };
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let removed = tables
            .records
            .get_mut(container)
            .and_then(|records| records.shift_remove(&id))
            .is_some();
        if removed {
            tables.meta.remove(&id);
        }
        removed
    }
}
