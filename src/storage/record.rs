//! Record-backed data store
//!
//! Each model is one record in a named container. Serialized keys the
//! backend lists as core keys are written on the record; every other key
//! goes to the record's side-storage. Reads merge the two back together
//! before deserializing.

use crate::core::error::{BinderyResult, StorageError};
use crate::core::model::Model;
use crate::core::schema::ModelSchema;
use crate::core::store::{DataStore, RecordBackend};
use crate::core::types::is_empty;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Data store over the host's structured record storage
#[derive(Clone)]
pub struct RecordStore {
    schema: Arc<ModelSchema>,
    backend: Arc<dyn RecordBackend>,
    container: String,
}

impl RecordStore {
    pub fn new(
        schema: Arc<ModelSchema>,
        backend: Arc<dyn RecordBackend>,
        container: impl Into<String>,
    ) -> Self {
        Self {
            schema,
            backend,
            container: container.into(),
        }
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    /// Record plus side-storage, side-storage winning on shared keys
    fn from_record(&self, mut record: Map<String, Value>) -> BinderyResult<Model> {
        if let Some(id) = record.get(self.backend.id_key()).cloned() {
            record.extend(self.backend.get_meta(&id));
        }
        Ok(Model::from_storage(Arc::clone(&self.schema), &record)?)
    }

    fn upsert_failed(&self, keys: Vec<String>) -> StorageError {
        StorageError::UpsertFailed {
            model: self.schema.name().to_string(),
            keys,
        }
    }
}

impl DataStore for RecordStore {
    fn get_entities(&self, filter: Option<&Value>) -> BinderyResult<Vec<Model>> {
        self.backend
            .list_records(&self.container, filter)
            .into_iter()
            .map(|record| self.from_record(record))
            .collect()
    }

    fn get_entity(&self, id: &Value) -> BinderyResult<Option<Model>> {
        match self.backend.get_record(&self.container, id) {
            Some(record) => Ok(Some(self.from_record(record)?)),
            None => Ok(None),
        }
    }

    /// Inserts when the model has no id yet, updates otherwise
    fn upsert(&self, model: &Model) -> BinderyResult<Value> {
        let core_keys = self.backend.core_keys();
        let (record, meta): (Map<String, Value>, Map<String, Value>) = model
            .serialize(None)
            .into_iter()
            .partition(|(key, _)| core_keys.contains(key));
        let record_keys: Vec<String> = record.keys().cloned().collect();

        let current = model.get_id()?;
        let id = if is_empty(&current) {
            debug!(model = model.name(), container = %self.container, "Inserting record");
            self.backend
                .insert_record(&self.container, record)
                .ok_or_else(|| self.upsert_failed(record_keys))?
        } else {
            debug!(model = model.name(), container = %self.container, id = %current, "Updating record");
            if !self.backend.update_record(&self.container, &current, record) {
                return Err(self.upsert_failed(record_keys).into());
            }
            current
        };

        let failed: Vec<String> = meta
            .iter()
            .filter(|(key, value)| !self.backend.set_meta(&id, key, value))
            .map(|(key, _)| key.clone())
            .collect();
        if !failed.is_empty() {
            warn!(model = model.name(), id = %id, keys = ?failed, "Side-storage write failed");
            return Err(self.upsert_failed(failed).into());
        }
        Ok(id)
    }

    fn delete(&self, model: &Model) -> BinderyResult<bool> {
        let id = model.get_id()?;
        if !self.backend.delete_record(&self.container, &id) {
            warn!(model = model.name(), id = %id, "Record delete failed");
            return Err(StorageError::DeleteFailed {
                model: model.name().to_string(),
                key: id.to_string(),
            }
            .into());
        }
        Ok(true)
    }
}
