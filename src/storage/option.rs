//! Flat key-value data store
//!
//! Persists a single singleton model: every stored field maps 1:1 to one
//! global key (its `map_from`). Reads ignore ids and filters. Writes go key
//! by key with no coordination between them, so a failed key never undoes
//! the keys written before it.

use crate::core::error::{BinderyResult, StorageError};
use crate::core::field::FieldKind;
use crate::core::model::Model;
use crate::core::schema::ModelSchema;
use crate::core::store::{DataStore, OptionBackend};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Data store over the host's global option namespace
#[derive(Clone)]
pub struct OptionStore {
    schema: Arc<ModelSchema>,
    backend: Arc<dyn OptionBackend>,
}

impl OptionStore {
    pub fn new(schema: Arc<ModelSchema>, backend: Arc<dyn OptionBackend>) -> Self {
        Self { schema, backend }
    }

    /// Read every present key and build the singleton from them
    fn load(&self) -> BinderyResult<Model> {
        let mut raw = Map::new();
        for declaration in self.schema.fields_of_kind(FieldKind::Stored) {
            let key = declaration.map_from();
            if let Some(value) = self.backend.get_option(key) {
                raw.insert(key.to_string(), value);
            }
        }
        Ok(Model::from_storage(Arc::clone(&self.schema), &raw)?)
    }
}

impl DataStore for OptionStore {
    fn get_entities(&self, _filter: Option<&Value>) -> BinderyResult<Vec<Model>> {
        Ok(vec![self.load()?])
    }

    fn get_entity(&self, _id: &Value) -> BinderyResult<Option<Model>> {
        Ok(Some(self.load()?))
    }

    fn upsert(&self, model: &Model) -> BinderyResult<Value> {
        let mut failed = Vec::new();
        for (key, value) in model.serialize(None) {
            let written = if self.backend.get_option(&key).is_some() {
                debug!(model = model.name(), key = %key, "Updating option");
                self.backend.update_option(&key, &value)
            } else {
                debug!(model = model.name(), key = %key, "Adding option");
                self.backend.add_option(&key, &value)
            };
            if !written {
                warn!(model = model.name(), key = %key, "Option write failed, earlier writes are kept");
                failed.push(key);
            }
        }

        if !failed.is_empty() {
            return Err(StorageError::UpsertFailed {
                model: model.name().to_string(),
                keys: failed,
            }
            .into());
        }
        Ok(model.get_id()?)
    }

    /// Removes every present key; stops at the first refusal
    fn delete(&self, model: &Model) -> BinderyResult<bool> {
        for key in model.serialize(None).keys() {
            if self.backend.get_option(key).is_none() {
                continue;
            }
            if !self.backend.delete_option(key) {
                warn!(model = model.name(), key = %key, "Option delete failed");
                return Err(StorageError::DeleteFailed {
                    model: model.name().to_string(),
                    key: key.clone(),
                }
                .into());
            }
        }
        Ok(true)
    }
}
