//! No-op data store

use crate::core::error::BinderyResult;
use crate::core::model::Model;
use crate::core::store::DataStore;
use serde_json::Value;

/// Store that persists nothing
///
/// Reads come back empty and writes succeed without effect. Every model
/// starts out bound to one until a real store is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NilStore;

impl NilStore {
    pub fn new() -> Self {
        Self
    }
}

impl DataStore for NilStore {
    fn get_entities(&self, _filter: Option<&Value>) -> BinderyResult<Vec<Model>> {
        Ok(Vec::new())
    }

    fn get_entity(&self, _id: &Value) -> BinderyResult<Option<Model>> {
        Ok(None)
    }

    /// Echoes the model's current id
    fn upsert(&self, model: &Model) -> BinderyResult<Value> {
        Ok(model.get_id().unwrap_or(Value::Null))
    }

    fn delete(&self, _model: &Model) -> BinderyResult<bool> {
        Ok(true)
    }
}
