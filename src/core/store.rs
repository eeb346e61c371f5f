//! Data store contracts
//!
//! A [`DataStore`] persists the models of one type. Strategies only ever see
//! a model through its schema and its storage-shaped projection
//! (`Model::serialize`), so they stay ignorant of wire naming.
//!
//! The host platform's own primitives are collaborators described by
//! [`OptionBackend`] (a flat global key/value namespace) and
//! [`RecordBackend`] (structured records with key/value side-storage).
//! Those primitives are individually atomic and report success as a plain
//! flag; nothing coordinates writes across several keys.

use crate::core::error::BinderyResult;
use crate::core::model::Model;
use serde_json::{Map, Value};

/// Uniform persistence capability set
pub trait DataStore: Send + Sync {
    /// All entities matching an optional backend-specific filter
    fn get_entities(&self, filter: Option<&Value>) -> BinderyResult<Vec<Model>>;

    /// One entity, or `None` when it does not exist
    fn get_entity(&self, id: &Value) -> BinderyResult<Option<Model>>;

    /// Insert or update, returning the entity's id
    fn upsert(&self, model: &Model) -> BinderyResult<Value>;

    /// Remove the entity
    fn delete(&self, model: &Model) -> BinderyResult<bool>;
}

/// Global key/value namespace of the host platform
///
/// `get_option` returns `None` only when the key is absent, so a stored
/// falsy value is never mistaken for a missing one.
pub trait OptionBackend: Send + Sync {
    fn get_option(&self, key: &str) -> Option<Value>;

    fn add_option(&self, key: &str, value: &Value) -> bool;

    fn update_option(&self, key: &str, value: &Value) -> bool;

    fn delete_option(&self, key: &str) -> bool;
}

/// Structured record storage of the host platform
///
/// Records live in named containers (content types). Each record may carry
/// side-storage: one value per key, addressed by the record id.
pub trait RecordBackend: Send + Sync {
    /// Record key holding the id
    fn id_key(&self) -> &str;

    /// Keys stored on the record itself; any other key goes to side-storage
    fn core_keys(&self) -> &[String];

    fn list_records(&self, container: &str, filter: Option<&Value>) -> Vec<Map<String, Value>>;

    fn get_record(&self, container: &str, id: &Value) -> Option<Map<String, Value>>;

    fn get_meta(&self, id: &Value) -> Map<String, Value>;

    /// Create a record and return its new id
    fn insert_record(&self, container: &str, record: Map<String, Value>) -> Option<Value>;

    fn update_record(&self, container: &str, id: &Value, record: Map<String, Value>) -> bool;

    fn set_meta(&self, id: &Value, key: &str, value: &Value) -> bool;

    fn delete_record(&self, container: &str, id: &Value) -> bool;
}
