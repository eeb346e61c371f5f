//! The model registry
//!
//! An [`Environment`] owns everything that is computed once per model type
//! and then shared: the type registry, each model's [`ModelSchema`] and the
//! data store bound to it. Nothing here is global; tests create their own
//! environment and get full isolation.
//!
//! Schemas and default stores are computed outside the lock on first
//! access and then published. When two threads race on the same model, the
//! first publisher wins and both get the same `Arc`.

use crate::config::BinderyConfig;
use crate::core::error::{BinderyError, BinderyResult, ConfigurationError};
use crate::core::field::{FieldBuilder, field};
use crate::core::model::{Model, ModelDefinition};
use crate::core::schema::ModelSchema;
use crate::core::store::DataStore;
use crate::core::types::{FieldType, TypeRegistry};
use crate::storage::builder::{DataStoreBuilder, HostBackends};
use crate::storage::nil::NilStore;
use serde_json::{Map, Value};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// Registry of model schemas and bound data stores
pub struct Environment {
    types: TypeRegistry,
    schemas: RwLock<HashMap<TypeId, Arc<ModelSchema>>>,
    stores: RwLock<HashMap<TypeId, Arc<dyn DataStore>>>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            types: TypeRegistry::new(),
            schemas: RwLock::new(HashMap::new()),
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// Start a field declaration
    pub fn field(&self, name: impl Into<String>) -> FieldBuilder {
        field(name)
    }

    /// Resolve a registered type by name
    pub fn type_named(&self, name: &str) -> Result<FieldType, ConfigurationError> {
        self.types
            .get(name)
            .ok_or_else(|| ConfigurationError::UnknownType {
                field: String::new(),
                type_name: name.to_string(),
            })
    }

    /// Register an extra type name (before the environment is shared)
    pub fn register_type(&mut self, name: impl Into<String>, field_type: FieldType) {
        self.types.register(name, field_type);
    }

    /// The schema of `M`, built on first access
    pub fn schema<M: ModelDefinition>(&self) -> BinderyResult<Arc<ModelSchema>> {
        let key = TypeId::of::<M>();
        if let Some(schema) = self.schemas.read().map_err(lock_error)?.get(&key) {
            return Ok(Arc::clone(schema));
        }

        // declare_fields may call back into this environment
        let mut schema = ModelSchema::from_builders(M::name(), M::declare_fields(self)?)?;
        if let Some(identity) = M::identity() {
            schema = schema.with_identity(identity);
        }

        let mut schemas = self.schemas.write().map_err(lock_error)?;
        let published = schemas.entry(key).or_insert_with(|| {
            debug!(model = M::name(), fields = schema.fields().len(), "Publishing model schema");
            Arc::new(schema)
        });
        Ok(Arc::clone(published))
    }

    /// The store bound to `M`; a no-op store until one is bound
    pub fn data_store<M: ModelDefinition>(&self) -> BinderyResult<Arc<dyn DataStore>> {
        let key = TypeId::of::<M>();
        if let Some(store) = self.stores.read().map_err(lock_error)?.get(&key) {
            return Ok(Arc::clone(store));
        }

        let mut stores = self.stores.write().map_err(lock_error)?;
        let store = stores.entry(key).or_insert_with(|| {
            debug!(model = M::name(), "No data store bound, using nil store");
            let nil: Arc<dyn DataStore> = Arc::new(NilStore::new());
            nil
        });
        Ok(Arc::clone(store))
    }

    /// Bind `store` to `M`, replacing any previous binding
    pub fn with_data_store<M: ModelDefinition>(&self, store: Arc<dyn DataStore>) -> BinderyResult<()> {
        self.stores
            .write()
            .map_err(lock_error)?
            .insert(TypeId::of::<M>(), store);
        info!(model = M::name(), "Data store bound");
        Ok(())
    }

    /// A store builder already carrying `M`'s schema
    pub fn store_builder<M: ModelDefinition>(&self) -> BinderyResult<DataStoreBuilder> {
        Ok(DataStoreBuilder::new().with_model_schema(self.schema::<M>()?))
    }

    /// Build and bind `M`'s store from configuration.
    ///
    /// Models the configuration does not mention keep their current store.
    pub fn bind_store_from_config<M: ModelDefinition>(
        &self,
        config: &BinderyConfig,
        backends: &HostBackends,
    ) -> BinderyResult<Arc<dyn DataStore>> {
        let Some(store_config) = config.store_for(M::name()) else {
            return self.data_store::<M>();
        };

        let mut builder = self
            .store_builder::<M>()?
            .with_kind(store_config.kind)
            .with_backends(backends);
        if let Some(container) = &store_config.container {
            builder = builder.with_container(container.clone());
        }

        let store = builder.build()?;
        self.with_data_store::<M>(Arc::clone(&store))?;
        Ok(store)
    }

    /// Create an `M` from model-shaped data
    pub fn create<M: ModelDefinition>(&self, data: Map<String, Value>) -> BinderyResult<Model> {
        Ok(Model::create(self.schema::<M>()?, data)?)
    }

    /// Create an `M` from storage-shaped data
    pub fn from_storage<M: ModelDefinition>(&self, data: &Map<String, Value>) -> BinderyResult<Model> {
        Ok(Model::from_storage(self.schema::<M>()?, data)?)
    }

    /// Create an `M` from a wire payload
    pub fn new_from_array<M: ModelDefinition>(&self, data: &Map<String, Value>) -> BinderyResult<Model> {
        Ok(Model::new_from_array(self.schema::<M>()?, data)?)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_error<T>(err: PoisonError<T>) -> BinderyError {
    BinderyError::Internal(format!("Environment lock poisoned: {}", err))
}
