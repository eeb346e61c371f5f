//! Data store selection and construction

use crate::core::error::ConfigurationError;
use crate::core::schema::ModelSchema;
use crate::core::store::{DataStore, OptionBackend, RecordBackend};
use crate::storage::nil::NilStore;
use crate::storage::option::OptionStore;
use crate::storage::record::RecordStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Container used by record-backed stores unless told otherwise
pub const DEFAULT_CONTAINER: &str = "post";

/// The available store strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// One record per model in a content container
    #[default]
    CustomPostType,
    /// Singleton model over the global key/value namespace
    Option,
    /// Persist nothing
    Nil,
    /// Transient models; same as `Nil`
    InMemory,
}

impl StoreKind {
    pub fn name(&self) -> &'static str {
        match self {
            StoreKind::CustomPostType => "custom_post_type",
            StoreKind::Option => "option",
            StoreKind::Nil => "nil",
            StoreKind::InMemory => "in_memory",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StoreKind {
    type Err = ConfigurationError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "custom_post_type" => Ok(StoreKind::CustomPostType),
            "option" => Ok(StoreKind::Option),
            "nil" => Ok(StoreKind::Nil),
            "in_memory" => Ok(StoreKind::InMemory),
            other => Err(ConfigurationError::UnknownStoreKind {
                name: other.to_string(),
            }),
        }
    }
}

/// The host primitives available to store strategies
#[derive(Clone, Default)]
pub struct HostBackends {
    pub records: Option<Arc<dyn RecordBackend>>,
    pub options: Option<Arc<dyn OptionBackend>>,
}

impl HostBackends {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(mut self, backend: Arc<dyn RecordBackend>) -> Self {
        self.records = Some(backend);
        self
    }

    pub fn with_options(mut self, backend: Arc<dyn OptionBackend>) -> Self {
        self.options = Some(backend);
        self
    }
}

/// Fluent builder selecting and wiring a [`DataStore`]
///
/// ```rust,ignore
/// let store = env
///     .store_builder::<Casette>()?
///     .custom_post_type()
///     .with_container("casette")
///     .with_record_backend(records)
///     .build()?;
/// ```
#[must_use]
pub struct DataStoreBuilder {
    kind: StoreKind,
    container: String,
    schema: Option<Arc<ModelSchema>>,
    backends: HostBackends,
}

impl DataStoreBuilder {
    pub fn new() -> Self {
        Self {
            kind: StoreKind::default(),
            container: DEFAULT_CONTAINER.to_string(),
            schema: None,
            backends: HostBackends::default(),
        }
    }

    pub fn custom_post_type(self) -> Self {
        self.with_kind(StoreKind::CustomPostType)
    }

    pub fn option(self) -> Self {
        self.with_kind(StoreKind::Option)
    }

    pub fn nil(self) -> Self {
        self.with_kind(StoreKind::Nil)
    }

    pub fn with_kind(mut self, kind: StoreKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = container.into();
        self
    }

    pub fn with_model_schema(mut self, schema: Arc<ModelSchema>) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_record_backend(mut self, backend: Arc<dyn RecordBackend>) -> Self {
        self.backends.records = Some(backend);
        self
    }

    pub fn with_option_backend(mut self, backend: Arc<dyn OptionBackend>) -> Self {
        self.backends.options = Some(backend);
        self
    }

    /// Take whichever backends are available
    pub fn with_backends(mut self, backends: &HostBackends) -> Self {
        if let Some(records) = &backends.records {
            self.backends.records = Some(Arc::clone(records));
        }
        if let Some(options) = &backends.options {
            self.backends.options = Some(Arc::clone(options));
        }
        self
    }

    pub fn build(self) -> Result<Arc<dyn DataStore>, ConfigurationError> {
        debug!(kind = %self.kind, container = %self.container, "Building data store");
        match self.kind {
            StoreKind::Nil | StoreKind::InMemory => Ok(Arc::new(NilStore::new())),
            StoreKind::Option => {
                let schema = self.require_schema()?;
                let backend = self
                    .backends
                    .options
                    .ok_or_else(|| missing_backend(StoreKind::Option, "option"))?;
                Ok(Arc::new(OptionStore::new(schema, backend)))
            }
            StoreKind::CustomPostType => {
                let schema = self.require_schema()?;
                let backend = self
                    .backends
                    .records
                    .ok_or_else(|| missing_backend(StoreKind::CustomPostType, "record"))?;
                Ok(Arc::new(RecordStore::new(schema, backend, self.container)))
            }
        }
    }

    fn require_schema(&self) -> Result<Arc<ModelSchema>, ConfigurationError> {
        self.schema
            .clone()
            .ok_or_else(|| ConfigurationError::MissingSchema {
                kind: self.kind.to_string(),
            })
    }
}

impl Default for DataStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn missing_backend(kind: StoreKind, backend: &str) -> ConfigurationError {
    ConfigurationError::MissingBackend {
        kind: kind.to_string(),
        backend: backend.to_string(),
    }
}
