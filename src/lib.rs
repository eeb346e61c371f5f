//! # Bindery
//!
//! Declarative model data binding for Rust services.
//!
//! ## Features
//!
//! - **Typed Field Declarations**: Fluent builders for types, defaults, validation and hooks
//! - **Per-Model Schemas**: Field collections computed once per model type and shared
//! - **Wire Mapping**: Transfer names for payloads, storage keys for persistence
//! - **Validation & Sanitization**: Every failing field reported in one pass
//! - **Pluggable Stores**: Record-backed, key/value singleton and no-op strategies
//! - **Settings Models**: Fields derived from declarative settings metadata (YAML/JSON)
//! - **REST Exposure**: Axum CRUD controllers grouped under a route prefix
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bindery::prelude::*;
//!
//! struct Casette;
//!
//! impl ModelDefinition for Casette {
//!     fn name() -> &'static str {
//!         "casette"
//!     }
//!
//!     fn declare_fields(env: &Environment) -> Result<Vec<FieldBuilder>, ConfigurationError> {
//!         Ok(vec![
//!             env.field("id").with_type(env.type_named("int")?).with_map_from("ID").primary(),
//!             env.field("title").with_map_from("post_title").required(),
//!             env.field("songs").with_type(FieldType::array_of(FieldType::Integer)),
//!         ])
//!     }
//! }
//!
//! let env = Environment::new();
//! let casette = env.new_from_array::<Casette>(&payload)?;
//! casette.validate()?;
//! ```

pub mod config;
pub mod core;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Models ===
    pub use crate::core::{
        environment::Environment,
        field::{FieldBuilder, FieldDeclaration, FieldKind, field},
        model::{Model, ModelDefinition},
        schema::{FieldCollection, Identity, ModelSchema},
        types::{FieldType, TypeRegistry},
    };

    // === Settings ===
    pub use crate::core::settings::{
        SettingField, SettingsGroup, SettingsGroups, SettingsModel, bit_to_bool, bool_to_bit,
        settings_from_json_str, settings_from_yaml_file, settings_from_yaml_str,
    };

    // === Validation ===
    pub use crate::core::validation::{ValidationErrors, ValidationFailure, filters, validators};

    // === Errors ===
    pub use crate::core::error::{
        BinderyError, BinderyResult, ConfigurationError, ErrorResponse, ModelError, StorageError,
    };

    // === Storage ===
    pub use crate::core::store::{DataStore, OptionBackend, RecordBackend};
    pub use crate::storage::{
        DataStoreBuilder, HostBackends, InMemoryOptions, InMemoryRecords, NilStore, OptionStore,
        RecordStore, StoreKind,
    };

    // === Configuration ===
    pub use crate::config::{BinderyConfig, StoreConfig};

    // === Server ===
    pub use crate::server::{ControllerBundle, CrudController, RestResponse};

    // === Common External Types ===
    pub use serde_json::{Map, Value, json};
    pub use std::sync::Arc;
}
