//! Core module containing the type system, field declarations, models and
//! the store contracts

pub mod environment;
pub mod error;
pub mod field;
pub mod model;
pub mod schema;
pub mod settings;
pub mod store;
pub mod types;
pub mod validation;

pub use environment::Environment;
pub use error::{BinderyError, BinderyResult, ConfigurationError, ModelError, StorageError};
pub use field::{FieldBuilder, FieldDeclaration, FieldKind, field};
pub use model::{Model, ModelDefinition};
pub use schema::{FieldCollection, Identity, ModelSchema};
pub use settings::{SettingField, SettingsGroup, SettingsGroups, SettingsModel, bit_to_bool, bool_to_bit};
pub use store::{DataStore, OptionBackend, RecordBackend};
pub use types::{FieldType, TypeRegistry, is_empty};
pub use validation::{ValidationErrors, ValidationFailure};
