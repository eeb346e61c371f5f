//! Field declarations
//!
//! A [`FieldDeclaration`] is the immutable description of one model
//! attribute: its type, how it is named on the wire and in storage, and the
//! hooks that run when the value crosses those boundaries. Declarations are
//! assembled with the fluent [`FieldBuilder`] and frozen by `build()`.
//!
//! ```rust,ignore
//! let title = field("title")
//!     .with_type(FieldType::String)
//!     .with_map_from("post_title")
//!     .required()
//!     .build()?;
//! ```

use crate::core::error::ConfigurationError;
use crate::core::model::Model;
use crate::core::types::FieldType;
use crate::core::validation::validators;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Validator: `(field_name, value) -> Ok | reason`
pub type Validator = Arc<dyn Fn(&str, &Value) -> Result<(), String> + Send + Sync>;

/// Custom sanitizer: `(model, value) -> sanitized value`
pub type Sanitizer = Arc<dyn Fn(&Model, Value) -> Value + Send + Sync>;

/// Storage-boundary transform (serializer / deserializer)
pub type ValueTransform = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// In-memory boundary transform (before-get / before-set): `(value, field_name)`
pub type FieldHook = Arc<dyn Fn(Value, &str) -> Value + Send + Sync>;

/// Computes a derived field from the model it belongs to
pub type Reader = Arc<dyn Fn(&Model) -> Value + Send + Sync>;

/// Persists an inbound value for a derived field through a side channel
pub type Updater = Arc<dyn Fn(&Model, Value) -> Result<(), String> + Send + Sync>;

/// Whether a field's value lives in storage or is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Stored,
    Derived,
}

/// Immutable metadata for one model field
#[derive(Clone)]
pub struct FieldDeclaration {
    name: String,
    kind: FieldKind,
    field_type: FieldType,
    default_value: Option<Value>,
    description: Option<String>,
    required: bool,
    primary: bool,
    output: bool,
    transfer_name: String,
    map_from: String,
    choices: Option<Vec<String>>,
    validations: Vec<Validator>,
    sanitizer: Option<Sanitizer>,
    serializer: Option<ValueTransform>,
    deserializer: Option<ValueTransform>,
    before_get: Option<FieldHook>,
    before_set: Option<FieldHook>,
    reader: Option<Reader>,
    updater: Option<Updater>,
}

impl FieldDeclaration {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn is_kind(&self, kind: FieldKind) -> bool {
        self.kind == kind
    }

    pub fn is_derived(&self) -> bool {
        self.kind == FieldKind::Derived
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    /// The declared default, or the type's default when none was given
    pub fn default_value(&self) -> Value {
        self.default_value
            .clone()
            .unwrap_or_else(|| self.field_type.default_value())
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Identity field; inbound updates never overwrite it
    pub fn is_primary(&self) -> bool {
        self.primary
    }

    /// Whether the field appears in the JSON transfer DTO
    pub fn supports_output(&self) -> bool {
        self.output
    }

    /// Key used on the wire
    pub fn transfer_name(&self) -> &str {
        &self.transfer_name
    }

    /// Key used in storage
    pub fn map_from(&self) -> &str {
        &self.map_from
    }

    pub fn choices(&self) -> Option<&[String]> {
        self.choices.as_deref()
    }

    pub fn validations(&self) -> &[Validator] {
        &self.validations
    }

    pub fn sanitizer(&self) -> Option<&Sanitizer> {
        self.sanitizer.as_ref()
    }

    pub fn serializer(&self) -> Option<&ValueTransform> {
        self.serializer.as_ref()
    }

    pub fn deserializer(&self) -> Option<&ValueTransform> {
        self.deserializer.as_ref()
    }

    pub fn before_get(&self) -> Option<&FieldHook> {
        self.before_get.as_ref()
    }

    pub fn before_set(&self) -> Option<&FieldHook> {
        self.before_set.as_ref()
    }

    pub fn reader(&self) -> Option<&Reader> {
        self.reader.as_ref()
    }

    pub fn updater(&self) -> Option<&Updater> {
        self.updater.as_ref()
    }

    /// Coerce a raw value with this field's type
    pub fn cast_value(&self, value: &Value) -> Value {
        self.field_type.cast(value)
    }

    /// Apply the serializer hook, if any
    pub fn serialize_value(&self, value: Value) -> Value {
        match &self.serializer {
            Some(serializer) => serializer(value),
            None => value,
        }
    }

    /// Apply the deserializer hook, if any
    pub fn deserialize_value(&self, value: Value) -> Value {
        match &self.deserializer {
            Some(deserializer) => deserializer(value),
            None => value,
        }
    }
}

impl fmt::Debug for FieldDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDeclaration")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("type", &self.field_type.to_string())
            .field("default", &self.default_value)
            .field("required", &self.required)
            .field("primary", &self.primary)
            .field("transfer_name", &self.transfer_name)
            .field("map_from", &self.map_from)
            .field("validations", &self.validations.len())
            .finish_non_exhaustive()
    }
}

/// Start declaring a field
pub fn field(name: impl Into<String>) -> FieldBuilder {
    FieldBuilder::new(name)
}

/// Fluent builder for [`FieldDeclaration`]
///
/// Every method consumes the builder, and so does `build()`: a builder
/// cannot be reused once its declaration is frozen.
#[must_use = "a field builder does nothing until it is built"]
pub struct FieldBuilder {
    name: String,
    kind: FieldKind,
    field_type: FieldType,
    default_value: Option<Value>,
    description: Option<String>,
    required: bool,
    primary: bool,
    output: bool,
    transfer_name: Option<String>,
    map_from: Option<String>,
    choices: Option<Vec<String>>,
    validations: Vec<Validator>,
    sanitizer: Option<Sanitizer>,
    serializer: Option<ValueTransform>,
    deserializer: Option<ValueTransform>,
    before_get: Option<FieldHook>,
    before_set: Option<FieldHook>,
    reader: Option<Reader>,
    updater: Option<Updater>,
}

impl FieldBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Stored,
            field_type: FieldType::String,
            default_value: None,
            description: None,
            required: false,
            primary: false,
            output: true,
            transfer_name: None,
            map_from: None,
            choices: None,
            validations: Vec::new(),
            sanitizer: None,
            serializer: None,
            deserializer: None,
            before_get: None,
            before_set: None,
            reader: None,
            updater: None,
        }
    }

    /// Name of the field being built
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = field_type;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Wire-facing key (defaults to the field name)
    pub fn with_dto_name(mut self, name: impl Into<String>) -> Self {
        self.transfer_name = Some(name.into());
        self
    }

    /// Storage-facing key (defaults to the field name)
    pub fn with_map_from(mut self, key: impl Into<String>) -> Self {
        self.map_from = Some(key.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Keep the field out of the transfer DTO
    pub fn hidden(mut self) -> Self {
        self.output = false;
        self
    }

    /// Restrict the value to a fixed set of keys
    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    /// Append a validator; validators run in the order they were added
    pub fn with_validation<F>(mut self, validator: F) -> Self
    where
        F: Fn(&str, &Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validations.push(Arc::new(validator));
        self
    }

    pub fn with_sanitizer<F>(mut self, sanitizer: F) -> Self
    where
        F: Fn(&Model, Value) -> Value + Send + Sync + 'static,
    {
        self.sanitizer = Some(Arc::new(sanitizer));
        self
    }

    pub fn with_serializer<F>(mut self, serializer: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.serializer = Some(Arc::new(serializer));
        self
    }

    pub fn with_deserializer<F>(mut self, deserializer: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.deserializer = Some(Arc::new(deserializer));
        self
    }

    pub fn with_before_get<F>(mut self, hook: F) -> Self
    where
        F: Fn(Value, &str) -> Value + Send + Sync + 'static,
    {
        self.before_get = Some(Arc::new(hook));
        self
    }

    /// Replaces the type cast on `Model::set` for this field
    pub fn with_before_set<F>(mut self, hook: F) -> Self
    where
        F: Fn(Value, &str) -> Value + Send + Sync + 'static,
    {
        self.before_set = Some(Arc::new(hook));
        self
    }

    /// Mark the field as computed rather than stored
    pub fn derived(mut self) -> Self {
        self.kind = FieldKind::Derived;
        self
    }

    pub fn with_reader<F>(mut self, reader: F) -> Self
    where
        F: Fn(&Model) -> Value + Send + Sync + 'static,
    {
        self.reader = Some(Arc::new(reader));
        self
    }

    pub fn with_updater<F>(mut self, updater: F) -> Self
    where
        F: Fn(&Model, Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.updater = Some(Arc::new(updater));
        self
    }

    /// Freeze the declaration
    pub fn build(self) -> Result<FieldDeclaration, ConfigurationError> {
        if self.name.trim().is_empty() {
            return Err(ConfigurationError::EmptyFieldName);
        }
        if self.kind == FieldKind::Derived && self.reader.is_none() {
            return Err(ConfigurationError::MissingReader { field: self.name });
        }

        let mut validations = self.validations;
        if let Some(choices) = &self.choices {
            validations.push(Arc::new(validators::in_list(choices.clone())));
        }

        Ok(FieldDeclaration {
            transfer_name: self.transfer_name.unwrap_or_else(|| self.name.clone()),
            map_from: self.map_from.unwrap_or_else(|| self.name.clone()),
            name: self.name,
            kind: self.kind,
            field_type: self.field_type,
            default_value: self.default_value,
            description: self.description,
            required: self.required,
            primary: self.primary,
            output: self.output,
            choices: self.choices,
            validations,
            sanitizer: self.sanitizer,
            serializer: self.serializer,
            deserializer: self.deserializer,
            before_get: self.before_get,
            before_set: self.before_set,
            reader: self.reader,
            updater: self.updater,
        })
    }
}

impl fmt::Debug for FieldBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBuilder")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
