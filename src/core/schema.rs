//! Field collections and model schemas
//!
//! A [`ModelSchema`] is what a model type compiles down to: its name, the
//! ordered collection of its field declarations and the way it identifies
//! its instances. Schemas are built once per model type by the
//! [`Environment`](crate::core::environment::Environment) and shared
//! read-only afterwards.

use crate::core::error::ConfigurationError;
use crate::core::field::{FieldBuilder, FieldDeclaration, FieldKind};
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// How a model identifies its instances
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// The value of the named field is the id
    Field(String),
    /// Singleton bag: the id is this fixed name and cannot be changed
    Singleton(String),
}

impl Default for Identity {
    fn default() -> Self {
        Identity::Field("id".to_string())
    }
}

/// Ordered, name-keyed set of field declarations
#[derive(Debug, Clone, Default)]
pub struct FieldCollection {
    fields: IndexMap<String, FieldDeclaration>,
}

impl FieldCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a declaration, rejecting a second field with the same name
    pub fn insert(
        &mut self,
        model: &str,
        declaration: FieldDeclaration,
    ) -> Result<(), ConfigurationError> {
        if self.fields.contains_key(declaration.name()) {
            return Err(ConfigurationError::DuplicateField {
                model: model.to_string(),
                field: declaration.name().to_string(),
            });
        }
        self.fields
            .insert(declaration.name().to_string(), declaration);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FieldDeclaration> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDeclaration> {
        self.fields.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Everything the engine knows about one model type
#[derive(Debug, Clone)]
pub struct ModelSchema {
    name: String,
    fields: FieldCollection,
    identity: Identity,
}

impl ModelSchema {
    /// Build every field and collect them in declaration order.
    ///
    /// The identity defaults to the field marked primary, or `id`.
    pub fn from_builders(
        name: impl Into<String>,
        builders: Vec<FieldBuilder>,
    ) -> Result<Self, ConfigurationError> {
        let name = name.into();
        let mut fields = FieldCollection::new();
        for builder in builders {
            fields.insert(&name, builder.build()?)?;
        }

        let identity = fields
            .iter()
            .find(|f| f.is_primary())
            .map(|f| Identity::Field(f.name().to_string()))
            .unwrap_or_default();

        Ok(Self {
            name,
            fields,
            identity,
        })
    }

    /// Replace the inferred identity
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &FieldCollection {
        &self.fields
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn field(&self, name: &str) -> Option<&FieldDeclaration> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains(name)
    }

    /// Declarations of one kind, in declaration order
    pub fn fields_of_kind(&self, kind: FieldKind) -> impl Iterator<Item = &FieldDeclaration> {
        self.fields.iter().filter(move |f| f.is_kind(kind))
    }

    /// Transfer name → field name for every output-eligible field
    pub fn transfer_mappings(&self) -> IndexMap<String, String> {
        self.fields
            .iter()
            .filter(|f| f.supports_output())
            .map(|f| (f.transfer_name().to_string(), f.name().to_string()))
            .collect()
    }

    /// Map a wire payload onto model field names.
    ///
    /// Derived fields and null values are skipped; while `updating`, so is
    /// the primary field and the field holding the identity.
    pub fn map_inbound(&self, data: &Map<String, Value>, updating: bool) -> Map<String, Value> {
        let identity_field = match &self.identity {
            Identity::Field(name) => Some(name.as_str()),
            Identity::Singleton(_) => None,
        };
        let mut mapped = Map::new();
        for declaration in self.fields_of_kind(FieldKind::Stored) {
            if updating && (declaration.is_primary() || identity_field == Some(declaration.name())) {
                continue;
            }
            match data.get(declaration.transfer_name()) {
                Some(Value::Null) | None => {}
                Some(value) => {
                    mapped.insert(declaration.name().to_string(), value.clone());
                }
            }
        }
        mapped
    }
}
