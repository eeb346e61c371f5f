//! Models: typed value bags bound to a schema
//!
//! A [`Model`] owns the coerced value of each field it has touched so far.
//! Values are materialized lazily: reading a field that was never set yields
//! its default (stored fields) or runs its reader once (derived fields), and
//! the result is cached on the instance.
//!
//! Raw data crosses three boundaries, each with its own naming:
//!
//! - storage: keys are each field's `map_from` ([`Model::serialize`],
//!   [`Model::deserialize`])
//! - in memory: keys are field names ([`Model::get`], [`Model::set`])
//! - wire: keys are transfer names ([`Model::to_transfer_dto`],
//!   [`Model::update_from_array`])

use crate::core::environment::Environment;
use crate::core::error::{ConfigurationError, ModelError};
use crate::core::field::{FieldBuilder, FieldDeclaration, FieldKind};
use crate::core::schema::{Identity, ModelSchema};
use crate::core::types::is_empty;
use crate::core::validation::{ValidationErrors, ValidationFailure};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::sync::Arc;

/// Compile-time contract every model type implements
///
/// ```rust,ignore
/// struct Casette;
///
/// impl ModelDefinition for Casette {
///     fn name() -> &'static str {
///         "casette"
///     }
///
///     fn declare_fields(env: &Environment) -> Result<Vec<FieldBuilder>, ConfigurationError> {
///         Ok(vec![
///             env.field("id").with_type(FieldType::Integer).primary(),
///             env.field("title").required(),
///         ])
///     }
/// }
/// ```
pub trait ModelDefinition: 'static {
    /// Model name, used in errors, logs and as the settings id
    fn name() -> &'static str;

    /// Field declarations, in the order they should be kept
    fn declare_fields(env: &Environment) -> Result<Vec<FieldBuilder>, ConfigurationError>;

    /// Override the identity inferred from the declared fields
    fn identity() -> Option<Identity> {
        None
    }
}

/// A bag of typed field values bound to one schema
#[derive(Debug, Clone)]
pub struct Model {
    schema: Arc<ModelSchema>,
    data: RefCell<IndexMap<String, Value>>,
    raw_data: Map<String, Value>,
}

impl Model {
    /// Create a model from data already in model shape (keys are field names)
    pub fn create(schema: Arc<ModelSchema>, data: Map<String, Value>) -> Result<Self, ModelError> {
        let mut model = Self {
            schema,
            data: RefCell::new(IndexMap::new()),
            raw_data: Map::new(),
        };
        for (key, value) in &data {
            model.set(key, value.clone())?;
        }
        model.raw_data = data;
        Ok(model)
    }

    /// Create a model from data in storage shape
    pub fn from_storage(schema: Arc<ModelSchema>, data: &Map<String, Value>) -> Result<Self, ModelError> {
        let model_data = deserialize_with(&schema, data);
        Self::create(schema, model_data)
    }

    /// Create a model from a wire payload, then sanitize it
    pub fn new_from_array(schema: Arc<ModelSchema>, data: &Map<String, Value>) -> Result<Self, ModelError> {
        let mapped = schema.map_inbound(data, false);
        let mut model = Self::create(schema, mapped)?;
        model.sanitize();
        Ok(model)
    }

    pub fn name(&self) -> &str {
        self.schema.name()
    }

    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    /// The data this model was created from
    pub fn raw_data(&self) -> &Map<String, Value> {
        &self.raw_data
    }

    /// Whether the schema declares `field` (regardless of current data)
    pub fn has(&self, field: &str) -> bool {
        self.schema.contains(field)
    }

    /// Current value of a field, with its before-get hook applied
    pub fn get(&self, field: &str) -> Result<Value, ModelError> {
        let declaration = self.declaration(field)?;
        Ok(self.prepared(declaration))
    }

    /// Coerce and store a field value
    pub fn set(&mut self, field: &str, value: Value) -> Result<&mut Self, ModelError> {
        let schema = Arc::clone(&self.schema);
        let declaration = schema.field(field).ok_or_else(|| self.unknown(field))?;
        self.store(declaration, value);
        Ok(self)
    }

    /// Check every stored field, collecting all failures
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for declaration in self.schema.fields_of_kind(FieldKind::Stored) {
            if let Some(failure) = self.run_field_validations(declaration) {
                errors.push(failure);
            }
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Normalize every field in place
    pub fn sanitize(&mut self) -> &mut Self {
        let schema = Arc::clone(&self.schema);
        for declaration in schema.fields().iter() {
            let value = self.prepared(declaration);
            let sanitized = match declaration.sanitizer() {
                Some(sanitizer) => sanitizer(&*self, value),
                None => declaration.field_type().sanitize(&value),
            };
            self.store(declaration, sanitized);
        }
        self
    }

    /// Project fields of `kind` (stored by default) onto their storage keys
    pub fn serialize(&self, kind: Option<FieldKind>) -> Map<String, Value> {
        let kind = kind.unwrap_or(FieldKind::Stored);
        self.schema
            .fields_of_kind(kind)
            .map(|declaration| {
                let value = self.prepared(declaration);
                (
                    declaration.map_from().to_string(),
                    declaration.serialize_value(value),
                )
            })
            .collect()
    }

    /// Turn storage-shaped data into model-shaped data
    pub fn deserialize(&self, data: &Map<String, Value>) -> Map<String, Value> {
        deserialize_with(&self.schema, data)
    }

    /// Wire representation: every output-eligible field under its transfer name
    pub fn to_transfer_dto(&self) -> Map<String, Value> {
        self.schema
            .fields()
            .iter()
            .filter(|declaration| declaration.supports_output())
            .map(|declaration| {
                (
                    declaration.transfer_name().to_string(),
                    self.prepared(declaration),
                )
            })
            .collect()
    }

    /// Merge a wire payload into this model, then sanitize.
    ///
    /// While `updating`, the identity field is left untouched. Derived fields
    /// present in the payload are handed to their updater; an updater
    /// rejection is reported as a validation failure once the rest of the
    /// payload has been applied.
    pub fn update_from_array(
        &mut self,
        data: &Map<String, Value>,
        updating: bool,
    ) -> Result<&mut Self, ValidationErrors> {
        let schema = Arc::clone(&self.schema);
        for (name, value) in schema.map_inbound(data, updating) {
            if let Some(declaration) = schema.field(&name) {
                self.store(declaration, value);
            }
        }

        let mut errors = ValidationErrors::new();
        for declaration in schema.fields_of_kind(FieldKind::Derived) {
            let (Some(updater), Some(value)) =
                (declaration.updater(), data.get(declaration.transfer_name()))
            else {
                continue;
            };
            if let Err(reason) = updater(&*self, value.clone()) {
                errors.push(ValidationFailure::new(
                    declaration.transfer_name(),
                    reason,
                    value.clone(),
                ));
            }
        }

        self.sanitize();
        if errors.is_empty() { Ok(self) } else { Err(errors) }
    }

    /// The model's id
    pub fn get_id(&self) -> Result<Value, ModelError> {
        match self.schema.identity() {
            Identity::Field(field) => self.get(field),
            Identity::Singleton(name) => Ok(Value::String(name.clone())),
        }
    }

    /// Store a new id; singleton models ignore it
    pub fn set_id(&mut self, id: Value) -> Result<&mut Self, ModelError> {
        let schema = Arc::clone(&self.schema);
        match schema.identity() {
            Identity::Field(field) => self.set(field, id),
            Identity::Singleton(_) => Ok(self),
        }
    }

    fn declaration(&self, field: &str) -> Result<&FieldDeclaration, ModelError> {
        self.schema.field(field).ok_or_else(|| self.unknown(field))
    }

    fn unknown(&self, field: &str) -> ModelError {
        ModelError::UnknownField {
            model: self.schema.name().to_string(),
            field: field.to_string(),
        }
    }

    fn store(&mut self, declaration: &FieldDeclaration, value: Value) {
        let coerced = coerce(declaration, value);
        self.data
            .get_mut()
            .insert(declaration.name().to_string(), coerced);
    }

    /// Cached value, materialized on first access
    fn value_of(&self, declaration: &FieldDeclaration) -> Value {
        let cached = self.data.borrow().get(declaration.name()).cloned();
        if let Some(value) = cached {
            return value;
        }

        // the reader may read other fields, so no borrow is held here
        let initial = match declaration.reader() {
            Some(reader) if declaration.is_derived() => reader(self),
            _ => declaration.default_value(),
        };
        let value = coerce(declaration, initial);
        self.data
            .borrow_mut()
            .insert(declaration.name().to_string(), value.clone());
        value
    }

    fn prepared(&self, declaration: &FieldDeclaration) -> Value {
        let value = self.value_of(declaration);
        match declaration.before_get() {
            Some(hook) => hook(value, declaration.name()),
            None => value,
        }
    }

    fn run_field_validations(&self, declaration: &FieldDeclaration) -> Option<ValidationFailure> {
        let value = self.prepared(declaration);
        let empty = is_empty(&value);

        if declaration.is_required() {
            return empty.then(|| {
                ValidationFailure::new(
                    declaration.transfer_name(),
                    format!("{} cannot be empty", declaration.name()),
                    value.clone(),
                )
            });
        }
        if empty {
            return None;
        }

        declaration.validations().iter().find_map(|validator| {
            validator(declaration.transfer_name(), &value)
                .err()
                .map(|reason| ValidationFailure::new(declaration.transfer_name(), reason, value.clone()))
        })
    }
}

fn coerce(declaration: &FieldDeclaration, value: Value) -> Value {
    match declaration.before_set() {
        Some(hook) => hook(value, declaration.name()),
        None => declaration.cast_value(&value),
    }
}

/// Storage shape → model shape.
///
/// Each stored field is looked up by its own name first, then by its
/// storage key; the deserializer only runs on values actually found.
fn deserialize_with(schema: &ModelSchema, data: &Map<String, Value>) -> Map<String, Value> {
    schema
        .fields_of_kind(FieldKind::Stored)
        .map(|declaration| {
            let value = data
                .get(declaration.name())
                .or_else(|| data.get(declaration.map_from()))
                .map(|raw| declaration.deserialize_value(raw.clone()))
                .unwrap_or_else(|| declaration.default_value());
            (declaration.name().to_string(), declaration.cast_value(&value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::field;
    use crate::core::types::FieldType;
    use crate::core::validation::validators;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn casette_schema() -> Arc<ModelSchema> {
        Arc::new(
            ModelSchema::from_builders(
                "casette",
                vec![
                    field("id").with_type(FieldType::Integer).primary(),
                    field("title")
                        .with_type(FieldType::String)
                        .with_map_from("post_title")
                        .required(),
                    field("songs")
                        .with_type(FieldType::array_of(FieldType::Integer))
                        .with_default(json!([]))
                        .with_map_from("_casette_songs"),
                    field("author")
                        .with_dto_name("author_name")
                        .with_validation(validators::string_length(2, 20)),
                ],
            )
            .unwrap(),
        )
    }

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    // ============================================================================
    // get / set / has
    // ============================================================================

    mod access_tests {
        use super::*;

        #[test]
        fn test_set_casts_value() {
            let mut model = Model::create(casette_schema(), Map::new()).unwrap();
            model.set("id", json!("12")).unwrap();
            assert_eq!(model.get("id").unwrap(), json!(12));
        }

        #[test]
        fn test_unset_field_yields_default() {
            let model = Model::create(casette_schema(), Map::new()).unwrap();
            assert_eq!(model.get("songs").unwrap(), json!([]));
            assert_eq!(model.get("title").unwrap(), json!(""));
        }

        #[test]
        fn test_unknown_field_fails() {
            let mut model = Model::create(casette_schema(), Map::new()).unwrap();
            assert!(matches!(
                model.get("nope"),
                Err(ModelError::UnknownField { ref field, .. }) if field == "nope"
            ));
            assert!(model.set("nope", json!(1)).is_err());
            assert!(!model.has("nope"));
            assert!(model.has("songs"));
        }

        #[test]
        fn test_create_rejects_unknown_keys() {
            let err = Model::create(casette_schema(), object(json!({"bogus": 1}))).unwrap_err();
            assert_eq!(
                err,
                ModelError::UnknownField {
                    model: "casette".to_string(),
                    field: "bogus".to_string()
                }
            );
        }

        #[test]
        fn test_before_set_replaces_cast() {
            let schema = ModelSchema::from_builders(
                "tagged",
                vec![
                    field("count")
                        .with_type(FieldType::Integer)
                        .with_before_set(|value, name| json!(format!("{}:{}", name, value))),
                ],
            )
            .unwrap();
            let mut model = Model::create(Arc::new(schema), Map::new()).unwrap();
            model.set("count", json!(3)).unwrap();
            assert_eq!(model.get("count").unwrap(), json!("count:3"));
        }

        #[test]
        fn test_before_get_runs_on_every_read() {
            let calls = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&calls);
            let schema = ModelSchema::from_builders(
                "shouty",
                vec![field("word").with_before_get(move |value, _| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    json!(value.as_str().unwrap_or_default().to_uppercase())
                })],
            )
            .unwrap();
            let model = Model::create(Arc::new(schema), object(json!({"word": "hi"}))).unwrap();

            assert_eq!(model.get("word").unwrap(), json!("HI"));
            assert_eq!(model.get("word").unwrap(), json!("HI"));
            assert_eq!(calls.load(Ordering::SeqCst), 2);
        }

        #[test]
        fn test_derived_reader_is_cached() {
            let calls = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&calls);
            let schema = ModelSchema::from_builders(
                "casette",
                vec![
                    field("songs").with_type(FieldType::array_of(FieldType::Integer)),
                    field("song_count")
                        .with_type(FieldType::Integer)
                        .derived()
                        .with_reader(move |model| {
                            counter.fetch_add(1, Ordering::SeqCst);
                            let songs = model.get("songs").unwrap_or_default();
                            json!(songs.as_array().map(Vec::len).unwrap_or(0))
                        }),
                ],
            )
            .unwrap();
            let model = Model::create(Arc::new(schema), object(json!({"songs": [1, 2, 3]}))).unwrap();

            assert_eq!(model.get("song_count").unwrap(), json!(3));
            assert_eq!(model.get("song_count").unwrap(), json!(3));
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }
    }

    // ============================================================================
    // validate / sanitize
    // ============================================================================

    mod validation_tests {
        use super::*;

        #[test]
        fn test_missing_required_field_reports_once() {
            let model = Model::create(casette_schema(), object(json!({"songs": [1, 2]}))).unwrap();
            let errors = model.validate().unwrap_err();
            assert_eq!(errors.len(), 1);
            let failure = &errors.failures()[0];
            assert_eq!(failure.field, "title");
            assert_eq!(failure.reason, "title cannot be empty");
        }

        #[test]
        fn test_optional_empty_field_skips_validators() {
            let model = Model::create(casette_schema(), object(json!({"title": "Mix 1"}))).unwrap();
            assert!(model.validate().is_ok());
        }

        #[test]
        fn test_failures_use_transfer_name() {
            let model = Model::create(
                casette_schema(),
                object(json!({"title": "Mix 1", "author": "x"})),
            )
            .unwrap();
            let errors = model.validate().unwrap_err();
            assert_eq!(errors.len(), 1);
            assert_eq!(errors.failures()[0].field, "author_name");
            assert!(errors.failures()[0].reason.contains("at least 2"));
        }

        #[test]
        fn test_failures_accumulate_across_fields() {
            let model = Model::create(casette_schema(), object(json!({"author": "x"}))).unwrap();
            let errors = model.validate().unwrap_err();
            assert_eq!(errors.len(), 2);
        }

        #[test]
        fn test_first_failing_validator_wins() {
            let schema = ModelSchema::from_builders(
                "rated",
                vec![
                    field("score")
                        .with_type(FieldType::Integer)
                        .with_validation(|_, _| Err("first".to_string()))
                        .with_validation(|_, _| Err("second".to_string())),
                ],
            )
            .unwrap();
            let model = Model::create(Arc::new(schema), object(json!({"score": 4}))).unwrap();
            let errors = model.validate().unwrap_err();
            assert_eq!(errors.failures()[0].reason, "first");
        }

        #[test]
        fn test_derived_fields_are_not_validated() {
            let schema = ModelSchema::from_builders(
                "computed",
                vec![
                    field("total")
                        .derived()
                        .required()
                        .with_reader(|_| json!("")),
                ],
            )
            .unwrap();
            let model = Model::create(Arc::new(schema), Map::new()).unwrap();
            assert!(model.validate().is_ok());
        }

        #[test]
        fn test_sanitize_trims_and_uses_custom_hook() {
            let schema = ModelSchema::from_builders(
                "clean",
                vec![
                    field("title"),
                    field("slug").with_sanitizer(|_, value| {
                        json!(value.as_str().unwrap_or_default().replace(' ', "-"))
                    }),
                ],
            )
            .unwrap();
            let mut model = Model::create(
                Arc::new(schema),
                object(json!({"title": "  Mix 1 ", "slug": "mix 1"})),
            )
            .unwrap();
            model.sanitize();
            assert_eq!(model.get("title").unwrap(), json!("Mix 1"));
            assert_eq!(model.get("slug").unwrap(), json!("mix-1"));
        }
    }

    // ============================================================================
    // serialize / deserialize / transfer
    // ============================================================================

    mod boundary_tests {
        use super::*;

        #[test]
        fn test_serialize_uses_storage_keys() {
            let model = Model::create(
                casette_schema(),
                object(json!({"id": 1, "title": "Mix 1", "songs": [4]})),
            )
            .unwrap();
            let stored = model.serialize(None);
            assert_eq!(stored.get("post_title"), Some(&json!("Mix 1")));
            assert_eq!(stored.get("_casette_songs"), Some(&json!([4])));
            assert_eq!(stored.get("id"), Some(&json!(1)));
            assert!(!stored.contains_key("title"));
        }

        #[test]
        fn test_projections_follow_declaration_order() {
            let schema = ModelSchema::from_builders(
                "ordered",
                vec![field("zeta"), field("alpha"), field("mid")],
            )
            .unwrap();
            let model = Model::create(
                Arc::new(schema),
                object(json!({"alpha": "a", "mid": "m", "zeta": "z"})),
            )
            .unwrap();

            let stored: Vec<String> = model.serialize(None).keys().cloned().collect();
            assert_eq!(stored, vec!["zeta", "alpha", "mid"]);
            let dto: Vec<String> = model.to_transfer_dto().keys().cloned().collect();
            assert_eq!(dto, vec!["zeta", "alpha", "mid"]);
        }

        #[test]
        fn test_serialize_skips_derived_unless_asked() {
            let schema = ModelSchema::from_builders(
                "computed",
                vec![
                    field("base").with_type(FieldType::Integer),
                    field("double")
                        .with_type(FieldType::Integer)
                        .derived()
                        .with_reader(|m| json!(m.get("base").unwrap().as_i64().unwrap_or(0) * 2)),
                ],
            )
            .unwrap();
            let model = Model::create(Arc::new(schema), object(json!({"base": 4}))).unwrap();
            assert!(!model.serialize(None).contains_key("double"));
            assert_eq!(
                model.serialize(Some(FieldKind::Derived)).get("double"),
                Some(&json!(8))
            );
        }

        #[test]
        fn test_deserialize_lookup_order() {
            let model = Model::create(casette_schema(), Map::new()).unwrap();
            let data = model.deserialize(&object(json!({
                "title": "By name",
                "post_title": "By storage key",
                "_casette_songs": ["1", "2"]
            })));
            assert_eq!(data.get("title"), Some(&json!("By name")));
            assert_eq!(data.get("songs"), Some(&json!([1, 2])));
            assert_eq!(data.get("id"), Some(&json!(0)));
        }

        #[test]
        fn test_storage_round_trip() {
            let schema = casette_schema();
            let original = Model::create(
                Arc::clone(&schema),
                object(json!({"id": 3, "title": "Mix 1", "songs": [1, 2], "author": "Ann"})),
            )
            .unwrap();
            let restored = Model::from_storage(schema, &original.serialize(None)).unwrap();
            for name in ["id", "title", "songs", "author"] {
                assert_eq!(original.get(name).unwrap(), restored.get(name).unwrap(), "{}", name);
            }
        }

        #[test]
        fn test_deserializer_only_runs_on_found_values() {
            let schema = ModelSchema::from_builders(
                "flags",
                vec![
                    field("enabled")
                        .with_type(FieldType::Boolean)
                        .with_default(true)
                        .with_deserializer(|value| json!(value == json!("yes"))),
                ],
            )
            .unwrap();
            let schema = Arc::new(schema);
            let absent = Model::from_storage(Arc::clone(&schema), &Map::new()).unwrap();
            assert_eq!(absent.get("enabled").unwrap(), json!(true));
            let stored = Model::from_storage(schema, &object(json!({"enabled": "no"}))).unwrap();
            assert_eq!(stored.get("enabled").unwrap(), json!(false));
        }

        #[test]
        fn test_transfer_dto_uses_transfer_names() {
            let model = Model::create(
                casette_schema(),
                object(json!({"id": 1, "title": "Mix 1", "author": "Ann"})),
            )
            .unwrap();
            let dto = model.to_transfer_dto();
            assert_eq!(dto.get("author_name"), Some(&json!("Ann")));
            assert_eq!(dto.get("songs"), Some(&json!([])));
            assert!(!dto.contains_key("author"));
        }
    }

    // ============================================================================
    // wire payloads / identity
    // ============================================================================

    mod inbound_tests {
        use super::*;

        #[test]
        fn test_new_from_array_maps_and_sanitizes() {
            let model = Model::new_from_array(
                casette_schema(),
                &object(json!({"title": " Mix 1 ", "author_name": "Ann"})),
            )
            .unwrap();
            assert_eq!(model.get("title").unwrap(), json!("Mix 1"));
            assert_eq!(model.get("author").unwrap(), json!("Ann"));
            assert_eq!(model.get("songs").unwrap(), json!([]));
        }

        #[test]
        fn test_update_never_changes_identity() {
            let mut model = Model::create(
                casette_schema(),
                object(json!({"id": 5, "title": "Mix 1"})),
            )
            .unwrap();
            model
                .update_from_array(&object(json!({"id": 99, "title": "Mix 2"})), true)
                .unwrap();
            assert_eq!(model.get_id().unwrap(), json!(5));
            assert_eq!(model.get("title").unwrap(), json!("Mix 2"));
        }

        #[test]
        fn test_update_keeps_unmarked_id_field() {
            let schema = ModelSchema::from_builders(
                "note",
                vec![field("id").with_type(FieldType::Integer), field("title")],
            )
            .unwrap();
            let mut model = Model::create(Arc::new(schema), object(json!({"id": 5}))).unwrap();
            model
                .update_from_array(&object(json!({"id": 99, "title": "b"})), true)
                .unwrap();
            assert_eq!(model.get_id().unwrap(), json!(5));
            assert_eq!(model.get("title").unwrap(), json!("b"));
        }

        #[test]
        fn test_updater_errors_become_validation_failures() {
            let schema = ModelSchema::from_builders(
                "computed",
                vec![
                    field("title"),
                    field("total")
                        .derived()
                        .with_reader(|_| json!(0))
                        .with_updater(|_, _| Err("total is read-only".to_string())),
                ],
            )
            .unwrap();
            let mut model = Model::create(Arc::new(schema), Map::new()).unwrap();
            let errors = model
                .update_from_array(&object(json!({"title": "x", "total": 3})), false)
                .unwrap_err();
            assert_eq!(errors.failures()[0].field, "total");
            assert_eq!(model.get("title").unwrap(), json!("x"));
        }

        #[test]
        fn test_singleton_identity() {
            let schema = ModelSchema::from_builders("settings", vec![field("site_title")])
                .unwrap()
                .with_identity(Identity::Singleton("settings".to_string()));
            let mut model = Model::create(Arc::new(schema), Map::new()).unwrap();
            model.set_id(json!(42)).unwrap();
            assert_eq!(model.get_id().unwrap(), json!("settings"));
        }
    }
}
