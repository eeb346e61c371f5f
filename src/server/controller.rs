//! CRUD controller over one model type
//!
//! The controller speaks wire shapes only: it maps payloads through the
//! model's transfer names, runs validation and hands persistence to the
//! bound data store. Status mapping:
//!
//! - list / get / update / delete: 200
//! - create: 201
//! - validation failure: 400 with the per-field failure list
//! - missing entity: 404
//! - storage failure: 500

use crate::core::environment::Environment;
use crate::core::error::{BinderyError, BinderyResult, StorageError};
use crate::core::model::{Model, ModelDefinition};
use crate::core::schema::ModelSchema;
use crate::core::store::DataStore;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Successful controller outcome
#[derive(Debug, Clone, PartialEq)]
pub struct RestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl RestResponse {
    pub fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn created(body: Value) -> Self {
        Self {
            status: StatusCode::CREATED,
            body,
        }
    }
}

impl IntoResponse for RestResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// CRUD endpoint for one model, mounted at `base` (e.g. `/casettes`)
#[derive(Clone)]
pub struct CrudController {
    base: String,
    schema: Arc<ModelSchema>,
    store: Arc<dyn DataStore>,
}

impl CrudController {
    pub fn new(base: impl Into<String>, schema: Arc<ModelSchema>, store: Arc<dyn DataStore>) -> Self {
        Self {
            base: base.into(),
            schema,
            store,
        }
    }

    /// Controller for `M` using the store currently bound in `env`
    pub fn for_model<M: ModelDefinition>(env: &Environment, base: impl Into<String>) -> BinderyResult<Self> {
        Ok(Self::new(base, env.schema::<M>()?, env.data_store::<M>()?))
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn list(&self) -> BinderyResult<RestResponse> {
        let entities = self.store.get_entities(None)?;
        debug!(model = self.schema.name(), count = entities.len(), "Listing entities");
        let items = entities
            .iter()
            .map(|model| Value::Object(model.to_transfer_dto()))
            .collect();
        Ok(RestResponse::ok(Value::Array(items)))
    }

    pub fn get(&self, id: &Value) -> BinderyResult<RestResponse> {
        let model = self.find(id)?;
        Ok(RestResponse::ok(Value::Object(model.to_transfer_dto())))
    }

    pub fn create(&self, payload: &Map<String, Value>) -> BinderyResult<RestResponse> {
        let mut model = Model::new_from_array(Arc::clone(&self.schema), payload)?;
        model.validate()?;

        let id = self.store.upsert(&model)?;
        model.set_id(id)?;
        info!(model = self.schema.name(), id = %model.get_id()?, "Entity created");
        Ok(RestResponse::created(Value::Object(model.to_transfer_dto())))
    }

    pub fn update(&self, id: &Value, payload: &Map<String, Value>) -> BinderyResult<RestResponse> {
        let mut model = self.find(id)?;
        model.update_from_array(payload, true)?;
        model.validate()?;

        let id = self.store.upsert(&model)?;
        model.set_id(id)?;
        info!(model = self.schema.name(), id = %model.get_id()?, "Entity updated");
        Ok(RestResponse::ok(Value::Object(model.to_transfer_dto())))
    }

    /// Deletes the entity and replies with its last representation
    pub fn delete(&self, id: &Value) -> BinderyResult<RestResponse> {
        let model = self.find(id)?;
        self.store.delete(&model)?;
        info!(model = self.schema.name(), id = %id, "Entity deleted");
        Ok(RestResponse::ok(Value::Object(model.to_transfer_dto())))
    }

    fn find(&self, id: &Value) -> BinderyResult<Model> {
        self.store.get_entity(id)?.ok_or_else(|| {
            StorageError::NotFound {
                model: self.schema.name().to_string(),
                id: id.clone(),
            }
            .into()
        })
    }

    /// Axum routes for this controller under `path`
    pub fn routes(self, path: &str) -> Router {
        let item_path = format!("{}/{{id}}", path);
        Router::new()
            .route(path, get(list_handler).post(create_handler))
            .route(
                &item_path,
                get(get_handler).put(update_handler).delete(delete_handler),
            )
            .with_state(Arc::new(self))
    }
}

/// Numeric path ids become integers, anything else stays a string
pub fn parse_id(raw: &str) -> Value {
    raw.parse::<i64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::String(raw.to_string()))
}

type ControllerState = State<Arc<CrudController>>;

async fn list_handler(State(controller): ControllerState) -> Result<RestResponse, BinderyError> {
    controller.list()
}

async fn get_handler(
    State(controller): ControllerState,
    Path(id): Path<String>,
) -> Result<RestResponse, BinderyError> {
    controller.get(&parse_id(&id))
}

async fn create_handler(
    State(controller): ControllerState,
    Json(payload): Json<Map<String, Value>>,
) -> Result<RestResponse, BinderyError> {
    controller.create(&payload)
}

async fn update_handler(
    State(controller): ControllerState,
    Path(id): Path<String>,
    Json(payload): Json<Map<String, Value>>,
) -> Result<RestResponse, BinderyError> {
    controller.update(&parse_id(&id), &payload)
}

async fn delete_handler(
    State(controller): ControllerState,
    Path(id): Path<String>,
) -> Result<RestResponse, BinderyError> {
    controller.delete(&parse_id(&id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::field;
    use crate::core::types::FieldType;
    use crate::storage::in_memory::InMemoryRecords;
    use crate::storage::record::RecordStore;
    use serde_json::json;

    fn controller() -> CrudController {
        let schema = Arc::new(
            ModelSchema::from_builders(
                "casette",
                vec![
                    field("id").with_type(FieldType::Integer).with_map_from("ID").primary(),
                    field("title").with_map_from("post_title").required(),
                    field("songs").with_type(FieldType::array_of(FieldType::Integer)),
                ],
            )
            .unwrap(),
        );
        let store = RecordStore::new(Arc::clone(&schema), Arc::new(InMemoryRecords::new()), "casette");
        CrudController::new("/casettes", schema, Arc::new(store))
    }

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("12"), json!(12));
        assert_eq!(parse_id("-3"), json!(-3));
        assert_eq!(parse_id("abc"), json!("abc"));
    }

    #[test]
    fn test_create_then_get() {
        let controller = controller();
        let created = controller
            .create(&payload(json!({"title": "Mix 1", "songs": [1, 2]})))
            .unwrap();
        assert_eq!(created.status, StatusCode::CREATED);
        assert_eq!(created.body["id"], json!(1));

        let fetched = controller.get(&json!(1)).unwrap();
        assert_eq!(fetched.status, StatusCode::OK);
        assert_eq!(fetched.body["title"], json!("Mix 1"));
        assert_eq!(fetched.body["songs"], json!([1, 2]));
    }

    #[test]
    fn test_create_invalid_is_validation_error() {
        let err = controller()
            .create(&payload(json!({"songs": [1]})))
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.failures()[0].field, "title");
    }

    #[test]
    fn test_missing_entity_is_not_found() {
        let controller = controller();
        assert_eq!(controller.get(&json!(9)).unwrap_err().status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            controller.update(&json!(9), &Map::new()).unwrap_err().status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(controller.delete(&json!(9)).unwrap_err().status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_update_keeps_id_and_delete_removes() {
        let controller = controller();
        controller.create(&payload(json!({"title": "Mix 1"}))).unwrap();

        let updated = controller
            .update(&json!(1), &payload(json!({"id": 50, "title": "Mix 2"})))
            .unwrap();
        assert_eq!(updated.body["id"], json!(1));
        assert_eq!(updated.body["title"], json!("Mix 2"));

        controller.delete(&json!(1)).unwrap();
        assert!(controller.list().unwrap().body.as_array().unwrap().is_empty());
    }
}
