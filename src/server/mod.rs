//! REST exposure for models
//!
//! A [`CrudController`] serves one model type; a [`ControllerBundle`] groups
//! controllers under a route prefix and produces an axum `Router`.

pub mod bundle;
pub mod controller;

pub use bundle::ControllerBundle;
pub use controller::{CrudController, RestResponse, parse_id};
