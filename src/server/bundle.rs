//! Controller bundles: a group of controllers under one route prefix

use crate::server::controller::CrudController;
use axum::Router;
use tracing::debug;

/// Controllers sharing a prefix such as `casette-api/v1`
pub struct ControllerBundle {
    prefix: String,
    controllers: Vec<CrudController>,
}

impl ControllerBundle {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into().trim_matches('/').to_string(),
            controllers: Vec::new(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn add_endpoint(mut self, controller: CrudController) -> Self {
        self.controllers.push(controller);
        self
    }

    /// Full collection path of a controller base, e.g. `/casette-api/v1/casettes`
    pub fn path_for(&self, base: &str) -> String {
        let base = base.trim_matches('/');
        if self.prefix.is_empty() {
            format!("/{}", base)
        } else {
            format!("/{}/{}", self.prefix, base)
        }
    }

    /// Merge every controller's routes into one router
    pub fn build_router(mut self) -> Router {
        let mut router = Router::new();
        for controller in std::mem::take(&mut self.controllers) {
            let path = self.path_for(controller.base());
            debug!(path = %path, "Registering CRUD routes");
            router = router.merge(controller.routes(&path));
        }
        router
    }
}
