//! Typed helpers for well-known backend endpoints.

use serde_json::Value;

use super::ApiClient;
use crate::error::ApiError;
use crate::request::{ApiRequest, ApiResponse};
use crate::session::Session;
use crate::types::{DatabaseHealth, HealthStatus};

impl ApiClient {
    /// `GET /health/` on the backend origin.
    pub fn health(&self, session: &Session) -> Result<HealthStatus, ApiError> {
        self.execute(session, ApiRequest::get("/health/").at_origin())?
            .json()
    }

    /// `GET /api/schema/`. The body is returned raw since the schema may be
    /// served as YAML.
    pub fn schema(&self, session: &Session) -> Result<ApiResponse, ApiError> {
        self.execute(session, ApiRequest::get("/schema/"))
    }

    /// `GET /api/core/database/health/`.
    pub fn database_health(&self, session: &Session) -> Result<DatabaseHealth, ApiError> {
        self.get_json(session, "/core/database/health/")
    }

    /// `GET /api/core/categories/`.
    pub fn categories(&self, session: &Session) -> Result<Value, ApiError> {
        self.get_json(session, "/core/categories/")
    }

    /// `OPTIONS /api/auth/`.
    pub fn auth_options(&self, session: &Session) -> Result<ApiResponse, ApiError> {
        self.options(session, "/auth/")
    }
}
