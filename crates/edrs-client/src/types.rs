//! Backend response payloads.

use serde::{Deserialize, Serialize};

/// Body of `GET /health/`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HealthStatus {
    /// Overall status (e.g. "healthy").
    #[serde(default)]
    pub status: Option<String>,
    /// Service name (e.g. "edrs").
    #[serde(default)]
    pub service: Option<String>,
}

/// Body of `GET /api/core/database/health/`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatabaseHealth {
    /// Overall status.
    #[serde(default)]
    pub status: Option<String>,
    /// Database details.
    #[serde(default)]
    pub data: Option<DatabaseInfo>,
}

/// Database details nested under `data`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatabaseInfo {
    /// Server version string reported by `PostgreSQL`.
    #[serde(default)]
    pub postgresql_version: Option<String>,
    /// Database name.
    #[serde(default)]
    pub database: Option<String>,
}
