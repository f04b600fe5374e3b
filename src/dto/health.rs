use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status.
    pub status: String,
    /// Number of open tables.
    pub tables: usize,
    /// Countdowns currently driven by the shared timer.
    pub countdowns: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(tables: usize, countdowns: usize) -> Self {
        Self {
            status: "ok".to_string(),
            tables,
            countdowns,
        }
    }
}
