use tracing::debug;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report liveness together with a few load figures.
pub fn health_status(state: &SharedState) -> HealthResponse {
    let tables = state.tables().list().len();
    let countdowns = state.scheduler().task_count();
    debug!(
        tables,
        countdowns,
        timer = state.scheduler().is_timer_running(),
        "health check"
    );

    HealthResponse::ok(tables, countdowns)
}
