use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use validator::Validate;

use crate::{
    dto::table::{
        AffordanceSummary, AttachAffordanceRequest, AttachAffordanceResponse, CreateTableRequest,
        JoinTableRequest, NotifyResponse, QuorumResponse, ReadyRequest, TableSummary,
    },
    error::AppError,
    services::table_service,
    state::SharedState,
};

/// Lobby, countdown and match endpoints of the tables.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/tables", get(list_tables).post(create_table))
        .route("/tables/{name}", get(get_table).delete(delete_table))
        .route("/tables/{name}/users", post(join_table))
        .route("/tables/{name}/users/{user}", delete(leave_table))
        .route("/tables/{name}/users/{user}/ready", put(set_ready))
        .route("/tables/{name}/users/{user}/next", post(click_next))
        .route(
            "/tables/{name}/countdown",
            post(start_countdown).delete(stop_countdown),
        )
        .route(
            "/tables/{name}/affordances",
            get(list_affordances).post(attach_affordance),
        )
        .route("/tables/{name}/notify", post(notify))
}

/// List every open table.
#[utoipa::path(
    get,
    path = "/tables",
    tag = "tables",
    responses((status = 200, description = "Open tables", body = [TableSummary]))
)]
pub async fn list_tables(State(state): State<SharedState>) -> Json<Vec<TableSummary>> {
    Json(table_service::list_tables(&state))
}

/// Open a table, or return the existing one with that name.
#[utoipa::path(
    post,
    path = "/tables",
    tag = "tables",
    request_body = CreateTableRequest,
    responses(
        (status = 200, description = "Table opened", body = TableSummary),
        (status = 400, description = "Invalid table name")
    )
)]
pub async fn create_table(
    State(state): State<SharedState>,
    Json(payload): Json<CreateTableRequest>,
) -> Result<Json<TableSummary>, AppError> {
    payload.validate()?;
    let summary = table_service::create_table(&state, &payload.name)?;
    Ok(Json(summary))
}

/// Retrieve a table by name.
#[utoipa::path(
    get,
    path = "/tables/{name}",
    tag = "tables",
    params(("name" = String, Path, description = "Table name")),
    responses(
        (status = 200, description = "Table", body = TableSummary),
        (status = 404, description = "Unknown table")
    )
)]
pub async fn get_table(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<TableSummary>, AppError> {
    Ok(Json(table_service::get_table(&state, &name)?))
}

/// Close a table, its match and its countdown.
#[utoipa::path(
    delete,
    path = "/tables/{name}",
    tag = "tables",
    params(("name" = String, Path, description = "Table name")),
    responses(
        (status = 204, description = "Table deleted"),
        (status = 404, description = "Unknown table")
    )
)]
pub async fn delete_table(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<StatusCode, AppError> {
    table_service::delete_table(&state, &name)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Sit at a table.
#[utoipa::path(
    post,
    path = "/tables/{name}/users",
    tag = "tables",
    params(("name" = String, Path, description = "Table name")),
    request_body = JoinTableRequest,
    responses(
        (status = 200, description = "User seated", body = TableSummary),
        (status = 404, description = "Unknown table")
    )
)]
pub async fn join_table(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Json(payload): Json<JoinTableRequest>,
) -> Result<Json<TableSummary>, AppError> {
    payload.validate()?;
    Ok(Json(table_service::join_table(
        &state,
        &name,
        &payload.user,
    )?))
}

/// Leave a table.
#[utoipa::path(
    delete,
    path = "/tables/{name}/users/{user}",
    tag = "tables",
    params(
        ("name" = String, Path, description = "Table name"),
        ("user" = String, Path, description = "User name")
    ),
    responses(
        (status = 204, description = "User left"),
        (status = 404, description = "Unknown table or user")
    )
)]
pub async fn leave_table(
    State(state): State<SharedState>,
    Path((name, user)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    table_service::leave_table(&state, &name, &user)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mark a user ready (or not) for the next match.
#[utoipa::path(
    put,
    path = "/tables/{name}/users/{user}/ready",
    tag = "tables",
    params(
        ("name" = String, Path, description = "Table name"),
        ("user" = String, Path, description = "User name")
    ),
    request_body = ReadyRequest,
    responses(
        (status = 200, description = "Readiness updated", body = TableSummary),
        (status = 404, description = "Unknown table or user")
    )
)]
pub async fn set_ready(
    State(state): State<SharedState>,
    Path((name, user)): Path<(String, String)>,
    Json(payload): Json<ReadyRequest>,
) -> Result<Json<TableSummary>, AppError> {
    Ok(Json(table_service::set_ready(
        &state,
        &name,
        &user,
        payload.ready,
    )?))
}

/// Click "Next" on the board.
#[utoipa::path(
    post,
    path = "/tables/{name}/users/{user}/next",
    tag = "tables",
    params(
        ("name" = String, Path, description = "Table name"),
        ("user" = String, Path, description = "User name")
    ),
    responses(
        (status = 200, description = "Click recorded", body = QuorumResponse),
        (status = 404, description = "Unknown table or user"),
        (status = 409, description = "No game in progress")
    )
)]
pub async fn click_next(
    State(state): State<SharedState>,
    Path((name, user)): Path<(String, String)>,
) -> Result<Json<QuorumResponse>, AppError> {
    Ok(Json(table_service::click_next(&state, &name, &user)?))
}

/// Start the new-game countdown.
#[utoipa::path(
    post,
    path = "/tables/{name}/countdown",
    tag = "tables",
    params(("name" = String, Path, description = "Table name")),
    responses(
        (status = 200, description = "Countdown running", body = TableSummary),
        (status = 404, description = "Unknown table")
    )
)]
pub async fn start_countdown(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<TableSummary>, AppError> {
    Ok(Json(table_service::start_countdown(&state, &name)?))
}

/// Stop the new-game countdown.
#[utoipa::path(
    delete,
    path = "/tables/{name}/countdown",
    tag = "tables",
    params(("name" = String, Path, description = "Table name")),
    responses(
        (status = 200, description = "Countdown stopped", body = TableSummary),
        (status = 404, description = "Unknown table")
    )
)]
pub async fn stop_countdown(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<TableSummary>, AppError> {
    Ok(Json(table_service::stop_countdown(&state, &name)?))
}

/// Show the running countdown on a user's label.
#[utoipa::path(
    post,
    path = "/tables/{name}/affordances",
    tag = "tables",
    params(("name" = String, Path, description = "Table name")),
    request_body = AttachAffordanceRequest,
    responses(
        (status = 200, description = "Attachment outcome", body = AttachAffordanceResponse),
        (status = 404, description = "Unknown table or user")
    )
)]
pub async fn attach_affordance(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Json(payload): Json<AttachAffordanceRequest>,
) -> Result<Json<AttachAffordanceResponse>, AppError> {
    payload.validate()?;
    Ok(Json(table_service::attach_affordance(
        &state, &name, payload,
    )?))
}

/// Labels currently showing the countdown.
#[utoipa::path(
    get,
    path = "/tables/{name}/affordances",
    tag = "tables",
    params(("name" = String, Path, description = "Table name")),
    responses(
        (status = 200, description = "Countdown labels", body = [AffordanceSummary]),
        (status = 404, description = "Unknown table")
    )
)]
pub async fn list_affordances(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<AffordanceSummary>>, AppError> {
    Ok(Json(table_service::list_affordances(&state, &name)?))
}

/// Invite players to the table, throttled per table.
#[utoipa::path(
    post,
    path = "/tables/{name}/notify",
    tag = "tables",
    params(("name" = String, Path, description = "Table name")),
    responses(
        (status = 200, description = "Notification outcome", body = NotifyResponse),
        (status = 404, description = "Unknown table")
    )
)]
pub async fn notify(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<NotifyResponse>, AppError> {
    Ok(Json(table_service::notify(&state, &name)?))
}
