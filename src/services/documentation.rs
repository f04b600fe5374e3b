use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Nazdarbaby Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::view_stream,
        crate::routes::tables::list_tables,
        crate::routes::tables::create_table,
        crate::routes::tables::get_table,
        crate::routes::tables::delete_table,
        crate::routes::tables::join_table,
        crate::routes::tables::leave_table,
        crate::routes::tables::set_ready,
        crate::routes::tables::click_next,
        crate::routes::tables::start_countdown,
        crate::routes::tables::stop_countdown,
        crate::routes::tables::attach_affordance,
        crate::routes::tables::list_affordances,
        crate::routes::tables::notify,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::sse::ViewChangedEvent,
            crate::dto::table::TableSummary,
            crate::dto::table::CreateTableRequest,
            crate::dto::table::JoinTableRequest,
            crate::dto::table::ReadyRequest,
            crate::dto::table::AttachAffordanceRequest,
            crate::dto::table::AttachAffordanceResponse,
            crate::dto::table::AffordanceSummary,
            crate::dto::table::QuorumResponse,
            crate::dto::table::NotifyResponse,
            crate::state::user::User,
            crate::state::user::PlayerAction,
            crate::state::broadcast::ViewKind,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "tables", description = "Table lobby, countdown and match lifecycle"),
    )
)]
pub struct ApiDoc;
