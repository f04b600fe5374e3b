//! DTO definitions used by the table REST API and documentation layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{format_timestamp, validation::validate_display_name},
    state::{Table, affordance::CountdownAffordance, user::User},
};

/// Request to open (or look up) a table.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateTableRequest {
    #[validate(custom(function = "validate_display_name"))]
    pub name: String,
}

/// Request to sit at a table.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinTableRequest {
    #[validate(custom(function = "validate_display_name"))]
    pub user: String,
}

/// Request to toggle a player's readiness.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReadyRequest {
    pub ready: bool,
}

/// Request to show the new-game countdown on a player's label.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AttachAffordanceRequest {
    #[validate(custom(function = "validate_display_name"))]
    pub user: String,
    #[validate(length(max = 256))]
    pub label: String,
}

/// Outcome of attaching a countdown affordance.
#[derive(Debug, Serialize, ToSchema)]
pub struct AttachAffordanceResponse {
    /// False when no countdown was running.
    pub attached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
}

/// Label currently showing the countdown.
#[derive(Debug, Serialize, ToSchema)]
pub struct AffordanceSummary {
    pub id: Uuid,
    pub owner: String,
    pub label: String,
}

impl From<&dyn CountdownAffordance> for AffordanceSummary {
    fn from(affordance: &dyn CountdownAffordance) -> Self {
        Self {
            id: affordance.id(),
            owner: affordance.owner().to_string(),
            label: affordance.label(),
        }
    }
}

/// Answer to a "Next" click.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuorumResponse {
    /// True when every match user has now clicked.
    pub quorum: bool,
}

/// Answer to a notification request.
#[derive(Debug, Serialize, ToSchema)]
pub struct NotifyResponse {
    /// False while the throttle delay has not elapsed.
    pub sent: bool,
}

/// Table projection for list and detail views.
#[derive(Debug, Serialize, ToSchema)]
pub struct TableSummary {
    pub name: String,
    /// Status line, e.g. `Not started, Ready = 2, Not ready = 1`.
    pub info: String,
    pub in_progress: bool,
    pub full: bool,
    pub countdown_running: bool,
    /// Seconds left on the new-game countdown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countdown_remaining: Option<i64>,
    pub min_users: usize,
    pub max_users: usize,
    pub users: Vec<User>,
    pub match_users: Vec<String>,
    /// RFC 3339 timestamp of the last notification.
    pub last_notification_at: String,
}

impl From<&Table> for TableSummary {
    fn from(table: &Table) -> Self {
        let limits = table.limits();
        Self {
            name: table.name().to_string(),
            info: table.info(),
            in_progress: table.game().is_game_in_progress(),
            full: table.is_full(),
            countdown_running: table.is_new_game_countdown_running(),
            countdown_remaining: table.new_game_countdown_remaining(),
            min_users: limits.min,
            max_users: limits.max,
            users: table.users().users(),
            match_users: table.game().match_user_names(),
            last_notification_at: format_timestamp(table.last_notification_time()),
        }
    }
}
