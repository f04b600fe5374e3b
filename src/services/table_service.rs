use std::sync::Arc;

use tracing::info;

use crate::{
    dto::table::{
        AffordanceSummary, AttachAffordanceRequest, AttachAffordanceResponse, NotifyResponse,
        QuorumResponse, TableSummary,
    },
    error::ServiceError,
    state::{
        SharedState, Table, ViewKind,
        affordance::{CountdownAffordance, LabelAffordance},
        user::PlayerAction,
    },
};

/// Summaries of every open table, ordered by name.
pub fn list_tables(state: &SharedState) -> Vec<TableSummary> {
    state
        .tables()
        .list()
        .iter()
        .map(|table| TableSummary::from(table.as_ref()))
        .collect()
}

/// Open the table called `name`, or return it when it already exists.
pub fn create_table(state: &SharedState, name: &str) -> Result<TableSummary, ServiceError> {
    let table = state.tables().get_or_create(name)?;
    Ok(TableSummary::from(table.as_ref()))
}

/// Summary of a single table.
pub fn get_table(state: &SharedState, name: &str) -> Result<TableSummary, ServiceError> {
    let table = require_table(state, name)?;
    Ok(TableSummary::from(table.as_ref()))
}

/// Close a table and everything attached to it.
pub fn delete_table(state: &SharedState, name: &str) -> Result<(), ServiceError> {
    if state.tables().delete(name) {
        Ok(())
    } else {
        Err(table_not_found(name))
    }
}

/// Seat `user` at the table; they play from the next match on.
pub fn join_table(
    state: &SharedState,
    name: &str,
    user: &str,
) -> Result<TableSummary, ServiceError> {
    let table = require_table(state, name)?;
    table.users().join(user);
    info!(table = name, user, "user joined table");

    state.bus().publish(ViewKind::Table, name);
    Ok(TableSummary::from(table.as_ref()))
}

/// Remove `user` from the table.
pub fn leave_table(state: &SharedState, name: &str, user: &str) -> Result<(), ServiceError> {
    let table = require_table(state, name)?;
    if !table.users().leave(user) {
        return Err(user_not_found(name, user));
    }
    info!(table = name, user, "user left table");

    state.bus().publish(ViewKind::Table, name);
    if table.game().is_game_in_progress()
        && table.game().match_user_names().iter().any(|n| n == user)
    {
        state.bus().publish(ViewKind::Board, name);
    }
    Ok(())
}

/// Toggle readiness of `user`; a ready click may start the match right away.
pub fn set_ready(
    state: &SharedState,
    name: &str,
    user: &str,
    ready: bool,
) -> Result<TableSummary, ServiceError> {
    let table = require_table(state, name)?;
    if !table.users().set_ready(user, ready) {
        return Err(user_not_found(name, user));
    }

    if ready && table.try_start_new_game() {
        state.bus().publish(ViewKind::Board, name);
    }
    state.bus().publish(ViewKind::Table, name);
    Ok(TableSummary::from(table.as_ref()))
}

/// Start the new-game countdown of a table.
pub fn start_countdown(state: &SharedState, name: &str) -> Result<TableSummary, ServiceError> {
    let table = require_table(state, name)?;
    table.start_new_game_countdown();

    state.bus().publish(ViewKind::Table, name);
    Ok(TableSummary::from(table.as_ref()))
}

/// Stop the new-game countdown of a table.
pub fn stop_countdown(state: &SharedState, name: &str) -> Result<TableSummary, ServiceError> {
    let table = require_table(state, name)?;
    table.stop_new_game_countdown();

    state.bus().publish(ViewKind::Table, name);
    Ok(TableSummary::from(table.as_ref()))
}

/// Show the running countdown on a label owned by a seated user.
pub fn attach_affordance(
    state: &SharedState,
    name: &str,
    request: AttachAffordanceRequest,
) -> Result<AttachAffordanceResponse, ServiceError> {
    let table = require_table(state, name)?;
    if table.users().user(&request.user).is_none() {
        return Err(user_not_found(name, &request.user));
    }

    let affordance: Arc<dyn CountdownAffordance> =
        Arc::new(LabelAffordance::new(request.user, request.label));
    let attached = table.add_countdown_affordance(affordance.clone());

    Ok(AttachAffordanceResponse {
        attached,
        id: attached.then(|| affordance.id()),
    })
}

/// Labels currently showing the countdown of a table.
pub fn list_affordances(
    state: &SharedState,
    name: &str,
) -> Result<Vec<AffordanceSummary>, ServiceError> {
    let table = require_table(state, name)?;
    Ok(table
        .countdown_affordances()
        .iter()
        .map(|affordance| AffordanceSummary::from(affordance.as_ref()))
        .collect())
}

/// Record a "Next" click; once every match user clicked, the board moves on.
pub fn click_next(
    state: &SharedState,
    name: &str,
    user: &str,
) -> Result<QuorumResponse, ServiceError> {
    let table = require_table(state, name)?;
    if !table.game().is_game_in_progress() {
        return Err(ServiceError::InvalidState(format!(
            "no game in progress at table `{name}`"
        )));
    }
    if !table.users().set_action(user, PlayerAction::Next) {
        return Err(user_not_found(name, user));
    }

    let quorum = table.increase_and_check_click_quorum();
    if quorum {
        table
            .users()
            .reset_actions(&table.game().match_user_names());
        state.bus().publish(ViewKind::Board, name);
    }
    Ok(QuorumResponse { quorum })
}

/// Invite players to a table, at most once per notification delay.
pub fn notify(state: &SharedState, name: &str) -> Result<NotifyResponse, ServiceError> {
    let table = require_table(state, name)?;
    let sent = table.try_claim_notification();
    if sent {
        info!(table = name, info = %table.info(), "table notification sent");
        state.bus().publish(ViewKind::Tables, name);
    }
    Ok(NotifyResponse { sent })
}

fn require_table(state: &SharedState, name: &str) -> Result<Arc<Table>, ServiceError> {
    state
        .tables()
        .get(name)
        .ok_or_else(|| table_not_found(name))
}

fn table_not_found(name: &str) -> ServiceError {
    ServiceError::NotFound(format!("table `{name}` not found"))
}

fn user_not_found(table: &str, user: &str) -> ServiceError {
    ServiceError::NotFound(format!("user `{user}` not found at table `{table}`"))
}
