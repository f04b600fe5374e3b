use serde::Serialize;
use utoipa::ToSchema;

use crate::state::ViewEvent;

#[derive(Clone, Debug)]
/// Dispatched payload carried across the SSE channel.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Body of `tables.changed`, `table.changed` and `board.changed` events.
pub struct ViewChangedEvent {
    /// Table whose views must refresh.
    pub table: String,
}

impl TryFrom<&ViewEvent> for ServerEvent {
    type Error = serde_json::Error;

    fn try_from(event: &ViewEvent) -> Result<Self, Self::Error> {
        ServerEvent::json(
            Some(event.view.event_name().to_string()),
            &ViewChangedEvent {
                table: event.table.clone(),
            },
        )
    }
}
