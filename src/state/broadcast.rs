use std::fmt;

use serde::Serialize;
use tokio::sync::broadcast;
use utoipa::ToSchema;

/// Capacity of the view broadcast channel before slow subscribers start lagging.
pub const DEFAULT_BUS_CAPACITY: usize = 64;

/// Which family of views must refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    /// Overview listing every table.
    Tables,
    /// Waiting room of a single table.
    Table,
    /// Game board of a single table.
    Board,
}

impl ViewKind {
    /// SSE event name used when forwarding to clients.
    pub fn event_name(self) -> &'static str {
        match self {
            ViewKind::Tables => "tables.changed",
            ViewKind::Table => "table.changed",
            ViewKind::Board => "board.changed",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

/// Notification that views of `view` kind showing `table` are stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewEvent {
    /// View family to refresh.
    pub view: ViewKind,
    /// Table the event concerns.
    pub table: String,
}

/// Process-wide publish/subscribe channel keyed by view kind and table name.
pub struct BroadcastBus {
    sender: broadcast::Sender<ViewEvent>,
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}

impl BroadcastBus {
    /// Construct a new bus backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.sender.subscribe()
    }

    /// Notify every subscriber, ignoring the case where nobody listens.
    pub fn publish(&self, view: ViewKind, table: &str) {
        let _ = self.sender.send(ViewEvent {
            view,
            table: table.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_receive_published_events() {
        let bus = BroadcastBus::default();
        let mut rx = bus.subscribe();

        bus.publish(ViewKind::Board, "T");
        bus.publish(ViewKind::Table, "T");

        assert_eq!(
            rx.try_recv().unwrap(),
            ViewEvent {
                view: ViewKind::Board,
                table: "T".into()
            }
        );
        assert_eq!(rx.try_recv().unwrap().view, ViewKind::Table);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        let bus = BroadcastBus::default();
        bus.publish(ViewKind::Tables, "nobody");
    }
}
