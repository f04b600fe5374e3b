pub mod affordance;
pub mod broadcast;
pub mod game;
pub mod registry;
pub mod table;
pub mod user;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    countdown::CountdownScheduler,
    state::{
        affordance::{ImmediateUiAccess, UiAccess},
        broadcast::BroadcastBus,
        registry::TableRegistry,
        table::TableContext,
    },
};

pub use self::broadcast::{ViewEvent, ViewKind};
pub use self::table::Table;

pub type SharedState = Arc<AppState>;

/// Central application state: the broadcast bus, the countdown timer and the table registry.
pub struct AppState {
    bus: Arc<BroadcastBus>,
    scheduler: CountdownScheduler,
    registry: Arc<TableRegistry>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: &AppConfig) -> SharedState {
        Self::with_ui(config, Arc::new(ImmediateUiAccess))
    }

    /// Same as [`AppState::new`] with a custom affordance dispatcher.
    pub fn with_ui(config: &AppConfig, ui: Arc<dyn UiAccess>) -> SharedState {
        let bus = Arc::new(BroadcastBus::default());
        let scheduler = CountdownScheduler::default();
        let registry = TableRegistry::new(TableContext {
            scheduler: scheduler.clone(),
            bus: bus.clone(),
            ui,
            settings: config.table_settings(),
        });

        Arc::new(Self {
            bus,
            scheduler,
            registry,
        })
    }

    /// Bus carrying view refresh notifications.
    pub fn bus(&self) -> &BroadcastBus {
        &self.bus
    }

    /// Shared countdown timer.
    pub fn scheduler(&self) -> &CountdownScheduler {
        &self.scheduler
    }

    /// Registry of every open table.
    pub fn tables(&self) -> &TableRegistry {
        &self.registry
    }
}
