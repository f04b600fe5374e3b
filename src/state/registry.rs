use std::sync::{Arc, Weak};

use dashmap::{DashMap, mapref::entry::Entry};
use tracing::info;

use crate::{
    error::ServiceError,
    state::{
        broadcast::ViewKind,
        table::{Table, TableContext},
    },
};

/// Process-wide map from table name to [`Table`].
pub struct TableRegistry {
    tables: DashMap<String, Arc<Table>>,
    context: TableContext,
    this: Weak<TableRegistry>,
}

impl TableRegistry {
    /// Empty registry whose tables share `context`.
    pub fn new(context: TableContext) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            tables: DashMap::new(),
            context,
            this: this.clone(),
        })
    }

    /// Collaborators handed to every table.
    pub fn context(&self) -> &TableContext {
        &self.context
    }

    /// Return the table called `name`, creating it on first use.
    pub fn get_or_create(&self, name: &str) -> Result<Arc<Table>, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "table name must not be empty".into(),
            ));
        }

        let table = match self.tables.entry(name.to_string()) {
            Entry::Occupied(entry) => return Ok(entry.get().clone()),
            Entry::Vacant(entry) => entry
                .insert(Table::new(name, self.context.clone(), self.this.clone()))
                .clone(),
        };

        info!(table = name, "table created");
        self.context.bus.publish(ViewKind::Tables, name);
        Ok(table)
    }

    /// Look a table up by name.
    pub fn get(&self, name: &str) -> Option<Arc<Table>> {
        self.tables.get(name).map(|entry| entry.value().clone())
    }

    /// Every table, ordered by name.
    pub fn list(&self) -> Vec<Arc<Table>> {
        let mut tables: Vec<_> = self
            .tables
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        tables.sort_by(|a, b| a.name().cmp(b.name()));
        tables
    }

    /// Delete the table called `name`. Returns false when there is no such table.
    pub fn delete(&self, name: &str) -> bool {
        match self.get(name) {
            Some(table) => {
                table.delete();
                true
            }
            None => false,
        }
    }

    /// Drop the entry of `table`, leaving a same-named successor in place.
    pub(super) fn forget(&self, table: &Table) {
        self.tables
            .remove_if(table.name(), |_, current| std::ptr::eq(current.as_ref(), table));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::TableSettings,
        countdown::CountdownScheduler,
        state::{affordance::ImmediateUiAccess, broadcast::BroadcastBus},
    };

    fn registry() -> Arc<TableRegistry> {
        TableRegistry::new(TableContext {
            scheduler: CountdownScheduler::default(),
            bus: Arc::new(BroadcastBus::default()),
            ui: Arc::new(ImmediateUiAccess),
            settings: TableSettings::default(),
        })
    }

    #[test]
    fn get_or_create_returns_the_same_table() {
        let registry = registry();
        let first = registry.get_or_create("T").unwrap();
        let second = registry.get_or_create("T").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.get("T").unwrap().name(), "T");
    }

    #[test]
    fn blank_names_are_rejected() {
        let registry = registry();
        assert!(matches!(
            registry.get_or_create("  "),
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(registry.list().is_empty());
    }

    #[test]
    fn list_is_sorted_by_name() {
        let registry = registry();
        for name in ["b", "c", "a"] {
            registry.get_or_create(name).unwrap();
        }
        let names: Vec<_> = registry
            .list()
            .iter()
            .map(|table| table.name().to_string())
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn delete_is_idempotent() {
        let registry = registry();
        let mut rx = registry.context().bus.subscribe();
        registry.get_or_create("T").unwrap();

        assert!(registry.delete("T"));
        assert!(!registry.delete("T"));
        assert!(registry.get("T").is_none());

        let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|event| event.view == ViewKind::Tables));
    }

    #[test]
    fn stale_table_does_not_remove_its_successor() {
        let registry = registry();
        let old = registry.get_or_create("T").unwrap();
        old.delete();

        let fresh = registry.get_or_create("T").unwrap();
        old.delete();
        registry.forget(&old);

        assert!(Arc::ptr_eq(&registry.get("T").unwrap(), &fresh));
    }
}
