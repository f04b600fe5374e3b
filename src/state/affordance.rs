use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::error::UiError;

/// UI element that displays the running countdown in its label.
pub trait CountdownAffordance: Send + Sync {
    /// Stable identifier of the element.
    fn id(&self) -> Uuid;
    /// User the element is shown to.
    fn owner(&self) -> &str;
    /// Current label text.
    fn label(&self) -> String;
    /// Replace the label text.
    fn set_label(&self, label: String);
}

/// Deferred label update handed to a [`UiAccess`].
pub type UiUpdate = Box<dyn FnOnce() + Send>;

/// Runs an update in the context that owns `affordance` (its UI thread, session lock, ...).
pub trait UiAccess: Send + Sync {
    /// Schedule `update` for `affordance`, preserving per-affordance order.
    fn access(&self, affordance: &Arc<dyn CountdownAffordance>, update: UiUpdate)
    -> Result<(), UiError>;
}

/// Dispatcher that applies updates immediately on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateUiAccess;

impl UiAccess for ImmediateUiAccess {
    fn access(
        &self,
        _affordance: &Arc<dyn CountdownAffordance>,
        update: UiUpdate,
    ) -> Result<(), UiError> {
        update();
        Ok(())
    }
}

/// Server-held label cell, e.g. the "ready" checkbox of one player.
#[derive(Debug)]
pub struct LabelAffordance {
    id: Uuid,
    owner: String,
    label: Mutex<String>,
}

impl LabelAffordance {
    /// New affordance owned by `owner` showing `label`.
    pub fn new(owner: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            label: Mutex::new(label.into()),
        }
    }
}

impl CountdownAffordance for LabelAffordance {
    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> &str {
        &self.owner
    }

    fn label(&self) -> String {
        self.label.lock().clone()
    }

    fn set_label(&self, label: String) {
        *self.label.lock() = label;
    }
}
