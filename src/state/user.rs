use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::Serialize;
use utoipa::ToSchema;

/// Transient action a player took on the board and that waits for the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlayerAction {
    /// Player clicked "Next" after a round.
    Next,
}

/// Participant of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct User {
    /// Display name, unique per table.
    pub name: String,
    /// Opted in to the next match.
    pub playing: bool,
    /// Marked ready for the next match.
    pub ready: bool,
    /// Left the table (or was dropped for not being ready in time).
    pub logged_out: bool,
    /// Must be offered a new game after the previous one was aborted.
    pub new_game: bool,
    /// Pending board action, if any.
    pub action: Option<PlayerAction>,
}

impl User {
    fn new(name: String) -> Self {
        Self {
            name,
            playing: true,
            ready: false,
            logged_out: false,
            new_game: false,
            action: None,
        }
    }

    /// Forget the pending board action.
    pub fn reset_action(&mut self) {
        self.action = None;
    }

    fn is_playing(&self) -> bool {
        self.playing && !self.logged_out
    }
}

/// Ordered roster of a single table.
#[derive(Debug, Default)]
pub struct UserProvider {
    users: RwLock<IndexMap<String, User>>,
}

impl UserProvider {
    /// Empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `name` to the roster, or bring a logged-out user back. Returns the user snapshot.
    pub fn join(&self, name: &str) -> User {
        let mut users = self.users.write();
        let user = users
            .entry(name.to_string())
            .or_insert_with(|| User::new(name.to_string()));
        if user.logged_out {
            *user = User::new(name.to_string());
        }
        user.clone()
    }

    /// Mark `name` as logged out. Returns false when the user is unknown.
    pub fn leave(&self, name: &str) -> bool {
        self.update(name, |user| {
            user.logged_out = true;
            user.ready = false;
        })
    }

    /// Toggle readiness. Returns false when the user is unknown or logged out.
    pub fn set_ready(&self, name: &str, ready: bool) -> bool {
        let mut users = self.users.write();
        match users.get_mut(name) {
            Some(user) if !user.logged_out => {
                user.ready = ready;
                true
            }
            _ => false,
        }
    }

    /// Record a board action. Returns false when the user is unknown.
    pub fn set_action(&self, name: &str, action: PlayerAction) -> bool {
        self.update(name, |user| user.action = Some(action))
    }

    /// Snapshot of a single user.
    pub fn user(&self, name: &str) -> Option<User> {
        self.users.read().get(name).cloned()
    }

    /// Snapshot of the whole roster in join order.
    pub fn users(&self) -> Vec<User> {
        self.users.read().values().cloned().collect()
    }

    /// Users opted in to the next match and still present, in join order.
    pub fn playing_users(&self) -> Vec<User> {
        self.users
            .read()
            .values()
            .filter(|user| user.is_playing())
            .cloned()
            .collect()
    }

    /// Whether every playing user is ready.
    pub fn are_playing_users_ready(&self) -> bool {
        self.users
            .read()
            .values()
            .filter(|user| user.is_playing())
            .all(|user| user.ready)
    }

    /// Log out every playing user that is not ready. Returns the affected names.
    pub fn log_out_not_ready_playing_users(&self) -> Vec<String> {
        let mut users = self.users.write();
        users
            .values_mut()
            .filter(|user| user.is_playing() && !user.ready)
            .map(|user| {
                user.logged_out = true;
                user.name.clone()
            })
            .collect()
    }

    /// Flag the given users, unless logged out, as waiting for a new game.
    pub fn mark_new_game(&self, names: &[String]) {
        let mut users = self.users.write();
        for name in names {
            match users.get_mut(name) {
                Some(user) if !user.logged_out => user.new_game = true,
                _ => {}
            }
        }
    }

    /// Clear the pending action of the given users.
    pub fn reset_actions(&self, names: &[String]) {
        let mut users = self.users.write();
        for name in names {
            if let Some(user) = users.get_mut(name) {
                user.reset_action();
            }
        }
    }

    /// Drop the roster of `table_name`.
    pub fn delete(&self, table_name: &str) {
        let mut users = self.users.write();
        tracing::debug!(table = table_name, users = users.len(), "dropping table roster");
        users.clear();
    }

    fn update(&self, name: &str, change: impl FnOnce(&mut User)) -> bool {
        let mut users = self.users.write();
        match users.get_mut(name) {
            Some(user) => {
                change(user);
                true
            }
            None => false,
        }
    }
}
