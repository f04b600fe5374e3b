use std::sync::Arc;

use parking_lot::RwLock;

use crate::state::user::{User, UserProvider};

/// Match bookkeeping of a table: whether a game runs and who plays it.
///
/// Card rules and scoring live elsewhere; this only tracks the roster of the running match.
#[derive(Debug)]
pub struct Game {
    users: Arc<UserProvider>,
    inner: RwLock<GameInner>,
}

#[derive(Debug, Default)]
struct GameInner {
    in_progress: bool,
    match_users: Vec<String>,
}

impl Game {
    /// Bind a game to the roster it draws its players from.
    pub fn new(users: Arc<UserProvider>) -> Self {
        Self {
            users,
            inner: RwLock::new(GameInner::default()),
        }
    }

    /// Whether a match is running.
    pub fn is_game_in_progress(&self) -> bool {
        self.inner.read().in_progress
    }

    /// Start or stop the match. Starting snapshots the current playing users as match users.
    pub fn set_game_in_progress(&self, in_progress: bool) {
        let mut inner = self.inner.write();
        if in_progress {
            inner.match_users = self
                .users
                .playing_users()
                .into_iter()
                .map(|user| user.name)
                .collect();
        }
        inner.in_progress = in_progress;
    }

    /// Names of the users taking part in the current (or last) match.
    pub fn match_user_names(&self) -> Vec<String> {
        self.inner.read().match_users.clone()
    }

    /// Number of users in the current (or last) match.
    pub fn match_user_count(&self) -> usize {
        self.inner.read().match_users.len()
    }

    /// Snapshots of the match users, in seating order.
    pub fn match_users(&self) -> Vec<User> {
        self.match_user_names()
            .iter()
            .filter_map(|name| self.users.user(name))
            .collect()
    }

    /// Forget the match entirely.
    pub fn delete(&self) {
        let mut inner = self.inner.write();
        inner.in_progress = false;
        inner.match_users.clear();
    }
}
