use std::{
    collections::VecDeque,
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, Ordering},
    },
};

use parking_lot::Mutex;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::{
    config::{PlayerLimits, TableSettings},
    countdown::{
        CountdownHandle, CountdownScheduler, CountdownTask, CountdownTick, ListenerKey,
        strip_countdown_suffix,
    },
    error::HookError,
    state::{
        affordance::{CountdownAffordance, UiAccess},
        broadcast::{BroadcastBus, ViewKind},
        game::Game,
        registry::TableRegistry,
        user::UserProvider,
    },
};

/// Collaborators shared by every table of a registry.
#[derive(Clone)]
pub struct TableContext {
    /// Timer driving the new-game countdowns.
    pub scheduler: CountdownScheduler,
    /// Bus notified whenever a view must refresh.
    pub bus: Arc<BroadcastBus>,
    /// Dispatcher for affordance label updates.
    pub ui: Arc<dyn UiAccess>,
    /// Countdown length, notification throttle and match size bounds.
    pub settings: TableSettings,
}

/// A named room: its roster, its match and the new-game countdown coordinating both.
///
/// Roster and match synchronize themselves; the countdown handle, the affordances, the click
/// counter and the notification timestamp sit behind one per-table monitor, shared between
/// request handlers and the countdown timer.
pub struct Table {
    name: String,
    users: Arc<UserProvider>,
    game: Game,
    context: TableContext,
    registry: Weak<TableRegistry>,
    this: Weak<Table>,
    deleted: AtomicBool,
    inner: Mutex<TableInner>,
}

struct TableInner {
    new_game_countdown: Option<CountdownHandle>,
    countdown_generation: u64,
    countdown_affordances: VecDeque<Arc<dyn CountdownAffordance>>,
    next_button_click_counter: usize,
    last_notification_time: OffsetDateTime,
}

impl TableInner {
    fn is_countdown_running(&self) -> bool {
        self.new_game_countdown
            .as_ref()
            .is_some_and(CountdownHandle::is_running)
    }
}

impl Table {
    pub(super) fn new(
        name: &str,
        context: TableContext,
        registry: Weak<TableRegistry>,
    ) -> Arc<Self> {
        let users = Arc::new(UserProvider::new());
        let game = Game::new(users.clone());
        let last_notification_time = notification_baseline(&context.settings);

        Arc::new_cyclic(|this| Self {
            name: name.to_string(),
            users,
            game,
            context,
            registry,
            this: this.clone(),
            deleted: AtomicBool::new(false),
            inner: Mutex::new(TableInner {
                new_game_countdown: None,
                countdown_generation: 0,
                countdown_affordances: VecDeque::new(),
                next_button_click_counter: 0,
                last_notification_time,
            }),
        })
    }

    /// Registry key of the table.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Roster of the table.
    pub fn users(&self) -> &UserProvider {
        &self.users
    }

    /// Match of the table.
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Match size bounds applied by [`try_start_new_game`](Self::try_start_new_game).
    pub fn limits(&self) -> PlayerLimits {
        self.context.settings.limits
    }

    /// Whether [`delete`](Self::delete) already ran.
    pub fn is_deleted(&self) -> bool {
        self.deleted.load(Ordering::Acquire)
    }

    /// Start the new-game countdown unless one is already running.
    ///
    /// On expiry a running match is aborted (its players are offered a new game); otherwise
    /// players who are still not ready are logged out and a new match is attempted.
    ///
    /// Call from within a Tokio runtime; elsewhere the countdown is registered but only
    /// advances when the scheduler is ticked by hand.
    pub fn start_new_game_countdown(&self) {
        let mut inner = self.inner.lock();
        if inner.is_countdown_running() {
            return;
        }

        inner.countdown_affordances.clear();
        inner.countdown_generation += 1;

        let seconds = self
            .context
            .settings
            .countdown
            .seconds_from(OffsetDateTime::now_utc());
        let task = self.new_game_task(seconds, inner.countdown_generation);
        inner.new_game_countdown = Some(self.context.scheduler.add_task(task));

        info!(table = %self.name, seconds, "new game countdown started");
    }

    /// Cancel the new-game countdown. Players at the board see the stop.
    pub fn stop_new_game_countdown(&self) {
        let affordances = {
            let mut inner = self.inner.lock();
            match inner.new_game_countdown.take() {
                Some(handle) => {
                    if handle.is_running() {
                        info!(table = %self.name, "new game countdown stopped");
                    }
                    handle.cancel();
                    inner.countdown_affordances.drain(..).collect()
                }
                None => Vec::new(),
            }
        };
        self.restore_labels(affordances);

        if self.game.is_game_in_progress() {
            self.users.reset_actions(&self.game.match_user_names());
            self.context.bus.publish(ViewKind::Board, &self.name);
        }
    }

    /// Whether a new-game countdown is alive.
    pub fn is_new_game_countdown_running(&self) -> bool {
        self.inner.lock().is_countdown_running()
    }

    /// Ticks left on the running countdown.
    pub fn new_game_countdown_remaining(&self) -> Option<i64> {
        let inner = self.inner.lock();
        inner
            .new_game_countdown
            .as_ref()
            .filter(|handle| handle.is_running())
            .map(CountdownHandle::remaining_ticks)
    }

    /// Show the countdown on `affordance` while it runs.
    ///
    /// At most one affordance per current participant is kept; the oldest makes room for a
    /// newcomer. Returns false when no countdown runs or nobody takes part.
    pub fn add_countdown_affordance(&self, affordance: Arc<dyn CountdownAffordance>) -> bool {
        let mut inner = self.inner.lock();
        if !inner.is_countdown_running() {
            return false;
        }

        let participants = self.current_participant_count();
        if participants == 0 {
            return false;
        }

        while inner.countdown_affordances.len() >= participants {
            inner.countdown_affordances.pop_front();
        }
        inner.countdown_affordances.push_back(affordance);
        true
    }

    /// Affordances currently showing the countdown, oldest first.
    pub fn countdown_affordances(&self) -> Vec<Arc<dyn CountdownAffordance>> {
        self.inner.lock().countdown_affordances.iter().cloned().collect()
    }

    /// Start a match when every playing user is ready and their number is supported.
    ///
    /// Returns whether the match started; failed preconditions leave the table untouched.
    pub fn try_start_new_game(&self) -> bool {
        if !self.users.are_playing_users_ready() {
            return false;
        }

        let playing = self.users.playing_users().len();
        if !self.limits().accepts(playing) {
            return false;
        }

        self.stop_new_game_countdown();
        {
            let mut inner = self.inner.lock();
            inner.last_notification_time = notification_baseline(&self.context.settings);
            inner.next_button_click_counter = 0;
        }
        self.game.set_game_in_progress(true);

        info!(table = %self.name, players = playing, "new game started");
        true
    }

    /// Count one "Next" click; true once every match user has clicked since the last quorum.
    pub fn increase_and_check_click_quorum(&self) -> bool {
        let match_users = self.game.match_user_count();
        if match_users == 0 {
            return false;
        }

        let mut inner = self.inner.lock();
        inner.next_button_click_counter += 1;
        inner.next_button_click_counter % match_users == 0
    }

    /// Human-readable status shown in the table list.
    pub fn info(&self) -> String {
        if self.game.is_game_in_progress() {
            return format!("In progress, Playing = {}", self.game.match_user_count());
        }

        let (ready, not_ready): (Vec<_>, Vec<_>) = self
            .users
            .playing_users()
            .into_iter()
            .partition(|user| user.ready);

        format!(
            "Not started, Ready = {}, Not ready = {}",
            ready.len(),
            not_ready.len()
        )
    }

    /// A running match seats the maximum number of players.
    pub fn is_full(&self) -> bool {
        self.game.is_game_in_progress() && self.game.match_user_count() == self.limits().max
    }

    /// When the table last notified potential players.
    pub fn last_notification_time(&self) -> OffsetDateTime {
        self.inner.lock().last_notification_time
    }

    /// Overwrite the notification timestamp.
    pub fn set_last_notification_time(&self, at: OffsetDateTime) {
        self.inner.lock().last_notification_time = at;
    }

    /// Make the next notification immediately permissible.
    pub fn reset_last_notification_time(&self) {
        self.inner.lock().last_notification_time = notification_baseline(&self.context.settings);
    }

    /// Claim the right to notify players now; false while the throttle delay has not elapsed.
    pub fn try_claim_notification(&self) -> bool {
        let now = OffsetDateTime::now_utc();
        let mut inner = self.inner.lock();
        if now - inner.last_notification_time < self.context.settings.notification_delay {
            return false;
        }
        inner.last_notification_time = now;
        true
    }

    /// Tear the table down: cancel its countdown, drop match and roster, and leave the registry.
    ///
    /// Later calls do nothing.
    pub fn delete(&self) {
        if self.deleted.swap(true, Ordering::AcqRel) {
            return;
        }

        {
            let mut inner = self.inner.lock();
            if let Some(handle) = inner.new_game_countdown.take() {
                handle.cancel();
            }
            inner.countdown_affordances.clear();
        }

        self.game.delete();
        self.users.delete(&self.name);
        self.context.bus.publish(ViewKind::Tables, &self.name);

        if let Some(registry) = self.registry.upgrade() {
            registry.forget(self);
        }

        info!(table = %self.name, "table deleted");
    }

    fn current_participant_count(&self) -> usize {
        if self.game.is_game_in_progress() {
            self.game.match_user_count()
        } else {
            self.users.playing_users().len()
        }
    }

    fn new_game_task(&self, seconds: u64, generation: u64) -> Arc<CountdownTask> {
        let on_tick = self.this.clone();
        let on_expiry = self.this.clone();
        let alive = self.this.clone();

        CountdownTask::builder(ListenerKey::new_game(&self.name), seconds)
            .on_each_run(move |tick| match on_tick.upgrade() {
                Some(table) => table.refresh_countdown_labels(tick),
                None => Ok(()),
            })
            .on_final_run(move || {
                if let Some(table) = on_expiry.upgrade() {
                    table.finish_new_game_countdown(generation);
                }
                Ok(())
            })
            .listening(move || alive.upgrade().is_some_and(|table| !table.is_deleted()))
            .build()
    }

    fn refresh_countdown_labels(&self, tick: &CountdownTick) -> Result<(), HookError> {
        let suffix = tick.formatted();
        for affordance in self.countdown_affordances() {
            let label = format!("{}{}", strip_countdown_suffix(&affordance.label()), suffix);
            self.dispatch_label(&affordance, label);
        }
        Ok(())
    }

    fn finish_new_game_countdown(&self, generation: u64) {
        let affordances = {
            let mut inner = self.inner.lock();
            if inner.countdown_generation == generation {
                inner.new_game_countdown = None;
                inner.countdown_affordances.drain(..).collect()
            } else {
                Vec::new()
            }
        };
        self.restore_labels(affordances);

        if self.game.is_game_in_progress() {
            info!(table = %self.name, "new game countdown expired; aborting current game");
            self.users.mark_new_game(&self.game.match_user_names());
            self.game.set_game_in_progress(false);
            self.context.bus.publish(ViewKind::Board, &self.name);
        } else {
            let dropped = self.users.log_out_not_ready_playing_users();
            info!(table = %self.name, ?dropped, "new game countdown expired");
            self.try_start_new_game();
        }

        // Waiting-room viewers refresh even when a match was running.
        self.context.bus.publish(ViewKind::Table, &self.name);
    }

    fn restore_labels(&self, affordances: Vec<Arc<dyn CountdownAffordance>>) {
        for affordance in affordances {
            let label = strip_countdown_suffix(&affordance.label()).to_string();
            self.dispatch_label(&affordance, label);
        }
    }

    fn dispatch_label(&self, affordance: &Arc<dyn CountdownAffordance>, label: String) {
        let target = affordance.clone();
        if let Err(err) = self
            .context
            .ui
            .access(affordance, Box::new(move || target.set_label(label)))
        {
            warn!(
                table = %self.name,
                affordance = %affordance.id(),
                error = %err,
                "failed to update countdown label"
            );
        }
    }
}

/// Timestamp from which a notification is immediately permissible.
fn notification_baseline(settings: &TableSettings) -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.checked_sub(settings.notification_delay)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast;

    use super::*;
    use crate::{
        config::CountdownLength,
        error::UiError,
        state::{
            affordance::{ImmediateUiAccess, LabelAffordance, UiUpdate},
            broadcast::ViewEvent,
            user::PlayerAction,
        },
    };

    fn context_with_ui(seconds: u64, ui: Arc<dyn UiAccess>) -> TableContext {
        TableContext {
            scheduler: CountdownScheduler::default(),
            bus: Arc::new(BroadcastBus::default()),
            ui,
            settings: TableSettings {
                countdown: CountdownLength::Fixed { seconds },
                ..TableSettings::default()
            },
        }
    }

    fn context(seconds: u64) -> TableContext {
        context_with_ui(seconds, Arc::new(ImmediateUiAccess))
    }

    fn seat(table: &Table, players: &[(&str, bool)]) {
        for (name, ready) in players {
            table.users().join(name);
            table.users().set_ready(name, *ready);
        }
    }

    fn drain(rx: &mut broadcast::Receiver<ViewEvent>) -> Vec<ViewKind> {
        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(event.view);
        }
        kinds
    }

    fn label(owner: &str, text: &str) -> Arc<dyn CountdownAffordance> {
        Arc::new(LabelAffordance::new(owner, text))
    }

    #[tokio::test]
    async fn ready_players_start_a_game() {
        let registry = TableRegistry::new(context(3));
        let table = registry.get_or_create("T").unwrap();
        seat(&table, &[("ann", true), ("bob", true), ("cyril", true)]);

        assert!(table.try_start_new_game());
        assert!(table.game().is_game_in_progress());
        assert_eq!(table.info(), "In progress, Playing = 3");
    }

    #[tokio::test]
    async fn start_requires_readiness_and_supported_size() {
        let registry = TableRegistry::new(context(3));
        let table = registry.get_or_create("T").unwrap();
        seat(&table, &[("ann", true), ("bob", false)]);
        assert!(!table.try_start_new_game());
        assert_eq!(table.info(), "Not started, Ready = 1, Not ready = 1");

        table.users().leave("bob");
        assert!(!table.try_start_new_game());
        assert!(!table.game().is_game_in_progress());

        seat(
            &table,
            &[
                ("b", true),
                ("c", true),
                ("d", true),
                ("e", true),
                ("f", true),
                ("g", true),
            ],
        );
        assert!(!table.try_start_new_game());
    }

    #[tokio::test]
    async fn expiry_logs_out_late_players_and_starts_the_game() {
        let ctx = context(3);
        let scheduler = ctx.scheduler.clone();
        let mut rx = ctx.bus.subscribe();
        let registry = TableRegistry::new(ctx);
        let table = registry.get_or_create("T").unwrap();
        seat(
            &table,
            &[("ann", true), ("bob", true), ("cyril", true), ("dana", false)],
        );
        drain(&mut rx);

        table.start_new_game_countdown();
        for _ in 0..3 {
            scheduler.tick();
        }
        assert!(table.is_new_game_countdown_running());
        assert!(!table.game().is_game_in_progress());

        scheduler.tick();
        assert!(table.users().user("dana").unwrap().logged_out);
        assert!(table.game().is_game_in_progress());
        assert_eq!(table.game().match_user_names(), ["ann", "bob", "cyril"]);
        assert!(!table.is_new_game_countdown_running());
        assert_eq!(drain(&mut rx), [ViewKind::Table]);
    }

    #[tokio::test]
    async fn expiry_during_a_game_aborts_it() {
        let ctx = context(2);
        let scheduler = ctx.scheduler.clone();
        let mut rx = ctx.bus.subscribe();
        let registry = TableRegistry::new(ctx);
        let table = registry.get_or_create("T").unwrap();
        seat(
            &table,
            &[("ann", true), ("bob", true), ("cyril", true), ("dana", true)],
        );
        assert!(table.try_start_new_game());
        table.users().leave("dana");
        drain(&mut rx);

        table.start_new_game_countdown();
        for _ in 0..3 {
            scheduler.tick();
        }

        assert!(!table.game().is_game_in_progress());
        for name in ["ann", "bob", "cyril"] {
            assert!(table.users().user(name).unwrap().new_game);
        }
        assert!(!table.users().user("dana").unwrap().new_game);
        assert_eq!(drain(&mut rx), [ViewKind::Board, ViewKind::Table]);
    }

    #[tokio::test]
    async fn stopping_suppresses_expiry_and_resets_actions() {
        let ctx = context(2);
        let scheduler = ctx.scheduler.clone();
        let mut rx = ctx.bus.subscribe();
        let registry = TableRegistry::new(ctx);
        let table = registry.get_or_create("T").unwrap();
        seat(&table, &[("ann", true), ("bob", true)]);
        assert!(table.try_start_new_game());
        table.users().set_action("ann", PlayerAction::Next);
        drain(&mut rx);

        table.start_new_game_countdown();
        scheduler.tick();
        table.stop_new_game_countdown();

        assert!(!table.is_new_game_countdown_running());
        assert_eq!(table.users().user("ann").unwrap().action, None);
        assert_eq!(drain(&mut rx), [ViewKind::Board]);

        for _ in 0..5 {
            scheduler.tick();
        }
        assert!(table.game().is_game_in_progress());
        assert!(!table.users().user("ann").unwrap().new_game);
        assert_eq!(scheduler.task_count(), 0);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn stopping_outside_a_game_is_silent() {
        let ctx = context(2);
        let mut rx = ctx.bus.subscribe();
        let registry = TableRegistry::new(ctx);
        let table = registry.get_or_create("T").unwrap();
        drain(&mut rx);

        table.stop_new_game_countdown();
        table.start_new_game_countdown();
        table.stop_new_game_countdown();
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn starting_twice_keeps_a_single_countdown() {
        let ctx = context(30);
        let scheduler = ctx.scheduler.clone();
        let registry = TableRegistry::new(ctx);
        let table = registry.get_or_create("T").unwrap();

        table.start_new_game_countdown();
        scheduler.tick();
        table.start_new_game_countdown();

        assert_eq!(scheduler.task_count(), 1);
        assert_eq!(table.new_game_countdown_remaining(), Some(29));
    }

    #[tokio::test]
    async fn affordances_are_capped_by_participants() {
        let registry = TableRegistry::new(context(30));
        let table = registry.get_or_create("T").unwrap();
        seat(&table, &[("ann", false), ("bob", false), ("cyril", false)]);

        let early = label("ann", "Ready");
        assert!(!table.add_countdown_affordance(early));

        table.start_new_game_countdown();
        let added: Vec<_> = (0..5)
            .map(|index| label("ann", &format!("Ready {index}")))
            .collect();
        for affordance in &added {
            assert!(table.add_countdown_affordance(affordance.clone()));
            assert!(table.countdown_affordances().len() <= 3);
        }

        let kept: Vec<_> = table
            .countdown_affordances()
            .iter()
            .map(|affordance| affordance.id())
            .collect();
        let expected: Vec<_> = added[2..].iter().map(|affordance| affordance.id()).collect();
        assert_eq!(kept, expected);
    }

    #[tokio::test]
    async fn labels_follow_the_countdown_and_are_restored() {
        let ctx = context(3);
        let scheduler = ctx.scheduler.clone();
        let registry = TableRegistry::new(ctx);
        let table = registry.get_or_create("T").unwrap();
        seat(&table, &[("ann", false), ("bob", false)]);

        table.start_new_game_countdown();
        let affordance = label("ann", "Ready");
        table.add_countdown_affordance(affordance.clone());

        scheduler.tick();
        assert_eq!(affordance.label(), "Ready (00:03)");
        scheduler.tick();
        assert_eq!(affordance.label(), "Ready (00:02)");

        table.stop_new_game_countdown();
        assert_eq!(affordance.label(), "Ready");
        assert!(table.countdown_affordances().is_empty());
    }

    #[tokio::test]
    async fn expiry_without_a_game_start_still_clears_affordances() {
        let ctx = context(1);
        let scheduler = ctx.scheduler.clone();
        let registry = TableRegistry::new(ctx);
        let table = registry.get_or_create("T").unwrap();
        seat(&table, &[("ann", true)]);

        table.start_new_game_countdown();
        let affordance = label("ann", "Ready");
        assert!(table.add_countdown_affordance(affordance.clone()));

        scheduler.tick();
        scheduler.tick();

        assert!(!table.game().is_game_in_progress());
        assert!(!table.is_new_game_countdown_running());
        assert!(table.countdown_affordances().is_empty());
        assert_eq!(affordance.label(), "Ready");
    }

    struct RejectingUi;

    impl UiAccess for RejectingUi {
        fn access(
            &self,
            affordance: &Arc<dyn CountdownAffordance>,
            update: UiUpdate,
        ) -> Result<(), UiError> {
            if affordance.owner() == "gone" {
                return Err(UiError::Detached);
            }
            update();
            Ok(())
        }
    }

    #[tokio::test]
    async fn failed_label_dispatch_does_not_stop_the_countdown() {
        let ctx = context_with_ui(5, Arc::new(RejectingUi));
        let scheduler = ctx.scheduler.clone();
        let registry = TableRegistry::new(ctx);
        let table = registry.get_or_create("T").unwrap();
        seat(&table, &[("ann", false), ("gone", false)]);

        table.start_new_game_countdown();
        let detached = label("gone", "Ready");
        let attached = label("ann", "Ready");
        table.add_countdown_affordance(detached.clone());
        table.add_countdown_affordance(attached.clone());

        scheduler.tick();
        assert_eq!(detached.label(), "Ready");
        assert_eq!(attached.label(), "Ready (00:05)");
        assert!(table.is_new_game_countdown_running());
    }

    #[tokio::test]
    async fn click_quorum_fires_on_multiples_of_match_size() {
        let registry = TableRegistry::new(context(3));
        let table = registry.get_or_create("T").unwrap();
        assert!(!table.increase_and_check_click_quorum());

        seat(&table, &[("ann", true), ("bob", true), ("cyril", true)]);
        assert!(table.try_start_new_game());

        let clicks: Vec<_> = (0..6)
            .map(|_| table.increase_and_check_click_quorum())
            .collect();
        assert_eq!(clicks, [false, false, true, false, false, true]);

        seat(&table, &[("dana", true)]);
        assert!(table.try_start_new_game());
        assert!(!table.increase_and_check_click_quorum());
    }

    #[tokio::test]
    async fn notification_throttle() {
        let registry = TableRegistry::new(context(3));
        let table = registry.get_or_create("T").unwrap();
        let delay = time::Duration::minutes(5);
        assert!(OffsetDateTime::now_utc() - table.last_notification_time() >= delay);

        assert!(table.try_claim_notification());
        assert!(!table.try_claim_notification());

        table.reset_last_notification_time();
        assert!(OffsetDateTime::now_utc() - table.last_notification_time() >= delay);
        assert!(table.try_claim_notification());
    }

    #[tokio::test]
    async fn restored_notification_time_drives_the_throttle() {
        let registry = TableRegistry::new(context(3));
        let table = registry.get_or_create("T").unwrap();

        let recent = OffsetDateTime::now_utc() - time::Duration::minutes(1);
        table.set_last_notification_time(recent);
        assert_eq!(table.last_notification_time(), recent);
        assert!(!table.try_claim_notification());

        table.set_last_notification_time(recent - time::Duration::minutes(10));
        assert!(table.try_claim_notification());
    }

    #[test]
    fn unrepresentable_notification_delay_does_not_break_tables() {
        let mut ctx = context(3);
        ctx.settings.notification_delay = time::Duration::MAX;
        let registry = TableRegistry::new(ctx);

        let table = registry.get_or_create("T").unwrap();
        assert_eq!(table.last_notification_time(), OffsetDateTime::UNIX_EPOCH);

        table.reset_last_notification_time();
        assert_eq!(table.last_notification_time(), OffsetDateTime::UNIX_EPOCH);
    }

    #[tokio::test]
    async fn full_table_runs_a_maximum_size_match() {
        let registry = TableRegistry::new(context(3));
        let table = registry.get_or_create("T").unwrap();
        let names = ["a", "b", "c", "d", "e"];
        seat(
            &table,
            &names.iter().map(|name| (*name, true)).collect::<Vec<_>>(),
        );
        assert!(table.try_start_new_game());
        assert!(!table.is_full());

        table.game().delete();
        seat(&table, &[("f", true)]);
        assert!(table.try_start_new_game());
        assert!(table.is_full());
    }

    #[tokio::test]
    async fn deleting_cancels_the_countdown() {
        let ctx = context(3);
        let scheduler = ctx.scheduler.clone();
        let registry = TableRegistry::new(ctx);
        let table = registry.get_or_create("T").unwrap();
        seat(&table, &[("ann", true), ("bob", true)]);

        table.start_new_game_countdown();
        table.delete();
        table.delete();

        assert!(table.is_deleted());
        assert!(!table.is_new_game_countdown_running());
        assert!(table.users().users().is_empty());
        assert!(registry.get("T").is_none());

        scheduler.tick();
        assert_eq!(scheduler.task_count(), 0);
        assert!(!table.game().is_game_in_progress());
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_expires_on_the_real_timer() {
        let ctx = context(2);
        let registry = TableRegistry::new(ctx);
        let table = registry.get_or_create("T").unwrap();
        seat(&table, &[("ann", true), ("bob", true), ("cyril", false)]);

        table.start_new_game_countdown();
        tokio::time::sleep(std::time::Duration::from_millis(1_500)).await;
        assert!(table.is_new_game_countdown_running());

        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
        assert!(!table.is_new_game_countdown_running());
        assert!(table.game().is_game_in_progress());
        assert_eq!(table.info(), "In progress, Playing = 2");
    }
}
