use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicI64, Ordering},
    },
};

use crate::error::HookError;

type EachRunHook = Box<dyn Fn(&CountdownTick) -> Result<(), HookError> + Send + Sync>;
type FinalRunHook = Box<dyn Fn() -> Result<(), HookError> + Send + Sync>;
type ListeningProbe = Box<dyn Fn() -> bool + Send + Sync>;

/// Identity of a countdown subscriber; the scheduler keeps one task per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListenerKey(String);

impl ListenerKey {
    /// Wrap an arbitrary key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key used by a table for its "new game" countdown.
    pub fn new_game(table_name: &str) -> Self {
        Self(format!("table:{table_name}:new-game"))
    }

    /// Borrow the raw key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListenerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value handed to `each_run`: the ticks left before this tick's decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTick {
    /// Remaining ticks (seconds) as observed by the hook.
    pub remaining_ticks: i64,
}

impl CountdownTick {
    /// Suffix appended to affordance labels, e.g. ` (00:05)`.
    pub fn formatted(&self) -> String {
        format_countdown(self.remaining_ticks)
    }
}

/// Render a tick count as the ` (MM:SS)` label suffix.
pub fn format_countdown(remaining_ticks: i64) -> String {
    let seconds = remaining_ticks.max(0);
    format!(" ({:02}:{:02})", seconds / 60, seconds % 60)
}

/// Strip a countdown suffix previously appended by [`format_countdown`].
///
/// Everything from the first ` (<digits>:<two digits>)` occurrence onwards is dropped, so
/// relabelling on every tick never stacks suffixes.
pub fn strip_countdown_suffix(label: &str) -> &str {
    label
        .match_indices(" (")
        .map(|(index, _)| index)
        .find(|&index| is_countdown_suffix(&label[index + 2..]))
        .map(|index| &label[..index])
        .unwrap_or(label)
}

fn is_countdown_suffix(rest: &str) -> bool {
    let Some(close) = rest.find(')') else {
        return false;
    };
    let Some((minutes, seconds)) = rest[..close].split_once(':') else {
        return false;
    };

    !minutes.is_empty()
        && minutes.chars().all(|c| c.is_ascii_digit())
        && seconds.len() == 2
        && seconds.chars().all(|c| c.is_ascii_digit())
}

/// A decrementing counter driven by the [`CountdownScheduler`](super::CountdownScheduler).
pub struct CountdownTask {
    listener: ListenerKey,
    remaining_ticks: AtomicI64,
    canceled: AtomicBool,
    terminated: AtomicBool,
    finalized: AtomicBool,
    each_run: Option<EachRunHook>,
    final_run: Option<FinalRunHook>,
    listening: Option<ListeningProbe>,
}

impl CountdownTask {
    /// Start building a task for `listener` that expires after `ticks` decrements below zero.
    pub fn builder(listener: ListenerKey, ticks: u64) -> CountdownTaskBuilder {
        CountdownTaskBuilder {
            listener,
            ticks,
            each_run: None,
            final_run: None,
            listening: None,
        }
    }

    /// Key identifying this task within the scheduler.
    pub fn listener(&self) -> &ListenerKey {
        &self.listener
    }

    /// Ticks left before expiry.
    pub fn remaining_ticks(&self) -> i64 {
        self.remaining_ticks.load(Ordering::Acquire)
    }

    /// Request cooperative cancellation; the next tick drops the task.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::Release);
    }

    /// Whether the owner canceled the task.
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }

    /// Whether the listener still wants ticks.
    pub fn is_listening(&self) -> bool {
        self.listening.as_ref().is_none_or(|probe| probe())
    }

    /// Whether the scheduler has dropped this task (expired, canceled or not listening).
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    pub(super) fn mark_terminated(&self) {
        self.terminated.store(true, Ordering::Release);
    }

    pub(super) fn decrease_and_get(&self) -> i64 {
        self.remaining_ticks.fetch_sub(1, Ordering::AcqRel) - 1
    }

    pub(super) fn each_run(&self) -> Result<(), HookError> {
        let tick = CountdownTick {
            remaining_ticks: self.remaining_ticks(),
        };
        match &self.each_run {
            Some(hook) => hook(&tick),
            None => Ok(()),
        }
    }

    /// Run the expiry hook; later calls are ignored.
    pub(super) fn final_run(&self) -> Result<(), HookError> {
        if self.finalized.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        match &self.final_run {
            Some(hook) => hook(),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for CountdownTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountdownTask")
            .field("listener", &self.listener)
            .field("remaining_ticks", &self.remaining_ticks())
            .field("canceled", &self.is_canceled())
            .field("terminated", &self.is_terminated())
            .finish()
    }
}

/// Builder for [`CountdownTask`].
pub struct CountdownTaskBuilder {
    listener: ListenerKey,
    ticks: u64,
    each_run: Option<EachRunHook>,
    final_run: Option<FinalRunHook>,
    listening: Option<ListeningProbe>,
}

impl CountdownTaskBuilder {
    /// Hook invoked on every tick, before the decrement.
    pub fn on_each_run<F>(mut self, hook: F) -> Self
    where
        F: Fn(&CountdownTick) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.each_run = Some(Box::new(hook));
        self
    }

    /// Hook invoked once when the counter drops below zero.
    pub fn on_final_run<F>(mut self, hook: F) -> Self
    where
        F: Fn() -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.final_run = Some(Box::new(hook));
        self
    }

    /// Liveness probe polled after each decrement. Defaults to always listening.
    pub fn listening<F>(mut self, probe: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.listening = Some(Box::new(probe));
        self
    }

    /// Finish the task.
    pub fn build(self) -> Arc<CountdownTask> {
        Arc::new(CountdownTask {
            listener: self.listener,
            remaining_ticks: AtomicI64::new(i64::try_from(self.ticks).unwrap_or(i64::MAX)),
            canceled: AtomicBool::new(false),
            terminated: AtomicBool::new(false),
            finalized: AtomicBool::new(false),
            each_run: self.each_run,
            final_run: self.final_run,
            listening: self.listening,
        })
    }
}

/// Owner-side handle to a scheduled task.
#[derive(Debug, Clone)]
pub struct CountdownHandle {
    task: Arc<CountdownTask>,
}

impl CountdownHandle {
    pub(super) fn new(task: Arc<CountdownTask>) -> Self {
        Self { task }
    }

    /// Cancel the countdown. Cooperative: takes effect on the next tick.
    pub fn cancel(&self) {
        self.task.cancel();
    }

    /// Whether [`cancel`](Self::cancel) was called.
    pub fn is_canceled(&self) -> bool {
        self.task.is_canceled()
    }

    /// True until the countdown is canceled, expires or loses its listener.
    pub fn is_running(&self) -> bool {
        !self.task.is_canceled() && !self.task.is_terminated()
    }

    /// Ticks left before expiry.
    pub fn remaining_ticks(&self) -> i64 {
        self.task.remaining_ticks()
    }

    /// Key the task is registered under.
    pub fn listener(&self) -> &ListenerKey {
        self.task.listener()
    }
}
