use std::{
    any::Any,
    cell::Cell,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{
        Arc, Weak,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use dashmap::DashMap;
use parking_lot::{Mutex, ReentrantMutex};
use tokio::{
    runtime::Handle,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, error};

use super::task::{CountdownHandle, CountdownTask, ListenerKey};
use crate::error::HookError;

/// Tick period of the shared countdown timer.
pub const SCHEDULER_PERIOD: Duration = Duration::from_secs(1);

/// Multiplexes any number of countdowns onto a single periodic timer.
///
/// The timer task is spawned lazily by the first [`add_task`](Self::add_task) and torn down
/// when the last task is removed. Cloning the scheduler is cheap and shares the same timer.
#[derive(Clone)]
pub struct CountdownScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    tasks: DashMap<ListenerKey, Arc<CountdownTask>>,
    timer: Mutex<Option<JoinHandle<()>>>,
    // Set while a pass runs; passes never overlap and never nest.
    ticking: ReentrantMutex<Cell<bool>>,
    period: Duration,
    timers_started: AtomicUsize,
}

impl Default for CountdownScheduler {
    fn default() -> Self {
        Self::new(SCHEDULER_PERIOD)
    }
}

impl CountdownScheduler {
    /// Build an idle scheduler ticking every `period` once tasks arrive.
    pub fn new(period: Duration) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                tasks: DashMap::new(),
                timer: Mutex::new(None),
                ticking: ReentrantMutex::new(Cell::new(false)),
                period,
                timers_started: AtomicUsize::new(0),
            }),
        }
    }

    /// Register `task`, replacing any task already held for the same listener, and make sure
    /// the timer is running.
    ///
    /// Outside a Tokio runtime the task is registered but no timer can be spawned; the error
    /// is logged and the task only advances through [`tick`](Self::tick).
    pub fn add_task(&self, task: Arc<CountdownTask>) -> CountdownHandle {
        let handle = CountdownHandle::new(task.clone());
        if let Some(replaced) = self.inner.tasks.insert(task.listener().clone(), task) {
            replaced.mark_terminated();
        }
        self.inner.ensure_timer();
        handle
    }

    /// Run one pass over every registered task.
    ///
    /// The timer calls this once per period; it is public so a pass can also be driven
    /// explicitly. Concurrent passes run one after the other, and a pass requested from
    /// inside a hook is skipped.
    pub fn tick(&self) {
        self.inner.run_tick();
    }

    /// Number of tasks currently registered.
    pub fn task_count(&self) -> usize {
        self.inner.tasks.len()
    }

    /// Whether a task is registered for `listener`.
    pub fn contains(&self, listener: &ListenerKey) -> bool {
        self.inner.tasks.contains_key(listener)
    }

    /// Whether the periodic timer currently exists.
    pub fn is_timer_running(&self) -> bool {
        self.inner.timer.lock().is_some()
    }

    /// How many timers were spawned since the scheduler was built.
    pub fn timers_started(&self) -> usize {
        self.inner.timers_started.load(Ordering::Acquire)
    }
}

impl SchedulerInner {
    fn ensure_timer(self: &Arc<Self>) {
        let mut timer = self.timer.lock();
        if timer.is_some() || self.tasks.is_empty() {
            return;
        }

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(err) => {
                error!(error = %err, "no tokio runtime; countdown timer not started");
                return;
            }
        };

        let weak = Arc::downgrade(self);
        *timer = Some(runtime.spawn(run_timer(weak, self.period)));
        self.timers_started.fetch_add(1, Ordering::AcqRel);
        debug!(tasks = self.tasks.len(), "countdown timer started");
    }

    fn run_tick(&self) {
        let ticking = self.ticking.lock();
        if ticking.replace(true) {
            return;
        }
        let _pass = PassGuard(&ticking);

        let snapshot: Vec<Arc<CountdownTask>> = self
            .tasks
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        for task in snapshot {
            if !self.is_registered(&task) {
                continue;
            }

            if task.is_canceled() {
                self.remove(&task);
                continue;
            }

            if let Err(err) = guard_hook(|| task.each_run()) {
                error!(listener = %task.listener(), error = %err, "countdown tick failed; dropping task");
                self.remove(&task);
                continue;
            }

            if task.decrease_and_get() < 0 {
                // Unregister first so nothing observes the task as live during expiry.
                self.remove(&task);
                if let Err(err) = guard_hook(|| task.final_run()) {
                    error!(listener = %task.listener(), error = %err, "countdown expiry failed");
                }
            } else if !task.is_listening() {
                self.remove(&task);
            }
        }
    }

    fn is_registered(&self, task: &Arc<CountdownTask>) -> bool {
        !task.is_terminated()
            && self
                .tasks
                .get(task.listener())
                .is_some_and(|entry| Arc::ptr_eq(entry.value(), task))
    }

    fn remove(&self, task: &Arc<CountdownTask>) {
        task.mark_terminated();

        let mut timer = self.timer.lock();
        self.tasks
            .remove_if(task.listener(), |_, current| Arc::ptr_eq(current, task));

        if self.tasks.is_empty() {
            if let Some(handle) = timer.take() {
                handle.abort();
                debug!("countdown timer stopped");
            }
        }
    }
}

struct PassGuard<'a>(&'a Cell<bool>);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

async fn run_timer(scheduler: Weak<SchedulerInner>, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let Some(inner) = scheduler.upgrade() else {
            break;
        };
        inner.run_tick();
    }
}

fn guard_hook<F>(hook: F) -> Result<(), HookError>
where
    F: FnOnce() -> Result<(), HookError>,
{
    catch_unwind(AssertUnwindSafe(hook)).unwrap_or_else(|payload| {
        Err(HookError::Panicked(panic_message(payload.as_ref())))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
