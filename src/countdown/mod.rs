//! Shared 1 Hz countdown timer and the tasks it drives.

mod scheduler;
mod task;

pub use self::scheduler::{CountdownScheduler, SCHEDULER_PERIOD};
pub use self::task::{
    CountdownHandle, CountdownTask, CountdownTaskBuilder, CountdownTick, ListenerKey,
    format_countdown, strip_countdown_suffix,
};
