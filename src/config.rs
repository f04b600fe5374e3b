//! Application-level configuration loading: countdown length, notification throttle and
//! supported table sizes.

use std::{env, fmt, fs, io::ErrorKind, ops::RangeInclusive, path::PathBuf};

use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "NAZDARBABY_BACK_CONFIG_PATH";

/// Minimum pause between two "come and play" notifications of a table.
pub const NOTIFICATION_DELAY_IN_MINUTES: i64 = 5;
/// A new-game countdown runs until the next wall-clock multiple of this many minutes.
pub const COUNTDOWN_PERIOD_IN_MINUTES: u64 = 1;
/// Longest accepted notification delay (one week).
pub const MAX_NOTIFICATION_DELAY_IN_MINUTES: i64 = 7 * 24 * 60;
/// Longest accepted countdown period or fixed countdown (one day).
pub const MAX_COUNTDOWN_IN_SECONDS: u64 = 24 * 60 * 60;
/// Player counts the scoring table knows how to score.
pub const SUPPORTED_PLAYER_COUNTS: [usize; 5] = [2, 3, 4, 5, 6];

/// How long a new-game countdown lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownLength {
    /// Until the next boundary of a period of `minutes` minutes.
    UntilPeriodBoundary {
        /// Period length in minutes.
        minutes: u64,
    },
    /// A fixed number of seconds.
    Fixed {
        /// Countdown length in seconds.
        seconds: u64,
    },
}

impl CountdownLength {
    /// Countdown length in whole seconds when started at `now`.
    pub fn seconds_from(&self, now: OffsetDateTime) -> u64 {
        match *self {
            CountdownLength::Fixed { seconds } => seconds,
            CountdownLength::UntilPeriodBoundary { minutes } => {
                let period = minutes.clamp(1, MAX_COUNTDOWN_IN_SECONDS / 60) * 60;
                let elapsed = now.unix_timestamp().rem_euclid(period as i64) as u64;
                period - elapsed
            }
        }
    }
}

/// Bounds on the number of players a match can start with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerLimits {
    /// Fewest players a match accepts.
    pub min: usize,
    /// Most players a match accepts; a running match of this size makes the table full.
    pub max: usize,
}

impl PlayerLimits {
    /// Derive the bounds from the supported player counts, falling back to the built-in sizes.
    pub fn from_supported(counts: &[usize]) -> Self {
        let counts = if counts.is_empty() {
            &SUPPORTED_PLAYER_COUNTS[..]
        } else {
            counts
        };
        let min = counts.iter().copied().min().unwrap_or(2);
        let max = counts.iter().copied().max().unwrap_or(min);
        Self { min, max }
    }

    /// Whether a match with `count` players may start.
    pub fn accepts(&self, count: usize) -> bool {
        (self.min..=self.max).contains(&count)
    }
}

impl Default for PlayerLimits {
    fn default() -> Self {
        Self::from_supported(&SUPPORTED_PLAYER_COUNTS)
    }
}

/// Settings every table is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSettings {
    /// Minimum pause between two table notifications.
    pub notification_delay: time::Duration,
    /// Length of the new-game countdown.
    pub countdown: CountdownLength,
    /// Allowed match sizes.
    pub limits: PlayerLimits,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            notification_delay: time::Duration::minutes(NOTIFICATION_DELAY_IN_MINUTES),
            countdown: CountdownLength::UntilPeriodBoundary {
                minutes: COUNTDOWN_PERIOD_IN_MINUTES,
            },
            limits: PlayerLimits::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    table: TableSettings,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        settings = ?app_config.table,
                        "loaded table settings from config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON document; absent keys keep their defaults.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Settings applied to newly created tables.
    pub fn table_settings(&self) -> TableSettings {
        self.table
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    notification_delay_minutes: Option<i64>,
    countdown_period_minutes: Option<u64>,
    countdown_seconds: Option<u64>,
    supported_player_counts: Option<Vec<usize>>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = TableSettings::default();

        let seconds = value.countdown_seconds.filter(|seconds| {
            accept_setting("countdown_seconds", *seconds, 0..=MAX_COUNTDOWN_IN_SECONDS)
        });
        let minutes = value.countdown_period_minutes.filter(|minutes| {
            accept_setting(
                "countdown_period_minutes",
                *minutes,
                1..=MAX_COUNTDOWN_IN_SECONDS / 60,
            )
        });
        let countdown = match (seconds, minutes) {
            (Some(seconds), _) => CountdownLength::Fixed { seconds },
            (None, Some(minutes)) => CountdownLength::UntilPeriodBoundary { minutes },
            (None, None) => defaults.countdown,
        };

        let notification_delay = value
            .notification_delay_minutes
            .filter(|minutes| {
                accept_setting(
                    "notification_delay_minutes",
                    *minutes,
                    0..=MAX_NOTIFICATION_DELAY_IN_MINUTES,
                )
            })
            .map(time::Duration::minutes)
            .unwrap_or(defaults.notification_delay);

        Self {
            table: TableSettings {
                notification_delay,
                countdown,
                limits: value
                    .supported_player_counts
                    .as_deref()
                    .map(PlayerLimits::from_supported)
                    .unwrap_or(defaults.limits),
            },
        }
    }
}

/// Whether `value` lies in `range`; out-of-range values are logged and replaced by defaults.
fn accept_setting<T>(key: &str, value: T, range: RangeInclusive<T>) -> bool
where
    T: PartialOrd + fmt::Display,
{
    let accepted = range.contains(&value);
    if !accepted {
        warn!(
            key,
            %value,
            min = %range.start(),
            max = %range.end(),
            "config value out of range; falling back to default"
        );
    }
    accepted
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_keeps_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config.table_settings(), TableSettings::default());
        assert_eq!(
            config.table_settings().notification_delay,
            time::Duration::minutes(5)
        );
    }

    #[test]
    fn fixed_countdown_wins_over_period() {
        let config =
            AppConfig::from_json(r#"{"countdown_seconds": 3, "countdown_period_minutes": 2}"#)
                .unwrap();
        assert_eq!(
            config.table_settings().countdown,
            CountdownLength::Fixed { seconds: 3 }
        );
    }

    #[test]
    fn limits_follow_supported_counts() {
        let config = AppConfig::from_json(r#"{"supported_player_counts": [4, 3, 5]}"#).unwrap();
        assert_eq!(
            config.table_settings().limits,
            PlayerLimits { min: 3, max: 5 }
        );
        assert_eq!(PlayerLimits::from_supported(&[]), PlayerLimits::default());
    }

    #[test]
    fn period_boundary_counts_down_to_the_next_minute() {
        let length = CountdownLength::UntilPeriodBoundary { minutes: 1 };
        let at = |secs| OffsetDateTime::from_unix_timestamp(secs).unwrap();

        assert_eq!(length.seconds_from(at(60)), 60);
        assert_eq!(length.seconds_from(at(61)), 59);
        assert_eq!(length.seconds_from(at(119)), 1);

        let five = CountdownLength::UntilPeriodBoundary { minutes: 5 };
        assert_eq!(five.seconds_from(at(301)), 299);
    }

    #[test]
    fn out_of_range_notification_delays_fall_back_to_default() {
        for document in [
            r#"{"notification_delay_minutes": 100000000000}"#,
            r#"{"notification_delay_minutes": -5}"#,
            r#"{"notification_delay_minutes": 9223372036854775807}"#,
        ] {
            let config = AppConfig::from_json(document).unwrap();
            assert_eq!(
                config.table_settings().notification_delay,
                time::Duration::minutes(NOTIFICATION_DELAY_IN_MINUTES),
                "{document}"
            );
        }

        let config = AppConfig::from_json(r#"{"notification_delay_minutes": 0}"#).unwrap();
        assert_eq!(config.table_settings().notification_delay, time::Duration::ZERO);
    }

    #[test]
    fn out_of_range_countdowns_fall_back_to_default() {
        for document in [
            r#"{"countdown_period_minutes": 0}"#,
            r#"{"countdown_period_minutes": 18446744073709551615}"#,
            r#"{"countdown_seconds": 18446744073709551615}"#,
        ] {
            let config = AppConfig::from_json(document).unwrap();
            assert_eq!(
                config.table_settings().countdown,
                TableSettings::default().countdown,
                "{document}"
            );
        }

        let config = AppConfig::from_json(
            r#"{"countdown_seconds": 86401, "countdown_period_minutes": 2}"#,
        )
        .unwrap();
        assert_eq!(
            config.table_settings().countdown,
            CountdownLength::UntilPeriodBoundary { minutes: 2 }
        );
    }

    #[test]
    fn oversized_period_is_clamped_when_counting() {
        let length = CountdownLength::UntilPeriodBoundary { minutes: u64::MAX };
        let at = OffsetDateTime::from_unix_timestamp(0).unwrap();
        assert_eq!(length.seconds_from(at), MAX_COUNTDOWN_IN_SECONDS);
    }

    #[test]
    fn limits_accept_inclusive_range() {
        let limits = PlayerLimits { min: 2, max: 6 };
        assert!(!limits.accepts(1));
        assert!(limits.accepts(2));
        assert!(limits.accepts(6));
        assert!(!limits.accepts(7));
    }
}
