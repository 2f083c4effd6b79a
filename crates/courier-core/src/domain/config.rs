//! Poll configuration: queue reference, cadence, and receive options.
//!
//! The configuration is immutable for the lifetime of one running poller.
//! Interval validation happens once at start; option ranges are re-checked
//! on every cycle when the receive request is built.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::errors::ConfigurationError;

/// Largest delay the tokio timer wheel can represent (`2^36 - 1` ms, about 2.2 years).
///
/// A normalized interval above this is rejected at start, before any timer is armed.
pub const MAX_TIMER_DELAY: Duration = Duration::from_millis((1 << 36) - 1);

/// Unit the polling interval is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    #[default]
    Seconds,
    Minutes,
    Hours,
}

impl IntervalUnit {
    /// Milliseconds in one unit.
    pub fn factor_ms(self) -> i64 {
        match self {
            IntervalUnit::Seconds => 1_000,
            IntervalUnit::Minutes => 60 * 1_000,
            IntervalUnit::Hours => 60 * 60 * 1_000,
        }
    }
}

/// Per-receive options.
///
/// Every option except `delete_messages` is independently optional; leaving one
/// unset keeps the transport's own default in effect. Values are stored raw so
/// that an out-of-range value reaches the per-cycle range check instead of
/// failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOptions {
    /// Delete messages once they have been handed to the sink.
    #[serde(default)]
    pub delete_messages: bool,

    /// Seconds a received message stays hidden from other receivers. Range `[0, 43200]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility_timeout: Option<i64>,

    /// Upper bound on messages returned by one receive. Range `[1, 10]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_number_of_messages: Option<i64>,

    /// Long-poll wait in seconds. Range `[0, 20]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_time_seconds: Option<i64>,
}

/// Poll configuration for one running instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollConfig {
    /// Queue reference handed to the transport (URL or name, transport-defined).
    pub queue: String,

    pub interval: i64,

    #[serde(default)]
    pub unit: IntervalUnit,

    #[serde(default)]
    pub options: PollOptions,
}

impl PollConfig {
    pub fn new(queue: impl Into<String>, interval: i64, unit: IntervalUnit) -> Self {
        Self {
            queue: queue.into(),
            interval,
            unit,
            options: PollOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PollOptions) -> Self {
        self.options = options;
        self
    }

    /// Delay between the end of one cycle and the start of the next.
    ///
    /// `max(interval * unit, wait_time_seconds * 1000)` in milliseconds, so a
    /// cycle never starts before the previous long poll could have returned.
    ///
    /// # Errors
    /// - `NonPositiveInterval` if `interval <= 0`
    /// - `IntervalOverflow` if the millisecond value does not fit in `i64`
    /// - `DelayTooLong` if the result exceeds [`MAX_TIMER_DELAY`]
    pub fn normalized_delay(&self) -> Result<Duration, ConfigurationError> {
        if self.interval <= 0 {
            return Err(ConfigurationError::NonPositiveInterval(self.interval));
        }

        let interval_ms = self
            .interval
            .checked_mul(self.unit.factor_ms())
            .ok_or(ConfigurationError::IntervalOverflow {
                interval: self.interval,
                unit: self.unit,
            })?;

        // Negative wait times are caught by the per-cycle range check; they
        // never lower the cadence.
        let wait_ms = self
            .options
            .wait_time_seconds
            .filter(|secs| *secs > 0)
            .map(|secs| secs.saturating_mul(1_000))
            .unwrap_or(0);

        let delay = Duration::from_millis(interval_ms.max(wait_ms) as u64);
        if delay > MAX_TIMER_DELAY {
            return Err(ConfigurationError::DelayTooLong {
                delay_ms: delay.as_millis(),
                max_ms: MAX_TIMER_DELAY.as_millis(),
            });
        }

        Ok(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::seconds(5, IntervalUnit::Seconds, 5_000)]
    #[case::minutes(1, IntervalUnit::Minutes, 60_000)]
    #[case::hours(2, IntervalUnit::Hours, 7_200_000)]
    fn normalized_delay_applies_unit_factor(
        #[case] interval: i64,
        #[case] unit: IntervalUnit,
        #[case] expected_ms: u64,
    ) {
        let config = PollConfig::new("q", interval, unit);
        assert_eq!(
            config.normalized_delay().unwrap(),
            Duration::from_millis(expected_ms)
        );
    }

    #[test]
    fn wait_time_raises_short_interval() {
        let config = PollConfig::new("q", 1, IntervalUnit::Seconds).with_options(PollOptions {
            wait_time_seconds: Some(20),
            ..Default::default()
        });
        assert_eq!(
            config.normalized_delay().unwrap(),
            Duration::from_millis(20_000)
        );
    }

    #[test]
    fn wait_time_does_not_lower_long_interval() {
        let config = PollConfig::new("q", 1, IntervalUnit::Minutes).with_options(PollOptions {
            wait_time_seconds: Some(20),
            ..Default::default()
        });
        assert_eq!(
            config.normalized_delay().unwrap(),
            Duration::from_millis(60_000)
        );
    }

    #[rstest]
    #[case::zero(0)]
    #[case::negative(-3)]
    fn non_positive_interval_is_rejected(#[case] interval: i64) {
        let config = PollConfig::new("q", interval, IntervalUnit::Seconds);
        assert!(matches!(
            config.normalized_delay(),
            Err(ConfigurationError::NonPositiveInterval(v)) if v == interval
        ));
    }

    #[test]
    fn delay_above_timer_limit_is_rejected() {
        // 100_000 hours is roughly 11 years.
        let config = PollConfig::new("q", 100_000, IntervalUnit::Hours);
        assert!(matches!(
            config.normalized_delay(),
            Err(ConfigurationError::DelayTooLong { .. })
        ));
    }

    #[test]
    fn multiplication_overflow_is_rejected() {
        let config = PollConfig::new("q", i64::MAX, IntervalUnit::Minutes);
        assert!(matches!(
            config.normalized_delay(),
            Err(ConfigurationError::IntervalOverflow { .. })
        ));
    }

    #[test]
    fn deserializes_camel_case_config() {
        let config: PollConfig = serde_json::from_value(serde_json::json!({
            "queue": "https://queue.local/123/orders",
            "interval": 1,
            "unit": "minutes",
            "options": { "deleteMessages": true, "maxNumberOfMessages": 5 }
        }))
        .unwrap();

        assert_eq!(config.unit, IntervalUnit::Minutes);
        assert!(config.options.delete_messages);
        assert_eq!(config.options.max_number_of_messages, Some(5));
        assert_eq!(config.options.visibility_timeout, None);
        assert_eq!(
            config.normalized_delay().unwrap(),
            Duration::from_millis(60_000)
        );
    }
}
