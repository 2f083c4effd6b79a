//! Receive request built from the poll configuration at the start of every cycle.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::config::PollConfig;
use super::errors::ValidationError;

pub const VISIBILITY_TIMEOUT_RANGE: RangeInclusive<i64> = 0..=43_200;
pub const MAX_NUMBER_OF_MESSAGES_RANGE: RangeInclusive<i64> = 1..=10;
pub const WAIT_TIME_SECONDS_RANGE: RangeInclusive<i64> = 0..=20;

/// Attribute selector asking the transport for every message attribute.
pub const ALL_ATTRIBUTES: &str = "All";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveRequest {
    pub queue: String,
    pub attribute_names: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility_timeout: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_number_of_messages: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_time_seconds: Option<u32>,
}

impl ReceiveRequest {
    /// Builds the request, range-checking each option that is set.
    ///
    /// Unset options are left out so the transport default applies.
    pub fn from_config(config: &PollConfig) -> Result<Self, ValidationError> {
        let options = &config.options;

        let visibility_timeout = checked(
            options.visibility_timeout,
            VISIBILITY_TIMEOUT_RANGE,
            ValidationError::VisibilityTimeout,
        )?;
        let max_number_of_messages = checked(
            options.max_number_of_messages,
            MAX_NUMBER_OF_MESSAGES_RANGE,
            ValidationError::MaxNumberOfMessages,
        )?;
        let wait_time_seconds = checked(
            options.wait_time_seconds,
            WAIT_TIME_SECONDS_RANGE,
            ValidationError::WaitTimeSeconds,
        )?;

        Ok(Self {
            queue: config.queue.clone(),
            attribute_names: vec![ALL_ATTRIBUTES.to_string()],
            visibility_timeout,
            max_number_of_messages,
            wait_time_seconds,
        })
    }
}

fn checked(
    value: Option<i64>,
    range: RangeInclusive<i64>,
    err: fn(i64) -> ValidationError,
) -> Result<Option<u32>, ValidationError> {
    match value {
        None => Ok(None),
        // Every range tops out well below u32::MAX.
        Some(v) if range.contains(&v) => Ok(Some(v as u32)),
        Some(v) => Err(err(v)),
    }
}
