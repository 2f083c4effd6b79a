//! Domain model (config, messages, requests, outcomes, errors).

pub mod config;
pub mod errors;
pub mod message;
pub mod outcome;
pub mod request;

pub use self::config::{IntervalUnit, MAX_TIMER_DELAY, PollConfig, PollOptions};
pub use self::errors::{ConfigurationError, SinkError, TransportError, ValidationError};
pub use self::message::{DeleteBatch, DeleteBatchEntry, ReceivedMessage, encode_receipt_handle};
pub use self::outcome::{CycleOutcome, OutcomeKind};
pub use self::request::ReceiveRequest;
