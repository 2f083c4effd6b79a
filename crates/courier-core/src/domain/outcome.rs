//! Outcome model: what happened during one poll cycle.
//!
//! The scheduler only cares that a cycle finished; the detail here feeds
//! logging, run stats and tests.

use serde::{Deserialize, Serialize};

use super::errors::{TransportError, ValidationError};

/// A unified classification of a cycle result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    Delivered,
    Empty,
    Invalid,
    ReceiveFailed,
}

/// Result of one cycle, as seen by the reporting path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Messages reached the sink.
    ///
    /// `deleted` is `None` when deletion is disabled, `Some(false)` when the
    /// delete call failed.
    Delivered {
        count: usize,
        deleted: Option<bool>,
    },

    /// The receive call returned no messages.
    Empty,

    /// An option was out of range; no receive call was made.
    Invalid(ValidationError),

    /// The receive call failed; nothing was delivered or deleted.
    ReceiveFailed(TransportError),
}

impl CycleOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            CycleOutcome::Delivered { .. } => OutcomeKind::Delivered,
            CycleOutcome::Empty => OutcomeKind::Empty,
            CycleOutcome::Invalid(_) => OutcomeKind::Invalid,
            CycleOutcome::ReceiveFailed(_) => OutcomeKind::ReceiveFailed,
        }
    }

    pub fn delivered_count(&self) -> usize {
        match self {
            CycleOutcome::Delivered { count, .. } => *count,
            _ => 0,
        }
    }

    /// True when deletion was attempted and failed.
    pub fn delete_failed(&self) -> bool {
        matches!(
            self,
            CycleOutcome::Delivered {
                deleted: Some(false),
                ..
            }
        )
    }
}
