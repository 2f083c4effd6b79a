//! Status - ポーラーの実行統計
//!
//! スケジューラがサイクルの開始/スキップを、CycleExecutor が結果の内訳を記録します。
//! スケジューラ自身は結果の詳細を見ません。

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::domain::CycleOutcome;

/// Rolling counters for one poller instance.
#[derive(Debug, Default)]
pub struct PollStats {
    cycles_started: AtomicU64,
    ticks_skipped: AtomicU64,
    empty_receives: AtomicU64,
    messages_delivered: AtomicU64,
    validation_failures: AtomicU64,
    receive_failures: AtomicU64,
    delete_failures: AtomicU64,
}

impl PollStats {
    pub fn record_cycle_started(&self) {
        self.cycles_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tick_skipped(&self) {
        self.ticks_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_outcome(&self, outcome: &CycleOutcome) {
        match outcome {
            CycleOutcome::Delivered { count, deleted } => {
                self.messages_delivered
                    .fetch_add(*count as u64, Ordering::Relaxed);
                if *deleted == Some(false) {
                    self.delete_failures.fetch_add(1, Ordering::Relaxed);
                }
            }
            CycleOutcome::Empty => {
                self.empty_receives.fetch_add(1, Ordering::Relaxed);
            }
            CycleOutcome::Invalid(_) => {
                self.validation_failures.fetch_add(1, Ordering::Relaxed);
            }
            CycleOutcome::ReceiveFailed(_) => {
                self.receive_failures.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn snapshot(&self) -> PollStatsSnapshot {
        PollStatsSnapshot {
            cycles_started: self.cycles_started.load(Ordering::Relaxed),
            ticks_skipped: self.ticks_skipped.load(Ordering::Relaxed),
            empty_receives: self.empty_receives.load(Ordering::Relaxed),
            messages_delivered: self.messages_delivered.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            receive_failures: self.receive_failures.load(Ordering::Relaxed),
            delete_failures: self.delete_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollStatsSnapshot {
    pub cycles_started: u64,
    pub ticks_skipped: u64,
    pub empty_receives: u64,
    pub messages_delivered: u64,
    pub validation_failures: u64,
    pub receive_failures: u64,
    pub delete_failures: u64,
}
