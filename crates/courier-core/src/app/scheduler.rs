//! PollScheduler - 自己再アームするタイマーとサイクルの重複防止
//!
//! # 状態遷移
//! armed → firing → (skip | execute) → rearm or halt
//!
//! - 最初のサイクルは遅延 0 で発火
//! - 次の発火は「前のサイクルの完了」から delay 後（壁時計には揃えない）
//! - in_flight 中の発火はスキップ（キューイングもキャッチアップもしない）
//! - stop() はスケジューリングだけを止める。実行中のサイクルは最後まで走る

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::app::status::{PollStats, PollStatsSnapshot};
use crate::domain::{ConfigurationError, CycleOutcome, PollConfig, SinkError};

/// Run flags shared by the timer task and its handle.
///
/// `running` is cleared once and never set again. `in_flight` is only touched
/// by the timer task.
#[derive(Debug)]
pub(crate) struct RunState {
    running: AtomicBool,
    in_flight: AtomicBool,
}

impl RunState {
    fn started() -> Self {
        Self {
            running: AtomicBool::new(true),
            in_flight: AtomicBool::new(false),
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Returns true if this call is the one that stopped the run.
    pub(crate) fn stop(&self) -> bool {
        self.running.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Claims the in-flight slot. False means a cycle is already running.
    pub(crate) fn try_begin_cycle(&self) -> bool {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn finish_cycle(&self) {
        self.in_flight.store(false, Ordering::Release);
    }
}

/// A validated cadence, ready to drive a cycle function.
#[derive(Debug, Clone)]
pub struct PollScheduler {
    delay: Duration,
    stats: Arc<PollStats>,
}

impl PollScheduler {
    /// Validates the interval. Nothing is spawned yet.
    pub fn new(config: &PollConfig) -> Result<Self, ConfigurationError> {
        Ok(Self {
            delay: config.normalized_delay()?,
            stats: Arc::new(PollStats::default()),
        })
    }

    pub fn with_stats(mut self, stats: Arc<PollStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Validates `config` and starts polling with `cycle`.
    ///
    /// A configuration error is returned before any timer is armed.
    /// Must be called from within a tokio runtime.
    pub fn start<F, Fut>(config: &PollConfig, cycle: F) -> Result<PollHandle, ConfigurationError>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<CycleOutcome, SinkError>> + Send + 'static,
    {
        Ok(Self::new(config)?.spawn(cycle))
    }

    /// Spawns the timer task. The first cycle fires immediately.
    pub fn spawn<F, Fut>(self, cycle: F) -> PollHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<CycleOutcome, SinkError>> + Send + 'static,
    {
        let (stop_tx, stop_rx) = watch::channel(false);
        let state = Arc::new(RunState::started());

        tracing::info!(delay_ms = self.delay.as_millis() as u64, "poller started");

        let join = tokio::spawn(timer_loop(
            self.delay,
            cycle,
            Arc::clone(&state),
            Arc::clone(&self.stats),
            stop_rx,
        ));

        PollHandle {
            stop_tx,
            state,
            stats: self.stats,
            join: Some(join),
        }
    }
}

/// Handle returned by start.
/// - `stop()` は何度呼んでもよい
/// - handle を drop してもタイマーは止まる
pub struct PollHandle {
    stop_tx: watch::Sender<bool>,
    state: Arc<RunState>,
    stats: Arc<PollStats>,
    join: Option<JoinHandle<Result<(), SinkError>>>,
}

impl PollHandle {
    /// Stop scheduling. Idempotent.
    ///
    /// A pending timer is cancelled right away. A cycle that is already
    /// executing runs to completion, and nothing is scheduled after it.
    pub fn stop(&self) {
        if self.state.stop() {
            tracing::info!("poller stop requested");
        }
        // ignore send error: the timer task may already be gone
        let _ = self.stop_tx.send(true);
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn is_in_flight(&self) -> bool {
        self.state.is_in_flight()
    }

    pub fn stats(&self) -> PollStatsSnapshot {
        self.stats.snapshot()
    }

    /// Stop and wait for the timer task to exit, including any in-flight cycle.
    ///
    /// Returns the sink error that halted the schedule, if any.
    pub async fn stop_and_wait(mut self) -> Result<(), SinkError> {
        self.stop();
        let Some(join) = self.join.take() else {
            return Ok(());
        };
        match join.await {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(error = %err, "poller task panicked");
                Ok(())
            }
        }
    }
}

async fn timer_loop<F, Fut>(
    delay: Duration,
    mut cycle: F,
    state: Arc<RunState>,
    stats: Arc<PollStats>,
    mut stop_rx: watch::Receiver<bool>,
) -> Result<(), SinkError>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<CycleOutcome, SinkError>> + Send + 'static,
{
    let mut next_delay = Duration::ZERO;

    loop {
        // armed
        if !next_delay.is_zero() {
            tokio::select! {
                changed = stop_rx.changed() => {
                    // sender dropped: the handle is gone, nobody can stop us later
                    if changed.is_err() {
                        state.stop();
                    }
                }
                _ = tokio::time::sleep(next_delay) => {}
            }
        }

        if !state.is_running() {
            break;
        }

        // firing
        next_delay = delay;
        if !state.try_begin_cycle() {
            stats.record_tick_skipped();
            tracing::debug!("previous cycle still in flight, skipping tick");
            continue;
        }

        stats.record_cycle_started();
        let result = cycle().await;
        state.finish_cycle();

        if let Err(err) = result {
            state.stop();
            tracing::error!(error = %err, "sink failed, poller halted");
            return Err(err);
        }
    }

    tracing::info!("poller stopped");
    Ok(())
}
