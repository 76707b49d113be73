//! Scheduler - 保存された callback を時刻どおりに実行する
//!
//! # callback ごとの状態遷移
//! ```text
//! SUBSCRIBED -> WAITING -> EXECUTING -> {SUCCEEDED, FAILED}
//! FAILED -> WAITING（即時、または RetryPolicy の分だけ待って再実行。上限なし）
//! SUCCEEDED -> FINALIZING -> {DONE, GIVE_UP}
//! ```
//!
//! # 並行性
//! - main loop が 1 本（subscription と shutdown を select）
//! - callback ごとに 1 task（数は無制限。`max_in_flight` で HTTP 実行数だけ絞れる）
//! - 待機はすべて CancellationToken と競合させる（shutdown で即座に抜ける）

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::RetryPolicy;
use crate::domain::{Callback, CallbackId, ExecuteError, SchedulerError};
use crate::ports::{CallbackExecutor, CallbackStore, Clock, Subscription, SystemClock};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Delay between failed `subscribe` calls at startup.
    pub subscribe_retry_delay: Duration,

    /// Finalize retries after the first failed call.
    pub finalize_retries: u32,

    /// Delay between finalize calls.
    pub finalize_retry_delay: Duration,

    /// Backoff between delivery attempts. `None` re-arms immediately.
    pub delivery_backoff: Option<RetryPolicy>,

    /// Cap on concurrent delivery attempts. `None` is unbounded.
    pub max_in_flight: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            subscribe_retry_delay: Duration::from_secs(5),
            finalize_retries: 5,
            finalize_retry_delay: Duration::from_secs(5),
            delivery_backoff: None,
            max_in_flight: None,
        }
    }
}

pub struct Scheduler {
    store: Arc<dyn CallbackStore>,
    executor: Arc<dyn CallbackExecutor>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn CallbackStore>,
        executor: Arc<dyn CallbackExecutor>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            executor,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run on a background task.
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(self.run(shutdown_rx));
        SchedulerHandle { shutdown_tx, join }
    }

    /// Subscribe, then dispatch callbacks until `shutdown` turns true or its sender is dropped.
    ///
    /// Returns after every per-callback task has exited.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<(), SchedulerError> {
        let cancel = CancellationToken::new();

        let subscription = tokio::select! {
            _ = shutdown_requested(&mut shutdown) => {
                info!("shutdown requested before subscribing to callbacks");
                return Err(SchedulerError::Stopped);
            }
            subscription = self.subscribe_with_retry(&cancel) => subscription,
        };
        info!("subscribed to new callbacks, looping");

        let dispatch = Arc::new(Dispatch {
            permits: self.config.max_in_flight.map(|n| Semaphore::new(n.max(1))),
            store: self.store,
            executor: self.executor,
            clock: self.clock,
            config: self.config,
        });

        let mut tasks = JoinSet::new();
        loop {
            tokio::select! {
                _ = shutdown_requested(&mut shutdown) => break,
                received = subscription.recv() => {
                    let Some(callback) = received else { break };
                    debug!(callback_id = %callback.id().unwrap_or_default(), "scheduling callback");
                    tasks.spawn(Arc::clone(&dispatch).drive(callback, cancel.clone()));
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "callback task failed");
                    }
                }
            }
        }

        cancel.cancel();
        info!(in_flight = tasks.len(), "scheduler stopping");
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "callback task failed");
            }
        }
        info!("scheduler stopped");
        Ok(())
    }

    async fn subscribe_with_retry(&self, cancel: &CancellationToken) -> Subscription {
        loop {
            match self.store.subscribe(cancel.clone()).await {
                Ok(subscription) => return subscription,
                Err(e) => {
                    error!(error = %e, "error occurred while trying to subscribe to callbacks");
                    tokio::time::sleep(self.config.subscribe_retry_delay).await;
                }
            }
        }
    }
}

/// Handle to a spawned scheduler.
/// - `request_shutdown()` で新規 callback の受け付けを止める
/// - `shutdown_and_join()` で in-flight の task まで終了を待てる
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<Result<(), SchedulerError>>,
}

impl SchedulerHandle {
    pub fn request_shutdown(&self) {
        // ignore send error: the scheduler may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub async fn shutdown_and_join(self) -> Result<(), SchedulerError> {
        self.request_shutdown();
        self.join
            .await
            .map_err(|e| SchedulerError::TaskFailed(e.to_string()))?
    }
}

/// Shared by every per-callback task.
struct Dispatch {
    store: Arc<dyn CallbackStore>,
    executor: Arc<dyn CallbackExecutor>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
    permits: Option<Semaphore>,
}

impl Dispatch {
    /// WAITING -> EXECUTING until one attempt succeeds, then FINALIZING.
    async fn drive(self: Arc<Self>, callback: Arc<Callback>, cancel: CancellationToken) {
        let id = callback.id().unwrap_or_default();
        let mut failures: u32 = 0;

        loop {
            let mut wait = callback.wait_from(self.clock.now());
            if failures > 0
                && let Some(backoff) = &self.config.delivery_backoff
            {
                wait = wait.saturating_add(backoff.next_delay(failures));
            }
            if !sleep_or_cancel(wait, &cancel).await {
                debug!(callback_id = %id, "shutdown while waiting for deadline");
                return;
            }

            match self.attempt(&callback, &cancel).await {
                Ok(()) => break,
                Err(ExecuteError::Cancelled) => {
                    debug!(callback_id = %id, "shutdown while executing");
                    return;
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    warn!(callback_id = %id, failures, error = %e, "error reported in execute, retrying");
                }
            }
        }

        self.finalize(&id, &cancel).await;
    }

    async fn attempt(&self, callback: &Callback, cancel: &CancellationToken) -> Result<(), ExecuteError> {
        let _permit = match &self.permits {
            Some(permits) => tokio::select! {
                _ = cancel.cancelled() => return Err(ExecuteError::Cancelled),
                permit = permits.acquire() => Some(permit.map_err(|_| ExecuteError::Cancelled)?),
            },
            None => None,
        };
        self.executor.execute(callback, cancel).await
    }

    /// One call plus `finalize_retries` retries, then give up.
    async fn finalize(&self, id: &CallbackId, cancel: &CancellationToken) {
        let calls = self.config.finalize_retries.saturating_add(1);
        for call in 1..=calls {
            match self.store.finalize(id).await {
                Ok(()) => {
                    info!(callback_id = %id, "callback done");
                    return;
                }
                Err(e) => error!(callback_id = %id, call, error = %e, "failed to mark callback as done"),
            }
            if call < calls && !sleep_or_cancel(self.config.finalize_retry_delay, cancel).await {
                warn!(callback_id = %id, "shutdown before callback could be marked as done");
                return;
            }
        }
        warn!(callback_id = %id, "giving up on trying to mark callback as done");
    }
}

/// Resolves once shutdown is requested or the sender is dropped.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// `false` if cancelled before `wait` elapsed.
async fn sleep_or_cancel(wait: Duration, cancel: &CancellationToken) -> bool {
    if wait.is_zero() {
        tokio::task::yield_now().await;
        return !cancel.is_cancelled();
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(wait) => true,
    }
}
