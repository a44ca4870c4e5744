//! Serialized, rate-limited request scheduling for the metrics provider.
//!
//! The provider quota belongs to the account, not to a run, so every outbound
//! call in the process goes through one [`RequestScheduler`]. The scheduler is
//! a single worker task draining a FIFO channel. Before each attempt the
//! worker waits until at least `min_interval` has passed since the previous
//! attempt started. A task that reports [`Attempt::Queued`] is retried after
//! `queued_retry_delay` before the worker moves on to the next caller.

use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use keyplan_core::{defaults, Error, Result};

/// Outcome of one attempt at a scheduled task.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt<T> {
    /// The call finished; hand the value to the caller.
    Ready(T),
    /// The provider accepted the task but has not processed it yet.
    Queued,
}

/// Configuration for the request scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Minimum spacing between the starts of consecutive attempts.
    pub min_interval: Duration,
    /// Pause before retrying a task the provider reported as queued.
    pub queued_retry_delay: Duration,
    /// Give up on a task after this many queued retries. `None` retries forever.
    pub max_queued_retries: Option<u32>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_millis(defaults::MIN_REQUEST_INTERVAL_MS),
            queued_retry_delay: Duration::from_millis(defaults::QUEUED_RETRY_DELAY_MS),
            max_queued_retries: None,
        }
    }
}

impl SchedulerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `DATAFORSEO_MIN_INTERVAL_MS` | `6000` | Spacing between provider calls |
    /// | `DATAFORSEO_QUEUED_RETRY_MS` | `6000` | Delay before retrying a queued task |
    /// | `DATAFORSEO_MAX_QUEUED_RETRIES` | unset | Retry ceiling for queued tasks |
    pub fn from_env() -> Self {
        let min_interval_ms = std::env::var("DATAFORSEO_MIN_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::MIN_REQUEST_INTERVAL_MS);

        let queued_retry_ms = std::env::var("DATAFORSEO_QUEUED_RETRY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::QUEUED_RETRY_DELAY_MS);

        let max_queued_retries = std::env::var("DATAFORSEO_MAX_QUEUED_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok());

        Self {
            min_interval: Duration::from_millis(min_interval_ms),
            queued_retry_delay: Duration::from_millis(queued_retry_ms),
            max_queued_retries,
        }
    }

    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    pub fn with_queued_retry_delay(mut self, delay: Duration) -> Self {
        self.queued_retry_delay = delay;
        self
    }

    pub fn with_max_queued_retries(mut self, max: Option<u32>) -> Self {
        self.max_queued_retries = max;
        self
    }
}

/// Enforces the minimum spacing between attempt starts.
struct SpacingGate {
    min_interval: Duration,
    last_request: Option<Instant>,
}

impl SpacingGate {
    fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: None,
        }
    }

    /// Wait out the remaining interval, then mark a new attempt as started.
    async fn pass(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "Spacing provider request");
                sleep(wait).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}

/// State owned by the worker task.
struct WorkerState {
    gate: SpacingGate,
    queued_retry_delay: Duration,
    max_queued_retries: Option<u32>,
}

/// A type-erased unit of work waiting in the queue.
#[async_trait]
trait QueuedJob: Send {
    async fn run(self: Box<Self>, state: &mut WorkerState);
}

struct Job<T, F, Fut> {
    op: &'static str,
    task: F,
    reply: oneshot::Sender<Result<T>>,
    _fut: PhantomData<fn() -> Fut>,
}

#[async_trait]
impl<T, F, Fut> QueuedJob for Job<T, F, Fut>
where
    T: Send + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Attempt<T>>> + Send + 'static,
{
    async fn run(self: Box<Self>, state: &mut WorkerState) {
        let Job {
            op,
            mut task,
            reply,
            ..
        } = *self;

        let mut queued_retries: u32 = 0;
        let result = loop {
            if reply.is_closed() {
                if queued_retries == 0 {
                    debug!(op, "Caller went away before its turn, skipping request");
                } else {
                    debug!(op, attempt = queued_retries, "Caller went away, dropping queued task");
                }
                return;
            }
            state.gate.pass().await;
            match task().await {
                Ok(Attempt::Ready(value)) => break Ok(value),
                Ok(Attempt::Queued) => {
                    queued_retries += 1;
                    if let Some(max) = state.max_queued_retries {
                        if queued_retries > max {
                            warn!(op, attempt = queued_retries, "Provider task still queued, giving up");
                            break Err(Error::Scheduler(format!(
                                "{op}: provider task still queued after {max} retries"
                            )));
                        }
                    }
                    debug!(
                        op,
                        attempt = queued_retries,
                        wait_ms = state.queued_retry_delay.as_millis() as u64,
                        "Provider task queued, retrying"
                    );
                    sleep(state.queued_retry_delay).await;
                }
                Err(e) => break Err(e),
            }
        };

        if reply.send(result).is_err() {
            debug!(op, "Caller went away before the result was delivered");
        }
    }
}

/// Handle to the process-wide provider request queue.
///
/// Cloning is cheap; every clone feeds the same worker and therefore shares
/// one spacing clock.
#[derive(Clone)]
pub struct RequestScheduler {
    tx: mpsc::UnboundedSender<Box<dyn QueuedJob>>,
}

impl RequestScheduler {
    /// Spawn the worker task and return a handle to it.
    ///
    /// Must be called from within a tokio runtime. The worker stops once
    /// every handle has been dropped.
    pub fn start(config: SchedulerConfig) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Box<dyn QueuedJob>>();
        let mut state = WorkerState {
            gate: SpacingGate::new(config.min_interval),
            queued_retry_delay: config.queued_retry_delay,
            max_queued_retries: config.max_queued_retries,
        };

        debug!(
            min_interval_ms = config.min_interval.as_millis() as u64,
            queued_retry_ms = config.queued_retry_delay.as_millis() as u64,
            max_queued_retries = ?config.max_queued_retries,
            "Starting provider request scheduler"
        );

        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                job.run(&mut state).await;
            }
            debug!("Provider request scheduler stopped");
        });

        Self { tx }
    }

    /// Run `task` when its turn comes and return its result.
    ///
    /// `task` is called once per attempt and must rebuild the request each
    /// time. Errors reach only this caller; later callers are unaffected.
    /// Dropping the returned future removes the task from the queue without
    /// disturbing anyone else's order. A task already retrying stops before
    /// its next attempt.
    pub async fn schedule<T, F, Fut>(&self, op: &'static str, task: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Attempt<T>>> + Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        let job = Job {
            op,
            task,
            reply,
            _fut: PhantomData,
        };
        self.tx
            .send(Box::new(job))
            .map_err(|_| Error::Scheduler("request scheduler is not running".to_string()))?;

        rx.await
            .map_err(|_| Error::Scheduler(format!("{op}: request dropped by scheduler")))?
    }
}
