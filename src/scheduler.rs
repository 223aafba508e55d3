//! Recurring job scheduler
//!
//! A single background task polls the job registry every `tick` and runs due
//! jobs one after the other, in registration order. A job is rescheduled one
//! interval after it starts. Errors and panics inside a job are logged and
//! never reach the loop or the other jobs.

use futures::FutureExt;
use futures::future::BoxFuture;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::RouteWatchError;

type JobFn = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Handle returned on registration, used to cancel a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(u64);

impl Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

struct ScheduledJob {
    id: JobId,
    name: String,
    interval: Duration,
    next_run: Instant,
    job: JobFn,
}

struct Shared {
    jobs: Mutex<Vec<ScheduledJob>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    next_id: AtomicU64,
    stop: watch::Sender<bool>,
}

/// Cloneable handle to one registry and its background worker
#[derive(Clone)]
pub struct Scheduler {
    shared: Arc<Shared>,
    tick: Duration,
}

impl Scheduler {
    /// Create an idle scheduler. No task is spawned until the first job is registered.
    #[must_use]
    pub fn new(tick: Duration) -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                jobs: Mutex::new(Vec::new()),
                worker: Mutex::new(None),
                next_id: AtomicU64::new(1),
                stop,
            }),
            tick,
        }
    }

    /// Run `job` every `interval`, first one interval from now.
    ///
    /// Must be called from within a tokio runtime; the first registration
    /// spawns the worker on it.
    pub fn register_periodic<F, Fut>(
        &self,
        name: impl Into<String>,
        interval: Duration,
        job: F,
    ) -> crate::Result<JobId>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        if interval.is_zero() {
            return Err(RouteWatchError::scheduler("Job interval must be greater than zero"));
        }
        if *self.shared.stop.borrow() {
            return Err(RouteWatchError::scheduler("Scheduler has been shut down"));
        }
        let runtime = Handle::try_current().map_err(|e| {
            RouteWatchError::scheduler(format!("Jobs can only be registered inside a tokio runtime: {e}"))
        })?;

        let id = JobId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        let name = name.into();
        let job: JobFn = Arc::new(move || job().boxed());

        info!(job = %name, %id, every = ?interval, "Registering periodic job");
        self.shared.lock_jobs().push(ScheduledJob {
            id,
            name,
            interval,
            next_run: Instant::now() + interval,
            job,
        });

        self.ensure_worker(&runtime);
        Ok(id)
    }

    /// Remove a job. Returns `false` if it was not registered.
    pub fn cancel(&self, id: JobId) -> bool {
        let mut jobs = self.shared.lock_jobs();
        let before = jobs.len();
        jobs.retain(|job| job.id != id);
        let removed = jobs.len() != before;
        if removed {
            info!(%id, "Cancelled periodic job");
        }
        removed
    }

    #[must_use]
    pub fn job_count(&self) -> usize {
        self.shared.lock_jobs().len()
    }

    /// Whether the background worker has been started and has not stopped
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared
            .lock_worker()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the worker. A job that is running gets `grace` to finish before
    /// the worker is aborted.
    pub async fn shutdown(&self, grace: Duration) {
        self.shared.stop.send_replace(true);

        let worker = self.shared.lock_worker().take();
        let Some(mut worker) = worker else {
            return;
        };

        match time::timeout(grace, &mut worker).await {
            Ok(_) => info!("Scheduler stopped"),
            Err(_) => {
                warn!("Running job did not finish within {grace:?}, aborting scheduler");
                worker.abort();
            }
        }
    }

    fn ensure_worker(&self, runtime: &Handle) {
        let mut worker = self.shared.lock_worker();
        if worker.is_none() {
            debug!(tick = ?self.tick, "Starting scheduler worker");
            let shared = Arc::clone(&self.shared);
            let stop = self.shared.stop.subscribe();
            *worker = Some(runtime.spawn(run_worker(shared, self.tick, stop)));
        }
    }
}

impl Shared {
    fn lock_jobs(&self) -> MutexGuard<'_, Vec<ScheduledJob>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_worker(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run_pending(&self) {
        let now = Instant::now();
        let due: Vec<JobId> = self
            .lock_jobs()
            .iter()
            .filter(|job| job.next_run <= now)
            .map(|job| job.id)
            .collect();

        for id in due {
            // Cancelled by an earlier job of this tick
            let Some((name, job)) = self.start(id) else {
                continue;
            };
            run_job(&name, job).await;
        }
    }

    /// Reschedule a due job from its firing time and hand out its body
    fn start(&self, id: JobId) -> Option<(String, JobFn)> {
        let mut jobs = self.lock_jobs();
        let job = jobs.iter_mut().find(|job| job.id == id)?;
        job.next_run = Instant::now() + job.interval;
        Some((job.name.clone(), Arc::clone(&job.job)))
    }
}

async fn run_worker(shared: Arc<Shared>, tick: Duration, mut stop: watch::Receiver<bool>) {
    let mut ticker = time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = stop.changed() => break,
            _ = ticker.tick() => shared.run_pending().await,
        }
    }
    debug!("Scheduler worker exited");
}

async fn run_job(name: &str, job: JobFn) {
    let started = Instant::now();
    let outcome = AssertUnwindSafe(async move { job().await })
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(())) => debug!(job = %name, elapsed = ?started.elapsed(), "Scheduled job finished"),
        Ok(Err(e)) => error!(job = %name, "Error in scheduled job: {e:#}"),
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(job = %name, "Scheduled job panicked: {message}");
        }
    }
}
