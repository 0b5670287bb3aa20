//! Scheduled rank monitoring.
//!
//! Each [`MonitoringTask`] becomes one cron job on a shared
//! [`JobScheduler`]. A run checks every keyword in order and overwrites the
//! task's entry in the results cache.

pub mod schedule;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use salonscope_core::RankResult;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use uuid::Uuid;

use crate::cache::{CacheEntry, TtlCache};
use crate::sourcing::Sourcing;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("invalid schedule \"{schedule}\": {reason}")]
    InvalidSchedule { schedule: String, reason: String },

    #[error("monitoring task not found: {0}")]
    NotFound(String),

    #[error("scheduler error: {0}")]
    Scheduler(#[from] JobSchedulerError),
}

#[derive(Debug, Clone)]
pub struct MonitoringTask {
    pub task_id: String,
    pub keywords: Vec<String>,
    pub shop_name: String,
    /// Raw schedule as supplied; see [`schedule::normalize`].
    pub schedule: String,
}

/// Where monitoring jobs run. [`JobScheduler`] in production.
#[async_trait]
trait JobHost: Send + Sync {
    async fn add(&self, job: Job) -> Result<Uuid, JobSchedulerError>;
    async fn remove(&self, job_id: &Uuid) -> Result<(), JobSchedulerError>;
    async fn shutdown(&self) -> Result<(), JobSchedulerError>;
}

#[async_trait]
impl JobHost for JobScheduler {
    async fn add(&self, job: Job) -> Result<Uuid, JobSchedulerError> {
        JobScheduler::add(self, job).await
    }

    async fn remove(&self, job_id: &Uuid) -> Result<(), JobSchedulerError> {
        JobScheduler::remove(self, job_id).await
    }

    async fn shutdown(&self) -> Result<(), JobSchedulerError> {
        let mut scheduler = self.clone();
        JobScheduler::shutdown(&mut scheduler).await
    }
}

/// Live monitoring jobs keyed by task id, plus their latest results.
///
/// A task id stays registered until its job has actually been removed from
/// the scheduler, so a failed removal can be retried with `stop`.
pub struct MonitorRegistry {
    scheduler: Arc<dyn JobHost>,
    jobs: Mutex<HashMap<String, Uuid>>,
    results: Arc<TtlCache<Vec<RankResult>>>,
    sourcing: Arc<Sourcing>,
}

impl MonitorRegistry {
    /// Creates and starts the underlying scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`JobSchedulerError`] if the scheduler cannot be initialised or
    /// started.
    pub async fn new(sourcing: Arc<Sourcing>) -> Result<Self, JobSchedulerError> {
        let scheduler = JobScheduler::new().await?;
        scheduler.start().await?;
        Ok(Self::with_host(Arc::new(scheduler), sourcing))
    }

    fn with_host(scheduler: Arc<dyn JobHost>, sourcing: Arc<Sourcing>) -> Self {
        Self {
            scheduler,
            jobs: Mutex::new(HashMap::new()),
            results: Arc::new(TtlCache::new()),
            sourcing,
        }
    }

    /// Registers `task`, replacing any job already registered under its id.
    /// Returns the normalised cron expression.
    ///
    /// # Errors
    ///
    /// [`MonitorError::InvalidSchedule`] when the schedule cannot be parsed,
    /// in which case an existing job for the id is left untouched.
    pub async fn start(&self, task: MonitoringTask) -> Result<String, MonitorError> {
        let cron = schedule::normalize(&task.schedule).map_err(|reason| {
            MonitorError::InvalidSchedule {
                schedule: task.schedule.clone(),
                reason,
            }
        })?;

        let job = self
            .build_job(&cron, &task)
            .map_err(|e| MonitorError::InvalidSchedule {
                schedule: task.schedule.clone(),
                reason: e.to_string(),
            })?;

        let mut jobs = self.jobs.lock().await;
        if let Some(previous) = jobs.get(&task.task_id).copied() {
            tracing::info!(task_id = %task.task_id, "scheduler: replacing monitoring task");
            self.scheduler.remove(&previous).await?;
            jobs.remove(&task.task_id);
        }
        let job_id = self.scheduler.add(job).await?;
        jobs.insert(task.task_id.clone(), job_id);
        drop(jobs);

        tracing::info!(
            task_id = %task.task_id,
            cron = %cron,
            keywords = task.keywords.len(),
            "scheduler: monitoring task started"
        );
        Ok(cron)
    }

    /// Unregisters a task and clears its cached results. A run that is
    /// already executing is not interrupted.
    ///
    /// # Errors
    ///
    /// [`MonitorError::NotFound`] when no task is registered under `task_id`;
    /// [`MonitorError::Scheduler`] when the job could not be removed, in which
    /// case the task stays registered.
    pub async fn stop(&self, task_id: &str) -> Result<(), MonitorError> {
        let mut jobs = self.jobs.lock().await;
        let job_id = jobs
            .get(task_id)
            .copied()
            .ok_or_else(|| MonitorError::NotFound(task_id.to_string()))?;

        self.scheduler.remove(&job_id).await?;
        jobs.remove(task_id);
        drop(jobs);

        self.results.remove(task_id).await;
        tracing::info!(task_id, "scheduler: monitoring task stopped");
        Ok(())
    }

    pub async fn results(&self, task_id: &str) -> Option<CacheEntry<Vec<RankResult>>> {
        self.results.get(task_id).await
    }

    pub async fn active_tasks(&self) -> usize {
        self.jobs.lock().await.len()
    }

    /// Stops the scheduler; registered jobs will not fire again.
    pub async fn shutdown(&self) {
        if let Err(e) = self.scheduler.shutdown().await {
            tracing::warn!(error = %e, "scheduler: shutdown failed");
        }
    }

    fn build_job(&self, cron: &str, task: &MonitoringTask) -> Result<Job, JobSchedulerError> {
        let sourcing = Arc::clone(&self.sourcing);
        let results = Arc::clone(&self.results);
        let task = Arc::new(task.clone());

        Job::new_async(cron, move |_uuid, _lock| {
            let sourcing = Arc::clone(&sourcing);
            let results = Arc::clone(&results);
            let task = Arc::clone(&task);

            Box::pin(async move {
                run_checks(&sourcing, &results, &task).await;
            })
        })
    }
}

/// One monitoring run: rank every keyword and overwrite the task's results.
async fn run_checks(
    sourcing: &Sourcing,
    results: &TtlCache<Vec<RankResult>>,
    task: &MonitoringTask,
) {
    tracing::info!(task_id = %task.task_id, "scheduler: running monitoring task");
    let ranks = sourcing.monitor_ranks(&task.keywords, &task.shop_name).await;
    let failed = ranks.iter().filter(|r| r.error.is_some()).count();
    results.put(task.task_id.clone(), ranks).await;
    tracing::info!(task_id = %task.task_id, failed, "scheduler: monitoring run complete");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use salonscope_core::DataMode;

    use super::*;

    /// Real scheduler whose removals can be made to fail.
    struct FlakyHost {
        inner: JobScheduler,
        fail_removals: AtomicBool,
    }

    #[async_trait]
    impl JobHost for FlakyHost {
        async fn add(&self, job: Job) -> Result<Uuid, JobSchedulerError> {
            self.inner.add(job).await
        }

        async fn remove(&self, job_id: &Uuid) -> Result<(), JobSchedulerError> {
            if self.fail_removals.load(Ordering::SeqCst) {
                return Err(JobSchedulerError::CantRemove);
            }
            self.inner.remove(job_id).await
        }

        async fn shutdown(&self) -> Result<(), JobSchedulerError> {
            JobHost::shutdown(&self.inner).await
        }
    }

    async fn flaky_registry() -> (MonitorRegistry, Arc<FlakyHost>) {
        let host = Arc::new(FlakyHost {
            inner: JobScheduler::new().await.expect("scheduler"),
            fail_removals: AtomicBool::new(false),
        });
        let sourcing = Arc::new(Sourcing::new(DataMode::Demo, None, Duration::ZERO));
        let registry = MonitorRegistry::with_host(host.clone(), sourcing);
        (registry, host)
    }

    fn task(task_id: &str, schedule: &str) -> MonitoringTask {
        MonitoringTask {
            task_id: task_id.to_string(),
            keywords: vec!["Shibuya seitai".to_string(), "Shibuya massage".to_string()],
            shop_name: "Sample Salon".to_string(),
            schedule: schedule.to_string(),
        }
    }

    async fn registry() -> MonitorRegistry {
        let sourcing = Arc::new(Sourcing::new(DataMode::Demo, None, Duration::ZERO));
        MonitorRegistry::new(sourcing).await.expect("scheduler")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn start_registers_and_stop_unregisters() {
        let registry = registry().await;
        let cron = registry
            .start(task("task-1", schedule::DEFAULT_SCHEDULE))
            .await
            .expect("start");
        assert_eq!(cron, "0 0 9 * * *");
        assert_eq!(registry.active_tasks().await, 1);

        registry.stop("task-1").await.expect("stop");
        assert_eq!(registry.active_tasks().await, 0);
        registry.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn restarting_same_id_replaces_job() {
        let registry = registry().await;
        registry.start(task("task-1", "0 9 * * *")).await.expect("start");
        registry.start(task("task-1", "0 18 * * *")).await.expect("restart");
        assert_eq!(registry.active_tasks().await, 1);
        registry.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn invalid_schedule_keeps_existing_job() {
        let registry = registry().await;
        registry.start(task("task-1", "0 9 * * *")).await.expect("start");

        let err = registry
            .start(task("task-1", "not a schedule"))
            .await
            .expect_err("invalid schedule");
        assert!(matches!(err, MonitorError::InvalidSchedule { .. }));
        assert_eq!(registry.active_tasks().await, 1);
        registry.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn out_of_range_cron_field_is_invalid() {
        let registry = registry().await;
        let err = registry
            .start(task("task-1", "0 99 * * *"))
            .await
            .expect_err("hour 99");
        assert!(matches!(err, MonitorError::InvalidSchedule { .. }));
        assert_eq!(registry.active_tasks().await, 0);
        registry.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_removal_keeps_task_stoppable() {
        let (registry, host) = flaky_registry().await;
        registry.start(task("task-1", "0 9 * * *")).await.expect("start");

        host.fail_removals.store(true, Ordering::SeqCst);
        let err = registry.stop("task-1").await.expect_err("removal fails");
        assert!(matches!(err, MonitorError::Scheduler(_)));
        assert_eq!(registry.active_tasks().await, 1);

        host.fail_removals.store(false, Ordering::SeqCst);
        registry.stop("task-1").await.expect("retry succeeds");
        assert_eq!(registry.active_tasks().await, 0);
        registry.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_replacement_keeps_previous_registration() {
        let (registry, host) = flaky_registry().await;
        registry.start(task("task-1", "0 9 * * *")).await.expect("start");

        host.fail_removals.store(true, Ordering::SeqCst);
        let err = registry
            .start(task("task-1", "0 18 * * *"))
            .await
            .expect_err("replacement fails");
        assert!(matches!(err, MonitorError::Scheduler(_)));
        assert_eq!(registry.active_tasks().await, 1);

        host.fail_removals.store(false, Ordering::SeqCst);
        registry.stop("task-1").await.expect("stop");
        assert_eq!(registry.active_tasks().await, 0);
        registry.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stop_unknown_task_is_not_found() {
        let registry = registry().await;
        let err = registry.stop("missing").await.expect_err("unknown task");
        assert!(matches!(err, MonitorError::NotFound(id) if id == "missing"));
        registry.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn run_writes_results_in_keyword_order_and_stop_clears_them() {
        let registry = registry().await;
        let monitored = task("task-1", "0 9 * * *");
        registry.start(monitored.clone()).await.expect("start");
        assert!(registry.results("task-1").await.is_none());

        run_checks(&registry.sourcing, &registry.results, &monitored).await;
        let entry = registry.results("task-1").await.expect("results written");
        let keywords: Vec<&str> = entry.data.iter().map(|r| r.keyword.as_str()).collect();
        assert_eq!(keywords, ["Shibuya seitai", "Shibuya massage"]);

        registry.stop("task-1").await.expect("stop");
        assert!(registry.results("task-1").await.is_none());
        registry.shutdown().await;
    }
}
