pub mod watch_evaluation_job;

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::errors::CoreError;
use crate::repo::WatchRepo;
use crate::watch::WatchEvaluator;

/// Shared handles every scheduled job function receives.
#[derive(Clone)]
pub struct JobContext {
    pub evaluator: Arc<WatchEvaluator>,
    pub watch_repo: Arc<dyn WatchRepo>,
}

#[derive(Debug)]
pub struct JobResult {
    pub items_processed: i32,
    pub items_failed: i32,
}

pub struct JobSchedulerService {
    scheduler: JobScheduler,
    context: JobContext,
}

impl JobSchedulerService {
    pub async fn new(evaluator: Arc<WatchEvaluator>, watch_repo: Arc<dyn WatchRepo>) -> Result<Self, CoreError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| CoreError::Internal(format!("failed to create scheduler: {e}")))?;

        Ok(Self {
            scheduler,
            context: JobContext { evaluator, watch_repo },
        })
    }

    /// Start all scheduled jobs.
    pub async fn start(&mut self) -> Result<(), CoreError> {
        let test_mode = std::env::var("JOB_SCHEDULER_TEST_MODE")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        let schedule = if test_mode { "0 */1 * * * *" } else { "0 */15 * * * *" };
        let description = if test_mode { "every minute (test mode)" } else { "every 15 minutes" };

        self.schedule_job(schedule, "evaluate_watches", description, watch_evaluation_job::run_watch_evaluations)
            .await?;

        self.scheduler
            .start()
            .await
            .map_err(|e| CoreError::Internal(format!("failed to start scheduler: {e}")))?;

        info!("job scheduler started");
        Ok(())
    }

    async fn schedule_job<F, Fut>(
        &mut self,
        schedule: &str,
        job_name: &'static str,
        description: &str,
        job_fn: F,
    ) -> Result<(), CoreError>
    where
        F: Fn(JobContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<JobResult, CoreError>> + Send + 'static,
    {
        let context = self.context.clone();
        let job_fn = Arc::new(job_fn);

        let job = Job::new_async(schedule, move |_uuid, _l| {
            let context = context.clone();
            let job_fn = job_fn.clone();
            Box::pin(async move {
                run_tracked(job_name, context, job_fn).await;
            })
        })
        .map_err(|e| CoreError::Internal(format!("failed to create job {job_name}: {e}")))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| CoreError::Internal(format!("failed to add job {job_name}: {e}")))?;

        info!("scheduled: {} - {} [cron: {}]", job_name, description, schedule);
        Ok(())
    }
}

async fn run_tracked<F, Fut>(job_name: &str, context: JobContext, job_fn: Arc<F>)
where
    F: Fn(JobContext) -> Fut,
    Fut: std::future::Future<Output = Result<JobResult, CoreError>>,
{
    info!("running job: {job_name}");
    match job_fn(context).await {
        Ok(result) => info!(
            "job completed: {} (processed: {}, failed: {})",
            job_name, result.items_processed, result.items_failed
        ),
        Err(err) => error!("job failed: {job_name} - {err}"),
    }
}
