use tracing::{info, warn};

use crate::errors::CoreError;
use crate::jobs::{JobContext, JobResult};

const INTER_WATCH_DELAY_MS: u64 = 500;

/// Re-evaluates every active watch (spec §4.8). Scheduled to run
/// periodically; the evaluator itself decides whether a given watch
/// actually needs an upstream call.
pub async fn run_watch_evaluations(ctx: JobContext) -> Result<JobResult, CoreError> {
    info!("starting watch evaluation job");

    let watches = ctx.watch_repo.list_active(None).await;
    if watches.is_empty() {
        info!("no active watches to evaluate");
        return Ok(JobResult { items_processed: 0, items_failed: 0 });
    }

    info!("evaluating {} active watches", watches.len());

    let mut processed = 0;
    let mut failed = 0;

    for watch in &watches {
        match ctx.evaluator.evaluate(watch.id).await {
            Ok((price_changed, alert)) => {
                processed += 1;
                if let Some(alert) = alert {
                    info!(watch_id = %watch.id, kind = ?alert.kind, "alert emitted");
                } else if price_changed {
                    info!(watch_id = %watch.id, "price changed, no alert threshold crossed");
                }
            }
            Err(err) => {
                failed += 1;
                warn!(watch_id = %watch.id, "watch evaluation failed: {err}");
            }
        }

        tokio::time::sleep(tokio::time::Duration::from_millis(INTER_WATCH_DELAY_MS)).await;
    }

    info!("watch evaluation job completed: {} processed, {} failed", processed, failed);
    Ok(JobResult { items_processed: processed, items_failed: failed })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(INTER_WATCH_DELAY_MS, 500);
    }
}
