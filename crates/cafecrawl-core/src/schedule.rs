use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::crawl::{CrawlReporter, CrawlService};
use crate::models::CrawlSummary;
use crate::traits::{CafeStore, PlaceSearch, RunLog};
use crate::zone::Zone;

/// Job name under which crawl runs are logged.
pub const DEFAULT_JOB_NAME: &str = "kakao_cafe_crawl";

/// Configuration for periodic crawling.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub job_name: String,
    /// Time between the starts of consecutive runs.
    pub interval: Duration,
    /// Start the first run right away instead of after one interval.
    pub run_immediately: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            job_name: DEFAULT_JOB_NAME.to_string(),
            interval: Duration::from_secs(24 * 60 * 60),
            run_immediately: true,
        }
    }
}

/// Runs a crawl on a fixed interval until cancelled, logging every run.
pub struct CrawlScheduler<P, S, L>
where
    P: PlaceSearch,
    S: CafeStore,
    L: RunLog,
{
    service: CrawlService<P, S>,
    run_log: L,
    zones: Vec<Zone>,
    config: ScheduleConfig,
}

impl<P, S, L> CrawlScheduler<P, S, L>
where
    P: PlaceSearch,
    S: CafeStore,
    L: RunLog,
{
    pub fn new(
        service: CrawlService<P, S>,
        run_log: L,
        zones: Vec<Zone>,
        config: ScheduleConfig,
    ) -> Self {
        Self {
            service,
            run_log,
            zones,
            config,
        }
    }

    /// Run until `cancel` fires. Returns the number of runs that were started.
    ///
    /// A run in progress when cancellation arrives finishes its current zone
    /// and is still logged.
    pub async fn run<R: CrawlReporter>(&self, cancel: CancellationToken, reporter: &R) -> usize {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        if !self.config.run_immediately {
            // The first tick completes immediately.
            ticker.tick().await;
        }

        tracing::info!(
            job = %self.config.job_name,
            interval_secs = self.config.interval.as_secs(),
            zones = self.zones.len(),
            "Scheduler started"
        );

        let mut runs = 0;
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                () = cancel.cancelled() => break,
            }

            let summary = self.service.run(&self.zones, &cancel, reporter).await;
            runs += 1;
            self.record(&summary).await;

            if summary.cancelled {
                break;
            }
        }

        tracing::info!(job = %self.config.job_name, %runs, "Scheduler stopped");
        runs
    }

    async fn record(&self, summary: &CrawlSummary) {
        match self.run_log.record_run(&self.config.job_name, summary).await {
            Ok(run) => tracing::debug!(run_id = %run.id, "Crawl run recorded"),
            Err(e) => tracing::error!(error = %e, "Failed to record crawl run"),
        }
    }
}
