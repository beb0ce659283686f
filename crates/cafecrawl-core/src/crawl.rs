//! Crawl orchestration: walks the zone catalog, collecting and reconciling
//! one zone at a time.
//!
//! Zones are processed strictly in catalog order with a fixed pause after
//! each one. A failure while collecting or reconciling a zone is recorded in
//! the run summary and never aborts the run, so a summary is produced even if
//! every zone fails.
//!
//! A café reported by several zones in one run belongs to the first zone
//! that collected it; later zones drop it before counting or reconciling.
//!
//! Cancellation is cooperative: the token is checked before each zone and
//! during the pause between zones. A zone that has started is always
//! collected and reconciled to completion.

use std::collections::HashSet;
use std::time::Instant;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::collector::ZoneCollector;
use crate::error::AppError;
use crate::models::{CrawlSummary, ReconcileCounts};
use crate::pacing::Pacer;
use crate::reconcile::Reconciler;
use crate::traits::{CafeStore, PlaceSearch};
use crate::zone::Zone;

/// Events emitted during a crawl for monitoring/logging.
#[derive(Debug)]
pub enum CrawlEvent<'a> {
    RunStarted {
        zones: usize,
    },
    ZoneStarted {
        zone: &'a str,
        position: usize,
        total: usize,
    },
    ZoneCompleted {
        zone: &'a str,
        outcome: &'a ZoneOutcome,
    },
    ZoneFailed {
        zone: &'a str,
        error: &'a AppError,
    },
    Cancelled {
        remaining: usize,
    },
    RunFinished {
        summary: &'a CrawlSummary,
    },
}

/// Trait for receiving crawl events (decoupled logging).
pub trait CrawlReporter: Send + Sync {
    fn report(&self, event: CrawlEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingCrawlReporter;

impl CrawlReporter for TracingCrawlReporter {
    fn report(&self, event: CrawlEvent<'_>) {
        match event {
            CrawlEvent::RunStarted { zones } => {
                tracing::info!(%zones, "Crawl started");
            }
            CrawlEvent::ZoneStarted {
                zone,
                position,
                total,
            } => {
                tracing::debug!(%zone, "Crawling zone {position}/{total}");
            }
            CrawlEvent::ZoneCompleted { zone, outcome } => {
                tracing::info!(
                    %zone,
                    fetched = outcome.fetched,
                    inserted = outcome.counts.inserted,
                    updated = outcome.counts.updated,
                    truncated = outcome.truncated,
                    "Zone saved"
                );
            }
            CrawlEvent::ZoneFailed { zone, error } => {
                tracing::error!(%zone, %error, "Zone failed");
            }
            CrawlEvent::Cancelled { remaining } => {
                tracing::warn!(%remaining, "Crawl cancelled, skipping remaining zones");
            }
            CrawlEvent::RunFinished { summary } => {
                tracing::info!(
                    fetched = summary.total_fetched,
                    inserted = summary.inserted,
                    updated = summary.updated,
                    failed_zones = ?summary.failed_zones,
                    elapsed = format!("{:.1}s", summary.elapsed_seconds),
                    "Crawl finished"
                );
            }
        }
    }
}

/// What happened to a single zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneOutcome {
    /// Cafés collected for the zone and not claimed by an earlier zone.
    pub fetched: usize,
    pub counts: ReconcileCounts,
    /// Pagination ended early on a fetch failure.
    pub truncated: bool,
}

/// Runs the collect-then-reconcile pipeline over a zone catalog.
///
/// Generic over the search API and the store so both can be injected,
/// scoped to the lifetime of the service.
#[derive(Clone)]
pub struct CrawlService<P, S>
where
    P: PlaceSearch,
    S: CafeStore,
{
    collector: ZoneCollector<P>,
    reconciler: Reconciler<S>,
    pacer: Pacer,
}

impl<P, S> CrawlService<P, S>
where
    P: PlaceSearch,
    S: CafeStore,
{
    pub fn new(search: P, store: S, pacer: Pacer) -> Self {
        Self {
            collector: ZoneCollector::new(search, pacer),
            reconciler: Reconciler::new(store),
            pacer,
        }
    }

    /// Crawl every zone in order and summarize the run.
    pub async fn run<R: CrawlReporter>(
        &self,
        zones: &[Zone],
        cancel: &CancellationToken,
        reporter: &R,
    ) -> CrawlSummary {
        let started = Instant::now();
        let started_at = Utc::now();
        let mut total_fetched = 0;
        let mut totals = ReconcileCounts::default();
        let mut failed_zones = Vec::new();
        let mut cancelled = false;
        let mut claimed: HashSet<String> = HashSet::new();

        reporter.report(CrawlEvent::RunStarted { zones: zones.len() });

        for (i, zone) in zones.iter().enumerate() {
            if cancel.is_cancelled() {
                cancelled = true;
                reporter.report(CrawlEvent::Cancelled {
                    remaining: zones.len() - i,
                });
                break;
            }

            reporter.report(CrawlEvent::ZoneStarted {
                zone: &zone.name,
                position: i + 1,
                total: zones.len(),
            });

            // Fetched counts only when collection succeeded, even if the
            // reconciliation that follows fails.
            match self.collector.collect(zone).await {
                Ok(mut batch) => {
                    let dropped = batch.retain_unclaimed(&mut claimed);
                    if dropped > 0 {
                        tracing::debug!(
                            zone = %zone.name,
                            dropped,
                            "Skipped cafés claimed by earlier zones"
                        );
                    }
                    total_fetched += batch.len();
                    match self.reconciler.reconcile(&batch.cafes).await {
                        Ok(counts) => {
                            totals += counts;
                            let outcome = ZoneOutcome {
                                fetched: batch.len(),
                                counts,
                                truncated: batch.truncated,
                            };
                            reporter.report(CrawlEvent::ZoneCompleted {
                                zone: &zone.name,
                                outcome: &outcome,
                            });
                        }
                        Err(error) => {
                            reporter.report(CrawlEvent::ZoneFailed {
                                zone: &zone.name,
                                error: &error,
                            });
                            failed_zones.push(zone.name.clone());
                        }
                    }
                }
                Err(error) => {
                    reporter.report(CrawlEvent::ZoneFailed {
                        zone: &zone.name,
                        error: &error,
                    });
                    failed_zones.push(zone.name.clone());
                }
            }

            self.pacer.pause(cancel).await;
        }

        let summary = CrawlSummary {
            total_fetched,
            inserted: totals.inserted,
            updated: totals.updated,
            failed_zones,
            elapsed_seconds: started.elapsed().as_secs_f64(),
            started_at,
            finished_at: Utc::now(),
            cancelled,
        };
        reporter.report(CrawlEvent::RunFinished { summary: &summary });
        summary
    }
}
