pub mod collector;
pub mod crawl;
pub mod error;
pub mod models;
pub mod pacing;
pub mod reconcile;
pub mod schedule;
pub mod traits;
pub mod zone;

#[cfg(test)]
pub mod testutil;

pub use collector::{ZoneBatch, ZoneCollector};
pub use crawl::{CrawlEvent, CrawlReporter, CrawlService, TracingCrawlReporter, ZoneOutcome};
pub use error::AppError;
pub use models::{Cafe, CrawlRun, CrawlSummary, NewCafe, ReconcileCounts, UpsertOutcome};
pub use pacing::Pacer;
pub use reconcile::Reconciler;
pub use schedule::{CrawlScheduler, ScheduleConfig};
pub use traits::{CafeStore, PlaceSearch, RunLog};
pub use zone::Zone;
