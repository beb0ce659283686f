use std::sync::Arc;

use cafecrawl_client::KakaoClient;
use cafecrawl_core::{CrawlService, Zone};
use cafecrawl_db::{CafeRepository, Database};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Crawl service wired to the Kakao API and the Postgres café table.
pub type Crawler = CrawlService<KakaoClient, CafeRepository>;

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub db: Database,
    pub crawler: Crawler,
    /// Catalog walked by `POST /v1/crawls`.
    pub zones: Vec<Zone>,
    /// Admin token for protecting write endpoints (None = admin endpoints disabled).
    pub admin_token: Option<String>,
    /// Held by the crawl task until the run is recorded.
    pub crawl_lock: Arc<Mutex<()>>,
    /// Cancelled on server shutdown; stops a running crawl after its current zone.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(db: Database, crawler: Crawler, zones: Vec<Zone>, admin_token: Option<String>) -> Self {
        Self {
            db,
            crawler,
            zones,
            admin_token,
            crawl_lock: Arc::new(Mutex::new(())),
            shutdown: CancellationToken::new(),
        }
    }
}
