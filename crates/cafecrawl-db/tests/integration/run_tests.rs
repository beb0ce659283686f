use cafecrawl_core::models::CrawlSummary;
use cafecrawl_core::traits::RunLog;
use cafecrawl_db::CrawlRunRepository;

use crate::integration::common::{at, setup_test_db};

fn summary(hour: u32, failed_zones: &[&str]) -> CrawlSummary {
    CrawlSummary {
        total_fetched: 12,
        inserted: 9,
        updated: 3,
        failed_zones: failed_zones.iter().map(|z| z.to_string()).collect(),
        elapsed_seconds: 42.5,
        started_at: at(hour),
        finished_at: at(hour + 1),
        cancelled: false,
    }
}

#[tokio::test]
async fn record_run_round_trips_summary() {
    let (pool, _container) = setup_test_db().await;
    let repo = CrawlRunRepository::new(pool);

    let run = repo
        .record_run("kakao_cafe_crawl", &summary(1, &["강남구", "중구"]))
        .await
        .unwrap();

    assert!(!run.id.is_nil());
    assert_eq!(run.job_name, "kakao_cafe_crawl");
    assert_eq!(run.total_fetched, 12);
    assert_eq!(run.inserted, 9);
    assert_eq!(run.updated, 3);
    assert_eq!(run.failed_zones, vec!["강남구", "중구"]);
    assert_eq!(run.started_at, at(1));
    assert!(!run.cancelled);
}

#[tokio::test]
async fn recent_runs_are_newest_first_per_job() {
    let (pool, _container) = setup_test_db().await;
    let repo = CrawlRunRepository::new(pool);

    repo.record_run("job", &summary(1, &[])).await.unwrap();
    repo.record_run("job", &summary(5, &[])).await.unwrap();
    repo.record_run("job", &summary(3, &[])).await.unwrap();
    repo.record_run("other", &summary(9, &[])).await.unwrap();

    let runs = repo.recent_runs("job", 2).await.unwrap();
    let starts: Vec<_> = runs.iter().map(|r| r.started_at).collect();
    assert_eq!(starts, vec![at(5), at(3)]);
}
