pub mod cafe_repository;
pub mod config;
pub mod database;
pub mod run_repository;

pub use cafe_repository::CafeRepository;
pub use config::DatabaseConfig;
pub use database::Database;
pub use run_repository::CrawlRunRepository;
