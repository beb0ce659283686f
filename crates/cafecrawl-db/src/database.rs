use cafecrawl_core::AppError;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::cafe_repository::CafeRepository;
use crate::config::DatabaseConfig;
use crate::run_repository::CrawlRunRepository;

/// Central database facade: owns the connection pool, runs migrations,
/// and vends repository instances.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL with the given configuration.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {e}")))?;

        Ok(Self { pool })
    }

    /// Connect using [`DatabaseConfig::from_env`] and apply pending migrations.
    pub async fn from_env() -> Result<Self, AppError> {
        let db = Self::connect(&DatabaseConfig::from_env()?).await?;
        db.migrate().await?;
        Ok(db)
    }

    /// Create a `Database` from an existing pool (useful for testing).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run all pending migrations.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// Get a [`CafeRepository`] backed by this pool.
    pub fn cafe_repo(&self) -> CafeRepository {
        CafeRepository::new(self.pool.clone())
    }

    /// Get a [`CrawlRunRepository`] backed by this pool.
    pub fn run_repo(&self) -> CrawlRunRepository {
        CrawlRunRepository::new(self.pool.clone())
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
