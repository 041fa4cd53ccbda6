use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod repositories;
pub mod runner;
pub mod splitter;

pub use runner::{MigrationError, MigrationRunner, MigrationSummary};
pub use splitter::split_statements;

use repositories::account::AccountRepository;
use repositories::candidate::CandidateRepository;
use repositories::token::TokenRepository;

/// Explicitly constructed storage client. Built once at startup and passed by
/// construction into the services that need it; there is no process-wide
/// database handle.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    /// Connect and bring the schema up to date from `migrations_dir`.
    pub async fn new(db_url: &str, migrations_dir: &Path) -> Result<Self> {
        Self::with_pool_options(db_url, migrations_dir, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        migrations_dir: &Path,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        let path_str = db_url.trim_start_matches("sqlite:");
        if path_str != ":memory:" {
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        let summary = MigrationRunner::new(conn.clone())
            .apply_dir(migrations_dir)
            .await?;

        info!(
            "Database connected, schema current ({} migrations applied, {} already in place)",
            summary.files_applied, summary.files_skipped
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    #[must_use]
    pub fn accounts(&self) -> AccountRepository {
        AccountRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn tokens(&self) -> TokenRepository {
        TokenRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn candidates(&self) -> CandidateRepository {
        CandidateRepository::new(self.conn.clone())
    }
}
