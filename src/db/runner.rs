//! File-ordered, rerunnable schema migration runner.
//!
//! Applies `*.sql` files from a directory in case-sensitive lexicographic
//! order (zero-pad ordinal prefixes), tracking completed files by name in a
//! `schema_migrations` table. Already-recorded files are skipped on rerun.
//!
//! File-level atomicity is not guaranteed: a fatal failure mid-file leaves
//! earlier statements applied with the file unrecorded, and the whole file
//! re-executes on the next run. Every statement inside a migration must
//! therefore be idempotent (create-if-not-exists style).
//!
//! One runner, one process: statements run strictly sequentially within a
//! file and files strictly sequentially by name, since later statements may
//! depend on earlier ones. Concurrent runners against the same database are
//! unsupported; serialize invocations externally.

use std::collections::HashSet;
use std::path::Path;

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, Statement};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::splitter::split_statements;

const TRACKING_TABLE_DDL: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (\
     filename TEXT PRIMARY KEY, \
     applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP)";

/// Errors that abort a migration run.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Failed to read migrations from {dir}: {source}")]
    Io {
        dir: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Migration {file} failed on statement {index}: {source}")]
    Fatal {
        file: String,
        index: usize,
        #[source]
        source: DbErr,
    },

    #[error("Migration bookkeeping failed: {0}")]
    Tracking(#[from] DbErr),
}

/// Counters for one migration run, logged by the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct MigrationSummary {
    /// Files executed and recorded this run.
    pub files_applied: usize,

    /// Files skipped because they were already recorded.
    pub files_skipped: usize,

    /// Statements that executed successfully.
    pub statements_executed: usize,

    /// Statements whose failure was classified ignorable.
    pub statements_ignored: usize,
}

pub struct MigrationRunner {
    conn: DatabaseConnection,
}

impl MigrationRunner {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Apply every unapplied `*.sql` file under `dir`, in filename order.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::Fatal`] on the first statement failure that
    /// is not classified ignorable; remaining statements and files are not
    /// executed.
    pub async fn apply_dir(&self, dir: &Path) -> Result<MigrationSummary, MigrationError> {
        self.conn.execute_unprepared(TRACKING_TABLE_DDL).await?;

        let applied = self.applied_filenames().await?;
        let files = list_migration_files(dir)?;

        let mut summary = MigrationSummary::default();

        for filename in files {
            if applied.contains(&filename) {
                debug!("Migration {} already applied, skipping", filename);
                summary.files_skipped += 1;
                continue;
            }

            let path = dir.join(&filename);
            let sql = std::fs::read_to_string(&path).map_err(|source| MigrationError::Io {
                dir: path.display().to_string(),
                source,
            })?;

            self.apply_file(&filename, &sql, &mut summary).await?;
            self.record_applied(&filename).await?;
            summary.files_applied += 1;
        }

        info!(
            "Migrations complete: {} applied, {} skipped, {} statements ({} ignored)",
            summary.files_applied,
            summary.files_skipped,
            summary.statements_executed,
            summary.statements_ignored
        );

        Ok(summary)
    }

    async fn apply_file(
        &self,
        filename: &str,
        sql: &str,
        summary: &mut MigrationSummary,
    ) -> Result<(), MigrationError> {
        let statements = split_statements(sql);
        info!("Applying migration {} ({} statements)", filename, statements.len());

        for (index, statement) in statements.iter().enumerate() {
            match self.conn.execute_unprepared(statement).await {
                Ok(_) => summary.statements_executed += 1,
                Err(err) if is_ignorable(&err.to_string(), statement) => {
                    warn!(
                        "Ignoring statement {} of {}: {}",
                        index + 1,
                        filename,
                        err
                    );
                    summary.statements_ignored += 1;
                }
                Err(source) => {
                    return Err(MigrationError::Fatal {
                        file: filename.to_string(),
                        index: index + 1,
                        source,
                    });
                }
            }
        }

        Ok(())
    }

    async fn applied_filenames(&self) -> Result<HashSet<String>, DbErr> {
        let backend = self.conn.get_database_backend();
        let rows = self
            .conn
            .query_all(Statement::from_string(
                backend,
                "SELECT filename FROM schema_migrations".to_string(),
            ))
            .await?;

        rows.iter()
            .map(|row| row.try_get::<String>("", "filename"))
            .collect()
    }

    async fn record_applied(&self, filename: &str) -> Result<(), DbErr> {
        let backend = self.conn.get_database_backend();
        self.conn
            .execute(Statement::from_sql_and_values(
                backend,
                "INSERT INTO schema_migrations (filename) VALUES (?) \
                 ON CONFLICT(filename) DO NOTHING",
                [filename.into()],
            ))
            .await?;
        Ok(())
    }
}

fn list_migration_files(dir: &Path) -> Result<Vec<String>, MigrationError> {
    let entries = std::fs::read_dir(dir).map_err(|source| MigrationError::Io {
        dir: dir.display().to_string(),
        source,
    })?;

    let mut files: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();

    // Case-sensitive lexicographic order; callers zero-pad ordinal prefixes.
    files.sort();
    Ok(files)
}

/// Classify a statement failure as ignorable (the desired end state already
/// holds) or fatal.
///
/// A missing-column failure is only ignorable on an index-creation statement:
/// that happens when a reordered migration indexes a column a later file
/// dropped, and the index is pointless rather than load-bearing.
fn is_ignorable(message: &str, statement: &str) -> bool {
    let message = message.to_lowercase();

    if message.contains("already exists")
        || message.contains("already installed")
        || message.contains("unique constraint failed")
        || message.contains("duplicate key")
        || message.contains("duplicate column")
        || message.contains("duplicate object")
    {
        return true;
    }

    if is_create_index(statement)
        && (message.contains("no such column")
            || (message.contains("column") && message.contains("does not exist")))
    {
        return true;
    }

    false
}

fn is_create_index(statement: &str) -> bool {
    let head: String = statement
        .split_whitespace()
        .take(3)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    head.starts_with("create index") || head.starts_with("create unique index")
}
