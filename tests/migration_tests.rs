//! Integration tests for the raw-SQL migration runner.

use std::path::PathBuf;

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use recruitr::db::{MigrationError, MigrationRunner, Store};

struct TestDb {
    conn: DatabaseConnection,
    migrations_dir: PathBuf,
    db_path: PathBuf,
}

async fn setup(migration_files: &[(&str, &str)]) -> TestDb {
    let unique = uuid::Uuid::new_v4();

    let db_path = std::env::temp_dir().join(format!("recruitr-migration-test-{unique}.db"));
    std::fs::File::create(&db_path).expect("failed to create db file");

    let migrations_dir = std::env::temp_dir().join(format!("recruitr-migrations-{unique}"));
    std::fs::create_dir_all(&migrations_dir).expect("failed to create migrations dir");
    for (name, sql) in migration_files {
        std::fs::write(migrations_dir.join(name), sql).expect("failed to write migration");
    }

    let conn = Database::connect(format!("sqlite:{}", db_path.display()))
        .await
        .expect("failed to connect");

    TestDb {
        conn,
        migrations_dir,
        db_path,
    }
}

impl TestDb {
    async fn recorded_files(&self) -> Vec<String> {
        let backend = self.conn.get_database_backend();
        let rows = self
            .conn
            .query_all(Statement::from_string(
                backend,
                "SELECT filename FROM schema_migrations ORDER BY filename".to_string(),
            ))
            .await
            .expect("failed to query schema_migrations");

        rows.iter()
            .map(|row| row.try_get::<String>("", "filename").unwrap())
            .collect()
    }

    async fn table_exists(&self, name: &str) -> bool {
        let backend = self.conn.get_database_backend();
        let row = self
            .conn
            .query_one(Statement::from_sql_and_values(
                backend,
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
                [name.into()],
            ))
            .await
            .expect("failed to query sqlite_master");

        row.is_some()
    }

    fn cleanup(&self) {
        let _ = std::fs::remove_file(&self.db_path);
        let _ = std::fs::remove_dir_all(&self.migrations_dir);
    }
}

#[tokio::test]
async fn runner_applies_files_in_filename_order() {
    let db = setup(&[
        (
            "0002_second.sql",
            "CREATE TABLE IF NOT EXISTS b (a_id INTEGER REFERENCES a (id));",
        ),
        (
            "0001_first.sql",
            "CREATE TABLE IF NOT EXISTS a (id INTEGER PRIMARY KEY);",
        ),
    ])
    .await;

    let summary = MigrationRunner::new(db.conn.clone())
        .apply_dir(&db.migrations_dir)
        .await
        .expect("migration run failed");

    assert_eq!(summary.files_applied, 2);
    assert_eq!(
        db.recorded_files().await,
        vec!["0001_first.sql".to_string(), "0002_second.sql".to_string()]
    );
    assert!(db.table_exists("a").await);
    assert!(db.table_exists("b").await);

    db.cleanup();
}

#[tokio::test]
async fn rerun_applies_nothing_new() {
    let db = setup(&[(
        "0001_accounts.sql",
        "CREATE TABLE IF NOT EXISTS t (id INTEGER PRIMARY KEY);\n\
         CREATE INDEX IF NOT EXISTS idx_t ON t (id);",
    )])
    .await;

    let runner = MigrationRunner::new(db.conn.clone());

    let first = runner.apply_dir(&db.migrations_dir).await.unwrap();
    assert_eq!(first.files_applied, 1);
    assert_eq!(first.statements_executed, 2);

    let second = runner.apply_dir(&db.migrations_dir).await.unwrap();
    assert_eq!(second.files_applied, 0);
    assert_eq!(second.files_skipped, 1);
    assert_eq!(second.statements_executed, 0);

    db.cleanup();
}

#[tokio::test]
async fn already_exists_failure_does_not_abort_the_file() {
    let db = setup(&[
        (
            "0001_base.sql",
            "CREATE TABLE IF NOT EXISTS base (id INTEGER PRIMARY KEY);",
        ),
        (
            "0002_dup.sql",
            // First statement collides with 0001; second must still run.
            "CREATE TABLE base (id INTEGER PRIMARY KEY);\n\
             CREATE TABLE IF NOT EXISTS extra (id INTEGER PRIMARY KEY);",
        ),
    ])
    .await;

    let summary = MigrationRunner::new(db.conn.clone())
        .apply_dir(&db.migrations_dir)
        .await
        .expect("ignorable failure should not abort the run");

    assert_eq!(summary.files_applied, 2);
    assert_eq!(summary.statements_ignored, 1);
    assert!(db.table_exists("extra").await);
    assert!(db.recorded_files().await.contains(&"0002_dup.sql".to_string()));

    db.cleanup();
}

#[tokio::test]
async fn duplicate_seed_insert_is_ignorable_and_file_is_recorded() {
    // A seed row re-inserted after a partial run collides on the unique
    // index; SQLite reports that as "UNIQUE constraint failed" and the run
    // must continue past it.
    let db = setup(&[(
        "0001_seed.sql",
        "CREATE TABLE IF NOT EXISTS roles (name TEXT PRIMARY KEY);\n\
         INSERT INTO roles (name) VALUES ('admin');\n\
         INSERT INTO roles (name) VALUES ('admin');\n\
         CREATE TABLE IF NOT EXISTS after_seed (id INTEGER PRIMARY KEY);",
    )])
    .await;

    let summary = MigrationRunner::new(db.conn.clone())
        .apply_dir(&db.migrations_dir)
        .await
        .expect("duplicate seed insert must classify as ignorable");

    assert_eq!(summary.files_applied, 1);
    assert_eq!(summary.statements_executed, 3);
    assert_eq!(summary.statements_ignored, 1);
    assert!(db.table_exists("after_seed").await);
    assert_eq!(db.recorded_files().await, vec!["0001_seed.sql".to_string()]);

    db.cleanup();
}

#[tokio::test]
async fn fatal_failure_aborts_file_and_subsequent_files() {
    let db = setup(&[
        (
            "0001_ok.sql",
            "CREATE TABLE IF NOT EXISTS ok (id INTEGER PRIMARY KEY);",
        ),
        (
            "0002_broken.sql",
            "CREATE TABLE IF NOT EXISTS partial (id INTEGER PRIMARY KEY);\n\
             INSERT INTO missing_table (id) VALUES (1);\n\
             CREATE TABLE IF NOT EXISTS never (id INTEGER PRIMARY KEY);",
        ),
        (
            "0003_after.sql",
            "CREATE TABLE IF NOT EXISTS after (id INTEGER PRIMARY KEY);",
        ),
    ])
    .await;

    let err = MigrationRunner::new(db.conn.clone())
        .apply_dir(&db.migrations_dir)
        .await
        .expect_err("unrelated failure must be fatal");

    match err {
        MigrationError::Fatal { file, index, .. } => {
            assert_eq!(file, "0002_broken.sql");
            assert_eq!(index, 2);
        }
        other => panic!("expected fatal error, got {other:?}"),
    }

    // Earlier statements of the broken file are applied, the file itself is
    // unrecorded, and nothing after it ran.
    assert!(db.table_exists("partial").await);
    assert!(!db.table_exists("never").await);
    assert!(!db.table_exists("after").await);
    assert_eq!(db.recorded_files().await, vec!["0001_ok.sql".to_string()]);

    db.cleanup();
}

#[tokio::test]
async fn index_on_dropped_column_is_ignorable_and_file_is_recorded() {
    // A reordered migration: the index targets a column a later-numbered
    // file already removed from the schema.
    let db = setup(&[
        (
            "0001_table.sql",
            "CREATE TABLE IF NOT EXISTS people (id INTEGER PRIMARY KEY, name TEXT);",
        ),
        (
            "0002_stale_index.sql",
            "CREATE INDEX IF NOT EXISTS idx_people_age ON people (age);",
        ),
    ])
    .await;

    let summary = MigrationRunner::new(db.conn.clone())
        .apply_dir(&db.migrations_dir)
        .await
        .expect("stale index must classify as ignorable");

    assert_eq!(summary.files_applied, 2);
    assert_eq!(summary.statements_ignored, 1);
    assert!(
        db.recorded_files()
            .await
            .contains(&"0002_stale_index.sql".to_string())
    );

    db.cleanup();
}

#[tokio::test]
async fn memory_url_does_not_create_a_file() {
    let db = setup(&[(
        "0001_first.sql",
        "CREATE TABLE IF NOT EXISTS a (id INTEGER PRIMARY KEY);",
    )])
    .await;

    // One pooled connection: an in-memory SQLite database is per-connection.
    let store = Store::with_pool_options("sqlite::memory:", &db.migrations_dir, 1, 1)
        .await
        .expect("memory store setup failed");
    store.ping().await.expect("ping failed");

    assert!(!std::path::Path::new(":memory:").exists());

    db.cleanup();
}

#[tokio::test]
async fn rerun_after_fatal_failure_re_executes_the_whole_file() {
    let db = setup(&[(
        "0001_flaky.sql",
        "CREATE TABLE IF NOT EXISTS kept (id INTEGER PRIMARY KEY);\n\
         INSERT INTO missing_table (id) VALUES (1);",
    )])
    .await;

    let runner = MigrationRunner::new(db.conn.clone());

    let first = runner.apply_dir(&db.migrations_dir).await;
    assert!(first.is_err());
    assert!(db.table_exists("kept").await);
    assert!(db.recorded_files().await.is_empty());

    // The file stays unrecorded, so the rerun walks it again from the top;
    // the idempotent first statement tolerates that.
    let second = runner.apply_dir(&db.migrations_dir).await;
    assert!(second.is_err());

    db.cleanup();
}
