use anyhow::Result;
use libsql::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// Run all pending migrations
pub async fn run_migrations(conn: &Connection) -> Result<()> {
    // Create migrations tracking table if it doesn't exist
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        (),
    )
    .await?;

    let current_version = get_current_version(conn).await?;

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            "Migrating database from version {} to {}",
            current_version,
            SCHEMA_VERSION
        );

        for version in (current_version + 1)..=SCHEMA_VERSION {
            apply_migration(conn, version).await?;
            record_migration(conn, version).await?;
            tracing::info!("Applied migration version {}", version);
        }
    }

    Ok(())
}

/// Get the current schema version from the database
async fn get_current_version(conn: &Connection) -> Result<i32> {
    let mut rows = conn
        .query("SELECT MAX(version) FROM schema_migrations", ())
        .await?;

    if let Some(row) = rows.next().await? {
        let version: Option<i32> = row.get(0)?;
        Ok(version.unwrap_or(0))
    } else {
        Ok(0)
    }
}

/// Record that a migration has been applied
async fn record_migration(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version, applied_at) VALUES (?, ?)",
        libsql::params![version, chrono::Utc::now().timestamp()],
    )
    .await?;
    Ok(())
}

/// Apply a specific migration version
async fn apply_migration(conn: &Connection, version: i32) -> Result<()> {
    match version {
        1 => run_migration_v1(conn).await,
        2 => run_migration_v2(conn).await,
        _ => Err(anyhow::anyhow!("Unknown migration version: {}", version)),
    }
}

/// Migration v1: Initial schema
async fn run_migration_v1(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS monitors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT NOT NULL UNIQUE,
            user_id INTEGER NOT NULL,
            url TEXT NOT NULL,
            interval_seconds INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
        (),
    )
    .await?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS sites (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            url TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL DEFAULT 'available',
            consecutive_failures INTEGER NOT NULL DEFAULT 0
        )",
        (),
    )
    .await?;

    // Checks are keyed by URL rather than monitor id. History has to
    // outlive any individual subscription to the same URL.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS checks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            url TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            outcome TEXT NOT NULL,
            status_code INTEGER,
            response_time_ms INTEGER
        )",
        (),
    )
    .await?;

    // One monitor per user per URL
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_monitors_user_url ON monitors (user_id, url)",
        (),
    )
    .await?;

    // Create indexes
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_monitors_url ON monitors (url)",
        (),
    )
    .await?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_monitors_user_id ON monitors (user_id)",
        (),
    )
    .await?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_monitors_interval ON monitors (interval_seconds)",
        (),
    )
    .await?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sites_url ON sites (url)",
        (),
    )
    .await?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_checks_url ON checks (url)",
        (),
    )
    .await?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_checks_timestamp ON checks (timestamp DESC)",
        (),
    )
    .await?;

    Ok(())
}

/// Migration v2: Add covering index for report queries
async fn run_migration_v2(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_checks_url_timestamp ON checks (url, timestamp)",
        (),
    )
    .await?;

    Ok(())
}
