use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::params;
use uuid::Uuid;

use super::models::{Check, Monitor, Site, i64_to_timestamp, timestamp_to_i64};
use crate::monitoring::types::SiteStatus;
use crate::pool::LibsqlPool;

/// Persistence operations the monitoring and reporting code run against
#[async_trait]
pub trait Database: Send + Sync {
    /// Get the distinct URLs whose check interval divides the elapsed seconds
    async fn get_due_urls(&self, elapsed_seconds: i64) -> Result<Vec<String>>;

    /// Get the shared availability state for a URL
    async fn get_site(&self, url: &str) -> Result<Option<Site>>;

    /// Create availability state for a URL if none exists yet
    async fn create_site(&self, url: &str, status: SiteStatus) -> Result<()>;

    /// Overwrite the availability state for a URL
    async fn update_site(
        &self,
        url: &str,
        status: SiteStatus,
        consecutive_failures: u32,
    ) -> Result<()>;

    /// Save a check record
    async fn save_check(&self, check: &Check) -> Result<i64>;

    /// Get checks for a URL within an inclusive time range, oldest first
    async fn get_checks_in_range(
        &self,
        url: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Check>>;

    /// Insert or update a user's monitor for a URL
    async fn save_monitor(&self, monitor: &Monitor) -> Result<i64>;

    /// Get one user's monitor for a URL
    async fn get_monitor(&self, user_id: i64, url: &str) -> Result<Option<Monitor>>;

    /// Get all monitors belonging to a user
    async fn get_user_monitors(&self, user_id: i64) -> Result<Vec<Monitor>>;

    /// Get the ids of every user with a monitor on a URL
    async fn get_users_monitoring_url(&self, url: &str) -> Result<Vec<i64>>;

    /// Change the interval of one user's monitor, returning rows changed
    async fn update_monitor_interval(
        &self,
        user_id: i64,
        url: &str,
        interval_seconds: u64,
    ) -> Result<u64>;

    /// Delete one user's monitor, returning rows changed
    async fn delete_monitor(&self, user_id: i64, url: &str) -> Result<u64>;
}

/// LibSQL implementation of the persistence interface
pub struct DatabaseImpl {
    pool: LibsqlPool,
}

impl DatabaseImpl {
    /// Wrap an already initialized pool
    pub fn new_from_pool(pool: LibsqlPool) -> Self {
        Self { pool }
    }

    /// Get a connection from the pool
    async fn get_conn(&self) -> Result<deadpool::managed::Object<crate::pool::LibsqlManager>> {
        Ok(self.pool.get().await?)
    }
}

#[async_trait]
impl Database for DatabaseImpl {
    async fn get_due_urls(&self, elapsed_seconds: i64) -> Result<Vec<String>> {
        let conn = self.get_conn().await?;
        // The interval guard keeps a bad row from turning the modulo into
        // a division by zero.
        let mut stmt = conn
            .prepare(
                "SELECT DISTINCT url FROM monitors WHERE interval_seconds > 0 AND ? % interval_seconds = 0",
            )
            .await?;

        let mut rows = stmt.query(params![elapsed_seconds]).await?;
        let mut urls = Vec::new();

        while let Some(row) = rows.next().await? {
            urls.push(row.get(0)?);
        }

        Ok(urls)
    }

    async fn get_site(&self, url: &str) -> Result<Option<Site>> {
        let conn = self.get_conn().await?;
        let mut stmt = conn
            .prepare("SELECT id, url, status, consecutive_failures FROM sites WHERE url = ?")
            .await?;

        let mut rows = stmt.query(params![url]).await?;

        if let Some(row) = rows.next().await? {
            let status_str: String = row.get(2)?;

            Ok(Some(Site {
                id: Some(row.get(0)?),
                url: row.get(1)?,
                status: status_str.parse()?,
                consecutive_failures: row.get::<i64>(3)? as u32,
            }))
        } else {
            Ok(None)
        }
    }

    async fn create_site(&self, url: &str, status: SiteStatus) -> Result<()> {
        let conn = self.get_conn().await?;
        // OR IGNORE keeps concurrent first sightings of one URL from racing
        conn.execute(
            "INSERT OR IGNORE INTO sites (url, status, consecutive_failures) VALUES (?, ?, 0)",
            params![url, status.to_string()],
        )
        .await?;
        Ok(())
    }

    async fn update_site(
        &self,
        url: &str,
        status: SiteStatus,
        consecutive_failures: u32,
    ) -> Result<()> {
        let conn = self.get_conn().await?;
        conn.execute(
            "UPDATE sites SET status = ?, consecutive_failures = ? WHERE url = ?",
            params![status.to_string(), consecutive_failures as i64, url],
        )
        .await?;
        Ok(())
    }

    async fn save_check(&self, check: &Check) -> Result<i64> {
        let conn = self.get_conn().await?;
        conn.execute(
            "INSERT INTO checks (url, timestamp, outcome, status_code, response_time_ms) VALUES (?, ?, ?, ?, ?)",
            params![
                check.url.clone(),
                timestamp_to_i64(check.timestamp),
                check.outcome.to_string(),
                check.status_code.map(|v| v as i64),
                check.response_time_ms.map(|v| v as i64)
            ],
        )
        .await?;

        Ok(conn.last_insert_rowid())
    }

    async fn get_checks_in_range(
        &self,
        url: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Check>> {
        let conn = self.get_conn().await?;
        let mut stmt = conn
            .prepare(
                "SELECT id, url, timestamp, outcome, status_code, response_time_ms FROM checks WHERE url = ? AND timestamp >= ? AND timestamp <= ? ORDER BY timestamp ASC",
            )
            .await?;

        let mut rows = stmt
            .query(params![url, timestamp_to_i64(start), timestamp_to_i64(end)])
            .await?;
        let mut checks = Vec::new();

        while let Some(row) = rows.next().await? {
            let timestamp: i64 = row.get(2)?;
            let outcome_str: String = row.get(3)?;

            checks.push(Check {
                id: Some(row.get(0)?),
                url: row.get(1)?,
                timestamp: i64_to_timestamp(timestamp),
                outcome: outcome_str.parse()?,
                status_code: row.get::<Option<i64>>(4)?.map(|v| v as u16),
                response_time_ms: row.get::<Option<i64>>(5)?.map(|v| v as u64),
            });
        }

        Ok(checks)
    }

    async fn save_monitor(&self, monitor: &Monitor) -> Result<i64> {
        let conn = self.get_conn().await?;
        let created_at = timestamp_to_i64(monitor.created_at);
        let updated_at = timestamp_to_i64(monitor.updated_at);

        if let Some(id) = monitor.id {
            conn.execute(
                "UPDATE monitors SET url = ?, interval_seconds = ?, updated_at = ? WHERE id = ?",
                params![
                    monitor.url.clone(),
                    monitor.interval_seconds as i64,
                    updated_at,
                    id
                ],
            )
            .await?;
            Ok(id)
        } else {
            conn.execute(
                "INSERT INTO monitors (uuid, user_id, url, interval_seconds, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    monitor.uuid.to_string(),
                    monitor.user_id,
                    monitor.url.clone(),
                    monitor.interval_seconds as i64,
                    created_at,
                    updated_at
                ],
            )
            .await?;

            Ok(conn.last_insert_rowid())
        }
    }

    async fn get_monitor(&self, user_id: i64, url: &str) -> Result<Option<Monitor>> {
        let conn = self.get_conn().await?;
        let mut stmt = conn
            .prepare(
                "SELECT id, uuid, user_id, url, interval_seconds, created_at, updated_at FROM monitors WHERE user_id = ? AND url = ?",
            )
            .await?;

        let mut rows = stmt.query(params![user_id, url]).await?;

        if let Some(row) = rows.next().await? {
            let uuid_str: String = row.get(1)?;
            let created_at: i64 = row.get(5)?;
            let updated_at: i64 = row.get(6)?;

            Ok(Some(Monitor {
                id: Some(row.get(0)?),
                uuid: Uuid::parse_str(&uuid_str)?,
                user_id: row.get(2)?,
                url: row.get(3)?,
                interval_seconds: row.get::<i64>(4)? as u64,
                created_at: i64_to_timestamp(created_at),
                updated_at: i64_to_timestamp(updated_at),
            }))
        } else {
            Ok(None)
        }
    }

    async fn get_user_monitors(&self, user_id: i64) -> Result<Vec<Monitor>> {
        let conn = self.get_conn().await?;
        let mut stmt = conn
            .prepare(
                "SELECT id, uuid, user_id, url, interval_seconds, created_at, updated_at FROM monitors WHERE user_id = ? ORDER BY created_at ASC",
            )
            .await?;

        let mut rows = stmt.query(params![user_id]).await?;
        let mut monitors = Vec::new();

        while let Some(row) = rows.next().await? {
            let uuid_str: String = row.get(1)?;
            let created_at: i64 = row.get(5)?;
            let updated_at: i64 = row.get(6)?;

            monitors.push(Monitor {
                id: Some(row.get(0)?),
                uuid: Uuid::parse_str(&uuid_str)?,
                user_id: row.get(2)?,
                url: row.get(3)?,
                interval_seconds: row.get::<i64>(4)? as u64,
                created_at: i64_to_timestamp(created_at),
                updated_at: i64_to_timestamp(updated_at),
            });
        }

        Ok(monitors)
    }

    async fn get_users_monitoring_url(&self, url: &str) -> Result<Vec<i64>> {
        let conn = self.get_conn().await?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT user_id FROM monitors WHERE url = ?")
            .await?;

        let mut rows = stmt.query(params![url]).await?;
        let mut user_ids = Vec::new();

        while let Some(row) = rows.next().await? {
            user_ids.push(row.get(0)?);
        }

        Ok(user_ids)
    }

    async fn update_monitor_interval(
        &self,
        user_id: i64,
        url: &str,
        interval_seconds: u64,
    ) -> Result<u64> {
        let conn = self.get_conn().await?;
        let changed = conn
            .execute(
                "UPDATE monitors SET interval_seconds = ?, updated_at = ? WHERE user_id = ? AND url = ?",
                params![
                    interval_seconds as i64,
                    Utc::now().timestamp(),
                    user_id,
                    url
                ],
            )
            .await?;
        Ok(changed)
    }

    async fn delete_monitor(&self, user_id: i64, url: &str) -> Result<u64> {
        let conn = self.get_conn().await?;
        let changed = conn
            .execute(
                "DELETE FROM monitors WHERE user_id = ? AND url = ?",
                params![user_id, url],
            )
            .await?;
        Ok(changed)
    }
}
