use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use super::types::{ProbeReport, SiteStatus};
use crate::database::{Database, models::Site};
use crate::notify::{NotificationBus, StatusChange};

/// Threshold-based availability state machine
///
/// Each probe report advances the per-URL failure streak. A site flips to
/// unavailable once the streak reaches the configured threshold and flips
/// back on the first success. Notifications fire on flips, and also when a
/// success clears a shorter streak that never reached the threshold.
pub struct SiteStatusManager {
    database: Arc<dyn Database>,
    bus: Arc<NotificationBus>,
    failure_threshold: u32,
}

impl SiteStatusManager {
    pub fn new(
        database: Arc<dyn Database>,
        bus: Arc<NotificationBus>,
        failure_threshold: u32,
    ) -> Self {
        Self { database, bus, failure_threshold }
    }

    /// Advance the state machine for one probe report
    pub async fn process_report(&self, report: &ProbeReport) -> Result<()> {
        let site = match self.database.get_site(&report.url).await? {
            Some(site) => site,
            None => {
                // First sighting of this URL
                self.database
                    .create_site(&report.url, SiteStatus::Available)
                    .await?;
                Site {
                    id: None,
                    url: report.url.clone(),
                    status: SiteStatus::Available,
                    consecutive_failures: 0,
                }
            }
        };

        if report.is_success() {
            self.handle_success(&site).await;
        } else {
            self.handle_failure(&site).await;
        }

        Ok(())
    }

    async fn handle_success(&self, site: &Site) {
        // Steady state, nothing to record
        if site.status == SiteStatus::Available && site.consecutive_failures == 0 {
            return;
        }

        self.persist(&site.url, SiteStatus::Available, 0).await;
        self.publish(&site.url, SiteStatus::Available).await;
    }

    async fn handle_failure(&self, site: &Site) {
        let failures = site.consecutive_failures + 1;
        let new_status = if failures >= self.failure_threshold {
            SiteStatus::Unavailable
        } else {
            site.status
        };
        let crossed =
            site.status == SiteStatus::Available && new_status == SiteStatus::Unavailable;

        debug!(
            "{} failed check {}/{}, status {}",
            site.url, failures, self.failure_threshold, new_status
        );

        self.persist(&site.url, new_status, failures).await;

        if crossed {
            self.publish(&site.url, SiteStatus::Unavailable).await;
        }
    }

    /// Best-effort state write. A notification that is due still goes out
    /// when this fails, and the next check recomputes from whatever state
    /// was last persisted.
    async fn persist(&self, url: &str, status: SiteStatus, consecutive_failures: u32) {
        if let Err(e) = self
            .database
            .update_site(url, status, consecutive_failures)
            .await
        {
            warn!("Failed to persist state for {}: {}", url, e);
        }
    }

    async fn publish(&self, url: &str, status: SiteStatus) {
        self.bus
            .publish(&StatusChange { url: url.to_string(), status })
            .await;
    }
}
