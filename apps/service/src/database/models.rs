use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::monitoring::types::{CheckOutcome, ProbeReport, SiteStatus};

/// Monitor model - a user's subscription to checks of one URL at an interval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monitor {
    pub id: Option<i64>,
    pub uuid: Uuid,
    pub user_id: i64,
    pub url: String,
    pub interval_seconds: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Monitor {
    /// Create a new monitor
    pub fn new(user_id: i64, url: String, interval_seconds: u64) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            uuid: Uuid::new_v4(),
            user_id,
            url,
            interval_seconds,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Site model - shared availability state for a URL, independent of how
/// many monitors reference it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub id: Option<i64>,
    pub url: String,
    pub status: SiteStatus,
    pub consecutive_failures: u32,
}

/// Check model - one immutable record of a single probe's outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Check {
    pub id: Option<i64>,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub outcome: CheckOutcome,
    pub status_code: Option<u16>,
    pub response_time_ms: Option<u64>,
}

impl Check {
    /// Build the persisted row for a probe report
    pub fn from_report(report: &ProbeReport) -> Self {
        Self {
            id: None,
            url: report.url.clone(),
            timestamp: report.timestamp,
            outcome: report.outcome,
            status_code: report.status_code,
            response_time_ms: report.response_time_ms,
        }
    }

    /// Whether this check counts as successful
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Convert a timestamp to the unix seconds stored in the database
pub fn timestamp_to_i64(time: DateTime<Utc>) -> i64 {
    time.timestamp()
}

/// Convert stored unix seconds back to a timestamp
pub fn i64_to_timestamp(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).unwrap_or_default()
}
