use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate statistics over one reporting window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UptimeStats {
    pub total_checks: u64,
    pub successful_checks: u64,
    pub failed_checks: u64,
    /// Successful checks over total, as a percentage rounded to 2 places
    pub uptime_percentage: f64,
    /// Summed duration of all incidents in the window
    pub downtime_seconds: i64,
    pub average_response_time_ms: Option<f64>,
    pub min_response_time_ms: Option<u64>,
    pub max_response_time_ms: Option<u64>,
}

/// A contiguous stretch of unavailability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    /// Timestamp of the first failed check of the streak
    pub started_at: DateTime<Utc>,
    /// Timestamp of the next successful check, or of the last check when
    /// the outage runs past the window
    pub ended_at: DateTime<Utc>,
    pub duration_seconds: i64,
    pub reason: String,
}

/// Per-day rollup within the reporting window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyStat {
    pub date: NaiveDate,
    pub total_checks: u64,
    pub uptime_percentage: f64,
    pub average_response_time_ms: Option<f64>,
}

/// Full availability report for one URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityReport {
    pub url: String,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub stats: UptimeStats,
    pub incidents: Vec<Incident>,
    pub daily: Vec<DailyStat>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn report_serializes_to_json() {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
        let report = AvailabilityReport {
            url: "https://example.com".to_string(),
            window_start: start,
            window_end: start + chrono::Duration::days(7),
            stats: UptimeStats {
                total_checks: 10,
                successful_checks: 9,
                failed_checks: 1,
                uptime_percentage: 90.0,
                downtime_seconds: 600,
                average_response_time_ms: Some(120.5),
                min_response_time_ms: Some(80),
                max_response_time_ms: Some(200),
            },
            incidents: vec![Incident {
                started_at: start,
                ended_at: start + chrono::Duration::minutes(10),
                duration_seconds: 600,
                reason: "HTTP 503".to_string(),
            }],
            daily: vec![DailyStat {
                date: start.date_naive(),
                total_checks: 10,
                uptime_percentage: 90.0,
                average_response_time_ms: Some(120.5),
            }],
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["url"], "https://example.com");
        assert_eq!(json["stats"]["uptime_percentage"], 90.0);
        assert_eq!(json["incidents"][0]["reason"], "HTTP 503");
        assert_eq!(json["daily"][0]["date"], "2025-03-10");

        let back: AvailabilityReport = serde_json::from_value(json).unwrap();
        assert_eq!(back.stats.total_checks, 10);
    }
}
