use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::warn;

use super::models::{AvailabilityReport, DailyStat, Incident, UptimeStats};
use crate::database::{Database, models::Check};
use crate::monitoring::types::CheckOutcome;

/// Policy for days inside the window that saw no checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DailyBucketPolicy {
    /// Leave the day out of the rollup
    #[default]
    OmitEmpty,
    /// Keep the day with zeroed figures
    IncludeEmpty,
}

/// Report analyzer - recomputes availability history from stored checks
///
/// The analyzer never consults live site state. It replays the recorded
/// checks through the same threshold rule the status machine applies, so
/// a report agrees with the notifications that were sent at the time.
pub struct ReportAnalyzer {
    database: Arc<dyn Database>,
    failure_threshold: u32,
    daily_policy: DailyBucketPolicy,
}

impl ReportAnalyzer {
    pub fn new(database: Arc<dyn Database>, failure_threshold: u32) -> Self {
        Self {
            database,
            failure_threshold,
            daily_policy: DailyBucketPolicy::default(),
        }
    }

    pub fn with_daily_policy(mut self, policy: DailyBucketPolicy) -> Self {
        self.daily_policy = policy;
        self
    }

    /// Build a report over the seven days ending at `end`, defaulting to now
    pub async fn weekly_report(
        &self,
        url: &str,
        end: Option<DateTime<Utc>>,
    ) -> Result<AvailabilityReport> {
        let end = end.unwrap_or_else(Utc::now);
        let start = end - chrono::Duration::days(7);
        self.report(url, start, end).await
    }

    /// Build weekly reports for every monitor a user has. A URL whose
    /// report fails is logged and skipped rather than sinking the batch.
    pub async fn user_reports(
        &self,
        user_id: i64,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<AvailabilityReport>> {
        let monitors = self.database.get_user_monitors(user_id).await?;
        let mut reports = Vec::with_capacity(monitors.len());

        for monitor in monitors {
            match self.weekly_report(&monitor.url, end).await {
                Ok(report) => reports.push(report),
                Err(e) => warn!("Skipping report for {}: {}", monitor.url, e),
            }
        }

        Ok(reports)
    }

    /// Build a report over an arbitrary window
    pub async fn report(
        &self,
        url: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<AvailabilityReport> {
        let checks = self.database.get_checks_in_range(url, start, end).await?;
        Ok(self.analyze(url, checks, start, end))
    }

    /// Compute a report from an already loaded set of checks
    pub fn analyze(
        &self,
        url: &str,
        mut checks: Vec<Check>,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> AvailabilityReport {
        checks.sort_by_key(|c| c.timestamp);

        let incidents = self.replay_incidents(&checks);
        let stats = compute_stats(&checks, &incidents);
        let daily = self.daily_rollup(&checks, window_start, window_end);

        AvailabilityReport {
            url: url.to_string(),
            window_start,
            window_end,
            stats,
            incidents,
            daily,
        }
    }

    fn replay_incidents(&self, checks: &[Check]) -> Vec<Incident> {
        let mut incidents = Vec::new();
        let mut failure_streak: u32 = 0;
        let mut streak_started: Option<DateTime<Utc>> = None;
        let mut open: Option<(DateTime<Utc>, String)> = None;

        for check in checks {
            if check.is_success() {
                if let Some((started_at, reason)) = open.take() {
                    incidents.push(Incident {
                        started_at,
                        ended_at: check.timestamp,
                        duration_seconds: (check.timestamp - started_at).num_seconds(),
                        reason,
                    });
                }
                failure_streak = 0;
                streak_started = None;
            } else {
                if failure_streak == 0 {
                    streak_started = Some(check.timestamp);
                }
                failure_streak += 1;

                if failure_streak >= self.failure_threshold && open.is_none() {
                    // The incident dates back to the first failure of the
                    // streak, while the reason comes from the check that
                    // crossed the threshold
                    let started_at = streak_started.unwrap_or(check.timestamp);
                    open = Some((started_at, failure_reason(check)));
                }
            }
        }

        // An outage still running at the window edge closes at the last check
        if let (Some((started_at, reason)), Some(last)) = (open, checks.last()) {
            incidents.push(Incident {
                started_at,
                ended_at: last.timestamp,
                duration_seconds: (last.timestamp - started_at).num_seconds(),
                reason,
            });
        }

        incidents
    }

    fn daily_rollup(
        &self,
        checks: &[Check],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<DailyStat> {
        let mut daily = Vec::new();
        let mut day = start.date_naive();
        let last_day = end.date_naive();

        while day <= last_day {
            let day_checks: Vec<&Check> = checks
                .iter()
                .filter(|c| c.timestamp.date_naive() == day)
                .collect();

            if day_checks.is_empty() {
                if self.daily_policy == DailyBucketPolicy::IncludeEmpty {
                    daily.push(DailyStat {
                        date: day,
                        total_checks: 0,
                        uptime_percentage: 0.0,
                        average_response_time_ms: None,
                    });
                }
            } else {
                let total = day_checks.len() as u64;
                let successes = day_checks.iter().filter(|c| c.is_success()).count();
                let samples: Vec<u64> = day_checks
                    .iter()
                    .filter(|c| c.is_success())
                    .filter_map(|c| c.response_time_ms)
                    .collect();

                daily.push(DailyStat {
                    date: day,
                    total_checks: total,
                    uptime_percentage: round1(successes as f64 / total as f64 * 100.0),
                    average_response_time_ms: average(&samples),
                });
            }

            day = match day.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }

        daily
    }
}

fn compute_stats(checks: &[Check], incidents: &[Incident]) -> UptimeStats {
    let total_checks = checks.len() as u64;
    let successful_checks = checks.iter().filter(|c| c.is_success()).count() as u64;
    let failed_checks = total_checks - successful_checks;

    let uptime_percentage = if total_checks == 0 {
        0.0
    } else {
        round2(successful_checks as f64 / total_checks as f64 * 100.0)
    };

    // Response times only count for successful checks that recorded one
    let samples: Vec<u64> = checks
        .iter()
        .filter(|c| c.is_success())
        .filter_map(|c| c.response_time_ms)
        .collect();

    UptimeStats {
        total_checks,
        successful_checks,
        failed_checks,
        uptime_percentage,
        downtime_seconds: incidents.iter().map(|i| i.duration_seconds).sum(),
        average_response_time_ms: average(&samples),
        min_response_time_ms: samples.iter().min().copied(),
        max_response_time_ms: samples.iter().max().copied(),
    }
}

fn failure_reason(check: &Check) -> String {
    match check.outcome {
        CheckOutcome::Unavailable => match check.status_code {
            Some(code) => format!("HTTP {}", code),
            None => "Unknown Error".to_string(),
        },
        CheckOutcome::DnsError => "Connection Error".to_string(),
        CheckOutcome::Timeout => "Timeout".to_string(),
        CheckOutcome::Ok => "Unknown Error".to_string(),
    }
}

fn average(samples: &[u64]) -> Option<f64> {
    if samples.is_empty() {
        None
    } else {
        Some(round2(samples.iter().sum::<u64>() as f64 / samples.len() as f64))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
