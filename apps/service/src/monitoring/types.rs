use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification of a single availability probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckOutcome {
    /// Final response with a 2xx or 3xx status code
    Ok,
    /// Connection attempt exceeded the connect timeout
    Timeout,
    /// Name resolution or connection failure
    DnsError,
    /// Final response with a non-2xx/3xx status code
    Unavailable,
}

impl CheckOutcome {
    /// Whether this outcome counts as a successful check
    pub fn is_success(&self) -> bool {
        matches!(self, CheckOutcome::Ok)
    }
}

impl std::fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckOutcome::Ok => write!(f, "ok"),
            CheckOutcome::Timeout => write!(f, "timeout"),
            CheckOutcome::DnsError => write!(f, "dns_error"),
            CheckOutcome::Unavailable => write!(f, "unavailable"),
        }
    }
}

impl std::str::FromStr for CheckOutcome {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ok" => Ok(CheckOutcome::Ok),
            "timeout" => Ok(CheckOutcome::Timeout),
            "dns_error" => Ok(CheckOutcome::DnsError),
            "unavailable" => Ok(CheckOutcome::Unavailable),
            other => Err(anyhow!("unknown check outcome: {}", other)),
        }
    }
}

/// Tracked availability state of a site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteStatus {
    Available,
    Unavailable,
}

impl std::fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SiteStatus::Available => write!(f, "available"),
            SiteStatus::Unavailable => write!(f, "unavailable"),
        }
    }
}

impl std::str::FromStr for SiteStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(SiteStatus::Available),
            "unavailable" => Ok(SiteStatus::Unavailable),
            other => Err(anyhow!("unknown site status: {}", other)),
        }
    }
}

/// Result of probing a single URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeReport {
    /// URL that was probed
    pub url: String,

    /// Timestamp taken when the probe started
    pub timestamp: DateTime<Utc>,

    /// Outcome classification
    pub outcome: CheckOutcome,

    /// HTTP status code, if a final response was received
    pub status_code: Option<u16>,

    /// Response time in milliseconds, recorded for successful checks only
    pub response_time_ms: Option<u64>,
}

impl ProbeReport {
    /// Reachable response with a healthy status code
    pub fn ok(url: String, timestamp: DateTime<Utc>, status_code: u16, response_time_ms: u64) -> Self {
        Self {
            url,
            timestamp,
            outcome: CheckOutcome::Ok,
            status_code: Some(status_code),
            response_time_ms: Some(response_time_ms),
        }
    }

    /// Reachable response with an error status code
    pub fn unavailable(url: String, timestamp: DateTime<Utc>, status_code: u16) -> Self {
        Self {
            url,
            timestamp,
            outcome: CheckOutcome::Unavailable,
            status_code: Some(status_code),
            response_time_ms: None,
        }
    }

    /// Request that never produced a final response
    pub fn unreachable(url: String, timestamp: DateTime<Utc>, outcome: CheckOutcome) -> Self {
        Self { url, timestamp, outcome, status_code: None, response_time_ms: None }
    }

    /// Whether this report counts as a successful check
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}
