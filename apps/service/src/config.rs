use std::{env, fmt};

use tracing::warn;

const DEFAULT_TICK_DURATION: u64 = 10;
const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
const DEFAULT_REQUEST_TIMEOUT: u64 = 5;
const DEFAULT_MAX_CONCURRENT_TICKS: usize = 30;
const DEFAULT_DATABASE_PATH: &str = "sitewatch.db";

/// Runtime configuration, loaded from the environment
#[derive(Debug, Clone)]
pub struct Config {
    /// Seconds between fires of the shared tick clock
    pub tick_duration: u64,
    /// Consecutive failures before a site is declared unavailable
    pub failure_threshold: u32,
    /// Connect timeout for outgoing probes, in seconds
    pub request_timeout: u64,
    /// Upper bound on tick batches running at once
    pub max_concurrent_ticks: usize,
    pub database_path: String,
}

fn get_env_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    parse_or_default(name, env::var(name).ok(), default)
}

fn parse_or_default<T: std::str::FromStr>(name: &str, raw: Option<String>, default: T) -> T {
    match raw {
        Some(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("Ignoring unparseable {}={:?}", name, val);
                default
            }
        },
        None => default,
    }
}

impl Config {
    /// Load configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            tick_duration: get_env_var("TICK_DURATION", DEFAULT_TICK_DURATION),
            failure_threshold: get_env_var("FAILURE_THRESHOLD", DEFAULT_FAILURE_THRESHOLD),
            request_timeout: get_env_var("REQUEST_TIMEOUT", DEFAULT_REQUEST_TIMEOUT),
            max_concurrent_ticks: get_env_var(
                "MAX_CONCURRENT_TICKS",
                DEFAULT_MAX_CONCURRENT_TICKS,
            ),
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string()),
        }
        .normalized()
    }

    /// Clamp values the engine cannot run with back to their defaults
    fn normalized(mut self) -> Self {
        if self.tick_duration == 0 {
            warn!("TICK_DURATION must be positive, using {}", DEFAULT_TICK_DURATION);
            self.tick_duration = DEFAULT_TICK_DURATION;
        }
        if self.failure_threshold == 0 {
            warn!(
                "FAILURE_THRESHOLD must be positive, using {}",
                DEFAULT_FAILURE_THRESHOLD
            );
            self.failure_threshold = DEFAULT_FAILURE_THRESHOLD;
        }
        if self.max_concurrent_ticks == 0 {
            warn!(
                "MAX_CONCURRENT_TICKS must be positive, using {}",
                DEFAULT_MAX_CONCURRENT_TICKS
            );
            self.max_concurrent_ticks = DEFAULT_MAX_CONCURRENT_TICKS;
        }
        self
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Active Configuration:")?;
        writeln!(f, "  Tick Duration: {}s", self.tick_duration)?;
        writeln!(f, "  Failure Threshold: {}", self.failure_threshold)?;
        writeln!(f, "  Request Timeout: {}s", self.request_timeout)?;
        writeln!(f, "  Max Concurrent Ticks: {}", self.max_concurrent_ticks)?;
        write!(f, "  Database Path: {}", self.database_path)
    }
}
