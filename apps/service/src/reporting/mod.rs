/// Reporting module - availability reports derived from check history
pub mod analyzer;
pub mod format;
pub mod models;

pub use analyzer::{DailyBucketPolicy, ReportAnalyzer};
pub use models::AvailabilityReport;
