pub mod prober;
/// Monitoring engine module - turns due URLs into recorded checks
///
/// This module is responsible for:
/// - Probing URLs over HTTP
/// - Driving the shared tick clock
/// - Advancing per-site availability state
/// - Feeding results to the database and notification layers
pub mod executor;
pub mod scheduler;
pub mod status;
pub mod types;

pub use executor::CheckExecutor;
pub use prober::{HttpProber, Probe};
pub use scheduler::TickScheduler;
pub use status::SiteStatusManager;
pub use types::ProbeReport;
