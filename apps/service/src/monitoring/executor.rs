use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use super::prober::Probe;
use super::status::SiteStatusManager;
use super::types::ProbeReport;
use crate::database::{Database, models::Check};

/// Check executor - runs one batch of due URLs end to end
///
/// All probes in a batch run concurrently. Every surviving report is
/// recorded and fed to the status machine, and a failure in any one of
/// those steps never takes down the rest of the batch.
pub struct CheckExecutor {
    prober: Arc<dyn Probe>,
    database: Arc<dyn Database>,
    status: Arc<SiteStatusManager>,
}

impl CheckExecutor {
    pub fn new(
        prober: Arc<dyn Probe>,
        database: Arc<dyn Database>,
        status: Arc<SiteStatusManager>,
    ) -> Self {
        Self { prober, database, status }
    }

    /// Probe every URL in the batch, then record and apply the results
    pub async fn run_batch(&self, urls: Vec<String>) {
        if urls.is_empty() {
            return;
        }

        debug!("Running batch of {} checks", urls.len());

        let probes = join_all(urls.iter().map(|url| self.prober.probe(url))).await;

        // A probe error is not an observation of the site: it stays out of
        // history and does not advance the failure streak.
        let mut reports = Vec::with_capacity(probes.len());
        for (url, outcome) in urls.iter().zip(probes) {
            match outcome {
                Ok(report) => reports.push(report),
                Err(e) => warn!("Dropping check for {}: {}", url, e),
            }
        }

        join_all(reports.iter().map(|report| self.persist_report(report))).await;
        join_all(reports.iter().map(|report| self.apply_report(report))).await;
    }

    async fn persist_report(&self, report: &ProbeReport) {
        let check = Check::from_report(report);
        if let Err(e) = self.database.save_check(&check).await {
            warn!("Failed to save check for {}: {}", report.url, e);
        }
    }

    async fn apply_report(&self, report: &ProbeReport) {
        if let Err(e) = self.status.process_report(report).await {
            warn!("Failed to update status for {}: {}", report.url, e);
        }
    }
}
