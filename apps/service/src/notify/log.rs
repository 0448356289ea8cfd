use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use super::{StatusChange, Subscriber};
use crate::monitoring::types::SiteStatus;

/// Subscriber that mirrors every status change into the service log
pub struct LogSubscriber;

#[async_trait]
impl Subscriber for LogSubscriber {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, change: &StatusChange) -> Result<()> {
        match change.status {
            SiteStatus::Available => info!("{} is available again", change.url),
            SiteStatus::Unavailable => warn!("{} became unavailable", change.url),
        }
        Ok(())
    }
}
