use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

use super::{StatusChange, Subscriber};
use crate::database::Database;
use crate::monitoring::types::SiteStatus;

/// Subscriber that resolves which users monitor the changed URL and emits
/// one alert per user
pub struct UserNotifier {
    database: Arc<dyn Database>,
}

impl UserNotifier {
    pub fn new(database: Arc<dyn Database>) -> Self {
        Self { database }
    }
}

#[async_trait]
impl Subscriber for UserNotifier {
    fn name(&self) -> &str {
        "users"
    }

    async fn notify(&self, change: &StatusChange) -> Result<()> {
        let user_ids = self.database.get_users_monitoring_url(&change.url).await?;

        if user_ids.is_empty() {
            debug!("No users monitoring {}", change.url);
            return Ok(());
        }

        let message = match change.status {
            SiteStatus::Available => format!("{} is available again", change.url),
            SiteStatus::Unavailable => format!("{} became unavailable", change.url),
        };

        for user_id in user_ids {
            info!("Alert for user {}: {}", user_id, message);
        }

        Ok(())
    }
}
