use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::{Instant, interval_at};
use tracing::{debug, error, warn};

use super::executor::CheckExecutor;
use crate::database::Database;

/// Tick scheduler - drives the whole engine off one clock
///
/// A single timer fires every tick. The elapsed time at tick t is
/// t * tick_duration, and a URL is due whenever its interval divides that
/// evenly. Each fired tick runs in a spawned task so a slow batch never
/// delays the clock, up to a cap on ticks in flight.
pub struct TickScheduler {
    database: Arc<dyn Database>,
    executor: Arc<CheckExecutor>,
    tick_duration: Duration,
    max_concurrent_ticks: usize,
}

impl TickScheduler {
    pub fn new(
        database: Arc<dyn Database>,
        executor: Arc<CheckExecutor>,
        tick_duration: Duration,
        max_concurrent_ticks: usize,
    ) -> Self {
        Self { database, executor, tick_duration, max_concurrent_ticks }
    }

    /// Run the tick loop until the task is dropped
    pub async fn run(self) {
        let permits = Arc::new(Semaphore::new(self.max_concurrent_ticks));
        let tick_seconds = self.tick_duration.as_secs() as i64;

        // First fire lands one full tick out, so tick t always stands for
        // t * tick_duration of elapsed time.
        let mut timer = interval_at(Instant::now() + self.tick_duration, self.tick_duration);
        let mut ticks: i64 = 0;

        loop {
            timer.tick().await;
            ticks += 1;

            let permit = match permits.clone().try_acquire_owned() {
                Ok(permit) => permit,
                Err(_) => {
                    // The counter advanced anyway. Due-ness depends on
                    // elapsed time, not on which ticks got processed.
                    warn!(
                        "Skipping tick {}: {} ticks already in flight",
                        ticks, self.max_concurrent_ticks
                    );
                    continue;
                }
            };

            let database = self.database.clone();
            let executor = self.executor.clone();
            let elapsed_seconds = ticks * tick_seconds;
            let tick = ticks;

            tokio::spawn(async move {
                let _permit = permit;

                let urls = match database.get_due_urls(elapsed_seconds).await {
                    Ok(urls) => urls,
                    Err(e) => {
                        error!("Failed to load due URLs at tick {}: {}", tick, e);
                        Vec::new()
                    }
                };

                if urls.is_empty() {
                    return;
                }

                debug!("Tick {}: {} URLs due", tick, urls.len());
                executor.run_batch(urls).await;
            });
        }
    }
}
