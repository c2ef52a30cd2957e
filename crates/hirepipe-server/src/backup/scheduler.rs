//! Periodic background backups

use sqlx::PgPool;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};

use super::backup_all;
use crate::storage::Storage;

/// Runs [`backup_all`] on a fixed interval
pub struct BackupScheduler {
    db: PgPool,
    storage: Storage,
    period: Duration,
}

impl BackupScheduler {
    pub fn new(db: PgPool, storage: Storage, period: Duration) -> Self {
        Self { db, storage, period }
    }

    /// Start the scheduler in background.
    ///
    /// The first backup runs one full period after start.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                period_secs = self.period.as_secs(),
                bucket = self.storage.bucket(),
                "Backup scheduler started"
            );

            let mut ticker = interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let summary = backup_all(&self.db, &self.storage).await;
                if !summary.is_success() {
                    warn!(
                        failed = summary.failed.len(),
                        "Scheduled backup finished with failures"
                    );
                }
            }
        })
    }
}
