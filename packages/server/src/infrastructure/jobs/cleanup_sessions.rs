//! Periodic sweep of abandoned waiting sessions.

use async_trait::async_trait;
use tracing::info;

use super::scheduler::{Job, JobFrequency};
use crate::usecase::CleanupSessionsUseCase;

pub struct CleanupSessionsJob {
    usecase: CleanupSessionsUseCase,
    interval_secs: u64,
}

impl CleanupSessionsJob {
    pub fn new(usecase: CleanupSessionsUseCase, interval_secs: u64) -> Self {
        Self {
            usecase,
            interval_secs,
        }
    }
}

#[async_trait]
impl Job for CleanupSessionsJob {
    fn name(&self) -> &'static str {
        "cleanup_sessions"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::from_secs(self.interval_secs)
    }

    async fn execute(&self) -> Result<(), String> {
        let removed = self.usecase.execute().await;
        if !removed.is_empty() {
            info!(job = self.name(), removed = removed.len(), "expired waiting sessions removed");
        }
        Ok(())
    }
}
