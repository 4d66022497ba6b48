//! Background job scheduler.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{error, info, warn};

/// How often a job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobFrequency {
    Seconds(u64),
    Minutes(u64),
}

impl JobFrequency {
    /// Whole minutes are reported as `Minutes` so that logs read naturally.
    pub fn from_secs(secs: u64) -> Self {
        if secs >= 60 && secs % 60 == 0 {
            JobFrequency::Minutes(secs / 60)
        } else {
            JobFrequency::Seconds(secs)
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            JobFrequency::Seconds(secs) => Duration::from_secs(*secs),
            JobFrequency::Minutes(mins) => Duration::from_secs(*mins * 60),
        }
    }
}

#[async_trait]
pub trait Job: Send + Sync {
    /// Name used in log fields.
    fn name(&self) -> &'static str;

    fn frequency(&self) -> JobFrequency;

    async fn execute(&self) -> Result<(), String>;
}

/// Runs each registered job on its own interval until shutdown.
pub struct JobScheduler {
    jobs: Vec<Arc<dyn Job>>,
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl JobScheduler {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            jobs: Vec::new(),
            shutdown_tx,
            handles: Vec::new(),
        }
    }

    pub fn register<J: Job + 'static>(&mut self, job: J) {
        self.jobs.push(Arc::new(job));
    }

    pub fn start(&mut self) {
        info!(jobs = self.jobs.len(), "starting job scheduler");

        for job in &self.jobs {
            let job = Arc::clone(job);
            let mut shutdown_rx = self.shutdown_tx.subscribe();

            let handle = tokio::spawn(async move {
                let name = job.name();
                let frequency = job.frequency();
                let mut interval = tokio::time::interval(frequency.duration());

                // The first tick completes immediately.
                interval.tick().await;
                info!(job = name, frequency = ?frequency, "job scheduled");

                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            let start = std::time::Instant::now();
                            match job.execute().await {
                                Ok(()) => info!(
                                    job = name,
                                    elapsed_ms = start.elapsed().as_millis(),
                                    "job completed"
                                ),
                                Err(e) => error!(
                                    job = name,
                                    elapsed_ms = start.elapsed().as_millis(),
                                    error = %e,
                                    "job failed"
                                ),
                            }
                        }
                        changed = shutdown_rx.changed() => {
                            if changed.is_err() || *shutdown_rx.borrow() {
                                info!(job = name, "job shutting down");
                                break;
                            }
                        }
                    }
                }
            });

            self.handles.push(handle);
        }
    }

    /// Signal every job to stop. Returns immediately.
    pub fn shutdown(&self) {
        info!("stopping job scheduler");
        self.shutdown_tx.send_replace(true);
    }

    pub async fn wait_for_shutdown(self, timeout: Duration) {
        let handles = self.handles;
        let all_done = async {
            for handle in handles {
                if let Err(e) = handle.await {
                    warn!("job task panicked: {}", e);
                }
            }
        };

        match tokio::time::timeout(timeout, all_done).await {
            Ok(()) => info!("all jobs stopped"),
            Err(_) => warn!(timeout = ?timeout, "job shutdown timed out"),
        }
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}
