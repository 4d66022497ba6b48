//! Background jobs.

pub mod cleanup_sessions;
pub mod scheduler;

pub use cleanup_sessions::CleanupSessionsJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
