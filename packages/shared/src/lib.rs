//! Shared utilities for the Teamquiz workspace.

pub mod logger;
pub mod time;
