//! HTTP and WebSocket surface.

pub mod error;
pub mod extractor;
mod handler;
mod runner;
mod signal;
pub mod state;

pub use runner::{Application, build_router, run};
pub use signal::shutdown_signal;
