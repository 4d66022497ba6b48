//! Team quiz session coordinator.
//!
//! Hosts lobbies where members of a study group gather, runs team-voted
//! multiple-choice rounds over a flashcard deck, and pushes every state change
//! to connected clients over WebSocket.

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub use ui::{Application, run};
