//! Infrastructure layer.
//!
//! Concrete adapters behind the domain traits, real-time delivery, background
//! jobs and the wire DTOs.

pub mod auth;
pub mod dto;
pub mod jobs;
pub mod realtime;
pub mod repository;
