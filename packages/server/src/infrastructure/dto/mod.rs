//! Data transfer objects of the HTTP and push surfaces.

pub mod http;
pub mod websocket;
