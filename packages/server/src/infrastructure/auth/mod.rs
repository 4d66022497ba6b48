//! Identity adapters.

pub mod jwt;

pub use jwt::{Claims, JwtIdentityProvider};
