// conjure-api: Async Rust client for the Conjure magic-effects REST API

pub mod auth;
pub mod client;
pub mod effects;
pub mod error;
pub mod token;
pub mod transport;
pub mod triggers;
pub mod types;

pub use client::{ApiClient, Auth};
pub use error::{ApiError, Error};
pub use token::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use transport::TransportConfig;
