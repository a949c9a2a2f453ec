// remotegen-api: Async Rust client for the device configuration service

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::ConfigServiceClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
