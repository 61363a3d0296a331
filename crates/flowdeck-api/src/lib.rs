// flowdeck-api: Async Rust client for the Airflow 3 REST API (v2)

pub mod auth;
pub mod client;
pub mod cluster;
pub mod dags;
pub mod error;
pub mod pacer;
pub mod transport;
pub mod types;

pub use auth::Credentials;
pub use client::{FlowClient, ListOptions};
pub use error::Error;
pub use pacer::Pacer;
pub use transport::{TlsMode, TransportConfig};
