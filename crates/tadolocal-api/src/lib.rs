// tadolocal-api: Async Rust client for the Tado local bridge HTTP API

pub mod client;
pub mod error;
pub mod events;
pub mod models;
pub mod transport;

pub use client::LocalClient;
pub use error::Error;
pub use events::{EventStreamConfig, EventStreamHandle};
