//! Configuration structures.
//!
//! The only configuration the data layer needs is where the store lives.

mod client;

pub use client::{ConfigError, StoreConfig, ENV_HOST, ENV_PORT};
