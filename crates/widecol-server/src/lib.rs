//! # widecol-server
//!
//! `widecold`, a small wide-column store served over TCP.
//!
//! The server keeps every table in a [`MemoryStore`](widecol_store::MemoryStore)
//! and speaks the framed protocol of [`widecol_store::wire`], so any
//! [`RemoteConnector`](widecol_store::RemoteConnector) can talk to it.
//!
//! ```text
//!   RemoteConnector ──TCP──► StoreServer ──► dispatch ──► MemoryStore
//!   (one connection         (one task per
//!    per operation)          connection)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Server configuration.
pub mod config;

/// Listener, connection handling and request dispatch.
pub mod server;

pub use config::ServerConfig;
pub use server::{dispatch, ServerError, ServerResult, ServerStats, StoreServer};
