//! # widecol-store
//!
//! The boundary between widecol and the wide-column store.
//!
//! The store is reached through a [`Connector`], which hands out one
//! [`StoreConnection`] per operation. Callers never hold a connection
//! across operations: [`Connector::acquire`] returns a [`ScopedConnection`]
//! that closes itself when dropped, on success and on error alike.
//!
//! Two backends are provided:
//!
//! - [`MemoryStore`]: an in-process store, used by tests and by the
//!   `widecold` server as its storage.
//! - [`RemoteConnector`]: a blocking TCP client speaking the framed
//!   protocol in [`wire`].
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use widecol_store::{Connector, MemoryConnector, MemoryStore};
//!
//! let store = Arc::new(MemoryStore::new());
//! let connector = MemoryConnector::new(store);
//!
//! let mut conn = connector.acquire().unwrap();
//! conn.create_table("products", &["info".to_string()]).unwrap();
//! assert_eq!(conn.list_tables().unwrap(), vec!["products".to_string()]);
//! // `conn` is closed here.
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Connector and connection traits.
pub mod connection;

/// In-process store backend.
pub mod memory;

/// Blocking TCP client backend.
pub mod remote;

/// Frame codec and request/response messages.
pub mod wire;

pub use connection::{Connector, ScopedConnection, StoreConnection, TableHandle};
pub use memory::{MemoryConnection, MemoryConnector, MemoryStore, StoreStats};
pub use remote::{RemoteConnection, RemoteConnector};
