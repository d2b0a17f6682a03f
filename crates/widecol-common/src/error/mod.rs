//! Error handling for widecol.
//!
//! One error type is shared by the store backends, the wire protocol and the
//! data layer, so that a failure raised inside the server reaches a remote
//! client unchanged.

mod store;

pub use store::{ErrorCode, StoreError};

/// Result type alias for widecol operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
