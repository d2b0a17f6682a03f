//! # widecol-common
//!
//! Common types, errors, and configuration for widecol.
//!
//! This crate holds the pieces shared by every other widecol component:
//!
//! - **Types**: wire-level rows and cells exchanged with the store
//! - **Errors**: the `StoreError` taxonomy with stable error codes
//! - **Config**: `StoreConfig`, the host/port of the store to talk to
//!
//! ## Example
//!
//! ```rust
//! use widecol_common::types::{Cell, RawRow};
//! use widecol_common::error::StoreResult;
//!
//! fn example() -> StoreResult<()> {
//!     let row = RawRow::new(b"product_1".to_vec(), vec![Cell::new(b"info:name".to_vec(), b"Widget".to_vec())]);
//!     assert_eq!(row.cells.len(), 1);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod types;

pub use config::StoreConfig;
pub use error::{ErrorCode, StoreError, StoreResult};
pub use types::{validate_family, Cell, RawRow, FAMILY_SEPARATOR};
