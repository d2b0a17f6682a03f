//! Wire protocol between a remote client and `widecold`.
//!
//! Every exchange is one request frame followed by one response frame.
//!
//! ```text
//! ┌──────────────┬───────────────────────────────┐
//! │ length (u32) │ JSON payload (length bytes)   │
//! │  big-endian  │ Request or Response           │
//! └──────────────┴───────────────────────────────┘
//! ```

pub mod frame;
mod protocol;

pub use protocol::{Request, Response};
