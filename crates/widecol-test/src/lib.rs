//! # widecol-test
//!
//! Integration tests for widecol.
//!
//! This crate contains:
//! - End-to-end tests against the in-memory backend
//! - The same scenarios over TCP against a `widecold` server
//! - Fixtures shared by both

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Test utilities and helpers
pub mod utils;

/// Scenarios run against every backend
pub mod scenarios;
