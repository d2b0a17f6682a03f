//! # widecol-data
//!
//! Row-store access and query layer over a wide-column store.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Front end (CLI, forms, scripts)                │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐          │
//! │  │   Catalog   │  │  RowStore   │  │ QueryEngine │          │
//! │  │ (lifecycle) │  │   (CRUD)    │  │(scan+filter)│          │
//! │  └─────────────┘  └─────────────┘  └─────────────┘          │
//! │                  ┌─────────────┐                            │
//! │                  │    codec    │ (strings <-> bytes)        │
//! │                  └─────────────┘                            │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │         widecol-store (Connector / StoreConnection)         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every component holds an injected `Arc<dyn Connector>` and acquires a
//! fresh connection per operation.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod codec;
pub mod input;
pub mod query;
pub mod row;
pub mod schema;
pub mod seed;
pub mod table;

pub use catalog::{Catalog, ResetReport};
pub use query::{QueryDef, QueryEngine, QueryRegistry};
pub use row::{Column, FieldMap, ResultRow, Row};
pub use schema::{Schema, TableSpec};
pub use seed::{FieldSource, RandomSource, SeedPlan, SeedReport, Seeder};
pub use table::{RowScan, RowStore};
