//! Request and response messages.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use widecol_common::{Cell, RawRow, StoreError, StoreResult};

/// A request from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    /// Liveness probe.
    Ping,
    /// List all tables.
    ListTables,
    /// Create a table.
    CreateTable {
        /// Table name.
        table: String,
        /// Column families.
        families: Vec<String>,
    },
    /// Disable a table.
    DisableTable {
        /// Table name.
        table: String,
    },
    /// Re-enable a disabled table.
    EnableTable {
        /// Table name.
        table: String,
    },
    /// Delete a disabled table.
    DeleteTable {
        /// Table name.
        table: String,
    },
    /// Merge cells into a row.
    Put {
        /// Table name.
        table: String,
        /// Row key.
        row: Bytes,
        /// Cells to write.
        cells: Vec<Cell>,
    },
    /// Full table scan.
    Scan {
        /// Table name.
        table: String,
    },
    /// Delete a row.
    Delete {
        /// Table name.
        table: String,
        /// Row key.
        row: Bytes,
    },
}

impl Request {
    /// Short operation name, for logging.
    pub fn op(&self) -> &'static str {
        match self {
            Request::Ping => "ping",
            Request::ListTables => "list_tables",
            Request::CreateTable { .. } => "create_table",
            Request::DisableTable { .. } => "disable_table",
            Request::EnableTable { .. } => "enable_table",
            Request::DeleteTable { .. } => "delete_table",
            Request::Put { .. } => "put",
            Request::Scan { .. } => "scan",
            Request::Delete { .. } => "delete",
        }
    }
}

/// A response from server to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    /// Reply to `Ping`.
    Pong,
    /// Success without payload.
    Ok,
    /// Table names.
    Tables(Vec<String>),
    /// Scanned rows.
    Rows(Vec<RawRow>),
    /// The request failed.
    Error(StoreError),
}

impl Response {
    /// Wraps a unit result.
    pub fn from_unit(result: StoreResult<()>) -> Self {
        match result {
            Ok(()) => Response::Ok,
            Err(e) => Response::Error(e),
        }
    }

    /// Converts into a unit result.
    pub fn into_unit(self) -> StoreResult<()> {
        match self {
            Response::Ok => Ok(()),
            other => Err(other.unexpected("ok")),
        }
    }

    /// Converts into table names.
    pub fn into_tables(self) -> StoreResult<Vec<String>> {
        match self {
            Response::Tables(tables) => Ok(tables),
            other => Err(other.unexpected("tables")),
        }
    }

    /// Converts into rows.
    pub fn into_rows(self) -> StoreResult<Vec<RawRow>> {
        match self {
            Response::Rows(rows) => Ok(rows),
            other => Err(other.unexpected("rows")),
        }
    }

    fn unexpected(self, expected: &str) -> StoreError {
        match self {
            Response::Error(e) => e,
            other => StoreError::protocol(format!("expected {expected} response, got {other:?}")),
        }
    }
}
