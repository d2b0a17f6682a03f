//! Connector and connection abstractions.
//!
//! A [`Connector`] knows how to reach a store; a [`StoreConnection`] is one
//! live session with it. The data layer only ever talks to these traits, so
//! the same catalog and query code runs against the in-memory backend and
//! the TCP backend.

use std::fmt;
use std::ops::{Deref, DerefMut};

use bytes::Bytes;
use tracing::trace;

use widecol_common::{Cell, RawRow, StoreResult};

/// One live session with a store.
///
/// Every method is a single blocking request. Implementations perform no
/// retries and no caching.
pub trait StoreConnection: Send {
    /// Lists the names of all tables, enabled or not.
    fn list_tables(&mut self) -> StoreResult<Vec<String>>;

    /// Creates a table with the given column families.
    ///
    /// Fails with `TableExists` if a table of that name is present.
    fn create_table(&mut self, table: &str, families: &[String]) -> StoreResult<()>;

    /// Disables a table. Fails if it is absent or already disabled.
    fn disable_table(&mut self, table: &str) -> StoreResult<()>;

    /// Re-enables a disabled table. Fails if it is absent or already
    /// enabled.
    fn enable_table(&mut self, table: &str) -> StoreResult<()>;

    /// Deletes a disabled table. Fails if it is absent or still enabled.
    fn delete_table(&mut self, table: &str) -> StoreResult<()>;

    /// Writes cells onto a row, creating the row if needed.
    ///
    /// Cells not named in `cells` are left untouched.
    fn put(&mut self, table: &str, row: Bytes, cells: Vec<Cell>) -> StoreResult<()>;

    /// Returns every row of the table in store key order.
    fn scan(&mut self, table: &str) -> StoreResult<Vec<RawRow>>;

    /// Removes a row. Removing an absent row succeeds.
    fn delete_row(&mut self, table: &str, row: Bytes) -> StoreResult<()>;

    /// Releases the session. Must be safe to call more than once.
    fn close(&mut self) {}

    /// Returns true if a table of that name exists.
    fn table_exists(&mut self, table: &str) -> StoreResult<bool> {
        Ok(self.list_tables()?.iter().any(|t| t == table))
    }
}

/// Factory for store connections.
///
/// Components receive an `Arc<dyn Connector>` and acquire a fresh
/// connection for every operation.
pub trait Connector: Send + Sync + fmt::Debug {
    /// Opens a new connection.
    fn connect(&self) -> StoreResult<Box<dyn StoreConnection>>;

    /// Human-readable description of the target (address or backend name).
    fn target(&self) -> String;

    /// Opens a connection wrapped in a guard that closes it on drop.
    fn acquire(&self) -> StoreResult<ScopedConnection> {
        let inner = self.connect()?;
        trace!(store = %self.target(), "acquired store connection");
        Ok(ScopedConnection { inner })
    }
}

/// A connection that is closed when it goes out of scope.
pub struct ScopedConnection {
    inner: Box<dyn StoreConnection>,
}

impl ScopedConnection {
    /// Returns a handle bound to one table.
    ///
    /// No request is sent; a missing or disabled table is reported by the
    /// first operation on the handle.
    pub fn open_table(&mut self, table: impl Into<String>) -> TableHandle<'_> {
        TableHandle {
            conn: self.inner.as_mut(),
            table: table.into(),
        }
    }
}

impl Deref for ScopedConnection {
    type Target = dyn StoreConnection;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl DerefMut for ScopedConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.as_mut()
    }
}

impl Drop for ScopedConnection {
    fn drop(&mut self) {
        self.inner.close();
        trace!("released store connection");
    }
}

impl fmt::Debug for ScopedConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedConnection").finish_non_exhaustive()
    }
}

/// A connection bound to a single table.
pub struct TableHandle<'c> {
    conn: &'c mut dyn StoreConnection,
    table: String,
}

impl<'c> TableHandle<'c> {
    /// Returns the table name.
    pub fn name(&self) -> &str {
        &self.table
    }

    /// Writes cells onto a row.
    pub fn put(&mut self, row: Bytes, cells: Vec<Cell>) -> StoreResult<()> {
        self.conn.put(&self.table, row, cells)
    }

    /// Scans the whole table.
    pub fn scan(&mut self) -> StoreResult<Vec<RawRow>> {
        self.conn.scan(&self.table)
    }

    /// Deletes a row.
    pub fn delete(&mut self, row: Bytes) -> StoreResult<()> {
        self.conn.delete_row(&self.table, row)
    }
}

impl fmt::Debug for TableHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableHandle")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}
