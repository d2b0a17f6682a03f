//! In-process wide-column store.
//!
//! Tables hold a fixed set of column families and a sorted map of rows;
//! each row is a sorted map of column name to value. Writes merge at cell
//! granularity, so concurrent writers to one row interleave per field and
//! the last writer of a given cell wins.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use tracing::debug;

use widecol_common::{validate_family, Cell, RawRow, StoreError, StoreResult};

use crate::connection::{Connector, StoreConnection};

/// Target name reported by in-memory connections.
const MEMORY_TARGET: &str = "memory";

/// Store statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Connections opened so far.
    pub connections_opened: u64,
    /// Connections closed so far.
    pub connections_closed: u64,
    /// Requests served.
    pub requests: u64,
}

impl StoreStats {
    /// Connections currently open.
    pub fn open_connections(&self) -> u64 {
        self.connections_opened.saturating_sub(self.connections_closed)
    }
}

/// One stored table.
#[derive(Debug)]
struct StoredTable {
    families: BTreeSet<String>,
    enabled: bool,
    rows: BTreeMap<Bytes, BTreeMap<Bytes, Bytes>>,
}

impl StoredTable {
    fn new(families: BTreeSet<String>) -> Self {
        Self {
            families,
            enabled: true,
            rows: BTreeMap::new(),
        }
    }
}

/// An in-process wide-column store.
///
/// Thread-safe; share it behind an `Arc`.
pub struct MemoryStore {
    tables: RwLock<BTreeMap<String, StoredTable>>,
    available: AtomicBool,
    connections_opened: AtomicU64,
    connections_closed: AtomicU64,
    requests: AtomicU64,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(BTreeMap::new()),
            available: AtomicBool::new(true),
            connections_opened: AtomicU64::new(0),
            connections_closed: AtomicU64::new(0),
            requests: AtomicU64::new(0),
        }
    }

    /// Takes the store offline or brings it back.
    ///
    /// While offline, new connections and requests on open connections fail
    /// with `Unavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }

    /// Returns true if the store accepts requests.
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    /// Returns store statistics.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
            requests: self.requests.load(Ordering::Relaxed),
        }
    }

    fn check_available(&self) -> StoreResult<()> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if self.is_available() {
            Ok(())
        } else {
            Err(StoreError::unavailable(MEMORY_TARGET, "store is offline"))
        }
    }

    // =========================================================================
    // Table lifecycle
    // =========================================================================

    /// Lists all table names in sorted order.
    pub fn list_tables(&self) -> StoreResult<Vec<String>> {
        self.check_available()?;
        Ok(self.tables.read().keys().cloned().collect())
    }

    /// Creates a table.
    pub fn create_table(&self, table: &str, families: &[String]) -> StoreResult<()> {
        self.check_available()?;

        if table.is_empty() {
            return Err(StoreError::invalid_input("table name must not be empty"));
        }
        if families.is_empty() {
            return Err(StoreError::invalid_input(format!(
                "table '{table}' needs at least one column family"
            )));
        }
        for family in families {
            validate_family(family)?;
        }

        let mut tables = self.tables.write();
        if tables.contains_key(table) {
            return Err(StoreError::TableExists {
                table: table.to_string(),
            });
        }

        tables.insert(
            table.to_string(),
            StoredTable::new(families.iter().cloned().collect()),
        );
        debug!(table, ?families, "created table");
        Ok(())
    }

    /// Disables a table.
    pub fn disable_table(&self, table: &str) -> StoreResult<()> {
        self.check_available()?;
        let mut tables = self.tables.write();
        let stored = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::table_not_found(table))?;

        if !stored.enabled {
            return Err(StoreError::TableDisabled {
                table: table.to_string(),
            });
        }
        stored.enabled = false;
        debug!(table, "disabled table");
        Ok(())
    }

    /// Re-enables a disabled table.
    pub fn enable_table(&self, table: &str) -> StoreResult<()> {
        self.check_available()?;
        let mut tables = self.tables.write();
        let stored = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::table_not_found(table))?;

        if stored.enabled {
            return Err(StoreError::TableEnabled {
                table: table.to_string(),
            });
        }
        stored.enabled = true;
        debug!(table, "enabled table");
        Ok(())
    }

    /// Deletes a disabled table and all its rows.
    pub fn delete_table(&self, table: &str) -> StoreResult<()> {
        self.check_available()?;
        let mut tables = self.tables.write();
        let enabled = tables
            .get(table)
            .map(|t| t.enabled)
            .ok_or_else(|| StoreError::table_not_found(table))?;

        if enabled {
            return Err(StoreError::TableEnabled {
                table: table.to_string(),
            });
        }
        tables.remove(table);
        debug!(table, "deleted table");
        Ok(())
    }

    // =========================================================================
    // Row operations
    // =========================================================================

    /// Merges cells into a row, creating it if absent.
    pub fn put(&self, table: &str, row: Bytes, cells: Vec<Cell>) -> StoreResult<()> {
        self.check_available()?;

        if cells.is_empty() {
            return Err(StoreError::invalid_input("put requires at least one cell"));
        }

        let mut tables = self.tables.write();
        let stored = enabled_table_mut(&mut tables, table)?;

        // Reject the whole put before touching the row.
        for cell in &cells {
            let family = cell.family().ok_or_else(|| StoreError::MalformedQualifier {
                qualifier: String::from_utf8_lossy(&cell.column).into_owned(),
            })?;
            let family = String::from_utf8_lossy(family);
            if !stored.families.contains(&*family) {
                return Err(StoreError::NoSuchFamily {
                    table: table.to_string(),
                    family: family.into_owned(),
                });
            }
        }

        let columns = stored.rows.entry(row).or_default();
        for cell in cells {
            columns.insert(cell.column, cell.value);
        }
        Ok(())
    }

    /// Returns every row in key order.
    pub fn scan(&self, table: &str) -> StoreResult<Vec<RawRow>> {
        self.check_available()?;
        let tables = self.tables.read();
        let stored = tables
            .get(table)
            .ok_or_else(|| StoreError::table_not_found(table))?;
        if !stored.enabled {
            return Err(StoreError::TableDisabled {
                table: table.to_string(),
            });
        }

        Ok(stored
            .rows
            .iter()
            .map(|(key, columns)| {
                RawRow::new(
                    key.clone(),
                    columns
                        .iter()
                        .map(|(c, v)| Cell::new(c.clone(), v.clone()))
                        .collect(),
                )
            })
            .collect())
    }

    /// Removes a row if present.
    pub fn delete_row(&self, table: &str, row: &[u8]) -> StoreResult<()> {
        self.check_available()?;
        let mut tables = self.tables.write();
        let stored = enabled_table_mut(&mut tables, table)?;
        stored.rows.remove(row);
        Ok(())
    }

    /// Number of rows in a table.
    pub fn row_count(&self, table: &str) -> StoreResult<usize> {
        let tables = self.tables.read();
        tables
            .get(table)
            .map(|t| t.rows.len())
            .ok_or_else(|| StoreError::table_not_found(table))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("tables", &self.tables.read().len())
            .field("available", &self.is_available())
            .finish()
    }
}

fn enabled_table_mut<'a>(
    tables: &'a mut BTreeMap<String, StoredTable>,
    table: &str,
) -> StoreResult<&'a mut StoredTable> {
    let stored = tables
        .get_mut(table)
        .ok_or_else(|| StoreError::table_not_found(table))?;
    if !stored.enabled {
        return Err(StoreError::TableDisabled {
            table: table.to_string(),
        });
    }
    Ok(stored)
}

// =============================================================================
// Connector
// =============================================================================

/// Connector handing out sessions on a shared [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    store: Arc<MemoryStore>,
}

impl MemoryConnector {
    /// Creates a connector for the given store.
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }
}

impl Connector for MemoryConnector {
    fn connect(&self) -> StoreResult<Box<dyn StoreConnection>> {
        if !self.store.is_available() {
            return Err(StoreError::unavailable(MEMORY_TARGET, "store is offline"));
        }
        self.store.connections_opened.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(MemoryConnection {
            store: Arc::clone(&self.store),
            closed: false,
        }))
    }

    fn target(&self) -> String {
        MEMORY_TARGET.to_string()
    }
}

/// A session on a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryConnection {
    store: Arc<MemoryStore>,
    closed: bool,
}

impl MemoryConnection {
    fn check_open(&self) -> StoreResult<()> {
        if self.closed {
            Err(StoreError::unavailable(MEMORY_TARGET, "connection closed"))
        } else {
            Ok(())
        }
    }
}

impl StoreConnection for MemoryConnection {
    fn list_tables(&mut self) -> StoreResult<Vec<String>> {
        self.check_open()?;
        self.store.list_tables()
    }

    fn create_table(&mut self, table: &str, families: &[String]) -> StoreResult<()> {
        self.check_open()?;
        self.store.create_table(table, families)
    }

    fn disable_table(&mut self, table: &str) -> StoreResult<()> {
        self.check_open()?;
        self.store.disable_table(table)
    }

    fn enable_table(&mut self, table: &str) -> StoreResult<()> {
        self.check_open()?;
        self.store.enable_table(table)
    }

    fn delete_table(&mut self, table: &str) -> StoreResult<()> {
        self.check_open()?;
        self.store.delete_table(table)
    }

    fn put(&mut self, table: &str, row: Bytes, cells: Vec<Cell>) -> StoreResult<()> {
        self.check_open()?;
        self.store.put(table, row, cells)
    }

    fn scan(&mut self, table: &str) -> StoreResult<Vec<RawRow>> {
        self.check_open()?;
        self.store.scan(table)
    }

    fn delete_row(&mut self, table: &str, row: Bytes) -> StoreResult<()> {
        self.check_open()?;
        self.store.delete_row(table, &row)
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.store.connections_closed.fetch_add(1, Ordering::Relaxed);
        }
    }
}
