//! Table catalog: provisioning and teardown.
//!
//! `reset` is destructive: every table in the store is dropped, whether or
//! not the schema mentions it, and the schema's tables are then created.
//! `ensure_exists` / `ensure_schema` only create what is missing and never
//! drop anything.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use widecol_common::{ErrorCode, StoreError, StoreResult};
use widecol_store::{Connector, StoreConnection};

use crate::schema::{Schema, TableSpec};

/// Outcome of [`Catalog::reset`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResetReport {
    /// Tables dropped by the sweep.
    pub dropped: Vec<String>,
    /// Tables the sweep could not drop, with the reason.
    pub drop_failures: Vec<(String, StoreError)>,
    /// Tables created from the schema.
    pub created: Vec<String>,
    /// Schema tables that survived the sweep disabled and were re-enabled.
    pub reenabled: Vec<String>,
    /// Schema tables that were already present and left alone.
    pub skipped: Vec<String>,
}

/// Creates, drops and resets tables.
#[derive(Debug, Clone)]
pub struct Catalog {
    connector: Arc<dyn Connector>,
}

impl Catalog {
    /// Creates a catalog over the given connector.
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }

    /// Lists all tables in the store.
    pub fn list_tables(&self) -> StoreResult<Vec<String>> {
        self.connector.acquire()?.list_tables()
    }

    /// Drops every table in the store, then creates the schema's tables.
    ///
    /// A table that cannot be dropped (already disabled elsewhere, vanished
    /// mid-sweep) is logged and recorded in the report; the sweep goes on.
    /// Only an unreachable store aborts the sweep. After the sweep a schema
    /// table is created only if no table of that name exists, so a table
    /// that survived the sweep keeps its data. A surviving schema table left
    /// disabled is re-enabled; if that fails the reset fails.
    pub fn reset(&self, schema: &Schema) -> StoreResult<ResetReport> {
        schema.validate()?;

        let mut conn = self.connector.acquire()?;
        let mut report = ResetReport::default();

        for table in conn.list_tables()? {
            match drop_table(&mut *conn, &table) {
                Ok(()) => {
                    info!(table = %table, "dropped table");
                    report.dropped.push(table);
                }
                Err(e) if e.code() == ErrorCode::Unavailable => return Err(e),
                Err(e) => {
                    warn!(table = %table, error = %e, "failed to drop table, continuing");
                    report.drop_failures.push((table, e));
                }
            }
        }

        let live: BTreeSet<String> = conn.list_tables()?.into_iter().collect();
        for spec in schema.iter() {
            if live.contains(&spec.name) {
                if enable_table(&mut *conn, &spec.name)? {
                    report.reenabled.push(spec.name.clone());
                } else {
                    info!(table = %spec.name, "table already exists, skipping create");
                    report.skipped.push(spec.name.clone());
                }
                continue;
            }
            if create_table(&mut *conn, spec)? {
                report.created.push(spec.name.clone());
            } else {
                report.skipped.push(spec.name.clone());
            }
        }

        Ok(report)
    }

    /// Creates the table if it does not exist. Returns true if it was created.
    pub fn ensure_exists(&self, spec: &TableSpec) -> StoreResult<bool> {
        spec.validate()?;
        let mut conn = self.connector.acquire()?;
        if conn.table_exists(&spec.name)? {
            debug!(table = %spec.name, "table exists");
            return Ok(false);
        }
        create_table(&mut *conn, spec)
    }

    /// Creates every missing schema table. Returns the names created.
    pub fn ensure_schema(&self, schema: &Schema) -> StoreResult<Vec<String>> {
        schema.validate()?;
        let mut conn = self.connector.acquire()?;
        let live: BTreeSet<String> = conn.list_tables()?.into_iter().collect();

        let mut created = Vec::new();
        for spec in schema.iter().filter(|s| !live.contains(&s.name)) {
            if create_table(&mut *conn, spec)? {
                created.push(spec.name.clone());
            }
        }
        Ok(created)
    }

    /// Disables and deletes one table.
    pub fn drop_table(&self, table: &str) -> StoreResult<()> {
        let mut conn = self.connector.acquire()?;
        drop_table(&mut *conn, table)?;
        info!(table, "dropped table");
        Ok(())
    }
}

/// Disables then deletes. A table that is already disabled is still deleted.
fn drop_table(conn: &mut dyn StoreConnection, table: &str) -> StoreResult<()> {
    match conn.disable_table(table) {
        Ok(()) => {}
        Err(StoreError::TableDisabled { .. }) => {
            debug!(table, "table already disabled");
        }
        Err(e) => return Err(e),
    }
    conn.delete_table(table)
}

/// Enables a table, treating "already enabled" as "not enabled here".
fn enable_table(conn: &mut dyn StoreConnection, table: &str) -> StoreResult<bool> {
    match conn.enable_table(table) {
        Ok(()) => {
            warn!(table, "table survived reset disabled, re-enabled it");
            Ok(true)
        }
        Err(StoreError::TableEnabled { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Creates a table, treating a concurrent create as "not created".
fn create_table(conn: &mut dyn StoreConnection, spec: &TableSpec) -> StoreResult<bool> {
    match conn.create_table(&spec.name, &spec.families) {
        Ok(()) => {
            info!(table = %spec.name, families = ?spec.families, "created table");
            Ok(true)
        }
        Err(StoreError::TableExists { .. }) => {
            info!(table = %spec.name, "table created concurrently, skipping");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
