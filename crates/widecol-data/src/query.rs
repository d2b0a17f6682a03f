//! Query engine.
//!
//! Every query is a full table scan; rows come back in scan order and are
//! filtered by exact string equality. There are no indexes.
//!
//! ```text
//!   run("products_by_category", "category_1")
//!        │
//!        ▼
//!   QueryRegistry ──► QueryDef { table: products, filter: category_id }
//!        │
//!        ▼
//!   filtered_by(products, category_id, "category_1")
//!        │
//!        ▼
//!   RowStore::get_all() ──► decode ──► match ──► ResultRow
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use widecol_common::StoreResult;
use widecol_store::Connector;

use crate::row::ResultRow;
use crate::schema::{Schema, TableSpec, INFO_FAMILY};
use crate::table::RowStore;

/// A named query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDef {
    /// Query name.
    pub name: String,
    /// Table scanned.
    pub table: String,
    /// Field compared against the query parameter. `None` returns every row.
    #[serde(default)]
    pub filter_field: Option<String>,
    /// One-line description.
    #[serde(default)]
    pub description: String,
}

impl QueryDef {
    /// A query returning every row of `table`.
    pub fn all(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            filter_field: None,
            description: String::new(),
        }
    }

    /// A query returning rows of `table` whose `field` equals the parameter.
    pub fn filtered(
        name: impl Into<String>,
        table: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            filter_field: Some(field.into()),
            ..Self::all(name, table)
        }
    }

    /// Sets the description.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Returns true if the query takes a parameter.
    pub fn takes_param(&self) -> bool {
        self.filter_field.is_some()
    }
}

/// Named queries.
#[derive(Debug, Clone, Default)]
pub struct QueryRegistry {
    queries: BTreeMap<String, QueryDef>,
}

impl QueryRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The storefront queries.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(QueryDef::all("all_products", "products").describe("Every product"));
        registry.register(
            QueryDef::all("all_categories", "categories").describe("Every category"),
        );
        registry.register(QueryDef::all("all_users", "users").describe("Every user"));
        registry.register(
            QueryDef::filtered("products_by_category", "products", "category_id")
                .describe("Products in a category (param: category id)"),
        );
        registry.register(
            QueryDef::filtered("orders_by_user", "orders", "user_id")
                .describe("Orders placed by a user (param: user id)"),
        );
        registry.register(
            QueryDef::filtered("details_by_order", "order_details", "order_id")
                .describe("Line items of an order (param: order id)"),
        );
        registry
    }

    /// Adds a query, replacing any query of the same name.
    pub fn register(&mut self, query: QueryDef) {
        self.queries.insert(query.name.clone(), query);
    }

    /// Looks a query up.
    pub fn get(&self, name: &str) -> Option<&QueryDef> {
        self.queries.get(name)
    }

    /// Query names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.queries.keys().map(String::as_str).collect()
    }

    /// Iterates over the queries in name order.
    pub fn iter(&self) -> impl Iterator<Item = &QueryDef> {
        self.queries.values()
    }
}

/// Runs queries against a store.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    connector: Arc<dyn Connector>,
    schema: Schema,
    registry: QueryRegistry,
}

impl QueryEngine {
    /// Creates an engine with the built-in queries.
    pub fn new(connector: Arc<dyn Connector>, schema: Schema) -> Self {
        Self::with_registry(connector, schema, QueryRegistry::builtin())
    }

    /// Creates an engine with a custom registry.
    pub fn with_registry(
        connector: Arc<dyn Connector>,
        schema: Schema,
        registry: QueryRegistry,
    ) -> Self {
        Self {
            connector,
            schema,
            registry,
        }
    }

    /// The query registry.
    pub fn registry(&self) -> &QueryRegistry {
        &self.registry
    }

    /// Every row of `table`, in scan order.
    pub fn all_of(&self, table: &str) -> StoreResult<Vec<ResultRow>> {
        let rows = self
            .store_for(table)
            .get_all()?
            .map(|row| row.map(|r| r.into_result()))
            .collect::<StoreResult<Vec<_>>>()?;
        debug!(table, rows = rows.len(), "all_of");
        Ok(rows)
    }

    /// Rows of `table` whose `field` equals `expected` exactly.
    ///
    /// `field` is a bare qualifier, `family:qualifier`, or `id` for the row
    /// key. Rows without the field never match.
    pub fn filtered_by(
        &self,
        table: &str,
        field: &str,
        expected: &str,
    ) -> StoreResult<Vec<ResultRow>> {
        let mut matched = Vec::new();
        for row in self.store_for(table).get_all()? {
            let row = row?;
            if row.value_of(field) == Some(expected) {
                matched.push(row.into_result());
            }
        }
        debug!(table, field, rows = matched.len(), "filtered_by");
        Ok(matched)
    }

    /// Runs a named query.
    ///
    /// An unknown name, or a filtered query run without a parameter, yields
    /// no rows.
    pub fn run(&self, name: &str, param: Option<&str>) -> StoreResult<Vec<ResultRow>> {
        let Some(query) = self.registry.get(name) else {
            warn!(query = name, "unknown query");
            return Ok(Vec::new());
        };

        match (&query.filter_field, param) {
            (None, _) => self.all_of(&query.table),
            (Some(field), Some(value)) => self.filtered_by(&query.table, field, value),
            (Some(field), None) => {
                warn!(query = name, field = %field, "query needs a parameter");
                Ok(Vec::new())
            }
        }
    }

    fn store_for(&self, table: &str) -> RowStore {
        let spec = self
            .schema
            .get(table)
            .cloned()
            .unwrap_or_else(|| TableSpec::new(table).family(INFO_FAMILY));
        RowStore::new(Arc::clone(&self.connector), spec)
    }
}
