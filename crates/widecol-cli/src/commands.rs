//! Subcommand implementations.
//!
//! Each command runs against an injected connector and returns an
//! [`Outcome`] for `main` to print, so the same code runs against a remote
//! store and against an in-memory one.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use widecol_data::input::{merge_fields, parse_assignments, parse_json_object};
use widecol_data::schema::INFO_FAMILY;
use widecol_data::{
    Catalog, FieldSource, QueryEngine, ResetReport, ResultRow, RowStore, Schema, SeedPlan,
    SeedReport, Seeder, TableSpec,
};
use widecol_store::Connector;

/// What a command produced.
#[derive(Debug)]
pub enum Outcome {
    /// Result rows; may be empty.
    Rows(Vec<ResultRow>),
    /// A name/description listing.
    List {
        /// Header of the name column.
        header: &'static str,
        /// Name and description pairs.
        items: Vec<(String, String)>,
    },
    /// A status line.
    Message(String),
}

/// Command context: a connector plus the schema in force.
#[derive(Debug, Clone)]
pub struct App {
    connector: Arc<dyn Connector>,
    schema: Schema,
}

impl App {
    /// Creates a context.
    pub fn new(connector: Arc<dyn Connector>, schema: Schema) -> Self {
        Self { connector, schema }
    }

    /// `init`: drop every table, recreate the schema, optionally seed.
    pub fn init<S: FieldSource>(&self, seed: Option<(&SeedPlan, S)>) -> Result<Outcome> {
        let report = Catalog::new(Arc::clone(&self.connector))
            .reset(&self.schema)
            .context("failed to reset tables")?;

        let mut message = describe_reset(&report);
        if let Some((plan, source)) = seed {
            let seeded = Seeder::new(Arc::clone(&self.connector), self.schema.clone(), source)
                .seed_all(plan)
                .context("failed to seed demo data")?;
            message.push('\n');
            message.push_str(&describe_seed(&seeded));
        }
        info!("{}", message.replace('\n', "; "));
        Ok(Outcome::Message(message))
    }

    /// `tables`: list the store's tables, marking those the schema declares.
    pub fn tables(&self) -> Result<Outcome> {
        let tables = Catalog::new(Arc::clone(&self.connector))
            .list_tables()
            .context("failed to list tables")?;
        let items = tables
            .into_iter()
            .map(|name| {
                let description = match self.schema.get(&name) {
                    Some(spec) => format!("families: {}", spec.families.join(", ")),
                    None => "not in schema".to_string(),
                };
                (name, description)
            })
            .collect();
        Ok(Outcome::List {
            header: "table",
            items,
        })
    }

    /// `queries`: list the named queries.
    pub fn queries(&self) -> Outcome {
        let engine = self.engine();
        let items = engine
            .registry()
            .iter()
            .map(|q| (q.name.clone(), q.description.clone()))
            .collect();
        Outcome::List {
            header: "query",
            items,
        }
    }

    /// `show`: every row of a table.
    pub fn show(&self, table: &str) -> Result<Outcome> {
        let rows = self
            .engine()
            .all_of(table)
            .with_context(|| format!("failed to read table '{table}'"))?;
        Ok(Outcome::Rows(rows))
    }

    /// `put`: write fields onto a row.
    pub fn put(
        &self,
        table: &str,
        id: &str,
        assignments: &[String],
        json: Option<&str>,
    ) -> Result<Outcome> {
        let mut fields = parse_assignments(assignments)?;
        if let Some(json) = json {
            fields = merge_fields(fields, parse_json_object(json)?)?;
        }

        let count = fields.len();
        self.row_store(table)
            .put(id, &fields)
            .with_context(|| format!("failed to write row '{id}' in '{table}'"))?;
        Ok(Outcome::Message(format!(
            "wrote {count} field(s) to {table}/{id}"
        )))
    }

    /// `delete`: remove a row.
    pub fn delete(&self, table: &str, id: &str) -> Result<Outcome> {
        self.row_store(table)
            .delete(id)
            .with_context(|| format!("failed to delete row '{id}' from '{table}'"))?;
        Ok(Outcome::Message(format!("deleted {table}/{id}")))
    }

    /// `query`: run a named query.
    pub fn query(&self, name: &str, param: Option<&str>) -> Result<Outcome> {
        let rows = self
            .engine()
            .run(name, param)
            .with_context(|| format!("query '{name}' failed"))?;
        Ok(Outcome::Rows(rows))
    }

    /// `filter`: rows whose field equals a value.
    pub fn filter(&self, table: &str, field: &str, value: &str) -> Result<Outcome> {
        let rows = self
            .engine()
            .filtered_by(table, field, value)
            .with_context(|| format!("failed to filter '{table}'"))?;
        Ok(Outcome::Rows(rows))
    }

    fn engine(&self) -> QueryEngine {
        QueryEngine::new(Arc::clone(&self.connector), self.schema.clone())
    }

    fn row_store(&self, table: &str) -> RowStore {
        let spec = self
            .schema
            .get(table)
            .cloned()
            .unwrap_or_else(|| TableSpec::new(table).family(INFO_FAMILY));
        RowStore::new(Arc::clone(&self.connector), spec)
    }
}

fn describe_reset(report: &ResetReport) -> String {
    let mut message = format!(
        "dropped {} table(s), created {}",
        report.dropped.len(),
        report.created.len()
    );
    if !report.skipped.is_empty() {
        message.push_str(&format!(", kept existing: {}", report.skipped.join(", ")));
    }
    if !report.reenabled.is_empty() {
        message.push_str(&format!(", re-enabled: {}", report.reenabled.join(", ")));
    }
    for (table, error) in &report.drop_failures {
        message.push_str(&format!("\nwarning: could not drop '{table}': {error}"));
    }
    message
}

fn describe_seed(report: &SeedReport) -> String {
    format!(
        "seeded {} categories, {} products, {} users, {} orders, {} order details",
        report.categories, report.products, report.users, report.orders, report.order_details
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use widecol_data::RandomSource;
    use widecol_store::{MemoryConnector, MemoryStore};

    fn app() -> (Arc<MemoryStore>, App) {
        let store = Arc::new(MemoryStore::new());
        let app = App::new(
            Arc::new(MemoryConnector::new(Arc::clone(&store))),
            Schema::storefront(),
        );
        (store, app)
    }

    fn rows(outcome: Outcome) -> Vec<ResultRow> {
        match outcome {
            Outcome::Rows(rows) => rows,
            other => panic!("expected rows, got {other:?}"),
        }
    }

    #[test]
    fn test_init_without_seed() {
        let (store, app) = app();
        let outcome = app.init::<RandomSource>(None).unwrap();
        assert!(matches!(outcome, Outcome::Message(m) if m.contains("created 5")));
        assert_eq!(store.list_tables().unwrap().len(), 5);
        assert_eq!(store.row_count("products").unwrap(), 0);
    }

    #[test]
    fn test_init_with_seed() {
        let (store, app) = app();
        let plan = SeedPlan {
            products: 12,
            ..SeedPlan::default()
        };
        app.init(Some((&plan, RandomSource::seeded(9)))).unwrap();
        assert_eq!(store.row_count("products").unwrap(), 12);
        assert_eq!(store.row_count("categories").unwrap(), 5);
    }

    #[test]
    fn test_put_show_filter_delete() {
        let (_store, app) = app();
        app.init::<RandomSource>(None).unwrap();

        app.put(
            "products",
            "product_1",
            &["name=Widget".to_string(), "category_id=category_1".to_string()],
            None,
        )
        .unwrap();
        app.put(
            "products",
            "product_2",
            &[],
            Some(r#"{"name": "Gadget", "category_id": "category_2"}"#),
        )
        .unwrap();

        assert_eq!(rows(app.show("products").unwrap()).len(), 2);

        let matched = rows(app.filter("products", "category_id", "category_2").unwrap());
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, "product_2");

        app.delete("products", "product_2").unwrap();
        app.delete("products", "product_2").unwrap();
        assert_eq!(rows(app.show("products").unwrap()).len(), 1);
    }

    #[test]
    fn test_put_rejects_duplicate_field() {
        let (_store, app) = app();
        app.init::<RandomSource>(None).unwrap();
        let err = app
            .put(
                "products",
                "p",
                &["name=A".to_string()],
                Some(r#"{"name": "B"}"#),
            )
            .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_unknown_query_is_empty_not_error() {
        let (_store, app) = app();
        app.init::<RandomSource>(None).unwrap();
        assert!(rows(app.query("nope", None).unwrap()).is_empty());
    }

    #[test]
    fn test_show_missing_table_is_error() {
        let (_store, app) = app();
        assert!(app.show("ghosts").is_err());
    }

    #[test]
    fn test_listings() {
        let (_store, app) = app();
        app.init::<RandomSource>(None).unwrap();

        match app.tables().unwrap() {
            Outcome::List { items, .. } => assert_eq!(items.len(), 5),
            other => panic!("unexpected outcome: {other:?}"),
        }
        match app.queries() {
            Outcome::List { items, .. } => assert_eq!(items.len(), 6),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
