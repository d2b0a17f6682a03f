//! Demo data generator.
//!
//! Populates the storefront tables with synthetic rows. Ids are sequential
//! (`category_1`, `product_1`, ...), and cross-table references
//! (`category_id`, `user_id`, `order_id`, `product_id`) always point at ids
//! generated in the same run.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

use widecol_common::{StoreError, StoreResult};
use widecol_store::Connector;

use crate::row::FieldMap;
use crate::schema::{Schema, TableSpec, INFO_FAMILY};
use crate::table::RowStore;

/// Producer of synthetic field values.
pub trait FieldSource {
    /// A single lowercase word.
    fn word(&mut self) -> String;

    /// A short sentence.
    fn sentence(&mut self) -> String;

    /// A person's full name.
    fn person_name(&mut self) -> String;

    /// An email address.
    fn email(&mut self) -> String;

    /// A postal address.
    fn address(&mut self) -> String;

    /// A number in `low..=high`.
    fn number(&mut self, low: u32, high: u32) -> u32;
}

const WORDS: &[&str] = &[
    "amber", "anchor", "arrow", "basket", "beacon", "breeze", "canvas", "cedar", "cobalt",
    "copper", "crystal", "delta", "ember", "falcon", "fern", "glacier", "harbor", "indigo",
    "jasper", "lantern", "maple", "meadow", "nimbus", "orbit", "pepper", "quartz", "raven",
    "saffron", "summit", "thistle", "timber", "velvet", "willow", "zephyr",
];

const FIRST_NAMES: &[&str] = &[
    "Alex", "Blair", "Casey", "Dana", "Eden", "Finley", "Gray", "Harper", "Jordan", "Kai",
    "Logan", "Morgan", "Noel", "Parker", "Quinn", "Riley", "Sage", "Taylor",
];

const LAST_NAMES: &[&str] = &[
    "Adams", "Brooks", "Carter", "Diaz", "Ellis", "Fischer", "Garcia", "Hughes", "Ito",
    "Kowalski", "Lindqvist", "Moreau", "Nakamura", "Okafor", "Petrov", "Rossi", "Silva",
];

const STREETS: &[&str] = &[
    "Oak Street", "Harbor Road", "Mill Lane", "Station Avenue", "Church Walk", "Park Row",
];

const CITIES: &[&str] = &[
    "Northfield", "Lakeside", "Brookhaven", "Westbury", "Eastwick", "Riverton",
];

const DOMAINS: &[&str] = &["example.com", "example.org", "example.net"];

const STATUSES: &[&str] = &["pending", "paid", "shipped", "delivered", "cancelled"];

/// [`FieldSource`] backed by a seedable random generator.
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: StdRng,
}

impl RandomSource {
    /// A source seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// A reproducible source.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn pick(&mut self, items: &[&'static str]) -> &'static str {
        items.choose(&mut self.rng).copied().unwrap_or_default()
    }
}

impl FieldSource for RandomSource {
    fn word(&mut self) -> String {
        self.pick(WORDS).to_string()
    }

    fn sentence(&mut self) -> String {
        let len = self.rng.gen_range(5..=10);
        let words: Vec<&str> = (0..len).map(|_| self.pick(WORDS)).collect();
        let mut sentence = words.join(" ");
        if let Some(first) = sentence.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        sentence.push('.');
        sentence
    }

    fn person_name(&mut self) -> String {
        format!("{} {}", self.pick(FIRST_NAMES), self.pick(LAST_NAMES))
    }

    fn email(&mut self) -> String {
        let user = format!(
            "{}.{}{}",
            self.pick(FIRST_NAMES).to_lowercase(),
            self.pick(LAST_NAMES).to_lowercase(),
            self.rng.gen_range(1..100)
        );
        format!("{user}@{}", self.pick(DOMAINS))
    }

    fn address(&mut self) -> String {
        format!(
            "{} {}, {} {:05}",
            self.rng.gen_range(1..1000),
            self.pick(STREETS),
            self.pick(CITIES),
            self.rng.gen_range(10000..100000)
        )
    }

    fn number(&mut self, low: u32, high: u32) -> u32 {
        if low >= high {
            return low;
        }
        self.rng.gen_range(low..=high)
    }
}

/// How many rows of each kind to generate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPlan {
    /// Number of categories.
    #[serde(default = "default_categories")]
    pub categories: u32,
    /// Number of products.
    #[serde(default = "default_products")]
    pub products: u32,
    /// Number of users.
    #[serde(default = "default_users")]
    pub users: u32,
    /// Number of orders.
    #[serde(default = "default_orders")]
    pub orders: u32,
    /// Maximum line items per order.
    #[serde(default = "default_details_per_order")]
    pub max_details_per_order: u32,
}

fn default_categories() -> u32 {
    5
}

fn default_products() -> u32 {
    100
}

fn default_users() -> u32 {
    100
}

fn default_orders() -> u32 {
    50
}

fn default_details_per_order() -> u32 {
    3
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            products: default_products(),
            users: default_users(),
            orders: default_orders(),
            max_details_per_order: default_details_per_order(),
        }
    }
}

impl SeedPlan {
    /// Checks that every reference can be satisfied.
    pub fn validate(&self) -> StoreResult<()> {
        if self.products > 0 && self.categories == 0 {
            return Err(StoreError::invalid_input(
                "products need at least one category",
            ));
        }
        if self.orders > 0 && self.users == 0 {
            return Err(StoreError::invalid_input("orders need at least one user"));
        }
        if self.orders > 0 && self.max_details_per_order > 0 && self.products == 0 {
            return Err(StoreError::invalid_input(
                "order details need at least one product",
            ));
        }
        Ok(())
    }
}

/// Rows written by a seeding run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    /// Categories written.
    pub categories: usize,
    /// Products written.
    pub products: usize,
    /// Users written.
    pub users: usize,
    /// Orders written.
    pub orders: usize,
    /// Order line items written.
    pub order_details: usize,
}

impl SeedReport {
    /// Total rows written.
    pub fn total(&self) -> usize {
        self.categories + self.products + self.users + self.orders + self.order_details
    }
}

/// Writes generated rows into the storefront tables.
///
/// The tables must already exist; see [`Catalog::reset`](crate::Catalog::reset).
#[derive(Debug)]
pub struct Seeder<S> {
    connector: Arc<dyn Connector>,
    schema: Schema,
    source: S,
}

impl<S: FieldSource> Seeder<S> {
    /// Creates a seeder writing through `connector`.
    pub fn new(connector: Arc<dyn Connector>, schema: Schema, source: S) -> Self {
        Self {
            connector,
            schema,
            source,
        }
    }

    /// Generates and writes every table in the plan.
    pub fn seed_all(&mut self, plan: &SeedPlan) -> StoreResult<SeedReport> {
        plan.validate()?;

        let categories = self.categories(plan);
        let products = self.products(plan);
        let users = self.users(plan);
        let (orders, details) = self.orders(plan);

        let report = SeedReport {
            categories: self.write("categories", categories)?,
            products: self.write("products", products)?,
            users: self.write("users", users)?,
            orders: self.write("orders", orders)?,
            order_details: self.write("order_details", details)?,
        };

        info!(rows = report.total(), "seeded demo data");
        Ok(report)
    }

    fn write(&self, table: &str, rows: Vec<(String, FieldMap)>) -> StoreResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let spec = self
            .schema
            .get(table)
            .cloned()
            .unwrap_or_else(|| TableSpec::new(table).family(INFO_FAMILY));
        let written = RowStore::new(Arc::clone(&self.connector), spec).put_batch(&rows)?;
        info!(table, rows = written, "seeded table");
        Ok(written)
    }

    fn categories(&mut self, plan: &SeedPlan) -> Vec<(String, FieldMap)> {
        (1..=plan.categories)
            .map(|i| {
                let mut fields = FieldMap::new();
                fields.insert("name".into(), self.source.word());
                (format!("category_{i}"), fields)
            })
            .collect()
    }

    fn products(&mut self, plan: &SeedPlan) -> Vec<(String, FieldMap)> {
        (1..=plan.products)
            .map(|i| {
                let mut fields = FieldMap::new();
                fields.insert("name".into(), self.source.word());
                fields.insert("description".into(), self.source.sentence());
                fields.insert("price".into(), self.source.number(1, 99).to_string());
                fields.insert(
                    "category_id".into(),
                    format!("category_{}", self.source.number(1, plan.categories)),
                );
                (format!("product_{i}"), fields)
            })
            .collect()
    }

    fn users(&mut self, plan: &SeedPlan) -> Vec<(String, FieldMap)> {
        (1..=plan.users)
            .map(|i| {
                let mut fields = FieldMap::new();
                fields.insert("name".into(), self.source.person_name());
                fields.insert("email".into(), self.source.email());
                fields.insert("address".into(), self.source.address());
                (format!("user_{i}"), fields)
            })
            .collect()
    }

    /// Orders and their line items. An order's `total` is the sum of its
    /// line items' `quantity * price`.
    fn orders(&mut self, plan: &SeedPlan) -> (Vec<(String, FieldMap)>, Vec<(String, FieldMap)>) {
        let mut orders = Vec::with_capacity(plan.orders as usize);
        let mut details = Vec::new();

        for i in 1..=plan.orders {
            let order_id = format!("order_{i}");
            let lines = if plan.max_details_per_order == 0 {
                0
            } else {
                self.source.number(1, plan.max_details_per_order)
            };

            let mut total = 0u64;
            for _ in 0..lines {
                let quantity = self.source.number(1, 5);
                let price = self.source.number(1, 99);
                total += u64::from(quantity) * u64::from(price);

                let mut fields = FieldMap::new();
                fields.insert("order_id".into(), order_id.clone());
                fields.insert(
                    "product_id".into(),
                    format!("product_{}", self.source.number(1, plan.products)),
                );
                fields.insert("quantity".into(), quantity.to_string());
                fields.insert("price".into(), price.to_string());
                details.push((format!("order_detail_{}", details.len() + 1), fields));
            }

            let mut fields = FieldMap::new();
            fields.insert(
                "user_id".into(),
                format!("user_{}", self.source.number(1, plan.users)),
            );
            fields.insert(
                "status".into(),
                STATUSES[self.source.number(0, STATUSES.len() as u32 - 1) as usize].to_string(),
            );
            fields.insert("total".into(), total.to_string());
            orders.push((order_id, fields));
        }

        (orders, details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::query::QueryEngine;
    use widecol_store::{MemoryConnector, MemoryStore};

    fn setup() -> (Arc<MemoryStore>, Arc<dyn Connector>) {
        let store = Arc::new(MemoryStore::new());
        let connector: Arc<dyn Connector> = Arc::new(MemoryConnector::new(Arc::clone(&store)));
        Catalog::new(Arc::clone(&connector))
            .reset(&Schema::storefront())
            .unwrap();
        (store, connector)
    }

    #[test]
    fn test_random_source_is_reproducible() {
        let mut a = RandomSource::seeded(7);
        let mut b = RandomSource::seeded(7);
        for _ in 0..10 {
            assert_eq!(a.sentence(), b.sentence());
            assert_eq!(a.email(), b.email());
        }
    }

    #[test]
    fn test_random_source_shapes() {
        let mut source = RandomSource::seeded(1);
        for _ in 0..50 {
            let n = source.number(3, 6);
            assert!((3..=6).contains(&n));
            assert!(source.email().contains('@'));
            assert!(source.sentence().ends_with('.'));
            assert!(source.person_name().contains(' '));
        }
        assert_eq!(source.number(4, 4), 4);
    }

    #[test]
    fn test_seed_all_default_plan() {
        let (store, connector) = setup();
        let mut seeder = Seeder::new(connector, Schema::storefront(), RandomSource::seeded(42));
        let report = seeder.seed_all(&SeedPlan::default()).unwrap();

        assert_eq!(report.categories, 5);
        assert_eq!(report.products, 100);
        assert_eq!(report.users, 100);
        assert_eq!(report.orders, 50);
        assert!(report.order_details >= 50 && report.order_details <= 150);

        assert_eq!(store.row_count("categories").unwrap(), 5);
        assert_eq!(store.row_count("products").unwrap(), 100);
        assert_eq!(store.row_count("order_details").unwrap(), report.order_details);
    }

    #[test]
    fn test_seeded_references_resolve() {
        let (_store, connector) = setup();
        let plan = SeedPlan {
            categories: 3,
            products: 20,
            users: 5,
            orders: 10,
            max_details_per_order: 2,
        };
        Seeder::new(Arc::clone(&connector), Schema::storefront(), RandomSource::seeded(3))
            .seed_all(&plan)
            .unwrap();

        let engine = QueryEngine::new(connector, Schema::storefront());
        let categories: Vec<String> = engine
            .all_of("categories")
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();

        let mut by_category = 0;
        for category in &categories {
            by_category += engine
                .filtered_by("products", "category_id", category)
                .unwrap()
                .len();
        }
        assert_eq!(by_category, 20);

        for order in engine.all_of("orders").unwrap() {
            let user = order.get("user_id").unwrap();
            assert!(user.starts_with("user_"));
            assert!(!engine.run("details_by_order", Some(order.id.as_str())).unwrap().is_empty());
        }
    }

    #[test]
    fn test_invalid_plan() {
        let plan = SeedPlan {
            categories: 0,
            ..SeedPlan::default()
        };
        assert!(plan.validate().is_err());
    }
}
