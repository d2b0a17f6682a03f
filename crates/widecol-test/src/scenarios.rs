//! Scenarios shared by the in-memory and TCP test suites.
//!
//! Each scenario takes a connector onto an empty store and panics on the
//! first failed expectation.

use std::sync::Arc;

use widecol_data::{Catalog, QueryEngine, RowStore, Schema};
use widecol_store::Connector;

use crate::utils::{fields, products_spec};

/// Products/categories walk-through: create, put, list, filter, delete.
pub fn products_end_to_end(connector: Arc<dyn Connector>) {
    let schema = Schema::new().table(products_spec());
    let catalog = Catalog::new(Arc::clone(&connector));
    assert!(catalog.ensure_exists(&products_spec()).unwrap());

    let products = RowStore::new(Arc::clone(&connector), products_spec());
    products
        .put(
            "product_1",
            &fields(&[("info:name", "Widget"), ("info:category_id", "category_1")]),
        )
        .unwrap();
    products
        .put(
            "product_2",
            &fields(&[("info:name", "Gadget"), ("info:category_id", "category_2")]),
        )
        .unwrap();

    let engine = QueryEngine::new(Arc::clone(&connector), schema);
    assert_eq!(engine.all_of("products").unwrap().len(), 2);

    let matched = engine
        .filtered_by("products", "category_id", "category_1")
        .unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].id, "product_1");
    assert_eq!(matched[0].get("name"), Some("Widget"));
    assert_eq!(matched[0].get("category_id"), Some("category_1"));
    assert_eq!(matched[0].fields.len(), 2);

    products.delete("product_1").unwrap();
    let remaining = engine.all_of("products").unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "product_2");
}

/// Partial update, idempotent delete and scan completeness on one table.
pub fn row_store_properties(connector: Arc<dyn Connector>) {
    Catalog::new(Arc::clone(&connector))
        .ensure_exists(&products_spec())
        .unwrap();
    let products = RowStore::new(Arc::clone(&connector), products_spec());

    products.put("p", &fields(&[("a", "1")])).unwrap();
    products.put("p", &fields(&[("b", "2")])).unwrap();
    let row = products.get("p").unwrap().unwrap();
    assert_eq!(row.get("info", "a"), Some("1"));
    assert_eq!(row.get("info", "b"), Some("2"));

    products.delete("ghost").unwrap();
    products.delete("ghost").unwrap();
    assert!(products.get("ghost").unwrap().is_none());

    products.delete("p").unwrap();
    let ids: Vec<String> = (0..25).map(|i| format!("item_{i:02}")).collect();
    for id in &ids {
        products
            .put(id, &fields(&[("name", id.as_str()), ("n", "x")]))
            .unwrap();
    }

    let scanned = products.get_all().unwrap().collect_rows().unwrap();
    assert_eq!(scanned.len(), ids.len());
    for row in &scanned {
        assert_eq!(row.get("info", "name"), Some(row.key.as_str()));
        assert_eq!(row.get("info", "n"), Some("x"));
    }
}
