//! The same scenarios over TCP against a `widecold` server.

use std::sync::Arc;

use widecol_common::{ErrorCode, StoreError};
use widecol_data::{Catalog, QueryEngine, RandomSource, RowStore, Schema, SeedPlan, Seeder};
use widecol_store::{Connector, RemoteConnector};
use widecol_test::scenarios;
use widecol_test::utils::{fields, products_spec, TestServer};

#[test]
fn test_ping() {
    let server = TestServer::start();
    RemoteConnector::new(server.store_config()).ping().unwrap();
}

#[test]
fn test_products_end_to_end() {
    let server = TestServer::start();
    scenarios::products_end_to_end(server.connector());

    let store = server.store();
    assert_eq!(store.row_count("products").unwrap(), 1);
}

#[test]
fn test_row_store_properties() {
    let server = TestServer::start();
    scenarios::row_store_properties(server.connector());
}

#[test]
fn test_reset_and_seed() {
    let server = TestServer::start();
    server
        .store()
        .create_table("leftover", &["info".to_string()])
        .unwrap();
    server.store().disable_table("leftover").unwrap();

    let connector = server.connector();
    let schema = Schema::storefront();
    let report = Catalog::new(Arc::clone(&connector)).reset(&schema).unwrap();
    assert_eq!(report.dropped, vec!["leftover".to_string()]);
    assert_eq!(report.created.len(), schema.names().len());

    let plan = SeedPlan {
        categories: 2,
        products: 6,
        users: 3,
        orders: 2,
        max_details_per_order: 1,
    };
    Seeder::new(Arc::clone(&connector), schema.clone(), RandomSource::seeded(7))
        .seed_all(&plan)
        .unwrap();
    assert_eq!(server.store().row_count("products").unwrap(), 6);

    let engine = QueryEngine::new(connector, schema);
    assert_eq!(engine.run("all_users", None).unwrap().len(), 3);
    assert_eq!(
        engine.run("details_by_order", Some("order_1")).unwrap().len(),
        1
    );
}

#[test]
fn test_enable_table_over_the_wire() {
    let server = TestServer::start();
    server
        .store()
        .create_table("products", &["info".to_string()])
        .unwrap();
    server.store().disable_table("products").unwrap();

    let connector = server.connector();
    let mut conn = connector.acquire().unwrap();
    conn.enable_table("products").unwrap();
    let err = conn.enable_table("products").unwrap_err();
    assert_eq!(err.code(), ErrorCode::TableEnabled);
    drop(conn);

    assert!(server.store().scan("products").unwrap().is_empty());
}

#[test]
fn test_errors_travel_over_the_wire() {
    let server = TestServer::start();
    let connector = server.connector();

    let err = RowStore::new(Arc::clone(&connector), products_spec())
        .put("product_1", &fields(&[("name", "Widget")]))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::TableNotFound);

    Catalog::new(Arc::clone(&connector))
        .ensure_exists(&products_spec())
        .unwrap();
    let err = Catalog::new(connector)
        .drop_table("missing")
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::TableNotFound);
}

#[test]
fn test_connections_are_released_after_errors() {
    let server = TestServer::start();
    let connector = server.connector();
    let engine = QueryEngine::new(Arc::clone(&connector), Schema::storefront());

    // More failing calls than the server admits at once.
    for _ in 0..150 {
        assert!(engine.all_of("products").is_err());
    }

    Catalog::new(Arc::clone(&connector))
        .ensure_exists(&products_spec())
        .unwrap();
    assert!(engine.all_of("products").unwrap().is_empty());
}

#[test]
fn test_unavailable_once_server_stops() {
    let server = TestServer::start();
    let config = server.store_config();
    drop(server);

    let connector = RemoteConnector::new(config.clone());
    let err = connector.ping().unwrap_err();
    assert!(matches!(err, StoreError::Unavailable { .. }));

    let err = Catalog::new(Arc::new(connector) as Arc<dyn Connector>)
        .list_tables()
        .unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(config.addr(), RemoteConnector::new(config.clone()).target());
}
