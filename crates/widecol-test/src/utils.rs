//! Fixtures for integration tests.

use std::net::SocketAddr;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::debug;

use widecol_common::StoreConfig;
use widecol_data::{FieldMap, TableSpec};
use widecol_server::{ServerConfig, StoreServer};
use widecol_store::{Connector, MemoryConnector, MemoryStore, RemoteConnector};

/// A fresh in-memory store and a connector onto it.
pub fn memory_backend() -> (Arc<MemoryStore>, Arc<dyn Connector>) {
    let store = Arc::new(MemoryStore::new());
    let connector: Arc<dyn Connector> = Arc::new(MemoryConnector::new(Arc::clone(&store)));
    (store, connector)
}

/// Builds a field map from literal pairs.
pub fn fields(pairs: &[(&str, &str)]) -> FieldMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// The `products` table with a single `info` family.
pub fn products_spec() -> TableSpec {
    TableSpec::new("products").family("info")
}

/// A `widecold` server on an ephemeral localhost port.
///
/// The server runs on its own thread with a single-threaded runtime and is
/// stopped when the handle is dropped.
pub struct TestServer {
    addr: SocketAddr,
    store: Arc<MemoryStore>,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl TestServer {
    /// Starts a server and waits until it is accepting connections.
    pub fn start() -> Self {
        let store = Arc::new(MemoryStore::new());
        let config = ServerConfig::builder().host("127.0.0.1").port(0).build();

        let (addr_tx, addr_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let server_store = Arc::clone(&store);
        let thread = std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("Failed to build runtime");

            runtime.block_on(async move {
                let server = StoreServer::bind(server_store, &config)
                    .await
                    .expect("Failed to bind test server");
                let addr = server.local_addr().expect("No local address");
                addr_tx.send(addr).expect("Test harness went away");

                let _ = server
                    .serve_until(async {
                        let _ = shutdown_rx.await;
                    })
                    .await;
            });
        });

        let addr = addr_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("Test server did not start");
        debug!("Test server listening on {}", addr);

        Self {
            addr,
            store,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        }
    }

    /// Address the server listens on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Client configuration pointing at the server.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new()
            .host(self.addr.ip().to_string())
            .port(self.addr.port())
            .connect_timeout(Duration::from_secs(2))
            .io_timeout(Duration::from_secs(5))
    }

    /// A TCP connector onto the server.
    pub fn connector(&self) -> Arc<dyn Connector> {
        Arc::new(RemoteConnector::new(self.store_config()))
    }

    /// The store behind the server, for inspecting state directly.
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
