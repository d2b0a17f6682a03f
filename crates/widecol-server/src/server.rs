//! TCP front end for a [`MemoryStore`].
//!
//! Each accepted connection gets its own task. A connection carries any
//! number of request/response exchanges; requests are answered in order.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::BytesMut;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, trace, warn};

use widecol_common::StoreError;
use widecol_store::wire::frame;
use widecol_store::wire::{Request, Response};
use widecol_store::MemoryStore;

use crate::config::ServerConfig;

/// Errors raised by the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested.
        addr: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Socket I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A client sent something the server could not accept.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Connection counters.
#[derive(Debug, Default)]
pub struct ServerStats {
    accepted: AtomicU64,
    active: AtomicU64,
    requests: AtomicU64,
}

impl ServerStats {
    /// Connections accepted since start.
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    /// Connections currently open.
    pub fn active(&self) -> u64 {
        self.active.load(Ordering::Relaxed)
    }

    /// Requests handled since start.
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }
}

/// A bound, not yet serving, store server.
#[derive(Debug)]
pub struct StoreServer {
    store: Arc<MemoryStore>,
    listener: TcpListener,
    limit: Arc<Semaphore>,
    stats: Arc<ServerStats>,
}

impl StoreServer {
    /// Binds the listen address from `config`.
    pub async fn bind(store: Arc<MemoryStore>, config: &ServerConfig) -> ServerResult<Self> {
        let addr = config.socket_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;

        Ok(Self {
            store,
            listener,
            limit: Arc::new(Semaphore::new(config.max_connections.max(1))),
            stats: Arc::new(ServerStats::default()),
        })
    }

    /// Address actually bound; useful with port 0.
    pub fn local_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Connection counters, shared with the running server.
    pub fn stats(&self) -> Arc<ServerStats> {
        Arc::clone(&self.stats)
    }

    /// Serves until the process exits.
    pub async fn serve(self) -> ServerResult<()> {
        self.serve_until(std::future::pending()).await
    }

    /// Serves until `shutdown` completes. Open connections are left to
    /// finish on their own tasks.
    pub async fn serve_until<F>(self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()>,
    {
        info!("Store server listening on {}", self.local_addr()?);
        tokio::pin!(shutdown);

        loop {
            let permit = tokio::select! {
                permit = Arc::clone(&self.limit).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => return Ok(()),
                },
                _ = &mut shutdown => {
                    info!("Store server shutting down");
                    return Ok(());
                }
            };

            let (stream, peer) = tokio::select! {
                result = self.listener.accept() => match result {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        error!("Accept error: {}", e);
                        continue;
                    }
                },
                _ = &mut shutdown => {
                    info!("Store server shutting down");
                    return Ok(());
                }
            };

            debug!("Accepted connection from {}", peer);
            self.stats.accepted.fetch_add(1, Ordering::Relaxed);
            self.stats.active.fetch_add(1, Ordering::Relaxed);

            let store = Arc::clone(&self.store);
            let stats = Arc::clone(&self.stats);
            tokio::spawn(async move {
                if let Err(e) = handle_connection(&store, &stats, stream).await {
                    warn!("Connection {} error: {}", peer, e);
                }
                stats.active.fetch_sub(1, Ordering::Relaxed);
                drop(permit);
                trace!("Connection {} closed", peer);
            });
        }
    }
}

/// Reads frames off one connection and answers each in turn.
async fn handle_connection(
    store: &MemoryStore,
    stats: &ServerStats,
    mut stream: TcpStream,
) -> ServerResult<()> {
    stream.set_nodelay(true)?;
    let mut buf = BytesMut::with_capacity(4096);

    loop {
        let n = stream.read_buf(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }

        loop {
            let size = match frame::frame_size(&buf) {
                Ok(Some(size)) => size,
                Ok(None) => break,
                Err(e) => {
                    // The stream cannot be resynchronised after a bad header.
                    write_response(&mut stream, &Response::Error(e.clone())).await?;
                    return Err(e.into());
                }
            };

            let frame_data = buf.split_to(size).freeze();
            let response = match frame::decode::<Request>(frame_data) {
                Ok(request) => {
                    stats.requests.fetch_add(1, Ordering::Relaxed);
                    dispatch(store, request)
                }
                Err(e) => {
                    warn!("Undecodable request: {}", e);
                    Response::Error(e)
                }
            };
            write_response(&mut stream, &response).await?;
        }
    }
}

async fn write_response(stream: &mut TcpStream, response: &Response) -> ServerResult<()> {
    let encoded = match frame::encode(response) {
        Ok(encoded) => encoded,
        Err(e) => frame::encode(&Response::Error(e))?,
    };
    stream.write_all(&encoded).await?;
    Ok(())
}

/// Applies one request to the store.
pub fn dispatch(store: &MemoryStore, request: Request) -> Response {
    trace!(op = request.op(), "dispatch");
    match request {
        Request::Ping => Response::Pong,
        Request::ListTables => match store.list_tables() {
            Ok(tables) => Response::Tables(tables),
            Err(e) => Response::Error(e),
        },
        Request::CreateTable { table, families } => {
            Response::from_unit(store.create_table(&table, &families))
        }
        Request::DisableTable { table } => Response::from_unit(store.disable_table(&table)),
        Request::EnableTable { table } => Response::from_unit(store.enable_table(&table)),
        Request::DeleteTable { table } => Response::from_unit(store.delete_table(&table)),
        Request::Put { table, row, cells } => Response::from_unit(store.put(&table, row, cells)),
        Request::Scan { table } => match store.scan(&table) {
            Ok(rows) => Response::Rows(rows),
            Err(e) => Response::Error(e),
        },
        Request::Delete { table, row } => Response::from_unit(store.delete_row(&table, &row)),
    }
}
