//! Blocking TCP client for `widecold`.
//!
//! A [`RemoteConnector`] dials the configured host and port for every
//! [`Connector::connect`] call. Each method on the resulting connection is
//! one request frame and one response frame. Any I/O failure is reported as
//! `Unavailable` and the connection is not reused.

use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};

use bytes::Bytes;
use tracing::{debug, trace};

use widecol_common::{Cell, RawRow, StoreConfig, StoreError, StoreResult};

use crate::connection::{Connector, StoreConnection};
use crate::wire::frame::{self, HEADER_SIZE};
use crate::wire::{Request, Response};

/// Connector dialling a remote store over TCP.
#[derive(Debug, Clone)]
pub struct RemoteConnector {
    config: StoreConfig,
}

impl RemoteConnector {
    /// Creates a connector for the configured address.
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Opens a connection and sends a `Ping`.
    pub fn ping(&self) -> StoreResult<()> {
        let mut conn = self.dial()?;
        let result = match conn.call(Request::Ping)? {
            Response::Pong => Ok(()),
            Response::Error(e) => Err(e),
            other => Err(StoreError::protocol(format!(
                "expected pong, got {other:?}"
            ))),
        };
        conn.close();
        result
    }

    fn resolve(&self) -> StoreResult<Vec<SocketAddr>> {
        let addr = self.config.addr();
        let addrs: Vec<SocketAddr> = addr
            .to_socket_addrs()
            .map_err(|e| StoreError::unavailable(&addr, e))?
            .collect();
        if addrs.is_empty() {
            return Err(StoreError::unavailable(addr, "no addresses resolved"));
        }
        Ok(addrs)
    }

    fn dial(&self) -> StoreResult<RemoteConnection> {
        let addr = self.config.addr();
        let timeout = self.config.connect_timeout_duration();
        let mut last_err = None;

        for socket_addr in self.resolve()? {
            match TcpStream::connect_timeout(&socket_addr, timeout) {
                Ok(stream) => {
                    let io_timeout = self.config.io_timeout_duration();
                    stream
                        .set_read_timeout(io_timeout)
                        .and_then(|_| stream.set_write_timeout(io_timeout))
                        .and_then(|_| stream.set_nodelay(true))
                        .map_err(|e| StoreError::unavailable(&addr, e))?;
                    debug!(%socket_addr, "connected to store");
                    return Ok(RemoteConnection {
                        stream: Some(stream),
                        addr,
                    });
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(StoreError::unavailable(
            addr,
            last_err.map_or_else(|| "connect failed".to_string(), |e| e.to_string()),
        ))
    }
}

impl Connector for RemoteConnector {
    fn connect(&self) -> StoreResult<Box<dyn StoreConnection>> {
        Ok(Box::new(self.dial()?))
    }

    fn target(&self) -> String {
        self.config.addr()
    }
}

/// A TCP session with a remote store.
#[derive(Debug)]
pub struct RemoteConnection {
    stream: Option<TcpStream>,
    addr: String,
}

impl RemoteConnection {
    /// Sends one request and waits for its response.
    fn call(&mut self, request: Request) -> StoreResult<Response> {
        let op = request.op();
        let encoded = frame::encode(&request)?;

        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| StoreError::unavailable(&self.addr, "connection closed"))?;

        let result = exchange(stream, &encoded);
        if result.is_err() {
            // A half-finished exchange leaves the stream unusable.
            self.close();
        }
        let response = result.map_err(|e| match e {
            ExchangeError::Io(e) => StoreError::unavailable(&self.addr, e),
            ExchangeError::Store(e) => e,
        })?;

        trace!(op, addr = %self.addr, "request complete");
        Ok(response)
    }
}

enum ExchangeError {
    Io(std::io::Error),
    Store(StoreError),
}

impl From<std::io::Error> for ExchangeError {
    fn from(e: std::io::Error) -> Self {
        ExchangeError::Io(e)
    }
}

fn exchange(stream: &mut TcpStream, encoded: &[u8]) -> Result<Response, ExchangeError> {
    stream.write_all(encoded)?;
    stream.flush()?;

    let mut header = [0u8; HEADER_SIZE];
    stream.read_exact(&mut header)?;
    let len = frame::payload_len(header).map_err(ExchangeError::Store)?;

    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload)?;
    frame::decode_payload(&payload).map_err(ExchangeError::Store)
}

impl StoreConnection for RemoteConnection {
    fn list_tables(&mut self) -> StoreResult<Vec<String>> {
        self.call(Request::ListTables)?.into_tables()
    }

    fn create_table(&mut self, table: &str, families: &[String]) -> StoreResult<()> {
        self.call(Request::CreateTable {
            table: table.to_string(),
            families: families.to_vec(),
        })?
        .into_unit()
    }

    fn disable_table(&mut self, table: &str) -> StoreResult<()> {
        self.call(Request::DisableTable {
            table: table.to_string(),
        })?
        .into_unit()
    }

    fn enable_table(&mut self, table: &str) -> StoreResult<()> {
        self.call(Request::EnableTable {
            table: table.to_string(),
        })?
        .into_unit()
    }

    fn delete_table(&mut self, table: &str) -> StoreResult<()> {
        self.call(Request::DeleteTable {
            table: table.to_string(),
        })?
        .into_unit()
    }

    fn put(&mut self, table: &str, row: Bytes, cells: Vec<Cell>) -> StoreResult<()> {
        self.call(Request::Put {
            table: table.to_string(),
            row,
            cells,
        })?
        .into_unit()
    }

    fn scan(&mut self, table: &str) -> StoreResult<Vec<RawRow>> {
        self.call(Request::Scan {
            table: table.to_string(),
        })?
        .into_rows()
    }

    fn delete_row(&mut self, table: &str, row: Bytes) -> StoreResult<()> {
        self.call(Request::Delete {
            table: table.to_string(),
            row,
        })?
        .into_unit()
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
            trace!(addr = %self.addr, "closed store connection");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::time::Duration;

    #[test]
    fn test_unreachable_store_is_unavailable() {
        // Bind then drop to get a port nothing listens on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let connector = RemoteConnector::new(
            StoreConfig::new()
                .host("127.0.0.1")
                .port(port)
                .connect_timeout(Duration::from_millis(200)),
        );

        let err = connector.acquire().unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { .. }));
        assert!(err.to_string().contains(&port.to_string()));
    }

    #[test]
    fn test_single_exchange_against_stub_server() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut header = [0u8; HEADER_SIZE];
            stream.read_exact(&mut header).unwrap();
            let mut payload = vec![0u8; frame::payload_len(header).unwrap()];
            stream.read_exact(&mut payload).unwrap();
            let request: Request = frame::decode_payload(&payload).unwrap();
            assert_eq!(request, Request::ListTables);

            let reply = frame::encode(&Response::Tables(vec!["users".to_string()])).unwrap();
            stream.write_all(&reply).unwrap();
        });

        let connector = RemoteConnector::new(StoreConfig::new().host("127.0.0.1").port(port));
        let mut conn = connector.acquire().unwrap();
        assert_eq!(conn.list_tables().unwrap(), vec!["users".to_string()]);
        drop(conn);

        server.join().unwrap();
    }
}
