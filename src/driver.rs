use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use tokio::sync::Mutex;

use crate::dialect::Dialect;
use crate::error::DalError;
use crate::results::ResultSet;

/// One parameter-free statement execution against an open connection.
///
/// This is the boundary to the collaborating network driver: the core
/// renders complete SQL text and hands it to a `Connection`; everything on
/// the wire side (sockets, protocol, retries if any) lives behind it.
#[async_trait]
pub trait Connection: Send {
    /// Execute one statement and return its rows/row-count.
    async fn query(&mut self, sql: &str) -> Result<ResultSet, DalError>;
}

/// Hands out connections. Implementations wrap a pool handle; the handle is
/// injected explicitly into each store at construction, with lifetime owned
/// by whoever created it.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn Connection>, DalError>;
}

/// A transaction's dedicated connection, shared by every request issued at
/// nesting depth ≥ 1. The mutex serializes statements; each logical flow is
/// expected to be driven sequentially by its owner.
pub type SharedConnection = Arc<Mutex<Box<dyn Connection>>>;

/// A request handle produced by [`Acquire::acquire`]: either a fresh
/// connection, or a view of a transaction's shared connection.
pub enum Request {
    Fresh(Box<dyn Connection>),
    Shared(SharedConnection),
}

impl Request {
    /// Execute one statement through this handle.
    ///
    /// # Errors
    ///
    /// Driver failures propagate unchanged.
    pub async fn query(&mut self, sql: &str) -> Result<ResultSet, DalError> {
        match self {
            Request::Fresh(conn) => conn.query(sql).await,
            Request::Shared(conn) => conn.lock().await.query(sql).await,
        }
    }
}

/// Connection acquisition plus the execution settings runners need.
///
/// Implemented by [`Store`](crate::store::Store) (plain pooled acquisition)
/// and [`Transaction`](crate::transaction::Transaction) (routes to the
/// shared physical transaction while nested).
#[async_trait]
pub trait Acquire: Send + Sync {
    async fn acquire(&self) -> Result<Request, DalError>;

    fn dialect(&self) -> Dialect;

    /// Compiled batch separator, when one is configured (`GO` style).
    fn batch_separator(&self) -> Option<&Regex>;
}
