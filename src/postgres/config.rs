use async_trait::async_trait;
use deadpool_postgres::{Config as PgConfig, Object, Pool};
use tokio_postgres::NoTls;

use crate::driver::{Connection, Connector};
use crate::error::DalError;
use crate::results::ResultSet;

use super::query::build_result_set;

/// Hands out pooled `PostgreSQL` connections.
///
/// The pool handle is shared by cloning the connector's `Arc`; its lifetime
/// is owned by whoever constructed it.
pub struct PostgresConnector {
    pool: Pool,
}

impl PostgresConnector {
    /// Build a connector from a deadpool config.
    ///
    /// # Errors
    ///
    /// `DalError::Config` when a required field is missing,
    /// `DalError::Connection` when pool creation fails.
    pub fn new(pg_config: PgConfig) -> Result<Self, DalError> {
        if pg_config.dbname.is_none() {
            return Err(DalError::Config("dbname is required".to_string()));
        }
        if pg_config.host.is_none() {
            return Err(DalError::Config("host is required".to_string()));
        }
        if pg_config.port.is_none() {
            return Err(DalError::Config("port is required".to_string()));
        }
        if pg_config.user.is_none() {
            return Err(DalError::Config("user is required".to_string()));
        }

        let pool = pg_config
            .create_pool(Some(deadpool_postgres::Runtime::Tokio1), NoTls)
            .map_err(|e| DalError::Connection(format!("Failed to create Postgres pool: {e}")))?;

        Ok(PostgresConnector { pool })
    }
}

#[async_trait]
impl Connector for PostgresConnector {
    async fn connect(&self) -> Result<Box<dyn Connection>, DalError> {
        let conn = self.pool.get().await?;
        Ok(Box::new(PostgresConnection { conn }))
    }
}

/// One pooled connection; returned to the pool on drop.
pub struct PostgresConnection {
    conn: Object,
}

#[async_trait]
impl Connection for PostgresConnection {
    async fn query(&mut self, sql: &str) -> Result<ResultSet, DalError> {
        // The DAL renders complete literals, so the text protocol is
        // sufficient and also reports DML row counts.
        let messages = self.conn.simple_query(sql).await?;
        build_result_set(messages)
    }
}
