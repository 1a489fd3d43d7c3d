use std::fmt;
use std::ops::DerefMut;

use async_trait::async_trait;
use deadpool::managed::{Manager, Metrics, Object, Pool, RecycleError, RecycleResult};
use tiberius::{AuthMethod, Client};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::driver::{Connection, Connector};
use crate::error::DalError;
use crate::results::ResultSet;

use super::query::build_result_set;

/// Type alias for a connected SQL Server client.
pub type MssqlClient = Client<Compat<TcpStream>>;

/// SQL Server connection settings.
#[derive(Debug, Clone)]
pub struct MssqlConfig {
    pub server: String,
    pub database: String,
    pub user: String,
    pub password: String,
    /// Defaults to 1433.
    pub port: Option<u16>,
}

/// Manager for SQL Server connections, used with deadpool.
#[derive(Clone)]
pub struct MssqlManager {
    config: tiberius::Config,
    server: String,
    port: u16,
}

impl fmt::Debug for MssqlManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MssqlManager")
            .field("server", &self.server)
            .field("port", &self.port)
            .finish()
    }
}

impl Manager for MssqlManager {
    type Type = MssqlClient;
    type Error = tiberius::error::Error;

    async fn create(&self) -> Result<Self::Type, Self::Error> {
        let config = self.config.clone();

        let addr = format!("{}:{}", self.server, self.port);
        let tcp = TcpStream::connect(addr)
            .await
            .map_err(|e| tiberius::error::Error::Io {
                kind: e.kind(),
                message: format!("TCP connection error: {e}"),
            })?;

        let tcp = tcp.compat_write();
        Client::connect(config, tcp).await
    }

    async fn recycle(
        &self,
        client: &mut Self::Type,
        _metrics: &Metrics,
    ) -> RecycleResult<Self::Error> {
        // Check the connection is still usable before handing it back out.
        let query = tiberius::Query::new("SELECT 1");
        match query.query(client).await {
            Ok(_) => Ok(()),
            Err(e) => Err(RecycleError::Backend(e)),
        }
    }
}

/// Hands out pooled SQL Server connections.
pub struct MssqlConnector {
    pool: Pool<MssqlManager>,
}

impl MssqlConnector {
    /// Build a connector and its pool.
    ///
    /// # Errors
    ///
    /// `DalError::Connection` when pool creation fails.
    pub fn new(cfg: MssqlConfig) -> Result<Self, DalError> {
        let mut config = tiberius::Config::new();
        config.host(&cfg.server);
        config.database(&cfg.database);
        config.authentication(AuthMethod::sql_server(&cfg.user, &cfg.password));

        let port = cfg.port.unwrap_or(1433);
        config.port(port);

        let manager = MssqlManager {
            config,
            server: cfg.server,
            port,
        };

        let pool = Pool::builder(manager)
            .max_size(20)
            .build()
            .map_err(|e| DalError::Connection(format!("Failed to create SQL Server pool: {e}")))?;

        Ok(MssqlConnector { pool })
    }
}

#[async_trait]
impl Connector for MssqlConnector {
    async fn connect(&self) -> Result<Box<dyn Connection>, DalError> {
        let conn = self.pool.get().await?;
        Ok(Box::new(MssqlConnection { conn }))
    }
}

/// One pooled connection; returned to the pool on drop.
pub struct MssqlConnection {
    conn: Object<MssqlManager>,
}

#[async_trait]
impl Connection for MssqlConnection {
    async fn query(&mut self, sql: &str) -> Result<ResultSet, DalError> {
        build_result_set(self.conn.deref_mut(), sql).await
    }
}
