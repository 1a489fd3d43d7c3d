//! Convenience re-exports for typical usage.

pub use crate::builder::QueryBuilder;
pub use crate::criteria::{Criteria, DeleteTarget, Returning, SelectList};
pub use crate::dao::{Dao, UpsertOutcome};
pub use crate::dialect::Dialect;
pub use crate::driver::{Acquire, Connection, Connector};
pub use crate::error::DalError;
pub use crate::results::{DriverOutput, ResultSet, Row};
pub use crate::runner::Runner;
pub use crate::schema::TableSchema;
pub use crate::store::{Store, StoreConfig};
pub use crate::transaction::Transaction;
pub use crate::value::SqlValue;

#[cfg(feature = "mssql")]
pub use crate::mssql::MssqlConnector;
#[cfg(feature = "postgres")]
pub use crate::postgres::PostgresConnector;
