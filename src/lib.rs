//! Criteria-to-SQL data access layer with nested, reference-counted
//! transactions, for PostgreSQL and SQL Server.

pub mod builder;
pub mod criteria;
pub mod dao;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod results;
pub mod runner;
pub mod schema;
pub mod store;
pub mod transaction;
pub mod value;

#[cfg(feature = "mssql")]
pub mod mssql;
#[cfg(feature = "postgres")]
pub mod postgres;

pub mod prelude;

pub use builder::{QueryBuffer, QueryBuilder};
pub use criteria::{Criteria, DeleteTarget, Returning, SelectList};
pub use dao::{Dao, UpsertOutcome};
pub use dialect::Dialect;
pub use driver::{Acquire, Connection, Connector, Request};
pub use error::DalError;
pub use results::{DriverOutput, ResultSet, Row};
pub use runner::Runner;
pub use schema::{TableSchema, get_table_schema};
pub use store::{Store, StoreConfig};
pub use transaction::Transaction;
pub use value::SqlValue;
