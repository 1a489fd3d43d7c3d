// PostgreSQL glue - connection acquisition and result extraction
//
// - config: pool setup and the `Connector`/`Connection` implementations
// - query: simple-query result extraction into `ResultSet`

pub mod config;
pub mod query;

pub use config::{PostgresConnection, PostgresConnector};
pub use query::build_result_set;
