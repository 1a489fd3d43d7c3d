// SQL Server glue via Tiberius
//
// - config: deadpool manager, pool setup, and the `Connector`/`Connection`
//   implementations
// - query: query streaming and row extraction into `ResultSet`

pub mod config;
pub mod query;

pub use config::{MssqlClient, MssqlConfig, MssqlConnection, MssqlConnector, MssqlManager};
pub use query::build_result_set;
