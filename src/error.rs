use thiserror::Error;

/// Unified error type for the data access layer.
///
/// Everything except the driver variants is a construction-time failure:
/// it is raised before any statement reaches the network. Driver and
/// execution errors surface through the runner accessors.
#[derive(Debug, Error)]
pub enum DalError {
    #[error("could not get table schema, check spelling: {table}")]
    SchemaNotFound { table: String },

    #[error("STRICT: invalid column {0}")]
    StrictValidation(String),

    #[error("invalid fields or empty WHERE clause")]
    EmptyPredicate,

    #[error("STRICT: WHERE clause missing for {0} operation")]
    MissingWhere(&'static str),

    #[error("Parameter error: {0}")]
    Parameter(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("SQL execution error: {0}")]
    Execution(String),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    Postgres(#[from] tokio_postgres::Error),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PoolPostgres(#[from] deadpool_postgres::PoolError),

    #[cfg(feature = "mssql")]
    #[error(transparent)]
    Mssql(#[from] tiberius::error::Error),

    #[cfg(feature = "mssql")]
    #[error(transparent)]
    PoolMssql(#[from] deadpool::managed::PoolError<tiberius::error::Error>),
}
