use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dao::Dao;
use crate::dialect::Dialect;
use crate::driver::{Acquire, Connector, Request};
use crate::error::DalError;
use crate::runner::{self, Runner};
use crate::schema::{self, TableSchema};
use crate::transaction::Transaction;
use crate::value::SqlValue;

static ORDINAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\d+)").expect("ordinal placeholder pattern"));

/// Store settings. Serde-derived so it can come straight out of a config
/// file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub dialect: Dialect,
    /// Database name; required for postgres schema introspection.
    pub database: Option<String>,
    /// Batch separator line prefix (`GO` style). When set, ad-hoc SQL is
    /// split on it and the fragments run strictly in sequence.
    pub batch_separator: Option<String>,
    /// Strict builder mode for every DAO created by this store.
    pub strict: bool,
}

impl StoreConfig {
    #[must_use]
    pub fn new(dialect: Dialect) -> Self {
        StoreConfig {
            dialect,
            database: None,
            batch_separator: None,
            strict: false,
        }
    }

    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    #[must_use]
    pub fn batch_separator(mut self, separator: impl Into<String>) -> Self {
        self.batch_separator = Some(separator.into());
        self
    }

    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Binds a connector, per-table schemas, and DAOs together.
///
/// The connector is an explicitly injected shared handle; nothing here is
/// process-global. Table registration loads each schema once; DAOs are
/// created on first access and cached.
pub struct Store {
    connector: Arc<dyn Connector>,
    config: StoreConfig,
    separator: Option<Regex>,
    schemas: HashMap<String, Arc<TableSchema>>,
    daos: Mutex<HashMap<String, Arc<Dao>>>,
}

impl Store {
    /// # Errors
    ///
    /// `DalError::Config` when the batch separator does not compile.
    pub fn new(connector: Arc<dyn Connector>, config: StoreConfig) -> Result<Self, DalError> {
        let separator = match &config.batch_separator {
            Some(sep) => Some(
                Regex::new(&format!("(?im)^{}", regex::escape(sep)))
                    .map_err(|e| DalError::Config(format!("bad batch separator: {e}")))?,
            ),
            None => None,
        };
        Ok(Store {
            connector,
            config,
            separator,
            schemas: HashMap::new(),
            daos: Mutex::new(HashMap::new()),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub(crate) fn connector(&self) -> &Arc<dyn Connector> {
        &self.connector
    }

    /// Ad-hoc SQL with ordinal substitution: each `$n` placeholder is
    /// replaced by the escaped literal of `params[n-1]` before execution.
    ///
    /// # Errors
    ///
    /// `DalError::Parameter` at construction when a placeholder has no
    /// matching parameter. Execution failures arrive through the runner.
    pub fn sql<'a>(&'a self, sql: &str, params: &[SqlValue]) -> Result<Runner<'a>, DalError> {
        let formatted = format_ordinals(sql, params, self.config.dialect)?;
        Ok(runner::run(self, formatted))
    }

    /// Load a table's schema and register it under `name`. Introspection
    /// runs once per registration, not per query.
    ///
    /// # Errors
    ///
    /// `DalError::SchemaNotFound` for a misspelled or absent table; driver
    /// errors propagate unchanged.
    pub async fn register_dao(&mut self, name: &str, table: &str) -> Result<(), DalError> {
        let schema =
            schema::get_table_schema(self, self.config.database.as_deref(), table).await?;
        self.schemas.insert(name.to_string(), Arc::new(schema));
        Ok(())
    }

    /// Register a table under `name` with an already-known schema, skipping
    /// introspection.
    pub fn register_schema(&mut self, name: &str, schema: TableSchema) {
        self.schemas.insert(name.to_string(), Arc::new(schema));
    }

    /// Look up a registered DAO, creating and caching it on first access.
    ///
    /// # Errors
    ///
    /// `DalError::Parameter` when nothing is registered under `name`.
    pub fn dao(&self, name: &str) -> Result<Arc<Dao>, DalError> {
        let mut daos = match self.daos.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(dao) = daos.get(name) {
            return Ok(dao.clone());
        }
        let schema = self
            .schemas
            .get(name)
            .ok_or_else(|| DalError::Parameter(format!("no DAO registered under '{name}'")))?;
        let dao = Arc::new(Dao::new(schema.clone(), self.config.strict));
        daos.insert(name.to_string(), dao.clone());
        Ok(dao)
    }

    /// Start a logical transaction over this store's connector. The
    /// physical transaction and its dedicated connection are created
    /// lazily on first `begin`.
    #[must_use]
    pub fn transaction(&self) -> Transaction<'_> {
        Transaction::new(self)
    }
}

#[async_trait]
impl Acquire for Store {
    async fn acquire(&self) -> Result<Request, DalError> {
        let conn = self.connector.connect().await?;
        Ok(Request::Fresh(conn))
    }

    fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    fn batch_separator(&self) -> Option<&Regex> {
        self.separator.as_ref()
    }
}

/// Substitute `$n` placeholders with escaped literals. SQL without
/// parameters passes through untouched.
pub(crate) fn format_ordinals(
    sql: &str,
    params: &[SqlValue],
    dialect: Dialect,
) -> Result<String, DalError> {
    if params.is_empty() {
        return Ok(sql.to_string());
    }

    let mut missing = None;
    let formatted = ORDINAL_RE.replace_all(sql, |caps: &regex::Captures<'_>| {
        let position: usize = caps[1].parse().unwrap_or(0);
        if position == 0 || position > params.len() {
            missing = Some(caps[0].to_string());
            return String::new();
        }
        dialect.escape_value(&params[position - 1])
    });

    match missing {
        Some(placeholder) => Err(DalError::Parameter(format!(
            "no parameter for placeholder {placeholder}: {sql}"
        ))),
        None => Ok(formatted.into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinal_substitution_escapes_literals() {
        let sql = "SELECT * FROM t WHERE a = $1 AND b = $2";
        let params = vec![SqlValue::from("o'brien"), SqlValue::from(7)];
        let formatted = format_ordinals(sql, &params, Dialect::Postgres).unwrap();
        assert_eq!(formatted, "SELECT * FROM t WHERE a = 'o''brien' AND b = 7");
    }

    #[test]
    fn ordinal_substitution_reuses_positions() {
        let formatted = format_ordinals(
            "SELECT $1, $1, $2",
            &[SqlValue::from(1), SqlValue::from(2)],
            Dialect::Postgres,
        )
        .unwrap();
        assert_eq!(formatted, "SELECT 1, 1, 2");
    }

    #[test]
    fn ordinal_substitution_rejects_missing_parameters() {
        let err = format_ordinals("SELECT $3", &[SqlValue::from(1)], Dialect::Postgres)
            .unwrap_err();
        assert!(matches!(err, DalError::Parameter(_)));
    }

    #[test]
    fn no_params_passes_through() {
        let formatted =
            format_ordinals("SELECT $1", &[], Dialect::Postgres).unwrap();
        assert_eq!(formatted, "SELECT $1");
    }
}
