use std::collections::HashMap;

use crate::dialect::Dialect;
use crate::driver::Acquire;
use crate::error::DalError;
use crate::runner;
use crate::store::format_ordinals;
use crate::value::SqlValue;

const PG_COLUMNS_SQL: &str = "SELECT column_name FROM information_schema.columns \
     WHERE table_catalog = $1 AND table_name = $2 ORDER BY ordinal_position";

const MSSQL_COLUMNS_SQL: &str = "SELECT column_name FROM information_schema.columns \
     WHERE table_name = $1 ORDER BY ordinal_position";

/// Column metadata for one table, loaded once at registration and shared
/// read-only across query builders.
///
/// The column set never changes after load; every later column-validity
/// check is a membership test against it.
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub table_name: String,
    pub escaped_table_name: String,
    /// Primary-key column name, `id` unless overridden.
    pub primary_key: String,
    /// Known column names, in catalog order.
    pub columns: Vec<String>,
    pub escaped_columns: HashMap<String, String>,
    pub dialect: Dialect,
}

impl TableSchema {
    /// Build a schema from an already-known column list.
    #[must_use]
    pub fn new(table: &str, columns: Vec<String>, dialect: Dialect) -> Self {
        let escaped_columns = columns
            .iter()
            .map(|c| (c.clone(), dialect.escape_identifier(c)))
            .collect();
        TableSchema {
            table_name: table.to_string(),
            escaped_table_name: dialect.escape_identifier(table),
            primary_key: "id".to_string(),
            columns,
            escaped_columns,
            dialect,
        }
    }

    #[must_use]
    pub fn with_primary_key(mut self, primary_key: &str) -> Self {
        self.primary_key = primary_key.to_string();
        self
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.escaped_columns.contains_key(name)
    }

    #[must_use]
    pub fn escaped_column(&self, name: &str) -> Option<&str> {
        self.escaped_columns.get(name).map(String::as_str)
    }

    /// Escape a value with this schema's dialect.
    #[must_use]
    pub fn escape_value(&self, value: &SqlValue) -> String {
        self.dialect.escape_value(value)
    }

    /// Quote an identifier with this schema's dialect.
    #[must_use]
    pub fn escape_identifier(&self, name: &str) -> String {
        self.dialect.escape_identifier(name)
    }
}

/// Load a table's schema by introspecting the catalog.
///
/// Runs once per table registration. Postgres filters by catalog and table
/// (`database` is required); SQL Server by table alone.
///
/// # Errors
///
/// `DalError::SchemaNotFound` when the introspection query returns zero rows
/// (a misspelled or absent table); `DalError::Config` when the postgres
/// database name is missing; driver errors propagate unchanged.
pub async fn get_table_schema(
    exec: &dyn Acquire,
    database: Option<&str>,
    table: &str,
) -> Result<TableSchema, DalError> {
    let dialect = exec.dialect();
    let (raw_sql, params) = match dialect {
        Dialect::Postgres => {
            let database = database.ok_or_else(|| {
                DalError::Config("database name is required for schema introspection".to_string())
            })?;
            (
                PG_COLUMNS_SQL,
                vec![SqlValue::from(database), SqlValue::from(table)],
            )
        }
        Dialect::Mssql => (MSSQL_COLUMNS_SQL, vec![SqlValue::from(table)]),
    };

    let sql = format_ordinals(raw_sql, &params, dialect)?;
    let rows = runner::run(exec, sql).all().await?;
    if rows.is_empty() {
        return Err(DalError::SchemaNotFound {
            table: table.to_string(),
        });
    }

    let mut columns = Vec::with_capacity(rows.len());
    for row in &rows {
        let name = row
            .get("column_name")
            .and_then(SqlValue::as_text)
            .ok_or_else(|| {
                DalError::Execution("introspection row missing column_name".to_string())
            })?;
        columns.push(name.to_string());
    }

    Ok(TableSchema::new(table, columns, dialect))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_are_fixed_and_unique_after_load() {
        let schema = TableSchema::new(
            "model_name",
            vec!["id".into(), "name".into(), "age".into()],
            Dialect::Mssql,
        );
        assert_eq!(schema.columns.len(), 3);
        assert_eq!(schema.escaped_columns.len(), 3);
        assert!(schema.has_column("name"));
        assert!(!schema.has_column("missing"));
        assert_eq!(schema.escaped_column("name"), Some("[name]"));
        assert_eq!(schema.escaped_table_name, "[model_name]");
        assert_eq!(schema.primary_key, "id");
    }
}
