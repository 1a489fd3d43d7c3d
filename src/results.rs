use std::collections::HashMap;
use std::sync::Arc;

use crate::value::SqlValue;

/// A single row from a query result.
///
/// Column names are shared across all rows of a result set; lookups by name
/// go through a prebuilt index map.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<Vec<String>>,
    index: Arc<HashMap<String, usize>>,
    values: Vec<SqlValue>,
}

impl Row {
    #[must_use]
    pub(crate) fn new(
        columns: Arc<Vec<String>>,
        index: Arc<HashMap<String, usize>>,
        values: Vec<SqlValue>,
    ) -> Self {
        Self {
            columns,
            index,
            values,
        }
    }

    /// Column names, in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Get a value by column name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        let idx = self
            .index
            .get(column)
            .copied()
            .or_else(|| self.columns.iter().position(|c| c == column))?;
        self.values.get(idx)
    }

    /// Get a value by column index (declaration order).
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// Consume the row, returning the first column's value.
    #[must_use]
    pub fn into_first(mut self) -> Option<SqlValue> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.values.remove(0))
        }
    }

    /// All values, in declaration order.
    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }
}

/// The rows and metadata produced by one statement.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the statement.
    pub rows: Vec<Row>,
    /// Rows affected, when the driver reports it (DML statements).
    pub rows_affected: u64,
    columns: Option<Arc<Vec<String>>>,
    index: Option<Arc<HashMap<String, usize>>>,
}

impl ResultSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        ResultSet {
            rows: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Set the column names shared by all rows of this result set.
    pub fn set_columns(&mut self, columns: Vec<String>) {
        let index: HashMap<String, usize> = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        self.columns = Some(Arc::new(columns));
        self.index = Some(Arc::new(index));
    }

    #[must_use]
    pub fn columns(&self) -> Option<&Arc<Vec<String>>> {
        self.columns.as_ref()
    }

    /// Append a row of values. Columns must have been set first; rows pushed
    /// before that are attributed to an empty column list.
    pub fn push_row(&mut self, values: Vec<SqlValue>) {
        let columns = self.columns.clone().unwrap_or_default();
        let index = self.index.clone().unwrap_or_default();
        self.rows.push(Row::new(columns, index, values));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Raw output of one statement batch: one result set per executed statement,
/// in execution order.
#[derive(Debug, Clone, Default)]
pub struct DriverOutput {
    pub result_sets: Vec<ResultSet>,
}

impl DriverOutput {
    /// The primary row array: rows of the batch's final result set.
    #[must_use]
    pub fn into_rows(mut self) -> Vec<Row> {
        self.result_sets.pop().map_or_else(Vec::new, |rs| rs.rows)
    }
}
