use chrono::NaiveDateTime;
use futures_util::TryStreamExt;

use crate::error::DalError;
use crate::results::ResultSet;
use crate::value::SqlValue;

use super::config::MssqlClient;

/// Execute one statement and stream its rows into a [`ResultSet`].
///
/// Statements that produce no row description (plain DML without an OUTPUT
/// clause) yield an empty result set. Inserts built by the query builder
/// carry an `OUTPUT inserted.<pk>` clause, so generated identifiers come
/// back as rows through this same path. `rows_affected` stays 0 here: the
/// row stream does not expose the done-token count.
///
/// # Errors
///
/// Driver failures propagate unchanged.
pub async fn build_result_set(
    client: &mut MssqlClient,
    sql: &str,
) -> Result<ResultSet, DalError> {
    let query = tiberius::Query::new(sql.to_string());
    let mut stream = query.query(client).await?;

    let Some(columns) = stream.columns().await? else {
        return Ok(ResultSet::new());
    };
    let column_names: Vec<String> = columns.iter().map(|col| col.name().to_string()).collect();
    let column_count = column_names.len();

    let mut result_set = ResultSet::new();
    result_set.set_columns(column_names);

    let mut rows = stream.into_row_stream();
    while let Some(row) = rows.try_next().await? {
        let mut values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            values.push(extract_value(&row, idx));
        }
        result_set.push_row(values);
    }

    Ok(result_set)
}

/// Extract one column from a Tiberius row by probing the common types.
fn extract_value(row: &tiberius::Row, idx: usize) -> SqlValue {
    if let Ok(Some(val)) = row.try_get::<i32, _>(idx) {
        return SqlValue::Int(i64::from(val));
    }
    if let Ok(Some(val)) = row.try_get::<i64, _>(idx) {
        return SqlValue::Int(val);
    }
    if let Ok(Some(val)) = row.try_get::<f32, _>(idx) {
        return SqlValue::Float(f64::from(val));
    }
    if let Ok(Some(val)) = row.try_get::<f64, _>(idx) {
        return SqlValue::Float(val);
    }
    if let Ok(Some(val)) = row.try_get::<bool, _>(idx) {
        return SqlValue::Bool(val);
    }
    if let Ok(Some(val)) = row.try_get::<NaiveDateTime, _>(idx) {
        return SqlValue::Timestamp(val);
    }
    if let Ok(Some(val)) = row.try_get::<&str, _>(idx) {
        return SqlValue::Text(val.to_string());
    }
    SqlValue::Null
}
