use tokio_postgres::SimpleQueryMessage;

use crate::error::DalError;
use crate::results::ResultSet;
use crate::value::SqlValue;

/// Build a result set from a simple-query exchange.
///
/// Text-protocol values arrive untyped; they are carried as
/// [`SqlValue::Text`] and NULLs as [`SqlValue::Null`]. `CommandComplete`
/// supplies the affected-row count for DML statements.
///
/// # Errors
///
/// Currently infallible; kept fallible to match the extraction contract of
/// the other backend.
pub fn build_result_set(messages: Vec<SimpleQueryMessage>) -> Result<ResultSet, DalError> {
    let mut result_set = ResultSet::new();

    for message in messages {
        match message {
            SimpleQueryMessage::RowDescription(description) => {
                let columns: Vec<String> =
                    description.iter().map(|c| c.name().to_string()).collect();
                result_set.set_columns(columns);
            }
            SimpleQueryMessage::Row(row) => {
                if result_set.columns().is_none() {
                    let columns: Vec<String> =
                        row.columns().iter().map(|c| c.name().to_string()).collect();
                    result_set.set_columns(columns);
                }
                let values = (0..row.len())
                    .map(|i| {
                        row.get(i)
                            .map_or(SqlValue::Null, |text| SqlValue::Text(text.to_string()))
                    })
                    .collect();
                result_set.push_row(values);
            }
            SimpleQueryMessage::CommandComplete(count) => {
                result_set.rows_affected = count;
            }
            _ => {}
        }
    }

    Ok(result_set)
}
