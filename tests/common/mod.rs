#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sql_dal::driver::{Connection, Connector};
use sql_dal::error::DalError;
use sql_dal::results::ResultSet;
use sql_dal::value::SqlValue;

/// Scripted in-memory driver: records every statement in issue order,
/// counts opened connections, and replays queued result sets (an empty
/// result set when the queue runs dry).
#[derive(Default)]
pub struct MockConnector {
    log: Arc<Mutex<Vec<String>>>,
    connects: Arc<Mutex<usize>>,
    responses: Arc<Mutex<VecDeque<ResultSet>>>,
    fail_on: Arc<Mutex<Option<String>>>,
}

impl MockConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every statement issued so far, across all connections.
    pub fn issued(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn connects(&self) -> usize {
        *self.connects.lock().unwrap()
    }

    pub fn push_response(&self, result_set: ResultSet) {
        self.responses.lock().unwrap().push_back(result_set);
    }

    /// Fail any statement containing `pattern`.
    pub fn fail_on(&self, pattern: &str) {
        *self.fail_on.lock().unwrap() = Some(pattern.to_string());
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self) -> Result<Box<dyn Connection>, DalError> {
        *self.connects.lock().unwrap() += 1;
        Ok(Box::new(MockConnection {
            log: self.log.clone(),
            responses: self.responses.clone(),
            fail_on: self.fail_on.clone(),
        }))
    }
}

struct MockConnection {
    log: Arc<Mutex<Vec<String>>>,
    responses: Arc<Mutex<VecDeque<ResultSet>>>,
    fail_on: Arc<Mutex<Option<String>>>,
}

#[async_trait]
impl Connection for MockConnection {
    async fn query(&mut self, sql: &str) -> Result<ResultSet, DalError> {
        self.log.lock().unwrap().push(sql.to_string());
        if let Some(pattern) = self.fail_on.lock().unwrap().as_deref()
            && sql.contains(pattern)
        {
            return Err(DalError::Execution(format!("scripted failure: {pattern}")));
        }
        Ok(self.responses.lock().unwrap().pop_front().unwrap_or_default())
    }
}

/// Build a result set from literal columns and rows.
pub fn result_set(columns: &[&str], rows: Vec<Vec<SqlValue>>) -> ResultSet {
    let mut rs = ResultSet::new();
    rs.set_columns(columns.iter().map(|c| (*c).to_string()).collect());
    for row in rows {
        rs.push_row(row);
    }
    rs
}

/// Introspection response: one `column_name` row per column.
pub fn introspection_rows(columns: &[&str]) -> ResultSet {
    result_set(
        &["column_name"],
        columns
            .iter()
            .map(|c| vec![SqlValue::from(*c)])
            .collect(),
    )
}
