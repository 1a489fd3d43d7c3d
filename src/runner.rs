use std::future::Future;
use std::pin::Pin;

use crate::driver::Acquire;
use crate::error::DalError;
use crate::results::{DriverOutput, Row};
use crate::value::SqlValue;

type ExecFuture<'a> = Pin<Box<dyn Future<Output = Result<DriverOutput, DalError>> + Send + 'a>>;

/// A deferred, single-use unit of work.
///
/// Issuing a statement returns a `Runner` immediately; the database round
/// trip happens when one of the accessors is awaited. Each accessor takes
/// the runner by value, so it can execute at most once. There is no retry
/// logic: failures from the underlying execution propagate verbatim.
pub struct Runner<'a> {
    exec: ExecFuture<'a>,
}

impl std::fmt::Debug for Runner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner").finish_non_exhaustive()
    }
}

impl<'a> Runner<'a> {
    pub(crate) fn new(exec: ExecFuture<'a>) -> Self {
        Runner { exec }
    }

    /// Execute and return the raw driver output, one result set per
    /// statement in the batch. Use this when auxiliary output (row counts
    /// of every statement) matters.
    ///
    /// # Errors
    ///
    /// Construction has already succeeded by the time a `Runner` exists;
    /// only execution-time failures arrive here.
    pub async fn exec(self) -> Result<DriverOutput, DalError> {
        self.exec.await
    }

    /// Execute and return the primary row array.
    ///
    /// # Errors
    ///
    /// Execution-time failures propagate unchanged.
    pub async fn all(self) -> Result<Vec<Row>, DalError> {
        Ok(self.exec.await?.into_rows())
    }

    /// Execute and return the first row, or `None` when no rows came back.
    /// An empty result is not an error.
    ///
    /// # Errors
    ///
    /// Execution-time failures propagate unchanged.
    pub async fn one(self) -> Result<Option<Row>, DalError> {
        Ok(self.all().await?.into_iter().next())
    }

    /// Execute and return the first row's first column, in declaration
    /// order, or `None` when no rows came back.
    ///
    /// # Errors
    ///
    /// Execution-time failures propagate unchanged.
    pub async fn val(self) -> Result<Option<SqlValue>, DalError> {
        Ok(self.all().await?.into_iter().next().and_then(Row::into_first))
    }
}

/// Build a runner that acquires a request, splits the batch, and executes
/// its statements strictly in sequence. A failure aborts the remainder.
pub(crate) fn run<'a>(exec: &'a dyn Acquire, sql: String) -> Runner<'a> {
    Runner::new(Box::pin(async move {
        let mut request = exec.acquire().await?;

        let statements: Vec<String> = match exec.batch_separator() {
            Some(separator) => separator.split(&sql).map(str::to_string).collect(),
            None => vec![sql],
        };

        let mut output = DriverOutput::default();
        for statement in &statements {
            let statement = statement.trim();
            if statement.is_empty() {
                continue;
            }
            tracing::debug!(sql = statement, "executing statement");
            let result_set = request.query(statement).await?;
            output.result_sets.push(result_set);
        }
        Ok(output)
    }))
}
