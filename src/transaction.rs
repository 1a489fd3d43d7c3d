use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use tokio::sync::Mutex;

use crate::dao::Dao;
use crate::dialect::Dialect;
use crate::driver::{Acquire, Request, SharedConnection};
use crate::error::DalError;
use crate::runner::{self, Runner};
use crate::store::{Store, format_ordinals};
use crate::value::SqlValue;

const BEGIN_SQL: &str = "BEGIN TRANSACTION";
const COMMIT_SQL: &str = "COMMIT TRANSACTION";
const ROLLBACK_SQL: &str = "ROLLBACK TRANSACTION";

/// Nested, reference-counted logical transaction over one physical
/// transaction.
///
/// Composes a [`Store`] rather than specializing it: non-transactional
/// concerns (DAO lookup, dialect, batch splitting) delegate to the store.
/// A transaction assumes a single owning caller driving the
/// `begin`/`commit`/`rollback` nesting sequentially.
///
/// Contract note: `commit` and `rollback` decrement the nesting counter
/// and issue the physical statement *unconditionally*. An inner `commit` in a nested
/// sequence therefore commits for real while outer callers still believe
/// they are inside the transaction. `begin(); begin(); commit(); commit();`
/// issues one physical BEGIN and two physical COMMITs.
pub struct Transaction<'a> {
    store: &'a Store,
    shared: Option<SharedConnection>,
    txref: u32,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        Transaction {
            store,
            shared: None,
            txref: 0,
        }
    }

    /// Current nesting depth.
    #[must_use]
    pub fn txref(&self) -> u32 {
        self.txref
    }

    /// The store this transaction delegates to.
    #[must_use]
    pub fn store(&self) -> &Store {
        self.store
    }

    /// Look up a DAO registered on the underlying store.
    ///
    /// # Errors
    ///
    /// `DalError::Parameter` when nothing is registered under `name`.
    pub fn dao(&self, name: &str) -> Result<Arc<Dao>, DalError> {
        self.store.dao(name)
    }

    /// Ad-hoc SQL executed within this transaction while nested.
    ///
    /// # Errors
    ///
    /// `DalError::Parameter` for unmatched `$n` placeholders.
    pub fn sql(&self, sql: &str, params: &[SqlValue]) -> Result<Runner<'_>, DalError> {
        let formatted = format_ordinals(sql, params, self.store.config().dialect)?;
        Ok(runner::run(self, formatted))
    }

    /// Enter the transaction. The first `begin` opens the dedicated
    /// connection and issues the physical BEGIN; nested calls only bump the
    /// counter and share the one physical transaction.
    ///
    /// # Errors
    ///
    /// Connection and driver failures propagate unchanged.
    pub async fn begin(&mut self) -> Result<(), DalError> {
        let opened = self.ensure_transaction().await?;
        self.txref += 1;
        if opened {
            self.issue(BEGIN_SQL).await?;
        }
        Ok(())
    }

    /// Leave one nesting level and issue a physical COMMIT (see the type
    /// docs for the unconditional-decrement contract).
    ///
    /// # Errors
    ///
    /// `DalError::Execution` when no physical transaction is active; driver
    /// failures propagate unchanged.
    pub async fn commit(&mut self) -> Result<(), DalError> {
        self.finish(COMMIT_SQL).await
    }

    /// Leave one nesting level and issue a physical ROLLBACK.
    ///
    /// # Errors
    ///
    /// `DalError::Execution` when no physical transaction is active; driver
    /// failures propagate unchanged.
    pub async fn rollback(&mut self) -> Result<(), DalError> {
        self.finish(ROLLBACK_SQL).await
    }

    /// Discard the transaction handle. An unbalanced close (positive
    /// `txref`) is reported, not refused.
    pub fn close(&mut self) {
        if self.txref > 0 {
            tracing::warn!(
                txref = self.txref,
                "closing connection with outstanding transaction count"
            );
            self.txref = 0;
        }
        self.shared = None;
    }

    /// Open the dedicated connection if none exists yet. Returns whether a
    /// new physical transaction was started.
    async fn ensure_transaction(&mut self) -> Result<bool, DalError> {
        if self.shared.is_some() {
            return Ok(false);
        }
        let conn = self.store.connector().connect().await?;
        self.shared = Some(Arc::new(Mutex::new(conn)));
        Ok(true)
    }

    async fn finish(&mut self, sql: &str) -> Result<(), DalError> {
        if self.txref == 0 {
            tracing::warn!(sql, "transaction operation without matching begin");
        }
        self.txref = self.txref.saturating_sub(1);
        self.issue(sql).await?;
        if self.txref == 0 {
            // Full unwind: release the dedicated connection.
            self.shared = None;
        }
        Ok(())
    }

    async fn issue(&self, sql: &str) -> Result<(), DalError> {
        let Some(shared) = &self.shared else {
            return Err(DalError::Execution(
                "no active transaction".to_string(),
            ));
        };
        tracing::debug!(sql, "transaction control statement");
        shared.lock().await.query(sql).await?;
        Ok(())
    }
}

#[async_trait]
impl Acquire for Transaction<'_> {
    /// While nested, requests are scoped to the shared physical
    /// transaction; at depth zero this falls back to a plain acquisition
    /// from the base store.
    async fn acquire(&self) -> Result<Request, DalError> {
        if self.txref > 0 {
            if let Some(shared) = &self.shared {
                return Ok(Request::Shared(shared.clone()));
            }
        }
        self.store.acquire().await
    }

    fn dialect(&self) -> Dialect {
        self.store.config().dialect
    }

    fn batch_separator(&self) -> Option<&Regex> {
        self.store.batch_separator()
    }
}
