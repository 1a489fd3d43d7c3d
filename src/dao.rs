use std::sync::Arc;

use crate::builder::QueryBuilder;
use crate::criteria::Criteria;
use crate::driver::Acquire;
use crate::error::DalError;
use crate::results::Row;
use crate::runner::{self, Runner};
use crate::schema::TableSchema;
use crate::value::SqlValue;

/// What an upsert ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    /// Row was inserted; carries the returned row identifier, if any.
    Inserted(Option<SqlValue>),
    /// Row was updated by primary key; carries the returned row, if any.
    Updated(Option<Row>),
}

/// Per-table data access object: one immutable schema plus the CRUD
/// helpers built on the query builder.
///
/// A DAO holds no connection. Every operation takes the executor
/// explicitly, so the same DAO runs against a plain store or inside a
/// transaction:
/// ```rust,no_run
/// # async fn demo(store: sql_dal::Store) -> Result<(), sql_dal::DalError> {
/// use sql_dal::prelude::*;
///
/// let animals = store.dao("animals")?;
/// let fido = animals
///     .find_one(&store, &Criteria::new().filter([("name", "fido")]))
///     .await?;
/// # let _ = fido;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Dao {
    schema: Arc<TableSchema>,
    strict: bool,
}

impl Dao {
    pub(crate) fn new(schema: Arc<TableSchema>, strict: bool) -> Self {
        Dao { schema, strict }
    }

    #[must_use]
    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    /// Build the criteria into SQL and return a deferred runner. The
    /// caller picks the result shape by invoking a runner accessor.
    ///
    /// # Errors
    ///
    /// Builder construction failures (`StrictValidation`, `EmptyPredicate`,
    /// `MissingWhere`) surface here, before anything executes.
    pub fn query<'e>(
        &self,
        exec: &'e dyn Acquire,
        criteria: &Criteria,
    ) -> Result<Runner<'e>, DalError> {
        let sql = QueryBuilder::new(self.schema.clone())
            .strict(self.strict)
            .build(criteria)?;
        Ok(runner::run(exec, sql))
    }

    /// All rows matching the criteria.
    ///
    /// # Errors
    ///
    /// Construction failures surface immediately; execution failures come
    /// back from the driver unchanged.
    pub async fn find(
        &self,
        exec: &dyn Acquire,
        criteria: &Criteria,
    ) -> Result<Vec<Row>, DalError> {
        self.query(exec, criteria)?.all().await
    }

    /// First row matching the criteria, or `None`.
    ///
    /// # Errors
    ///
    /// Same as [`find`](Self::find).
    pub async fn find_one(
        &self,
        exec: &dyn Acquire,
        criteria: &Criteria,
    ) -> Result<Option<Row>, DalError> {
        self.query(exec, criteria)?.one().await
    }

    /// Look up a row by the schema's primary key.
    ///
    /// # Errors
    ///
    /// Same as [`find`](Self::find).
    pub async fn find_by_id(
        &self,
        exec: &dyn Acquire,
        id: impl Into<SqlValue> + Send,
    ) -> Result<Option<Row>, DalError> {
        let criteria =
            Criteria::new().filter([(self.schema.primary_key.clone(), id.into())]);
        self.find_one(exec, &criteria).await
    }

    /// Insert when the primary key is absent from `row`, otherwise update
    /// the row addressed by it.
    ///
    /// # Errors
    ///
    /// Same as [`find`](Self::find).
    pub async fn upsert(
        &self,
        exec: &dyn Acquire,
        mut row: Vec<(String, SqlValue)>,
    ) -> Result<UpsertOutcome, DalError> {
        let pk = &self.schema.primary_key;
        if let Some(position) = row.iter().position(|(k, _)| k == pk) {
            let (key, id) = row.remove(position);
            let criteria = Criteria::update(row).filter([(key, id)]);
            let updated = self.query(exec, &criteria)?.one().await?;
            Ok(UpsertOutcome::Updated(updated))
        } else {
            let criteria = Criteria::insert(row);
            let id = self.query(exec, &criteria)?.val().await?;
            Ok(UpsertOutcome::Inserted(id))
        }
    }
}
