use crate::value::SqlValue;

/// Ordered column/value pairs. Order matters: insert field lists follow
/// input order, and WHERE predicates render in the order given.
pub type Pairs = Vec<(String, SqlValue)>;

/// The select list of a query.
#[derive(Debug, Clone)]
pub enum SelectList {
    /// `SELECT *`
    All,
    /// A raw select list used verbatim, enabling aliasing (`"col AS a"`).
    Raw(String),
    /// Column names, filtered against the table's known columns.
    Columns(Vec<String>),
}

impl From<&str> for SelectList {
    fn from(s: &str) -> Self {
        SelectList::Raw(s.to_string())
    }
}

impl From<String> for SelectList {
    fn from(s: String) -> Self {
        SelectList::Raw(s)
    }
}

impl<S: Into<String>> From<Vec<S>> for SelectList {
    fn from(cols: Vec<S>) -> Self {
        SelectList::Columns(cols.into_iter().map(Into::into).collect())
    }
}

/// The target of a delete.
#[derive(Debug, Clone)]
pub enum DeleteTarget {
    /// Unconditional delete of every row.
    All,
    /// Delete rows matching these predicates.
    Where(Pairs),
}

/// Columns requested back from an insert.
#[derive(Debug, Clone)]
pub enum Returning {
    /// Raw text placed in the clause verbatim.
    Raw(String),
    /// Column names, escaped and validated against the known columns.
    Columns(Vec<String>),
}

#[derive(Debug, Clone)]
pub(crate) enum Verb {
    Select(SelectList),
    /// One or more rows; the field list comes from the first row.
    Insert(Vec<Pairs>),
    Update(Pairs),
    Delete(DeleteTarget),
}

/// A structured request describing one SQL operation plus optional modifiers.
///
/// Exactly one primary verb (`select`, `insert`, `update`, `delete`) per
/// criteria; a criteria with only a `where` implies select, and an empty
/// criteria implies `SELECT *`:
/// ```rust
/// use sql_dal::prelude::*;
///
/// let by_name = Criteria::new().filter([("name", "fido")]);
/// let adults = Criteria::select(vec!["id", "name"])
///     .filter([("age >=", 18)])
///     .order("name")
///     .page(2, 25);
/// # let _ = (by_name, adults);
/// ```
///
/// WHERE keys may carry an operator after the first space (`"age >"`,
/// `"name not in"`); the default is `=`, or `IN` for list values. Null
/// values always compare with `IS`.
#[derive(Debug, Clone, Default)]
pub struct Criteria {
    pub(crate) verb: Option<Verb>,
    pub(crate) where_clause: Option<Pairs>,
    pub(crate) returning: Option<Returning>,
    pub(crate) order: Option<String>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
    pub(crate) page: Option<(u64, u64)>,
}

fn pairs<K, V, I>(items: I) -> Pairs
where
    K: Into<String>,
    V: Into<SqlValue>,
    I: IntoIterator<Item = (K, V)>,
{
    items
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

impl Criteria {
    /// An empty criteria: builds `SELECT *` unless modifiers are added.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A select with an explicit field list.
    #[must_use]
    pub fn select(list: impl Into<SelectList>) -> Self {
        Criteria {
            verb: Some(Verb::Select(list.into())),
            ..Self::default()
        }
    }

    /// A `SELECT *`.
    #[must_use]
    pub fn select_all() -> Self {
        Criteria {
            verb: Some(Verb::Select(SelectList::All)),
            ..Self::default()
        }
    }

    /// An insert of a single row. Field order follows the input pairs.
    #[must_use]
    pub fn insert<K: Into<String>, V: Into<SqlValue>>(
        row: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        Criteria {
            verb: Some(Verb::Insert(vec![pairs(row)])),
            ..Self::default()
        }
    }

    /// A multi-row insert. The field list is derived from the first row
    /// only; callers must ensure all rows share its shape.
    #[must_use]
    pub fn insert_many<K: Into<String>, V: Into<SqlValue>>(
        rows: impl IntoIterator<Item = Vec<(K, V)>>,
    ) -> Self {
        Criteria {
            verb: Some(Verb::Insert(rows.into_iter().map(pairs).collect())),
            ..Self::default()
        }
    }

    /// An update of the given field/value pairs.
    #[must_use]
    pub fn update<K: Into<String>, V: Into<SqlValue>>(
        row: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        Criteria {
            verb: Some(Verb::Update(pairs(row))),
            ..Self::default()
        }
    }

    /// An unconditional delete of every row in the table.
    #[must_use]
    pub fn delete_all() -> Self {
        Criteria {
            verb: Some(Verb::Delete(DeleteTarget::All)),
            ..Self::default()
        }
    }

    /// A delete constrained by the given predicates.
    #[must_use]
    pub fn delete<K: Into<String>, V: Into<SqlValue>>(
        predicates: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        Criteria {
            verb: Some(Verb::Delete(DeleteTarget::Where(pairs(predicates)))),
            ..Self::default()
        }
    }

    /// Add WHERE predicates, keyed `"column"` or `"column operator"`.
    #[must_use]
    pub fn filter<K: Into<String>, V: Into<SqlValue>>(
        mut self,
        predicates: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        self.where_clause = Some(pairs(predicates));
        self
    }

    /// Request columns back from an insert, overriding the implicit
    /// primary-key returning.
    #[must_use]
    pub fn returning(mut self, returning: impl Into<Returning>) -> Self {
        self.returning = Some(returning.into());
        self
    }

    /// Raw ORDER BY clause text.
    #[must_use]
    pub fn order(mut self, clause: impl Into<String>) -> Self {
        self.order = Some(clause.into());
        self
    }

    /// ORDER BY from a list of raw terms, joined with `,`.
    #[must_use]
    pub fn order_by<S: Into<String>>(mut self, terms: impl IntoIterator<Item = S>) -> Self {
        self.order = Some(
            terms
                .into_iter()
                .map(Into::into)
                .collect::<Vec<_>>()
                .join(","),
        );
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Page `page_offset` with `rows_per_page` rows: limit = `rows_per_page`,
    /// offset = `page_offset * rows_per_page`. Applied after any explicit
    /// limit/offset.
    #[must_use]
    pub fn page(mut self, page_offset: u64, rows_per_page: u64) -> Self {
        self.page = Some((page_offset, rows_per_page));
        self
    }

    /// `page` taking the two values as a pair.
    #[must_use]
    pub fn page_pair(self, pair: [u64; 2]) -> Self {
        self.page(pair[0], pair[1])
    }
}

impl From<&str> for Returning {
    fn from(s: &str) -> Self {
        Returning::Raw(s.to_string())
    }
}

impl From<String> for Returning {
    fn from(s: String) -> Self {
        Returning::Raw(s)
    }
}

impl<S: Into<String>> From<Vec<S>> for Returning {
    fn from(cols: Vec<S>) -> Self {
        Returning::Columns(cols.into_iter().map(Into::into).collect())
    }
}
