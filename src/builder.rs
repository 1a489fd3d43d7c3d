use std::sync::Arc;

use crate::criteria::{Criteria, DeleteTarget, Pairs, Returning, SelectList, Verb};
use crate::dialect::Dialect;
use crate::error::DalError;
use crate::schema::TableSchema;
use crate::value::SqlValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VerbKind {
    Select,
    Insert,
    Update,
    Delete,
}

/// Named clause slots assembled incrementally, serialized once.
///
/// `into_sql` consumes the buffer: a stale caller cannot reuse it for a
/// second statement without re-specifying a verb. `peek_sql` is the
/// non-destructive variant for inspection.
#[derive(Debug, Clone)]
pub struct QueryBuffer {
    dialect: Dialect,
    strict: bool,
    verb: VerbKind,
    select: Option<String>,
    insert_target: Option<String>,
    update_target: Option<String>,
    set: Option<String>,
    from: Option<String>,
    where_clause: Option<String>,
    order: Option<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    values: Option<String>,
    returning: Option<String>,
}

impl QueryBuffer {
    fn new(dialect: Dialect, strict: bool, verb: VerbKind) -> Self {
        QueryBuffer {
            dialect,
            strict,
            verb,
            select: None,
            insert_target: None,
            update_target: None,
            set: None,
            from: None,
            where_clause: None,
            order: None,
            limit: None,
            offset: None,
            values: None,
            returning: None,
        }
    }

    /// Serialize the clause slots without consuming the buffer.
    #[must_use]
    pub fn peek_sql(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        match self.verb {
            VerbKind::Select => {
                parts.push(format!("SELECT {}", self.select.as_deref().unwrap_or("*")));
            }
            VerbKind::Delete => parts.push("DELETE".to_string()),
            VerbKind::Update => parts.push(format!(
                "UPDATE {}",
                self.update_target.as_deref().unwrap_or_default()
            )),
            VerbKind::Insert => parts.push(format!(
                "INSERT INTO {}",
                self.insert_target.as_deref().unwrap_or_default()
            )),
        }

        // SQL Server rewrites returning as an OUTPUT clause injected right
        // after the INSERT target; postgres renders it trailing.
        let mut trailing_returning = None;
        if let Some(returning) = &self.returning {
            match self.dialect {
                Dialect::Mssql => {
                    let cols = returning.split(", ").collect::<Vec<_>>().join(", inserted.");
                    parts.push(format!("OUTPUT inserted.{cols}"));
                }
                Dialect::Postgres => {
                    trailing_returning = Some(format!("RETURNING {returning}"));
                }
            }
        }

        if let Some(set) = &self.set {
            parts.push(format!("SET {set}"));
        }
        if let Some(from) = &self.from {
            parts.push(format!("FROM {from}"));
        }
        if let Some(where_clause) = &self.where_clause {
            parts.push(format!("WHERE {where_clause}"));
        }
        if let Some(order) = &self.order {
            parts.push(format!("ORDER BY {order}"));
        }
        // Zero limits/offsets are not rendered, matching the lenient
        // treatment of unset slots.
        if let Some(limit) = self.limit
            && limit != 0
        {
            parts.push(format!("LIMIT {limit}"));
        }
        if let Some(offset) = self.offset
            && offset != 0
        {
            parts.push(format!("OFFSET {offset}"));
        }
        if let Some(values) = &self.values {
            parts.push(format!("VALUES {values}"));
        }
        if let Some(returning) = trailing_returning {
            parts.push(returning);
        }

        let mut sql = parts.join(" ");
        sql.push(';');
        sql
    }

    /// Serialize and consume the buffer. Strict-mode clause checks happen
    /// here: an UPDATE or DELETE without a WHERE clause is refused.
    ///
    /// # Errors
    ///
    /// `DalError::MissingWhere` in strict mode for unconditioned mutations.
    pub fn into_sql(self) -> Result<String, DalError> {
        if self.strict && self.where_clause.is_none() {
            match self.verb {
                VerbKind::Update => return Err(DalError::MissingWhere("UPDATE")),
                VerbKind::Delete => return Err(DalError::MissingWhere("DELETE")),
                _ => {}
            }
        }
        Ok(self.peek_sql())
    }
}

/// Renders one [`Criteria`] into one SQL statement against an immutable
/// [`TableSchema`].
///
/// Each `build` call works on a fresh buffer; the builder itself holds no
/// per-statement state and may be reused, but must not be shared across
/// concurrent callers mid-build.
pub struct QueryBuilder {
    schema: Arc<TableSchema>,
    strict: bool,
}

impl QueryBuilder {
    #[must_use]
    pub fn new(schema: Arc<TableSchema>) -> Self {
        QueryBuilder {
            schema,
            strict: false,
        }
    }

    /// Enable strict mode: unknown columns and unconditioned mutations
    /// become hard failures instead of silent drops.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Render the criteria to SQL text.
    ///
    /// # Errors
    ///
    /// All builder failures are construction-time: `StrictValidation`,
    /// `EmptyPredicate`, `MissingWhere`, `Parameter`. No partial SQL is
    /// ever returned.
    pub fn build(&self, criteria: &Criteria) -> Result<String, DalError> {
        self.prepare(criteria)?.into_sql()
    }

    /// Fill a buffer from the criteria without serializing, for callers
    /// that want to `peek_sql` first.
    ///
    /// # Errors
    ///
    /// Same construction-time failures as [`build`](Self::build).
    pub fn prepare(&self, criteria: &Criteria) -> Result<QueryBuffer, DalError> {
        let mut buffer = match &criteria.verb {
            Some(Verb::Select(list)) => self.select(list)?,
            Some(Verb::Insert(rows)) => self.insert(rows)?,
            Some(Verb::Update(row)) => self.update(row)?,
            Some(Verb::Delete(target)) => self.delete(target)?,
            // A bare where implies select; an empty criteria implies
            // SELECT *.
            None => self.select(&SelectList::All)?,
        };

        if let Some(returning) = &criteria.returning {
            self.returning(&mut buffer, returning)?;
        }
        if let Some(predicates) = &criteria.where_clause {
            self.where_clause(&mut buffer, predicates)?;
        }
        if let Some(offset) = criteria.offset {
            buffer.offset = Some(offset);
        }
        if let Some(limit) = criteria.limit {
            buffer.limit = Some(limit);
        }
        if let Some(order) = &criteria.order {
            buffer.order = Some(order.clone());
        }
        if let Some((page_offset, rows_per_page)) = criteria.page {
            buffer.limit = Some(rows_per_page);
            buffer.offset = Some(page_offset * rows_per_page);
        }

        Ok(buffer)
    }

    fn buffer(&self, verb: VerbKind) -> QueryBuffer {
        QueryBuffer::new(self.schema.dialect, self.strict, verb)
    }

    fn select(&self, list: &SelectList) -> Result<QueryBuffer, DalError> {
        let mut buffer = self.buffer(VerbKind::Select);
        buffer.select = Some(match list {
            SelectList::All => "*".to_string(),
            SelectList::Raw(raw) => raw.clone(),
            SelectList::Columns(columns) => {
                let fields = self.valid_escaped_fields(columns)?;
                if fields.is_empty() {
                    "*".to_string()
                } else {
                    fields.join(",")
                }
            }
        });
        buffer.from = Some(self.schema.escaped_table_name.clone());
        Ok(buffer)
    }

    fn insert(&self, rows: &[Pairs]) -> Result<QueryBuffer, DalError> {
        let Some(first) = rows.first() else {
            return Err(DalError::Parameter(
                "insert requires at least one row".to_string(),
            ));
        };

        // The field list comes from the first row only; every row is
        // rendered against it, missing keys become NULL.
        let fields = self.valid_fields(first)?;
        let escaped: Vec<&str> = fields
            .iter()
            .filter_map(|f| self.schema.escaped_column(f))
            .collect();

        let mut buffer = self.buffer(VerbKind::Insert);
        buffer.insert_target = Some(format!(
            "{}({})",
            self.schema.escaped_table_name,
            escaped.join(", ")
        ));
        buffer.values = Some(
            rows.iter()
                .map(|row| format!("({})", self.escape_row_values(row, &fields)))
                .collect::<Vec<_>>()
                .join(", "),
        );
        // Implicitly request the primary key back; an explicit returning
        // modifier overwrites this slot.
        buffer.returning = self
            .schema
            .escaped_column(&self.schema.primary_key)
            .map(str::to_string);
        Ok(buffer)
    }

    fn update(&self, row: &Pairs) -> Result<QueryBuffer, DalError> {
        let mut buffer = self.buffer(VerbKind::Update);
        buffer.update_target = Some(self.schema.escaped_table_name.clone());

        let fields = self.valid_fields(row)?;
        // Assignments render in reverse input order; inserts render in
        // input order. See DESIGN.md.
        let assignments: Vec<String> = fields
            .iter()
            .rev()
            .map(|field| {
                let value = lookup(row, field).unwrap_or(&SqlValue::Null);
                format!(
                    "{} = {}",
                    self.schema.escape_identifier(field),
                    self.schema.escape_value(value)
                )
            })
            .collect();
        if !assignments.is_empty() {
            buffer.set = Some(assignments.join(", "));
        }
        Ok(buffer)
    }

    fn delete(&self, target: &DeleteTarget) -> Result<QueryBuffer, DalError> {
        let mut buffer = self.buffer(VerbKind::Delete);
        buffer.from = Some(self.schema.escaped_table_name.clone());
        if let DeleteTarget::Where(predicates) = target {
            self.where_clause(&mut buffer, predicates)?;
        }
        Ok(buffer)
    }

    fn returning(&self, buffer: &mut QueryBuffer, returning: &Returning) -> Result<(), DalError> {
        match returning {
            Returning::Raw(raw) => buffer.returning = Some(raw.clone()),
            Returning::Columns(columns) => {
                let fields = self.valid_escaped_fields(columns)?;
                buffer.returning = if fields.is_empty() {
                    None
                } else {
                    Some(fields.join(", "))
                };
            }
        }
        Ok(())
    }

    fn where_clause(&self, buffer: &mut QueryBuffer, predicates: &Pairs) -> Result<(), DalError> {
        let mut rendered = Vec::with_capacity(predicates.len());
        for (key, value) in predicates {
            let (column, operator) = extract_key_operator(key);
            if !self.schema.has_column(column) {
                if self.strict {
                    return Err(DalError::StrictValidation(column.to_string()));
                }
                continue;
            }
            rendered.push(self.expression(column, operator, value));
        }

        if rendered.is_empty() {
            return Err(DalError::EmptyPredicate);
        }
        buffer.where_clause = Some(rendered.join(" AND "));
        Ok(())
    }

    /// One predicate. The operator defaults to `=`, or `IN` for lists; an
    /// explicit operator from the key wins and its text is preserved
    /// verbatim. Null values are the exception: they always compare with
    /// `IS`, since any other operator against NULL can never match a row.
    fn expression(&self, column: &str, operator: Option<&str>, value: &SqlValue) -> String {
        let (op, rendered) = match value {
            SqlValue::List(_) => (
                operator.unwrap_or("IN").to_string(),
                format!("({})", self.schema.escape_value(value)),
            ),
            SqlValue::Null => ("IS".to_string(), "NULL".to_string()),
            _ => (
                operator.unwrap_or("=").to_string(),
                self.schema.escape_value(value),
            ),
        };
        format!("{} {} {}", self.schema.escape_identifier(column), op, rendered)
    }

    /// Keys of `row` present in the known column set, in input order.
    /// Unknown keys are dropped, or refused in strict mode.
    fn valid_fields<'r>(&self, row: &'r Pairs) -> Result<Vec<&'r str>, DalError> {
        let mut fields = Vec::with_capacity(row.len());
        for (key, _) in row {
            if self.schema.has_column(key) {
                fields.push(key.as_str());
            } else if self.strict {
                return Err(DalError::StrictValidation(key.clone()));
            }
        }
        Ok(fields)
    }

    /// Escaped names of the known columns among `columns`, in input order.
    fn valid_escaped_fields(&self, columns: &[String]) -> Result<Vec<String>, DalError> {
        let mut fields = Vec::with_capacity(columns.len());
        for column in columns {
            if let Some(escaped) = self.schema.escaped_column(column) {
                fields.push(escaped.to_string());
            } else if self.strict {
                return Err(DalError::StrictValidation(column.clone()));
            }
        }
        Ok(fields)
    }

    fn escape_row_values(&self, row: &Pairs, fields: &[&str]) -> String {
        fields
            .iter()
            .map(|field| {
                let value = lookup(row, field).unwrap_or(&SqlValue::Null);
                self.schema.escape_value(value)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn lookup<'r>(row: &'r Pairs, field: &str) -> Option<&'r SqlValue> {
    row.iter().find(|(k, _)| k == field).map(|(_, v)| v)
}

/// Split `"column operator"` at the first space. The operator keeps its
/// text verbatim (`"age not in"` yields `not in`).
fn extract_key_operator(key: &str) -> (&str, Option<&str>) {
    match key.find(' ') {
        Some(space) if space > 0 => (&key[..space], Some(key[space + 1..].trim_start())),
        _ => (key, None),
    }
}
