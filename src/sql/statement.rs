//! Pure SQL statement builders.
//!
//! Every builder here is parameters in, SQL text out, no I/O. Clause
//! compilation delegates to [`crate::sql::condition`] and literal rendering to
//! [`Value::escape`]. Dispatch lives in [`crate::client`] and
//! [`crate::transaction`].
//!
//! Firebird quirks handled here: `FIRST n SKIP m` pagination, the
//! `UPDATE OR INSERT INTO` upsert verb, and multi-row inserts expressed as
//! `UNION ALL` of `SELECT ... FROM RDB$DATABASE` (the dialect has no
//! multi-VALUES insert).

use crate::sql::condition::Filter;
use crate::sql::value::Value;

/// A parameter substituted into a [`Template`].
#[derive(Debug, Clone)]
pub enum SqlParam {
    /// A filter expression, compiled to a boolean clause.
    Filter(Filter),
    /// A scalar, rendered as an escaped literal.
    Value(Value),
    /// A fragment the caller has already escaped, spliced in verbatim.
    Raw(String),
}

#[derive(Debug, Clone)]
enum Piece {
    Text(String),
    Param(SqlParam),
}

/// A select statement composed from literal text interleaved with typed
/// parameters.
///
/// ```
/// use firebird_query::sql::{Template, Filter};
///
/// let sql = Template::new()
///     .text("SELECT * FROM USERS WHERE ")
///     .filter(Filter::field("NAME", "Jane"))
///     .render();
/// assert_eq!(sql, "SELECT * FROM USERS WHERE NAME = 'Jane'");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Template {
    pieces: Vec<Piece>,
}

impl Template {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a literal text fragment.
    pub fn text(mut self, fragment: impl Into<String>) -> Self {
        self.pieces.push(Piece::Text(fragment.into()));
        self
    }

    /// Append a filter expression, compiled to a boolean clause.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.pieces.push(Piece::Param(SqlParam::Filter(filter)));
        self
    }

    /// Append a scalar, rendered as an escaped literal.
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.pieces
            .push(Piece::Param(SqlParam::Value(value.into())));
        self
    }

    /// Append a pre-escaped fragment verbatim. The caller is responsible for
    /// its safety.
    pub fn raw(mut self, fragment: impl Into<String>) -> Self {
        self.pieces.push(Piece::Param(SqlParam::Raw(fragment.into())));
        self
    }

    /// Render the composed SQL text.
    ///
    /// A scalar in trailing position substitutes nothing: the last literal
    /// fragment never receives a trailing value.
    pub fn render(&self) -> String {
        let mut sql = String::new();
        for (i, piece) in self.pieces.iter().enumerate() {
            let is_last = i == self.pieces.len() - 1;
            match piece {
                Piece::Text(t) => sql.push_str(t),
                Piece::Param(SqlParam::Filter(f)) => sql.push_str(&f.to_sql()),
                Piece::Param(SqlParam::Raw(r)) => sql.push_str(r),
                Piece::Param(SqlParam::Value(_)) if is_last => {}
                Piece::Param(SqlParam::Value(v)) => sql.push_str(&v.escape()),
            }
        }
        sql
    }
}

/// Wrap an already-built select in Firebird's `FIRST n SKIP m` pagination.
///
/// Pages are 1-indexed; `skip = take * (page - 1)`. Trailing statement
/// terminators on the inner query are stripped before wrapping.
pub fn paginate(query: &str, take: u32, page: u32) -> String {
    let skip = take * page.max(1).saturating_sub(1);
    let inner = query.trim_end().trim_end_matches(';');
    format!("SELECT FIRST {take} SKIP {skip} * FROM ({inner});")
}

/// An insertion-ordered column-to-value map for INSERT and UPDATE statements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowValues(Vec<(String, Value)>);

impl RowValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value. Order of insertion is preserved; setting an
    /// existing column overwrites it in place.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        let column = column.into();
        let value = value.into();
        match self.0.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = value,
            None => self.0.push((column, value)),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(c, v)| (c.as_str(), v))
    }

    /// Entries sorted lexicographically by column name.
    fn sorted(&self) -> Vec<(&str, &Value)> {
        let mut entries: Vec<(&str, &Value)> = self.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

impl<C: Into<String>, V: Into<Value>> FromIterator<(C, V)> for RowValues {
    fn from_iter<I: IntoIterator<Item = (C, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(c, v)| (c.into(), v.into()))
                .collect(),
        )
    }
}

fn returning_clause(returning: &[String]) -> String {
    if returning.is_empty() {
        String::new()
    } else {
        format!(" RETURNING {}", returning.join(", "))
    }
}

/// Parameters for a single-row INSERT.
#[derive(Debug, Clone)]
pub struct InsertOne {
    pub table: String,
    pub row: RowValues,
    pub returning: Vec<String>,
}

impl InsertOne {
    pub fn new(table: impl Into<String>, row: RowValues) -> Self {
        Self {
            table: table.into(),
            row,
            returning: Vec::new(),
        }
    }

    pub fn returning(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.returning = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Columns follow the row map's insertion order. Absent values are
    /// retained as NULL: an insert names every supplied column.
    pub fn sql(&self) -> String {
        let columns: Vec<&str> = self.row.iter().map(|(c, _)| c).collect();
        let values: Vec<String> = self.row.iter().map(|(_, v)| v.escape()).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({}){};",
            self.table,
            columns.join(", "),
            values.join(", "),
            returning_clause(&self.returning),
        )
    }
}

/// Parameters for a multi-row INSERT.
#[derive(Debug, Clone)]
pub struct InsertMany {
    pub table: String,
    /// Column names, supplied explicitly rather than inferred from the rows.
    pub columns: Vec<String>,
    pub rows: Vec<RowValues>,
}

impl InsertMany {
    pub fn new(
        table: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
        rows: impl IntoIterator<Item = RowValues>,
    ) -> Self {
        Self {
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows: rows.into_iter().collect(),
        }
    }

    /// Number of rows this statement inserts.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Columns are sorted lexicographically, and each row's values are
    /// re-sorted by their own key names to align with the sorted column list.
    /// This guards against row maps built in differing insertion orders.
    pub fn sql(&self) -> String {
        let mut columns = self.columns.clone();
        columns.sort();

        let selects: Vec<String> = self
            .rows
            .iter()
            .map(|row| {
                let values: Vec<String> =
                    row.sorted().iter().map(|(_, v)| v.escape()).collect();
                format!("SELECT {} FROM RDB$DATABASE", values.join(", "))
            })
            .collect();

        format!(
            "INSERT INTO {} ({}) {};",
            self.table,
            columns.join(", "),
            selects.join(" UNION ALL "),
        )
    }
}

/// Parameters for a filtered UPDATE.
#[derive(Debug, Clone)]
pub struct UpdateOne {
    pub table: String,
    pub row: RowValues,
    pub filter: Filter,
    pub returning: Vec<String>,
}

impl UpdateOne {
    pub fn new(table: impl Into<String>, row: RowValues, filter: Filter) -> Self {
        Self {
            table: table.into(),
            row,
            filter,
            returning: Vec::new(),
        }
    }

    pub fn returning(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.returning = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Absent-valued entries are dropped from the SET list: an update never
    /// assigns a column the caller did not supply.
    pub fn sql(&self) -> String {
        let assignments: Vec<String> = self
            .row
            .iter()
            .filter(|(_, v)| !v.is_absent())
            .map(|(c, v)| format!("{c} = {}", v.escape()))
            .collect();
        format!(
            "UPDATE {} SET {} WHERE {}{};",
            self.table,
            assignments.join(", "),
            self.filter.to_sql(),
            returning_clause(&self.returning),
        )
    }
}

/// Parameters for Firebird's native upsert.
///
/// `UPDATE OR INSERT INTO` matches on the table's primary or unique key, so
/// there is no WHERE clause.
#[derive(Debug, Clone)]
pub struct UpdateOrInsert {
    pub table: String,
    pub row: RowValues,
    pub returning: Vec<String>,
}

impl UpdateOrInsert {
    pub fn new(table: impl Into<String>, row: RowValues) -> Self {
        Self {
            table: table.into(),
            row,
            returning: Vec::new(),
        }
    }

    pub fn returning(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.returning = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn sql(&self) -> String {
        let columns: Vec<&str> = self.row.iter().map(|(c, _)| c).collect();
        let values: Vec<String> = self.row.iter().map(|(_, v)| v.escape()).collect();
        format!(
            "UPDATE OR INSERT INTO {} ({}) VALUES ({}){};",
            self.table,
            columns.join(", "),
            values.join(", "),
            returning_clause(&self.returning),
        )
    }
}

/// Parameters for a filtered DELETE.
#[derive(Debug, Clone)]
pub struct DeleteOne {
    pub table: String,
    pub filter: Filter,
    pub returning: Vec<String>,
}

impl DeleteOne {
    pub fn new(table: impl Into<String>, filter: Filter) -> Self {
        Self {
            table: table.into(),
            filter,
            returning: Vec::new(),
        }
    }

    pub fn returning(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.returning = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn sql(&self) -> String {
        format!(
            "DELETE FROM {} WHERE {}{};",
            self.table,
            self.filter.to_sql(),
            returning_clause(&self.returning),
        )
    }
}
