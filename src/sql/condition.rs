//! Filter expressions and the condition compiler.
//!
//! A [`Filter`] is a recursive condition tree: either a list of field
//! conditions joined with AND, or an OR/AND combinator over sub-filters.
//! Combinators and field lists are separate enum variants, so a node can never
//! mix the two, and only the operators the dialect supports are expressible.
//!
//! Absent operands degrade to a neutral no-op clause (`1=1` in AND position,
//! `1=0` in OR position) instead of producing malformed SQL, which lets a
//! filter built from optional inputs skip whatever was not supplied.

use crate::sql::value::Value;

/// A field-scoped comparison operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    Between(Value, Value),
    In(Vec<Value>),
    NotIn(Vec<Value>),
    StartsWith(Value),
    EndsWith(Value),
    Contains(Value),
}

/// The condition attached to one field: a plain equality or an operator set.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Eq(Value),
    Ops(Vec<Op>),
}

/// One field condition inside a [`Filter::Fields`] node.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub(crate) name: String,
    pub(crate) term: Term,
}

impl Field {
    /// `field = value`, or a no-op when the value is absent.
    pub fn eq(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            term: Term::Eq(value.into()),
        }
    }

    /// A field with an explicit operator set, e.g. a range plus an exclusion.
    pub fn ops(name: impl Into<String>, ops: impl IntoIterator<Item = Op>) -> Self {
        Self {
            name: name.into(),
            term: Term::Ops(ops.into_iter().collect()),
        }
    }

    pub fn ne(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::ops(name, [Op::Ne(value.into())])
    }

    pub fn gt(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::ops(name, [Op::Gt(value.into())])
    }

    pub fn gte(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::ops(name, [Op::Gte(value.into())])
    }

    pub fn lt(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::ops(name, [Op::Lt(value.into())])
    }

    pub fn lte(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::ops(name, [Op::Lte(value.into())])
    }

    pub fn between(
        name: impl Into<String>,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> Self {
        Self::ops(name, [Op::Between(from.into(), to.into())])
    }

    pub fn is_in(
        name: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        Self::ops(name, [Op::In(values.into_iter().map(Into::into).collect())])
    }

    pub fn not_in(
        name: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        Self::ops(
            name,
            [Op::NotIn(values.into_iter().map(Into::into).collect())],
        )
    }

    pub fn starts_with(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::ops(name, [Op::StartsWith(value.into())])
    }

    pub fn ends_with(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::ops(name, [Op::EndsWith(value.into())])
    }

    pub fn contains(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::ops(name, [Op::Contains(value.into())])
    }
}

/// A recursive WHERE condition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field conditions, implicitly joined with AND.
    Fields(Vec<Field>),
    /// Sub-filters joined with OR, parenthesized.
    Any(Vec<Filter>),
    /// Sub-filters joined with AND, parenthesized.
    All(Vec<Filter>),
}

impl Filter {
    /// A filter of field conditions joined with AND.
    pub fn fields(fields: impl IntoIterator<Item = Field>) -> Self {
        Filter::Fields(fields.into_iter().collect())
    }

    /// A single-field equality filter.
    pub fn field(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Fields(vec![Field::eq(name, value)])
    }

    /// Sub-filters joined with OR.
    pub fn any(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Any(filters.into_iter().collect())
    }

    /// Sub-filters joined with AND.
    pub fn all(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::All(filters.into_iter().collect())
    }

    /// Compile this filter to a SQL boolean expression with no column prefix.
    pub fn to_sql(&self) -> String {
        compile(self, "", Joiner::And)
    }

    /// Compile this filter with every column name prefixed, e.g. `"u."`.
    pub fn to_sql_prefixed(&self, prefix: &str) -> String {
        compile(self, prefix, Joiner::And)
    }
}

impl From<Field> for Filter {
    fn from(field: Field) -> Self {
        Filter::Fields(vec![field])
    }
}

/// Boolean joiner for a combinator level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Joiner {
    And,
    Or,
}

impl Joiner {
    fn keyword(self) -> &'static str {
        match self {
            Joiner::And => " AND ",
            Joiner::Or => " OR ",
        }
    }

    /// The joiner's identity expression: the clause that leaves an AND or OR
    /// chain unchanged.
    fn identity(self) -> &'static str {
        match self {
            Joiner::And => "1=1",
            Joiner::Or => "1=0",
        }
    }
}

/// The no-op clause for a skipped condition inside a field list. Field
/// conditions are always AND-joined, so the AND identity applies.
const NO_OP: &str = "1=1";

/// Compile a filter expression to a SQL boolean expression.
pub(crate) fn compile(filter: &Filter, prefix: &str, joiner: Joiner) -> String {
    match filter {
        Filter::Fields(fields) => compile_fields(fields, prefix, joiner),
        Filter::Any(subs) => compile_combinator(subs, prefix, Joiner::Or, joiner),
        Filter::All(subs) => compile_combinator(subs, prefix, Joiner::And, joiner),
    }
}

fn compile_combinator(
    subs: &[Filter],
    prefix: &str,
    inner: Joiner,
    enclosing: Joiner,
) -> String {
    if subs.is_empty() {
        return enclosing.identity().to_string();
    }
    let clauses: Vec<String> = subs.iter().map(|f| compile(f, prefix, inner)).collect();
    format!("({})", clauses.join(inner.keyword()))
}

fn compile_fields(fields: &[Field], prefix: &str, joiner: Joiner) -> String {
    // A filter whose single entry carries no value short-circuits to the
    // enclosing joiner's identity, so an empty filter matches everything in
    // AND position and nothing in OR position.
    if let [field] = fields {
        if matches!(&field.term, Term::Eq(v) if v.is_absent()) {
            return joiner.identity().to_string();
        }
    }
    if fields.is_empty() {
        return joiner.identity().to_string();
    }

    let mut clauses = Vec::new();
    for field in fields {
        let column = format!("{prefix}{}", field.name);
        match &field.term {
            Term::Eq(value) => clauses.push(compile_eq(&column, value)),
            Term::Ops(ops) if ops.is_empty() => clauses.push(NO_OP.to_string()),
            Term::Ops(ops) => {
                for op in ops {
                    clauses.push(compile_op(&column, op));
                }
            }
        }
    }
    // Field-to-field conjunction is always AND; only the Any/All combinators
    // change the joiner.
    clauses.join(" AND ")
}

fn compile_eq(column: &str, value: &Value) -> String {
    if value.is_absent() {
        NO_OP.to_string()
    } else {
        format!("{column} = {}", value.escape())
    }
}

fn compile_op(column: &str, op: &Op) -> String {
    match op {
        Op::Ne(v) => compare(column, "!=", v),
        Op::Gt(v) => compare(column, ">", v),
        Op::Gte(v) => compare(column, ">=", v),
        Op::Lt(v) => compare(column, "<", v),
        Op::Lte(v) => compare(column, "<=", v),
        Op::Between(from, to) => {
            if from.is_absent() || to.is_absent() {
                NO_OP.to_string()
            } else {
                format!("{column} BETWEEN {} AND {}", from.escape(), to.escape())
            }
        }
        Op::In(values) => membership(column, "IN", values),
        Op::NotIn(values) => membership(column, "NOT IN", values),
        Op::StartsWith(v) => like(column, v, "", "%"),
        Op::EndsWith(v) => like(column, v, "%", ""),
        Op::Contains(v) => like(column, v, "%", "%"),
    }
}

fn compare(column: &str, op_sql: &str, value: &Value) -> String {
    if value.is_absent() {
        NO_OP.to_string()
    } else {
        format!("{column} {op_sql} {}", value.escape())
    }
}

/// An empty list operand degrades to the no-op clause, never `IN ()`.
fn membership(column: &str, verb: &str, values: &[Value]) -> String {
    if values.is_empty() {
        return NO_OP.to_string();
    }
    let escaped: Vec<String> = values.iter().map(Value::escape).collect();
    format!("{column} {verb} ({})", escaped.join(", "))
}

fn like(column: &str, value: &Value, before: &str, after: &str) -> String {
    match value.pattern_text() {
        Some(text) => {
            let pattern = Value::Text(format!("{before}{text}{after}"));
            format!("{column} LIKE {}", pattern.escape())
        }
        None => NO_OP.to_string(),
    }
}
