//! Query construction and filtering API for document stores.
//!
//! A [`Query`] selects documents from one collection by a filter expression. There is no
//! sorting or paging: backends return every match, in whatever order they hold them.
//!
//! # Query Building
//!
//! ```ignore
//! use tracker_core::query::{Query, Filter};
//!
//! let query = Query::builder()
//!     .filter(Filter::eq("ID", 1))
//!     .build();
//! ```
//!
//! # Filter Expression API
//!
//! The [`Filter`] struct provides static methods for building filter expressions:
//!
//! - Comparison: `eq`, `ne`, `gt`, `gte`, `lt`, `lte`
//! - Array: `array_contains`, `is_in`
//! - Existence: `exists`, `not_exists`
//! - Logical: `and`, `or`
//!
//! Comparisons are type-strict between text and numbers: `Filter::eq("ID", "1")` never
//! matches a document whose `ID` is the number `1`.

use bson::Bson;

use crate::error::DocumentStoreError;

/// How a field is compared with the operand of an [`Expr::Field`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    /// The field is an array holding the operand as an element.
    ArrayContains,
    /// The operand is an array and the field equals one of its elements.
    In,
}

/// A filter expression for querying documents.
///
/// # Example
///
/// ```ignore
/// use tracker_core::query::Filter;
///
/// let expr = Filter::and(vec![
///     Filter::eq("name", "Ada"),
///     Filter::array_contains("illnesses", "TB"),
/// ]);
/// ```
#[derive(Debug, Clone)]
pub enum Expr {
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    /// Field name and whether it must be present (`true`) or absent (`false`).
    Exists(String, bool),
    Field {
        field: String,
        op: FieldOp,
        value: Bson,
    },
}

impl Expr {
    pub fn field(field: String, op: FieldOp, value: Bson) -> Self {
        Expr::Field { field, op, value }
    }

    /// Conjunction with `other`, flattened into an existing `And`.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }

    /// Disjunction with `other`, flattened into an existing `Or`.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut list) => {
                list.push(other);
                Expr::Or(list)
            }
            _ => Expr::Or(vec![self, other]),
        }
    }

    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }
}

/// A structured query for retrieving documents from a collection.
///
/// A query without a filter matches every document in the collection.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filter: Option<Expr>,
}

impl Query {
    /// Matches every document.
    pub fn new() -> Self {
        Query { filter: None }
    }

    /// Creates a query matching documents that satisfy `filter`.
    pub fn filtered(filter: Expr) -> Self {
        Query { filter: Some(filter) }
    }

    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }
}

/// Shorthand constructors for [`Expr`].
pub struct Filter;

impl Filter {
    /// `field == value`, type-strict between text and numbers.
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Eq, value.into())
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Ne, value.into())
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gt, value.into())
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gte, value.into())
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Lt, value.into())
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Lte, value.into())
    }

    /// Matches documents whose array field holds `value` as an element.
    pub fn array_contains(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::ArrayContains, value.into())
    }

    /// Matches documents whose field equals any of `values`.
    pub fn is_in<V: Into<Bson>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Expr {
        Expr::field(
            field.into(),
            FieldOp::In,
            Bson::Array(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), true)
    }

    pub fn not_exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), false)
    }

    /// All of `exprs` must match. An empty list matches everything.
    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }

    /// Any of `exprs` must match. An empty list matches nothing.
    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(exprs.into_iter().collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    pub fn new() -> Self {
        QueryBuilder { query: Query::default() }
    }

    /// Adds a filter expression. Repeated calls are combined with logical AND.
    pub fn filter(mut self, filter: Expr) -> Self {
        self.query.filter = Some(match self.query.filter.take() {
            Some(existing) => existing.and(filter),
            None => filter,
        });
        self
    }

    pub fn build(self) -> Query {
        self.query
    }
}

/// Walks a filter expression. Backends implement it to evaluate or translate filters.
pub trait QueryVisitor {
    type Output;
    type Error: Into<DocumentStoreError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error>;
    fn visit_exists(
        &mut self,
        field: &str,
        should_exist: bool,
    ) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Not(expr) => self.visit_not(expr),
            Expr::Exists(field, should_exist) => self.visit_exists(field, *should_exist),
            Expr::Field { field, op, value } => self.visit_field(field, op, value),
        }
    }
}
