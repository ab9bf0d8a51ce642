//! Query expression evaluation for in-memory document filtering.

use std::{collections::HashMap, cmp::Ordering};
use bson::{Bson, Document as BsonDocument, datetime::DateTime};

use tracker_core::{
    query::{QueryVisitor, Expr, FieldOp},
    error::{DocumentStoreError, DocumentStoreResult},
};


/// Type-erased, comparable representation of BSON values.
///
/// Integers of either width compare exactly with each other, and with doubles through
/// [`compare_int_double`], so no two distinct `i64` values ever compare equal. Text and
/// numbers never compare equal to each other.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    DateTime(DateTime),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
    /// Any other BSON type. Equal only to an identical value, never ordered.
    Other(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Int(i64::from(*value)),
            Bson::Int64(value) => Comparable::Int(*value),
            Bson::Double(value) => Comparable::Double(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
            other => Comparable::Other(other),
        }
    }
}

/// Orders an integer against a double without rounding the integer.
fn compare_int_double(int: i64, double: f64) -> Option<Ordering> {
    // 2^63, the first double above every i64
    const BOUND: f64 = 9_223_372_036_854_775_808.0;

    if double.is_nan() {
        return None;
    }
    if double >= BOUND {
        return Some(Ordering::Less);
    }
    if double < -BOUND {
        return Some(Ordering::Greater);
    }

    let whole = double.trunc();
    // In range, and integral, so the cast is exact.
    match int.cmp(&(whole as i64)) {
        Ordering::Equal => whole.partial_cmp(&double),
        unequal => Some(unequal),
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Int(a), Comparable::Int(b)) => a == b,
            (Comparable::Double(a), Comparable::Double(b)) => a == b,
            (Comparable::Int(a), Comparable::Double(b)) | (Comparable::Double(b), Comparable::Int(a)) => {
                compare_int_double(*a, *b) == Some(Ordering::Equal)
            }
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            (Comparable::Other(a), Comparable::Other(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Int(a), Comparable::Int(b)) => a.partial_cmp(b),
            (Comparable::Double(a), Comparable::Double(b)) => a.partial_cmp(b),
            (Comparable::Int(a), Comparable::Double(b)) => compare_int_double(*a, *b),
            (Comparable::Double(a), Comparable::Int(b)) => compare_int_double(*b, *a).map(Ordering::reverse),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}


pub(crate) struct DocumentEvaluator<'a> {
    document: &'a BsonDocument,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a BsonDocument) -> Self {
        Self { document }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> DocumentStoreResult<bool> {
        self.visit_expr(expr)
    }

    /// Returns the keys of the documents that satisfy `expr`.
    ///
    /// An expression the evaluator rejects (such as `In` with a non-array operand) fails
    /// the whole query rather than silently matching nothing.
    pub fn matching_keys<K: Clone>(
        documents: impl IntoIterator<Item = (&'a K, &'a Bson)>,
        expr: &Expr,
    ) -> DocumentStoreResult<Vec<K>>
    where
        K: 'a,
    {
        let mut keys = Vec::new();

        for (key, document) in documents {
            let Some(document) = document.as_document() else {
                continue;
            };

            if DocumentEvaluator::new(document).evaluate(expr)? {
                keys.push(key.clone());
            }
        }

        Ok(keys)
    }
}

impl<'a> QueryVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(!self.visit_expr(expr)?)
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(self.document.get(field).is_some() == should_exist)
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        // A missing field reads as null for equality and membership, as in MongoDB, so
        // `ne` matches documents without the field and `eq(field, null)` matches them too.
        let left = match self.document.get(field) {
            Some(field_value) => Comparable::from(field_value),
            None if matches!(op, FieldOp::Eq | FieldOp::Ne | FieldOp::In) => Comparable::Null,
            None => return Ok(false),
        };
        let right = Comparable::from(value);

        match op {
            FieldOp::Eq => Ok(left == right),
            FieldOp::Ne => Ok(left != right),
            FieldOp::Gt | FieldOp::Gte | FieldOp::Lt | FieldOp::Lte => {
                Ok(match left.partial_cmp(&right) {
                    Some(Ordering::Greater) => matches!(op, FieldOp::Gt | FieldOp::Gte),
                    Some(Ordering::Equal) => matches!(op, FieldOp::Gte | FieldOp::Lte),
                    Some(Ordering::Less) => matches!(op, FieldOp::Lt | FieldOp::Lte),
                    None => false,
                })
            },
            FieldOp::ArrayContains => match left {
                Comparable::Array(items) => Ok(items.iter().any(|item| item == &right)),
                _ => Ok(false),
            },
            FieldOp::In => match right {
                Comparable::Array(candidates) => Ok(candidates.iter().any(|candidate| candidate == &left)),
                _ => Err(DocumentStoreError::InvalidQuery(
                    format!("`in` filter on {field} requires an array operand"),
                )),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{doc, oid::ObjectId};
    use tracker_core::query::Filter;

    fn ada() -> BsonDocument {
        doc! { "ID": 1_i64, "name": "Ada", "illnesses": ["TB", "Bronchitis"] }
    }

    fn matches(expr: Expr) -> bool {
        let document = ada();
        DocumentEvaluator::new(&document).evaluate(&expr).unwrap()
    }

    #[test]
    fn test_numeric_equality_ignores_integer_width() {
        assert!(matches(Filter::eq("ID", 1_i32)));
        assert!(matches(Filter::eq("ID", 1.0)));
        assert!(!matches(Filter::eq("ID", 1.5)));
        assert!(!matches(Filter::eq("ID", 2_i64)));
    }

    #[test]
    fn test_large_integers_compare_exactly() {
        let first = doc! { "ID": 9_007_199_254_740_992_i64 };
        let second = doc! { "ID": 9_007_199_254_740_993_i64 };
        let filter = Filter::eq("ID", 9_007_199_254_740_992_i64);

        assert!(DocumentEvaluator::new(&first).evaluate(&filter).unwrap());
        assert!(!DocumentEvaluator::new(&second).evaluate(&filter).unwrap());
        assert!(
            DocumentEvaluator::new(&second)
                .evaluate(&Filter::gt("ID", 9_007_199_254_740_992_i64))
                .unwrap()
        );
        // 2^53 + 1 has no exact double; the nearest one is 2^53.
        assert!(
            !DocumentEvaluator::new(&second)
                .evaluate(&Filter::eq("ID", 9_007_199_254_740_992.0))
                .unwrap()
        );
        assert!(
            DocumentEvaluator::new(&second)
                .evaluate(&Filter::gt("ID", 9_007_199_254_740_992.0))
                .unwrap()
        );
    }

    #[test]
    fn test_integer_against_double_ordering() {
        assert_eq!(compare_int_double(1, 1.5), Some(Ordering::Less));
        assert_eq!(compare_int_double(2, 1.5), Some(Ordering::Greater));
        assert_eq!(compare_int_double(-1, -1.5), Some(Ordering::Greater));
        assert_eq!(compare_int_double(i64::MAX, 9_223_372_036_854_775_808.0), Some(Ordering::Less));
        assert_eq!(compare_int_double(i64::MIN, -9_223_372_036_854_775_808.0), Some(Ordering::Equal));
        assert_eq!(compare_int_double(0, f64::NAN), None);
    }

    #[test]
    fn test_text_never_equals_a_number() {
        // A text "1" against a stored numeric ID is the classic filter type mismatch.
        assert!(!matches(Filter::eq("ID", "1")));
        assert!(matches(Filter::ne("ID", "1")));
    }

    #[test]
    fn test_range_operators_compare_numbers() {
        assert!(matches(Filter::gte("ID", 1)));
        assert!(matches(Filter::lt("ID", 5)));
        assert!(matches(Filter::lt("ID", 1.5)));
        assert!(!matches(Filter::gt("ID", 1)));
        assert!(!matches(Filter::gt("ward", 1)));
    }

    #[test]
    fn test_missing_fields_read_as_null() {
        assert!(matches(Filter::ne("ward", "North")));
        assert!(matches(Filter::eq("ward", Bson::Null)));
        assert!(matches(Filter::is_in("ward", [Bson::Null])));
        assert!(!matches(Filter::eq("ward", "North")));
        assert!(!matches(Filter::ne("ward", Bson::Null)));
        assert!(!matches(Filter::array_contains("ward", "North")));
    }

    #[test]
    fn test_unsupported_types_are_not_null() {
        let reference = ObjectId::new();
        let document = doc! { "ID": 1_i64, "ref": reference };
        let evaluate = |expr: Expr| DocumentEvaluator::new(&document).evaluate(&expr).unwrap();

        assert!(!evaluate(Filter::eq("ref", Bson::Null)));
        assert!(evaluate(Filter::ne("ref", Bson::Null)));
        assert!(evaluate(Filter::eq("ref", reference)));
        assert!(!evaluate(Filter::eq("ref", ObjectId::new())));
        assert!(!evaluate(Filter::gte("ref", reference)));
    }

    #[test]
    fn test_array_contains_checks_elements() {
        assert!(matches(Filter::array_contains("illnesses", "TB")));
        assert!(!matches(Filter::array_contains("illnesses", "Flu")));
        assert!(!matches(Filter::array_contains("name", "Ada")));
    }

    #[test]
    fn test_in_requires_an_array_operand() {
        assert!(matches(Filter::is_in("ID", [1, 3])));
        assert!(!matches(Filter::is_in("ID", [2, 3])));

        let document = ada();
        let result = DocumentEvaluator::new(&document)
            .evaluate(&Expr::field("ID".into(), FieldOp::In, Bson::Int32(1)));
        assert!(matches!(result, Err(DocumentStoreError::InvalidQuery(_))));
    }

    #[test]
    fn test_logical_operators_and_existence() {
        assert!(matches(Filter::eq("name", "Ada").and(Filter::exists("illnesses"))));
        assert!(matches(Filter::eq("name", "Bob").or(Filter::not_exists("ward"))));
        assert!(!matches(Filter::eq("name", "Ada").not()));
        assert!(!matches(Filter::eq("ward", "North")));
    }
}
