//! Query translation from filter expressions to MongoDB query documents.

use bson::{Document as BsonDocument, Bson, doc};

use tracker_core::{
    query::{QueryVisitor, Expr, FieldOp},
    error::DocumentStoreError,
};

use crate::sanitizer::KeySanitizer;


/// Translates filter expressions into MongoDB's native BSON query syntax.
///
/// Field names go through [`KeySanitizer`] so they address the escaped keys actually
/// stored in MongoDB.
pub(crate) struct MongoQueryTranslator;

impl QueryVisitor for MongoQueryTranslator {
    type Output = BsonDocument;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        // MongoDB rejects an empty $and.
        if exprs.is_empty() {
            return Ok(BsonDocument::new());
        }

        Ok(doc! {
            "$and": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        if exprs.is_empty() {
            return Ok(doc! { "$expr": false });
        }

        Ok(doc! {
            "$or": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        // $not only applies to field operators; $nor negates a whole expression.
        let negated = self.visit_expr(expr)?;

        Ok(doc! {
            "$nor": [negated],
        })
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        let field = KeySanitizer::sanitize_string(field);

        Ok(doc! {
            field: { "$exists": should_exist },
        })
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        let condition = match op {
            FieldOp::Eq => doc! { "$eq": value },
            FieldOp::Ne => doc! { "$ne": value },
            FieldOp::Gt => doc! { "$gt": value },
            FieldOp::Gte => doc! { "$gte": value },
            FieldOp::Lt => doc! { "$lt": value },
            FieldOp::Lte => doc! { "$lte": value },
            FieldOp::ArrayContains => doc! { "$elemMatch": { "$eq": value } },
            FieldOp::In => match value {
                Bson::Array(values) => doc! { "$in": values },
                _ => return Err(DocumentStoreError::InvalidQuery(
                    format!("`in` filter on {field} requires an array operand"),
                )),
            },
        };
        let field = KeySanitizer::sanitize_string(field);

        Ok(doc! { field: condition })
    }
}
