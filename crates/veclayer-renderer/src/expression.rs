use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use veclayer_core::feature::AttributeValue;

use crate::context::ExpressionScope;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Boolean filter evaluated against the expression scope of the current feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Compare {
        field: String,
        op: CompareOp,
        value: AttributeValue,
    },
    IsNull(String),
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
    Not(Box<Expression>),
}

impl Expression {
    pub fn compare(field: &str, op: CompareOp, value: impl Into<AttributeValue>) -> Self {
        Expression::Compare {
            field: field.to_string(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: &str, value: impl Into<AttributeValue>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    pub fn and(self, other: Expression) -> Self {
        Expression::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Expression) -> Self {
        Expression::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        Expression::Not(Box::new(self))
    }

    /// Comparisons involving `Null` are false, as in SQL.
    pub fn evaluate(&self, scope: &ExpressionScope) -> bool {
        match self {
            Expression::Compare { field, op, value } => {
                let actual = scope.value(field);
                if actual.is_null() || value.is_null() {
                    return false;
                }
                match (op, actual.compare(value)) {
                    (CompareOp::Eq, _) => actual.matches(value),
                    (CompareOp::Ne, _) => !actual.matches(value),
                    (CompareOp::Lt, Some(ord)) => ord == Ordering::Less,
                    (CompareOp::Le, Some(ord)) => ord != Ordering::Greater,
                    (CompareOp::Gt, Some(ord)) => ord == Ordering::Greater,
                    (CompareOp::Ge, Some(ord)) => ord != Ordering::Less,
                    (_, None) => false,
                }
            }
            Expression::IsNull(field) => scope.value(field).is_null(),
            Expression::And(a, b) => a.evaluate(scope) && b.evaluate(scope),
            Expression::Or(a, b) => a.evaluate(scope) || b.evaluate(scope),
            Expression::Not(e) => !e.evaluate(scope),
        }
    }

    /// Field names read by the expression, in first-use order.
    pub fn referenced_fields(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields(&self, out: &mut Vec<String>) {
        match self {
            Expression::Compare { field, .. } | Expression::IsNull(field) => {
                if !out.contains(field) {
                    out.push(field.clone());
                }
            }
            Expression::And(a, b) | Expression::Or(a, b) => {
                a.collect_fields(out);
                b.collect_fields(out);
            }
            Expression::Not(e) => e.collect_fields(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veclayer_core::feature::{Feature, Field, FieldType, Fields};

    fn scope(kind: &str, lanes: AttributeValue) -> ExpressionScope {
        let fields = Fields::new(vec![
            Field::new("kind", FieldType::Text),
            Field::new("lanes", FieldType::Integer),
        ]);
        let mut scope = ExpressionScope::new();
        scope.set_feature(&Feature::new(1, None, vec![kind.into(), lanes]), &fields);
        scope
    }

    #[test]
    fn test_compare_and_combinators() {
        let s = scope("motorway", AttributeValue::Int(4));
        let wide = Expression::compare("lanes", CompareOp::Ge, 3i64);
        assert!(wide.evaluate(&s));
        assert!(Expression::eq("kind", "motorway").and(wide.clone()).evaluate(&s));
        assert!(!Expression::eq("kind", "track").evaluate(&s));
        assert!(Expression::eq("kind", "track").or(wide.clone()).evaluate(&s));
        assert!(!wide.negate().evaluate(&s));
    }

    #[test]
    fn test_null_comparisons_are_false() {
        let s = scope("path", AttributeValue::Null);
        assert!(!Expression::compare("lanes", CompareOp::Lt, 2i64).evaluate(&s));
        assert!(!Expression::compare("lanes", CompareOp::Ne, 2i64).evaluate(&s));
        assert!(Expression::IsNull("lanes".into()).evaluate(&s));
    }

    #[test]
    fn test_referenced_fields_deduplicated() {
        let e = Expression::eq("kind", "a")
            .or(Expression::IsNull("lanes".into()))
            .and(Expression::eq("kind", "b"));
        assert_eq!(e.referenced_fields(), vec!["kind", "lanes"]);
    }
}
