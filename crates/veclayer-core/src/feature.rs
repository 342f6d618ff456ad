use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Geometry;

/// Feature identifier, unique within a layer.
pub type FeatureId = i64;

/// A set of feature identifiers (e.g. the current selection).
pub type FeatureIds = HashSet<FeatureId>;

/// A single attribute value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Text(String),
}

impl AttributeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(v) => Some(*v as f64),
            AttributeValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Loose equality: integers and doubles compare numerically.
    pub fn matches(&self, other: &AttributeValue) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }

    /// Ordering used by filter comparisons. `Null` and mixed kinds are unordered.
    pub fn compare(&self, other: &AttributeValue) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
            return a.partial_cmp(&b);
        }
        match (self, other) {
            (AttributeValue::Text(a), AttributeValue::Text(b)) => Some(a.cmp(b)),
            (AttributeValue::Bool(a), AttributeValue::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => write!(f, "NULL"),
            AttributeValue::Bool(v) => write!(f, "{v}"),
            AttributeValue::Int(v) => write!(f, "{v}"),
            AttributeValue::Double(v) => write!(f, "{v}"),
            AttributeValue::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Double(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    Bool,
    Integer,
    Double,
    Text,
}

/// A layer attribute column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
}

impl Field {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
        }
    }
}

/// The ordered field list of a layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fields {
    fields: Vec<Field>,
}

impl Fields {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One vector record: identifier, optional geometry and attribute values by field index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    pub geometry: Option<Geometry>,
    pub attributes: Vec<AttributeValue>,
}

impl Feature {
    pub fn new(id: FeatureId, geometry: Option<Geometry>, attributes: Vec<AttributeValue>) -> Self {
        Self {
            id,
            geometry,
            attributes,
        }
    }

    pub fn has_geometry(&self) -> bool {
        self.geometry.is_some()
    }

    /// Attribute at `index`; missing columns read as `Null`.
    pub fn attribute(&self, index: usize) -> &AttributeValue {
        const NULL: AttributeValue = AttributeValue::Null;
        self.attributes.get(index).unwrap_or(&NULL)
    }

    /// Keep only the attributes at `indices`, nulling the others.
    pub fn project(&mut self, indices: &[usize]) {
        for (i, value) in self.attributes.iter_mut().enumerate() {
            if !indices.contains(&i) {
                *value = AttributeValue::Null;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_values_compare_across_kinds() {
        let a = AttributeValue::Int(3);
        let b = AttributeValue::Double(3.0);
        assert!(a.matches(&b));
        assert_eq!(
            AttributeValue::Int(2).compare(&AttributeValue::Double(2.5)),
            Some(Ordering::Less)
        );
        assert_eq!(AttributeValue::Null.compare(&AttributeValue::Int(1)), None);
    }

    #[test]
    fn test_fields_lookup() {
        let fields = Fields::new(vec![
            Field::new("name", FieldType::Text),
            Field::new("population", FieldType::Integer),
        ]);
        assert_eq!(fields.index_of("population"), Some(1));
        assert_eq!(fields.index_of("missing"), None);
        assert_eq!(fields.names().collect::<Vec<_>>(), vec!["name", "population"]);
    }

    #[test]
    fn test_feature_projection_nulls_unrequested() {
        let mut feature = Feature::new(
            1,
            None,
            vec!["a".into(), AttributeValue::Int(5), AttributeValue::Double(1.5)],
        );
        feature.project(&[1]);
        assert!(feature.attribute(0).is_null());
        assert_eq!(feature.attribute(1), &AttributeValue::Int(5));
        assert!(feature.attribute(2).is_null());
        assert!(feature.attribute(10).is_null());
    }
}
