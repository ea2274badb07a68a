//! Schema definition for the column store.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Data types supported by the column store.
///
/// The discriminants are the one-byte type tags written to the schema
/// section of a database file.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 32-bit signed integer
    Int32 = 0,

    /// 64-bit signed integer
    Int64 = 1,

    /// 32-bit floating point
    Float32 = 2,

    /// 64-bit floating point
    Float64 = 3,

    /// UTF-8 string (variable length)
    String = 4,

    /// Boolean (1 byte)
    Bool = 5,
}

impl DataType {
    /// All data types, in tag order.
    pub const ALL: [DataType; 6] = [
        DataType::Int32,
        DataType::Int64,
        DataType::Float32,
        DataType::Float64,
        DataType::String,
        DataType::Bool,
    ];

    /// Get the size of the data type in bytes.
    ///
    /// For fixed-size types, returns the size in bytes.
    /// For variable-length types, returns None.
    pub fn size(&self) -> Option<usize> {
        match self {
            DataType::Int32 => Some(4),
            DataType::Int64 => Some(8),
            DataType::Float32 => Some(4),
            DataType::Float64 => Some(8),
            DataType::String => None,
            DataType::Bool => Some(1),
        }
    }

    /// The one-byte tag used on disk.
    #[inline]
    pub fn tag(&self) -> u8 {
        *self as u8
    }

    /// Lower-case type name, as shown by schema listings.
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::String => "string",
            DataType::Bool => "bool",
        }
    }

    /// Check if the data type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Int32 | DataType::Int64 | DataType::Float32 | DataType::Float64
        )
    }

    /// Check if the data type is variable length.
    pub fn is_variable_length(&self) -> bool {
        matches!(self, DataType::String)
    }

    /// Whether a value of type `from` can be stored in a column of this type
    /// without changing its meaning.
    pub fn accepts(&self, from: DataType) -> bool {
        *self == from
            || matches!(
                (self, from),
                (DataType::Int64, DataType::Int32) | (DataType::Float64, DataType::Float32)
            )
    }
}

impl TryFrom<u8> for DataType {
    type Error = Error;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        DataType::ALL
            .get(tag as usize)
            .copied()
            .ok_or(Error::InvalidType(tag))
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| Error::InvalidArgument(format!("unknown data type name: {}", s)))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Field definition in a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field name
    pub name: String,

    /// Field data type
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: &str, data_type: DataType) -> Self {
        Field {
            name: name.to_string(),
            data_type,
        }
    }
}

/// Ordered mapping from column name to data type.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// Fields in column order
    fields: Vec<Field>,

    /// Field name to index mapping
    field_indices: HashMap<String, usize>,
}

impl Schema {
    /// Create a new schema.
    ///
    /// Later fields with a name already seen are ignored.
    pub fn new(fields: Vec<Field>) -> Self {
        let mut schema = Schema::default();
        for field in fields {
            schema.push(field);
        }
        schema
    }

    pub(crate) fn push(&mut self, field: Field) -> bool {
        if self.field_indices.contains_key(&field.name) {
            return false;
        }
        self.field_indices.insert(field.name.clone(), self.fields.len());
        self.fields.push(field);
        true
    }

    /// Get a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.field_indices.get(name).map(|&i| &self.fields[i])
    }

    /// Get a field by index.
    pub fn field_by_index(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// Get the index of a field by name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.field_indices.get(name).copied()
    }

    /// Get the data type of a field by name.
    pub fn data_type(&self, name: &str) -> Option<DataType> {
        self.field(name).map(|f| f.data_type)
    }

    /// All fields, in column order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Iterate over `(name, type)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, DataType)> {
        self.fields.iter().map(|f| (f.name.as_str(), f.data_type))
    }

    /// Get the number of fields in the schema.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Check if the schema has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check if the schema contains a field with the given name.
    pub fn contains_field(&self, name: &str) -> bool {
        self.field_indices.contains_key(name)
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl Eq for Schema {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_follow_declaration_order() {
        for (i, t) in DataType::ALL.iter().enumerate() {
            assert_eq!(t.tag() as usize, i);
            assert_eq!(DataType::try_from(i as u8).unwrap(), *t);
        }
    }

    #[test]
    fn unknown_tag_is_invalid_type() {
        match DataType::try_from(6) {
            Err(Error::InvalidType(6)) => {}
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(DataType::try_from(255), Err(Error::InvalidType(255))));
    }

    #[test]
    fn names_parse_back() {
        for t in DataType::ALL {
            assert_eq!(t.name().parse::<DataType>().unwrap(), t);
        }
        assert_eq!("INT64".parse::<DataType>().unwrap(), DataType::Int64);
        assert!("decimal".parse::<DataType>().is_err());
    }

    #[test]
    fn widening_is_limited() {
        assert!(DataType::Int64.accepts(DataType::Int32));
        assert!(DataType::Float64.accepts(DataType::Float32));
        assert!(!DataType::Int32.accepts(DataType::Int64));
        assert!(!DataType::Float64.accepts(DataType::Int64));
        assert!(!DataType::String.accepts(DataType::Bool));
    }

    #[test]
    fn schema_keeps_insertion_order() {
        let schema = Schema::new(vec![
            Field::new("b", DataType::Bool),
            Field::new("a", DataType::String),
            Field::new("b", DataType::Int32),
        ]);
        assert_eq!(schema.field_count(), 2);
        let names: Vec<_> = schema.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(schema.data_type("b"), Some(DataType::Bool));
        assert_eq!(schema.field_index("a"), Some(1));
    }
}
