//! Column implementation for the column store.
//!
//! A column keeps its entries in three parallel buffers:
//!
//! - `data`: fixed-width slots in value-codec layout, or for strings the
//!   concatenated UTF-8 bytes of every entry
//! - `offsets`: for strings only, the end offset of each entry in `data`
//! - `validity`: presence bitmap, one bit per entry, set when a value is present
//!
//! NULL entries still occupy a slot: zeroed bytes for fixed-width types, an
//! empty range for strings.

use std::iter::FusedIterator;

use crate::columnar::codec::{self, Reader};
use crate::columnar::schema::{DataType, Field};
use crate::columnar::value::Value;
use crate::error::{Error, Result};

/// A named, typed, append-only column.
#[derive(Debug, Clone)]
pub struct Column {
    field: Field,
    data: Vec<u8>,
    offsets: Vec<u64>,
    validity: Vec<u8>,
    len: usize,
}

impl Column {
    /// Create an empty column.
    pub fn new(name: &str, data_type: DataType) -> Self {
        Column {
            field: Field::new(name, data_type),
            data: Vec::new(),
            offsets: Vec::new(),
            validity: Vec::new(),
            len: 0,
        }
    }

    /// Get the column name.
    pub fn name(&self) -> &str {
        &self.field.name
    }

    /// Get the data type of the column.
    pub fn data_type(&self) -> DataType {
        self.field.data_type
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Number of entries, NULLs included.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of NULL entries.
    pub fn null_count(&self) -> usize {
        let set: usize = self.validity.iter().map(|b| b.count_ones() as usize).sum();
        self.len - set
    }

    /// Append a value or NULL.
    ///
    /// Fails with `TypeMismatch` when the column type does not accept the
    /// value's type; nothing is appended in that case.
    pub fn append(&mut self, value: &Value) -> Result<()> {
        let value = self.check(value)?;
        match value {
            None => self.append_null(),
            Some(v) => self.append_checked(&v),
        }
        Ok(())
    }

    /// Append a NULL entry.
    pub fn append_null(&mut self) {
        match self.field.data_type.size() {
            Some(size) => self.data.resize(self.data.len() + size, 0),
            None => self.offsets.push(self.data.len() as u64),
        }
        self.push_validity(false);
    }

    /// Validate `value` against the column type without mutating.
    ///
    /// Returns the value converted to the column type, or `None` for NULL.
    pub(crate) fn check(&self, value: &Value) -> Result<Option<Value>> {
        let found = match value.data_type() {
            None => return Ok(None),
            Some(t) => t,
        };
        let converted = value
            .coerce(self.field.data_type)
            .ok_or_else(|| Error::TypeMismatch {
                column: self.field.name.clone(),
                expected: self.field.data_type,
                found,
            })?;
        if let Value::String(s) = &converted {
            if u32::try_from(s.len()).is_err() {
                return Err(Error::InvalidArgument(format!(
                    "string of {} bytes for column '{}' exceeds the {} byte limit",
                    s.len(),
                    self.field.name,
                    u32::MAX
                )));
            }
        }
        Ok(Some(converted))
    }

    /// Append a value already converted by `check`.
    pub(crate) fn append_checked(&mut self, value: &Value) {
        match value {
            Value::String(s) => {
                self.data.extend_from_slice(s.as_bytes());
                self.offsets.push(self.data.len() as u64);
            }
            Value::Null => {
                self.append_null();
                return;
            }
            // Fixed-width values never fail to encode.
            v => {
                let _ = codec::encode(v, &mut self.data);
            }
        }
        self.push_validity(true);
    }

    fn push_validity(&mut self, present: bool) {
        let byte_index = self.len / 8;
        let bit_index = self.len % 8;

        if byte_index >= self.validity.len() {
            self.validity.push(0);
        }
        if present {
            self.validity[byte_index] |= 1 << bit_index;
        }
        self.len += 1;
    }

    /// Check if the entry at `row` is NULL; `None` when out of range.
    pub fn is_null(&self, row: usize) -> Option<bool> {
        if row >= self.len {
            return None;
        }
        Some(!self.is_present(row))
    }

    #[inline]
    fn is_present(&self, row: usize) -> bool {
        (self.validity[row / 8] >> (row % 8)) & 1 == 1
    }

    /// Raw payload bytes of the entry at `row`.
    ///
    /// Fixed-width entries are in value-codec layout; string entries are the
    /// UTF-8 bytes without length prefix. NULL entries yield the placeholder.
    pub(crate) fn slot(&self, row: usize) -> &[u8] {
        match self.field.data_type.size() {
            Some(size) => &self.data[row * size..(row + 1) * size],
            None => {
                let start = if row == 0 { 0 } else { self.offsets[row - 1] as usize };
                let end = self.offsets[row] as usize;
                &self.data[start..end]
            }
        }
    }

    /// Get the entry at `row`; `Value::Null` for NULL, `None` when out of range.
    pub fn get(&self, row: usize) -> Option<Value> {
        if row >= self.len {
            return None;
        }
        if !self.is_present(row) {
            return Some(Value::Null);
        }
        let bytes = self.slot(row);
        let value = match self.field.data_type {
            DataType::String => Value::String(String::from_utf8_lossy(bytes).into_owned()),
            t => Reader::new(bytes).read_value(t).ok()?,
        };
        Some(value)
    }

    /// Get an i32 value at the given row index.
    pub fn get_i32(&self, row: usize) -> Option<i32> {
        self.get(row).and_then(|v| v.as_i32())
    }

    /// Get an i64 value at the given row index.
    pub fn get_i64(&self, row: usize) -> Option<i64> {
        match self.field.data_type {
            DataType::Int64 => self.get(row).and_then(|v| v.as_i64()),
            _ => None,
        }
    }

    /// Get an f32 value at the given row index.
    pub fn get_f32(&self, row: usize) -> Option<f32> {
        self.get(row).and_then(|v| v.as_f32())
    }

    /// Get an f64 value at the given row index.
    pub fn get_f64(&self, row: usize) -> Option<f64> {
        match self.field.data_type {
            DataType::Float64 => self.get(row).and_then(|v| v.as_f64()),
            _ => None,
        }
    }

    /// Get a string value at the given row index without copying.
    pub fn get_str(&self, row: usize) -> Option<&str> {
        if self.field.data_type != DataType::String || self.is_null(row)? {
            return None;
        }
        std::str::from_utf8(self.slot(row)).ok()
    }

    /// Get a boolean value at the given row index.
    pub fn get_bool(&self, row: usize) -> Option<bool> {
        self.get(row).and_then(|v| v.as_bool())
    }

    /// Create an iterator over the column.
    pub fn iter(&self) -> ColumnIterator<'_> {
        ColumnIterator {
            column: self,
            current_row: 0,
        }
    }

    /// All entries in order, NULLs as `Value::Null`.
    pub fn values(&self) -> Vec<Value> {
        self.iter().collect()
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field && self.len == other.len && self.iter().eq(other.iter())
    }
}

/// Iterator over a column.
pub struct ColumnIterator<'a> {
    column: &'a Column,
    current_row: usize,
}

impl<'a> Iterator for ColumnIterator<'a> {
    type Item = Value;

    fn next(&mut self) -> Option<Self::Item> {
        let value = self.column.get(self.current_row)?;
        self.current_row += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.column.len - self.current_row;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ColumnIterator<'_> {}

impl FusedIterator for ColumnIterator<'_> {}

impl<'a> IntoIterator for &'a Column {
    type Item = Value;
    type IntoIter = ColumnIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_width_entries_share_codec_layout() {
        let mut col = Column::new("n", DataType::Int32);
        col.append(&Value::Int32(-2)).unwrap();
        col.append(&Value::Null).unwrap();
        col.append(&Value::Int32(7)).unwrap();

        assert_eq!(col.len(), 3);
        assert_eq!(col.slot(0), (-2i32).to_le_bytes());
        assert_eq!(col.slot(1), [0, 0, 0, 0]);
        assert_eq!(col.values(), vec![Value::Int32(-2), Value::Null, Value::Int32(7)]);
        assert_eq!(col.null_count(), 1);
    }

    #[test]
    fn string_entries_use_offsets() {
        let mut col = Column::new("s", DataType::String);
        col.append(&Value::from("ab")).unwrap();
        col.append(&Value::Null).unwrap();
        col.append(&Value::from("")).unwrap();
        col.append(&Value::from("cde")).unwrap();

        assert_eq!(col.get_str(0), Some("ab"));
        assert_eq!(col.get_str(1), None);
        assert_eq!(col.is_null(1), Some(true));
        assert_eq!(col.get_str(2), Some(""));
        assert_eq!(col.is_null(2), Some(false));
        assert_eq!(col.get_str(3), Some("cde"));
        assert_eq!(col.slot(1), b"");
    }

    #[test]
    fn mismatch_leaves_column_untouched() {
        let mut col = Column::new("flag", DataType::Bool);
        col.append(&Value::Bool(true)).unwrap();

        let err = col.append(&Value::Int32(1)).unwrap_err();
        match err {
            Error::TypeMismatch { column, expected, found } => {
                assert_eq!(column, "flag");
                assert_eq!(expected, DataType::Bool);
                assert_eq!(found, DataType::Int32);
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(col.len(), 1);
        assert_eq!(col.values(), vec![Value::Bool(true)]);
    }

    #[test]
    fn widening_stores_column_type() {
        let mut col = Column::new("big", DataType::Int64);
        col.append(&Value::Int32(-5)).unwrap();
        assert_eq!(col.get(0), Some(Value::Int64(-5)));
        assert_eq!(col.get_i64(0), Some(-5));
    }

    #[test]
    fn bitmap_crosses_byte_boundaries() {
        let mut col = Column::new("b", DataType::Bool);
        for i in 0..20 {
            if i % 3 == 0 {
                col.append_null();
            } else {
                col.append(&Value::Bool(i % 2 == 0)).unwrap();
            }
        }
        assert_eq!(col.len(), 20);
        assert_eq!(col.null_count(), 7);
        for i in 0..20 {
            assert_eq!(col.is_null(i), Some(i % 3 == 0), "row {}", i);
        }
        assert_eq!(col.is_null(20), None);
        assert_eq!(col.get(20), None);
    }

    #[test]
    fn iterator_reports_exact_size() {
        let mut col = Column::new("f", DataType::Float64);
        col.append(&Value::Float64(1.5)).unwrap();
        col.append(&Value::Null).unwrap();

        let mut iter = col.iter();
        assert_eq!(iter.len(), 2);
        assert_eq!(iter.next(), Some(Value::Float64(1.5)));
        assert_eq!(iter.len(), 1);
        assert_eq!(iter.next(), Some(Value::Null));
        assert_eq!(iter.next(), None);
    }
}
