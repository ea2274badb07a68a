//! The database: an ordered set of columns and the unit of persistence.

use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::columnar::column::Column;
use crate::columnar::schema::{DataType, Field, Schema};
use crate::columnar::storage::{self, StorageOptions};
use crate::columnar::value::Value;
use crate::error::{Error, Result};

/// An in-memory columnar database.
///
/// Columns advance independently: `insert` appends to one column only, so
/// columns may have different lengths. `get_num_rows` reports the longest
/// column; `insert_row` appends to all columns at once.
#[derive(Debug, Clone, Default)]
pub struct Database {
    /// Column names and types, in column order
    schema: Schema,

    /// Columns, parallel to `schema`
    columns: Vec<Column>,
}

impl Database {
    /// Create an empty database.
    pub fn new() -> Self {
        Database::default()
    }

    /// Add an empty column.
    ///
    /// Fails with `DuplicateColumn` if the name is taken and with
    /// `InvalidArgument` if it is empty.
    pub fn add_column(&mut self, name: &str, data_type: DataType) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidArgument("column name must not be empty".into()));
        }
        if !self.schema.push(Field::new(name, data_type)) {
            return Err(Error::DuplicateColumn(name.to_string()));
        }
        self.columns.push(Column::new(name, data_type));
        debug!(column = name, data_type = %data_type, "added column");
        Ok(())
    }

    /// Add a column from its numeric type tag.
    ///
    /// Fails with `InvalidType` for tags outside the supported types.
    pub fn add_column_with_tag(&mut self, name: &str, tag: u8) -> Result<()> {
        let data_type = DataType::try_from(tag)?;
        self.add_column(name, data_type)
    }

    /// Append a value or NULL to one column.
    ///
    /// Fails with `UnknownColumn` if the column does not exist and with
    /// `TypeMismatch` if the value's type is not accepted by the column.
    /// On failure nothing is appended.
    pub fn insert(&mut self, column: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        self.column_mut(column)?.append(&value)
    }

    /// Append a NULL to one column.
    pub fn insert_null(&mut self, column: &str) -> Result<()> {
        self.column_mut(column)?.append_null();
        Ok(())
    }

    /// Append one entry to every column, in column order.
    ///
    /// All values are validated before anything is appended, so a failure
    /// leaves every column unchanged.
    pub fn insert_row<I, V>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.len() != self.columns.len() {
            return Err(Error::InvalidArgument(format!(
                "row has {} values but the database has {} columns",
                values.len(),
                self.columns.len()
            )));
        }

        let checked = self
            .columns
            .iter()
            .zip(&values)
            .map(|(col, value)| col.check(value))
            .collect::<Result<Vec<_>>>()?;

        for (col, value) in self.columns.iter_mut().zip(checked) {
            match value {
                Some(v) => col.append_checked(&v),
                None => col.append_null(),
            }
        }
        Ok(())
    }

    /// All stored entries of a column, NULLs as `Value::Null`.
    pub fn get_column_data(&self, column: &str) -> Result<Vec<Value>> {
        Ok(self.column_ref(column)?.values())
    }

    /// Like `get_column_data`, but padded with NULLs up to `get_num_rows`.
    pub fn get_column_data_padded(&self, column: &str) -> Result<Vec<Value>> {
        let mut values = self.get_column_data(column)?;
        values.resize(self.get_num_rows(), Value::Null);
        Ok(values)
    }

    /// Length of the longest column; 0 when there are no columns.
    pub fn get_num_rows(&self) -> usize {
        self.columns.iter().map(Column::len).max().unwrap_or(0)
    }

    /// Number of columns.
    pub fn get_num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Column names and types, in column order.
    pub fn get_schema(&self) -> &Schema {
        &self.schema
    }

    /// Whether columns have different lengths.
    pub fn is_ragged(&self) -> bool {
        let mut lens = self.columns.iter().map(Column::len);
        match lens.next() {
            Some(first) => lens.any(|len| len != first),
            None => false,
        }
    }

    /// Get a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.schema.field_index(name).map(|i| &self.columns[i])
    }

    /// All columns, in column order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.schema.contains_field(name)
    }

    /// Name of the column at `index`.
    pub fn column_name(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(Column::name)
    }

    /// Type of the column at `index`.
    pub fn column_type(&self, index: usize) -> Option<DataType> {
        self.columns.get(index).map(Column::data_type)
    }

    /// Column names, in column order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Every column's entries, in column order.
    pub fn to_columns(&self) -> Vec<(String, Vec<Value>)> {
        self.columns
            .iter()
            .map(|c| (c.name().to_string(), c.values()))
            .collect()
    }

    /// Write the database to `path` with default options.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.save_with(path, &StorageOptions::default())
    }

    /// Write the database to `path`.
    ///
    /// The file is replaced atomically; on failure any previous file at
    /// `path` is left as it was.
    pub fn save_with<P: AsRef<Path>>(&self, path: P, options: &StorageOptions) -> Result<()> {
        storage::save(self, path.as_ref(), options)
    }

    /// Load a database from `path` with default options.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with(path, &StorageOptions::default())
    }

    /// Load a database from `path`.
    ///
    /// Fails with `FileNotFound` if the file does not exist and with
    /// `CorruptData` if its contents are not a well-formed database.
    pub fn load_with<P: AsRef<Path>>(path: P, options: &StorageOptions) -> Result<Self> {
        storage::load(path.as_ref(), options)
    }

    fn column_ref(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }

    fn column_mut(&mut self, name: &str) -> Result<&mut Column> {
        match self.schema.field_index(name) {
            Some(i) => Ok(&mut self.columns[i]),
            None => Err(Error::UnknownColumn(name.to_string())),
        }
    }

    /// Install a fully decoded column. The caller has already registered
    /// its name through `add_column`.
    pub(crate) fn replace_column(&mut self, index: usize, column: Column) {
        self.columns[index] = column;
    }
}

impl PartialEq for Database {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.columns == other.columns
    }
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ColumnDB(rows={}, columns={})",
            self.get_num_rows(),
            self.get_num_columns()
        )
    }
}
