//! # ColumnDB
//!
//! `columndb` is a small embedded column store that keeps a table of typed,
//! nullable columns in memory and persists it as a single binary file.
//!
//! ## Features
//!
//! - Six column types: `int32`, `int64`, `float32`, `float64`, `string`, `bool`
//! - NULL tracking per entry with a presence bitmap
//! - Strict type checks on every insert, with lossless widening only
//! - Bit-exact round trips, NaN payloads and negative zero included
//! - Atomic saves through a temporary file and rename
//! - Checksummed files, loaded through a read-only memory map
//!
//! ## Example
//!
//! ```
//! use columndb::{Database, DataType, Value};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = tempfile::tempdir()?;
//! let path = dir.path().join("people.cdb");
//!
//! let mut db = Database::new();
//! db.add_column("id", DataType::Int64)?;
//! db.add_column("name", DataType::String)?;
//! db.add_column("score", DataType::Float64)?;
//!
//! db.insert_row(vec![Value::from(1i64), Value::from("Alice"), Value::from(95.5)])?;
//! db.insert_row(vec![Value::from(2i64), Value::from("Bob"), Value::Null])?;
//! db.save(&path)?;
//!
//! let loaded = Database::load(&path)?;
//! assert_eq!(loaded.get_num_rows(), 2);
//! assert_eq!(
//!     loaded.get_column_data("score")?,
//!     vec![Value::Float64(95.5), Value::Null]
//! );
//! # Ok(())
//! # }
//! ```

pub mod columnar;
pub mod error;
pub mod mmap;
pub mod platform;
pub mod utils;

pub use columnar::{Column, DataType, Database, Field, Schema, StorageOptions, Value};
pub use error::{Error, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Conventional extension of database files.
pub const FILE_EXTENSION: &str = "cdb";
