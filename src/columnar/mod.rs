//! The column store and its file format.
//!
//! A [`Database`] owns an ordered set of typed [`Column`]s. Values are
//! encoded once, by [`codec`], both in memory and on disk; [`format`] lays
//! those encodings out as a single file and [`storage`] moves the file to
//! and from disk.

pub mod codec;
pub mod column;
pub mod database;
pub mod format;
pub mod schema;
pub mod storage;
pub mod value;

pub use column::{Column, ColumnIterator};
pub use database::Database;
pub use schema::{DataType, Field, Schema};
pub use storage::StorageOptions;
pub use value::Value;
