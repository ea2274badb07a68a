#![allow(dead_code)]

use std::path::{Path, PathBuf};

use columndb::{DataType, Database, Value};
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .try_init();
}

pub fn db_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.{}", name, columndb::FILE_EXTENSION))
}

/// `id:int64, name:string, score:float64` with two rows, the second score NULL.
pub fn people() -> Database {
    let mut db = Database::new();
    db.add_column("id", DataType::Int64).unwrap();
    db.add_column("name", DataType::String).unwrap();
    db.add_column("score", DataType::Float64).unwrap();
    db.insert_row(vec![Value::from(1i64), Value::from("Alice"), Value::from(95.5)])
        .unwrap();
    db.insert_row(vec![Value::from(2i64), Value::from("Bob"), Value::Null])
        .unwrap();
    db
}

/// One column of every type, exercising edge values.
pub fn every_type() -> Database {
    let mut db = Database::new();
    for t in DataType::ALL {
        db.add_column(t.name(), t).unwrap();
    }
    let rows = vec![
        vec![
            Value::Int32(i32::MIN),
            Value::Int64(i64::MAX),
            Value::Float32(f32::NAN),
            Value::Float64(-0.0),
            Value::from(""),
            Value::Bool(true),
        ],
        vec![Value::Null; 6],
        vec![
            Value::Int32(0),
            Value::Int64(-1),
            Value::Float32(f32::from_bits(0x7fc0_1234)),
            Value::Float64(f64::INFINITY),
            Value::from("naïve ☃ 日本"),
            Value::Bool(false),
        ],
        vec![
            Value::Int32(i32::MAX),
            Value::Int64(i64::MIN),
            Value::Float32(f32::MIN_POSITIVE),
            Value::Float64(f64::from_bits(0xfff8_0000_0000_0001)),
            Value::from("line\nbreak\0nul"),
            Value::Null,
        ],
    ];
    for row in rows {
        db.insert_row(row).unwrap();
    }
    db
}
