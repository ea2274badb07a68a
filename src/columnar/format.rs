//! Binary layout of a `.cdb` database file.
//!
//! All integers are little-endian.
//!
//! ```text
//! header   magic: u32 = 0x43444201, version: u32, column_count: u32
//! schema   column_count x { name_len: u32, name: [u8; name_len], type_tag: u8 }
//! data     column_count x { row_count: u32,
//!                           row_count x { presence: u8, value (if presence == 1) } }
//! trailer  footer_magic: u32 = 0x43444245, crc32: u32
//! ```
//!
//! Values use the layout of the value codec. The checksum covers every byte
//! before it, the footer magic included.

use tracing::debug;

use crate::columnar::codec::{self, Reader};
use crate::columnar::column::Column;
use crate::columnar::database::Database;
use crate::columnar::schema::DataType;
use crate::error::{Error, Result};

/// Magic number at the start of every database file.
pub const MAGIC: u32 = 0x4344_4201;

/// Magic number in front of the trailing checksum.
pub const FOOTER_MAGIC: u32 = 0x4344_4245;

/// Format version written by this crate; the only one it reads.
pub const FORMAT_VERSION: u32 = 1;

/// Size of the fixed header in bytes.
pub const HEADER_SIZE: usize = 12;

/// Size of the trailer in bytes.
pub const TRAILER_SIZE: usize = 8;

const PRESENT: u8 = 1;
const ABSENT: u8 = 0;

/// File header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileHeader {
    version: u32,
    column_count: u32,
}

impl FileHeader {
    fn new(column_count: u32) -> Self {
        FileHeader {
            version: FORMAT_VERSION,
            column_count,
        }
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&MAGIC.to_le_bytes());
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.column_count.to_le_bytes());
    }

    fn read(reader: &mut Reader<'_>) -> Result<Self> {
        let magic = reader.read_u32("file magic")?;
        if magic != MAGIC {
            return Err(Error::corrupt(format!(
                "bad file magic {:#010x}, expected {:#010x}",
                magic, MAGIC
            )));
        }
        let version = reader.read_u32("format version")?;
        if version != FORMAT_VERSION {
            return Err(Error::corrupt(format!(
                "unsupported format version {} (supported: {})",
                version, FORMAT_VERSION
            )));
        }
        let column_count = reader.read_u32("column count")?;
        Ok(FileHeader {
            version,
            column_count,
        })
    }
}

fn count_u32(n: usize, what: &str) -> Result<u32> {
    u32::try_from(n).map_err(|_| {
        Error::InvalidArgument(format!(
            "{} {} exceeds the file format limit of {}",
            what,
            n,
            u32::MAX
        ))
    })
}

/// Serialize a database into a complete file image.
pub fn encode(db: &Database) -> Result<Vec<u8>> {
    let columns = db.columns();
    let mut out = Vec::with_capacity(estimate_size(db));

    FileHeader::new(count_u32(columns.len(), "column count")?).write(&mut out);

    for column in columns {
        codec::put_bytes(column.name().as_bytes(), &mut out)?;
        out.push(column.data_type().tag());
    }

    for column in columns {
        let row_count = count_u32(column.len(), &format!("row count of column '{}'", column.name()))?;
        out.extend_from_slice(&row_count.to_le_bytes());
        encode_column(column, &mut out)?;
    }

    out.extend_from_slice(&FOOTER_MAGIC.to_le_bytes());
    let checksum = crc32fast::hash(&out);
    out.extend_from_slice(&checksum.to_le_bytes());

    debug!(columns = columns.len(), bytes = out.len(), "encoded database");
    Ok(out)
}

fn encode_column(column: &Column, out: &mut Vec<u8>) -> Result<()> {
    let variable = column.data_type().is_variable_length();
    for row in 0..column.len() {
        if column.is_null(row) == Some(true) {
            out.push(ABSENT);
            continue;
        }
        out.push(PRESENT);
        let slot = column.slot(row);
        if variable {
            codec::put_bytes(slot, out)?;
        } else {
            out.extend_from_slice(slot);
        }
    }
    Ok(())
}

fn estimate_size(db: &Database) -> usize {
    let columns = db.columns();
    let mut size = HEADER_SIZE + TRAILER_SIZE;
    for column in columns {
        size += codec::LEN_PREFIX + column.name().len() + 1 + 4;
        let per_row = column.data_type().size().unwrap_or(codec::LEN_PREFIX) + 1;
        size += column.len() * per_row;
    }
    size
}

/// Deserialize a complete file image.
///
/// Either the whole database is reconstructed or `CorruptData` is returned.
pub fn decode(bytes: &[u8]) -> Result<Database> {
    let mut reader = Reader::new(bytes);
    let header = FileHeader::read(&mut reader)?;

    let body = verify_trailer(bytes)?;
    let mut reader = Reader::at(body, reader.position());

    // Every schema entry takes at least five bytes.
    let column_count = header.column_count as usize;
    if column_count > reader.remaining() / 5 {
        return Err(Error::corrupt(format!(
            "column count {} does not fit in {} remaining bytes",
            column_count,
            reader.remaining()
        )));
    }

    let mut db = Database::new();
    let mut types = Vec::with_capacity(column_count);
    for index in 0..column_count {
        let name = reader.read_str("column name")?;
        let tag = reader.read_u8("column type tag")?;
        let data_type = DataType::try_from(tag).map_err(|_| {
            Error::corrupt(format!("column {} has invalid type tag {}", index, tag))
        })?;
        db.add_column(name, data_type).map_err(|e| match e {
            Error::DuplicateColumn(n) => Error::corrupt(format!("duplicate column name '{}'", n)),
            Error::InvalidArgument(_) => Error::corrupt(format!("column {} has an empty name", index)),
            other => other,
        })?;
        types.push((name, data_type));
    }

    for (index, (name, data_type)) in types.into_iter().enumerate() {
        let column = decode_column(&mut reader, name, data_type)?;
        db.replace_column(index, column);
    }

    if reader.remaining() != 0 {
        return Err(Error::corrupt(format!(
            "{} unexpected bytes after the data section",
            reader.remaining()
        )));
    }

    debug!(
        version = header.version,
        columns = db.get_num_columns(),
        rows = db.get_num_rows(),
        bytes = bytes.len(),
        "decoded database"
    );
    Ok(db)
}

/// Check footer magic and checksum; returns the bytes they cover, minus the
/// footer magic.
fn verify_trailer(bytes: &[u8]) -> Result<&[u8]> {
    if bytes.len() < HEADER_SIZE + TRAILER_SIZE {
        return Err(Error::corrupt(format!(
            "file of {} bytes is shorter than header and trailer",
            bytes.len()
        )));
    }
    let split = bytes.len() - TRAILER_SIZE;
    let mut trailer = Reader::at(bytes, split);
    let footer_magic = trailer.read_u32("footer magic")?;
    if footer_magic != FOOTER_MAGIC {
        return Err(Error::corrupt(format!(
            "bad footer magic {:#010x}, expected {:#010x}",
            footer_magic, FOOTER_MAGIC
        )));
    }
    let stored = trailer.read_u32("checksum")?;
    let computed = crc32fast::hash(&bytes[..split + 4]);
    if stored != computed {
        return Err(Error::corrupt(format!(
            "checksum mismatch: stored {:#010x}, computed {:#010x}",
            stored, computed
        )));
    }
    Ok(&bytes[..split])
}

fn decode_column(reader: &mut Reader<'_>, name: &str, data_type: DataType) -> Result<Column> {
    let row_count = reader.read_u32("row count")? as usize;
    // Every entry takes at least its presence byte.
    if row_count > reader.remaining() {
        return Err(Error::corrupt(format!(
            "column '{}' declares {} rows but only {} bytes remain",
            name,
            row_count,
            reader.remaining()
        )));
    }

    let mut column = Column::new(name, data_type);
    for row in 0..row_count {
        match reader.read_u8("presence flag")? {
            ABSENT => column.append_null(),
            PRESENT => {
                let value = reader.read_value(data_type)?;
                column.append_checked(&value);
            }
            flag => {
                return Err(Error::corrupt(format!(
                    "column '{}' row {} has invalid presence flag {}",
                    name, row, flag
                )));
            }
        }
    }
    Ok(column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columnar::value::Value;

    fn sample() -> Database {
        let mut db = Database::new();
        db.add_column("id", DataType::Int32).unwrap();
        db.add_column("tag", DataType::String).unwrap();
        db.insert("id", 7).unwrap();
        db.insert("id", Value::Null).unwrap();
        db.insert("tag", "x").unwrap();
        db
    }

    /// Recompute the checksum after patching bytes, so decoding reaches
    /// the check under test.
    fn reseal(bytes: &mut Vec<u8>) {
        let split = bytes.len() - 4;
        let crc = crc32fast::hash(&bytes[..split]);
        bytes[split..].copy_from_slice(&crc.to_le_bytes());
    }

    #[test]
    fn layout_matches_documentation() {
        let bytes = encode(&sample()).unwrap();
        let mut expected = Vec::new();
        expected.extend_from_slice(&MAGIC.to_le_bytes());
        expected.extend_from_slice(&1u32.to_le_bytes());
        expected.extend_from_slice(&2u32.to_le_bytes());
        // schema
        expected.extend_from_slice(&2u32.to_le_bytes());
        expected.extend_from_slice(b"id");
        expected.push(0);
        expected.extend_from_slice(&3u32.to_le_bytes());
        expected.extend_from_slice(b"tag");
        expected.push(4);
        // id: [7, NULL]
        expected.extend_from_slice(&2u32.to_le_bytes());
        expected.push(1);
        expected.extend_from_slice(&7i32.to_le_bytes());
        expected.push(0);
        // tag: ["x"]
        expected.extend_from_slice(&1u32.to_le_bytes());
        expected.push(1);
        expected.extend_from_slice(&1u32.to_le_bytes());
        expected.push(b'x');
        expected.extend_from_slice(&FOOTER_MAGIC.to_le_bytes());
        let crc = crc32fast::hash(&expected);
        expected.extend_from_slice(&crc.to_le_bytes());

        assert_eq!(bytes, expected);
    }

    #[test]
    fn decode_inverts_encode() {
        let db = sample();
        let back = decode(&encode(&db).unwrap()).unwrap();
        assert_eq!(back, db);
        assert!(back.is_ragged());
    }

    #[test]
    fn encoding_is_deterministic() {
        let db = sample();
        assert_eq!(encode(&db).unwrap(), encode(&db.clone()).unwrap());
    }

    #[test]
    fn rejects_bad_magic_and_version() {
        let mut bytes = encode(&sample()).unwrap();
        bytes[0] ^= 0xff;
        assert!(matches!(decode(&bytes), Err(Error::CorruptData(m)) if m.contains("magic")));

        let mut bytes = encode(&sample()).unwrap();
        bytes[4] = 2;
        reseal(&mut bytes);
        assert!(matches!(decode(&bytes), Err(Error::CorruptData(m)) if m.contains("version")));
    }

    #[test]
    fn rejects_checksum_mismatch() {
        let mut bytes = encode(&sample()).unwrap();
        let last_value = bytes.len() - TRAILER_SIZE - 1;
        bytes[last_value] = b'y';
        assert!(matches!(decode(&bytes), Err(Error::CorruptData(m)) if m.contains("checksum")));
    }

    #[test]
    fn rejects_invalid_type_tag() {
        let mut bytes = encode(&sample()).unwrap();
        // type tag of "id" sits after header, name length and name
        bytes[HEADER_SIZE + 4 + 2] = 6;
        reseal(&mut bytes);
        assert!(matches!(decode(&bytes), Err(Error::CorruptData(m)) if m.contains("type tag")));
    }

    #[test]
    fn rejects_invalid_presence_flag() {
        let mut bytes = encode(&sample()).unwrap();
        let id_data = HEADER_SIZE + (4 + 2 + 1) + (4 + 3 + 1);
        bytes[id_data + 4] = 2;
        reseal(&mut bytes);
        assert!(matches!(decode(&bytes), Err(Error::CorruptData(m)) if m.contains("presence")));
    }

    #[test]
    fn rejects_overlong_row_count() {
        let mut bytes = encode(&sample()).unwrap();
        let id_data = HEADER_SIZE + (4 + 2 + 1) + (4 + 3 + 1);
        bytes[id_data..id_data + 4].copy_from_slice(&u32::MAX.to_le_bytes());
        reseal(&mut bytes);
        assert!(matches!(decode(&bytes), Err(Error::CorruptData(_))));
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut db = Database::new();
        db.add_column("aa", DataType::Bool).unwrap();
        db.add_column("ab", DataType::Bool).unwrap();
        let mut bytes = encode(&db).unwrap();
        // rename "ab" to "aa"
        let second_name = HEADER_SIZE + (4 + 2 + 1) + 4;
        bytes[second_name + 1] = b'a';
        reseal(&mut bytes);
        assert!(matches!(decode(&bytes), Err(Error::CorruptData(m)) if m.contains("duplicate")));
    }

    #[test]
    fn rejects_truncation_anywhere() {
        let bytes = encode(&sample()).unwrap();
        for len in 0..bytes.len() {
            assert!(
                matches!(decode(&bytes[..len]), Err(Error::CorruptData(_))),
                "prefix of {} bytes decoded",
                len
            );
        }
    }

    #[test]
    fn rejects_trailing_bytes_inside_checksum() {
        let mut bytes = encode(&sample()).unwrap();
        let split = bytes.len() - TRAILER_SIZE;
        bytes.insert(split, 0);
        reseal(&mut bytes);
        assert!(matches!(decode(&bytes), Err(Error::CorruptData(m)) if m.contains("unexpected")));
    }
}
