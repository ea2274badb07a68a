//! Value codec shared by the in-memory columns and the file format.
//!
//! Fixed-width values are little-endian: `Int32`/`Float32` take 4 bytes,
//! `Int64`/`Float64` take 8 and `Bool` takes 1 (`0` or `1`). Strings are a
//! `u32` byte length followed by that many bytes of UTF-8, with no terminator.
//!
//! NULL has no encoding here; presence is tracked by the caller.

use crate::columnar::schema::DataType;
use crate::columnar::value::Value;
use crate::error::{Error, Result};

/// Size of the length prefix in front of every encoded string.
pub const LEN_PREFIX: usize = 4;

/// Append the encoding of `value` to `out`.
///
/// Fails with `InvalidArgument` for NULL and for strings longer than
/// `u32::MAX` bytes.
pub fn encode(value: &Value, out: &mut Vec<u8>) -> Result<()> {
    match value {
        Value::Int32(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::Int64(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::Float32(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::Float64(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::Bool(v) => out.push(*v as u8),
        Value::String(s) => put_bytes(s.as_bytes(), out)?,
        Value::Null => {
            return Err(Error::InvalidArgument("NULL has no value encoding".into()));
        }
    }
    Ok(())
}

/// Encode `value` into a fresh buffer.
pub fn encode_to_vec(value: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(encoded_len(value).unwrap_or(0));
    encode(value, &mut out)?;
    Ok(out)
}

/// Number of bytes `encode` writes for `value`, or `None` for NULL.
pub fn encoded_len(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(LEN_PREFIX + s.len()),
        Value::Null => None,
        v => v.data_type().and_then(|t| t.size()),
    }
}

/// Append a length-prefixed byte string.
pub(crate) fn put_bytes(bytes: &[u8], out: &mut Vec<u8>) -> Result<()> {
    let len = u32::try_from(bytes.len()).map_err(|_| {
        Error::InvalidArgument(format!(
            "string of {} bytes exceeds the {} byte limit",
            bytes.len(),
            u32::MAX
        ))
    })?;
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(bytes);
    Ok(())
}

/// Decode one value of `data_type` starting at `cursor`.
///
/// Returns the value and the cursor just past it.
pub fn decode(data_type: DataType, bytes: &[u8], cursor: usize) -> Result<(Value, usize)> {
    let mut reader = Reader::at(bytes, cursor);
    let value = reader.read_value(data_type)?;
    Ok((value, reader.position()))
}

/// Bounds-checked little-endian reader over a byte slice.
///
/// Every short read is reported as `CorruptData`.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Reader { buf, pos: 0 }
    }

    pub fn at(buf: &'a [u8], pos: usize) -> Self {
        Reader { buf, pos }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| {
                Error::corrupt(format!(
                    "{} needs {} bytes at offset {}, {} available",
                    what,
                    n,
                    self.pos,
                    self.remaining()
                ))
            })?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self, what: &str) -> Result<[u8; N]> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N, what)?);
        Ok(array)
    }

    pub fn read_u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    pub fn read_u32(&mut self, what: &str) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take_array(what)?))
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn read_str(&mut self, what: &str) -> Result<&'a str> {
        let len = self.read_u32(what)? as usize;
        let bytes = self.take(len, what)?;
        std::str::from_utf8(bytes)
            .map_err(|e| Error::corrupt(format!("{} is not valid UTF-8: {}", what, e)))
    }

    /// Read one encoded value of `data_type`.
    pub fn read_value(&mut self, data_type: DataType) -> Result<Value> {
        let value = match data_type {
            DataType::Int32 => Value::Int32(i32::from_le_bytes(self.take_array("int32 value")?)),
            DataType::Int64 => Value::Int64(i64::from_le_bytes(self.take_array("int64 value")?)),
            DataType::Float32 => {
                Value::Float32(f32::from_le_bytes(self.take_array("float32 value")?))
            }
            DataType::Float64 => {
                Value::Float64(f64::from_le_bytes(self.take_array("float64 value")?))
            }
            DataType::Bool => match self.read_u8("bool value")? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                b => return Err(Error::corrupt(format!("invalid bool byte {:#04x}", b))),
            },
            DataType::String => Value::String(self.read_str("string value")?.to_string()),
        };
        Ok(value)
    }
}
