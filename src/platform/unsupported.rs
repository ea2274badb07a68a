//! Fallback for platforms without memory mapping.
//!
//! Every call fails with `Unsupported`; the loader then reads the file into
//! memory instead.

use std::fs::File;
use std::io;

use crate::error::{Error, Result};
use crate::platform::Advice;

fn unsupported() -> Error {
    Error::Io(io::Error::new(
        io::ErrorKind::Unsupported,
        "memory mapping is not supported on this platform",
    ))
}

pub unsafe fn map_file(_file: &File, _len: usize) -> Result<*mut u8> {
    Err(unsupported())
}

pub unsafe fn unmap(_ptr: *mut u8, _len: usize) -> Result<()> {
    Err(unsupported())
}

pub unsafe fn advise(_ptr: *mut u8, _len: usize, _advice: Advice) -> Result<()> {
    Err(unsupported())
}
