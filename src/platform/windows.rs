//! Memory mapping on Windows.

use std::fs::File;
use std::io;
use std::os::windows::io::AsRawHandle;
use std::ptr;

use winapi::shared::minwindef::DWORD;
use winapi::um::handleapi::CloseHandle;
use winapi::um::memoryapi::{CreateFileMappingW, MapViewOfFile, UnmapViewOfFile, FILE_MAP_READ};
use winapi::um::winnt::PAGE_READONLY;

use crate::error::{Error, Result};
use crate::platform::Advice;

pub unsafe fn map_file(file: &File, len: usize) -> Result<*mut u8> {
    let size = len as u64;
    let mapping = CreateFileMappingW(
        file.as_raw_handle() as _,
        ptr::null_mut(),
        PAGE_READONLY,
        (size >> 32) as DWORD,
        (size & 0xFFFF_FFFF) as DWORD,
        ptr::null(),
    );
    if mapping.is_null() {
        return Err(Error::Io(io::Error::last_os_error()));
    }

    let view = MapViewOfFile(mapping, FILE_MAP_READ, 0, 0, len);
    // The view keeps the mapping object alive.
    let err = io::Error::last_os_error();
    CloseHandle(mapping);

    if view.is_null() {
        return Err(Error::Io(err));
    }
    Ok(view as *mut u8)
}

pub unsafe fn unmap(ptr: *mut u8, _len: usize) -> Result<()> {
    if UnmapViewOfFile(ptr as _) == 0 {
        return Err(Error::Io(io::Error::last_os_error()));
    }
    Ok(())
}

pub unsafe fn advise(_ptr: *mut u8, _len: usize, _advice: Advice) -> Result<()> {
    Ok(())
}
