//! Memory mapping on Unix (Linux, macOS, the BSDs).

use std::fs::File;
use std::io;
use std::os::unix::io::AsRawFd;
use std::ptr;

use libc::{c_void, madvise, mmap, munmap, MAP_SHARED, PROT_READ};
use libc::{MADV_NORMAL, MADV_SEQUENTIAL, MADV_WILLNEED};

use crate::error::{Error, Result};
use crate::platform::Advice;

pub unsafe fn map_file(file: &File, len: usize) -> Result<*mut u8> {
    let addr = mmap(
        ptr::null_mut(),
        len,
        PROT_READ,
        MAP_SHARED,
        file.as_raw_fd(),
        0,
    );
    if addr == libc::MAP_FAILED {
        return Err(Error::Io(io::Error::last_os_error()));
    }
    Ok(addr as *mut u8)
}

pub unsafe fn unmap(ptr: *mut u8, len: usize) -> Result<()> {
    if munmap(ptr as *mut c_void, len) != 0 {
        return Err(Error::Io(io::Error::last_os_error()));
    }
    Ok(())
}

pub unsafe fn advise(ptr: *mut u8, len: usize, advice: Advice) -> Result<()> {
    let advice = match advice {
        Advice::Normal => MADV_NORMAL,
        Advice::Sequential => MADV_SEQUENTIAL,
        Advice::WillNeed => MADV_WILLNEED,
    };
    if madvise(ptr as *mut c_void, len, advice) != 0 {
        return Err(Error::Io(io::Error::last_os_error()));
    }
    Ok(())
}
