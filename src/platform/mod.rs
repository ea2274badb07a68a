//! Platform-specific memory mapping.
//!
//! Only read-only, whole-file mappings are needed: the loader maps a saved
//! database file and decodes it in place.

use std::fs::File;

use crate::error::Result;

/// Memory access advice for the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advice {
    /// Normal access pattern.
    Normal,

    /// Sequential access pattern.
    Sequential,

    /// Will need soon.
    WillNeed,
}

#[cfg(unix)]
mod unix;
#[cfg(unix)]
use self::unix as imp;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
use self::windows as imp;

#[cfg(not(any(unix, windows)))]
mod unsupported;
#[cfg(not(any(unix, windows)))]
use self::unsupported as imp;

/// Map the first `len` bytes of `file` read-only.
///
/// # Safety
///
/// The mapping aliases the file; the caller must ensure the file is not
/// truncated or modified while the mapping is alive, and must release it
/// with [`unmap`] using the same `len`.
pub unsafe fn map_file(file: &File, len: usize) -> Result<*mut u8> {
    imp::map_file(file, len)
}

/// Release a mapping created by [`map_file`].
///
/// # Safety
///
/// `ptr` and `len` must come from a single successful `map_file` call, and
/// no reference into the mapping may outlive this call.
pub unsafe fn unmap(ptr: *mut u8, len: usize) -> Result<()> {
    imp::unmap(ptr, len)
}

/// Hint the expected access pattern of a mapping.
///
/// # Safety
///
/// `ptr` and `len` must describe a live mapping.
pub unsafe fn advise(ptr: *mut u8, len: usize, advice: Advice) -> Result<()> {
    imp::advise(ptr, len, advice)
}
