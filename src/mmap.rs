//! Read-only memory maps of whole files.

use std::fs::File;
use std::io;
use std::ops::Deref;
use std::slice;

use tracing::warn;

use crate::error::{Error, Result};
use crate::platform::{self, Advice};

/// An immutable memory-mapped file.
///
/// The mapping is released on drop.
#[derive(Debug)]
pub struct Mmap {
    ptr: *mut u8,
    len: usize,
}

// The mapping is read-only and owned by this value.
unsafe impl Send for Mmap {}
unsafe impl Sync for Mmap {}

impl Mmap {
    /// Map the whole of `file` read-only.
    ///
    /// Empty files cannot be mapped and fail with `InvalidArgument`.
    ///
    /// # Safety
    ///
    /// The file must not be truncated or modified while the map is alive;
    /// doing so is undefined behavior.
    pub unsafe fn map(file: &File) -> Result<Mmap> {
        let len = file.metadata()?.len();
        let len = usize::try_from(len).map_err(|_| {
            Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("file of {} bytes does not fit in the address space", len),
            ))
        })?;
        if len == 0 {
            return Err(Error::InvalidArgument("cannot map an empty file".into()));
        }
        let ptr = platform::map_file(file, len)?;
        Ok(Mmap { ptr, len })
    }

    /// Get the length of the memory map.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr
    }

    /// Advise the kernel about the expected access pattern.
    pub fn advise(&self, advice: Advice) -> Result<()> {
        unsafe { platform::advise(self.ptr, self.len, advice) }
    }
}

impl Deref for Mmap {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.ptr, self.len) }
    }
}

impl AsRef<[u8]> for Mmap {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        self
    }
}

impl Drop for Mmap {
    fn drop(&mut self) {
        if let Err(e) = unsafe { platform::unmap(self.ptr, self.len) } {
            warn!(error = %e, len = self.len, "failed to unmap file");
        }
    }
}

#[cfg(all(test, any(unix, windows)))]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn maps_file_contents() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(b"column bytes").unwrap();
        file.sync_all().unwrap();

        let map = unsafe { Mmap::map(&file).unwrap() };
        assert_eq!(map.len(), 12);
        assert_eq!(&map[..], b"column bytes");
        map.advise(Advice::Sequential).unwrap();
    }

    #[test]
    fn empty_file_is_rejected() {
        let file = tempfile::tempfile().unwrap();
        let err = unsafe { Mmap::map(&file) }.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
