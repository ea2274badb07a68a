//! Saving and loading database files.
//!
//! Saves are atomic: the image is written to a temporary file beside the
//! target and renamed over it, so a failed save never truncates an existing
//! file. Loads map the file read-only when possible and decode it in place.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};

use crate::columnar::database::Database;
use crate::columnar::format;
use crate::error::{Error, Result};
use crate::mmap::Mmap;
use crate::platform::Advice;
use crate::utils::metrics::{self, Operation};

/// Storage options for saving and loading databases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageOptions {
    /// Whether to memory-map files during load
    pub use_mmap: bool,

    /// Whether to fsync the written file (and its directory) before returning
    pub sync: bool,

    /// Whether to create missing parent directories on save
    pub create_dirs: bool,
}

impl Default for StorageOptions {
    fn default() -> Self {
        StorageOptions {
            use_mmap: true,
            sync: true,
            create_dirs: false,
        }
    }
}

impl StorageOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        StorageOptions::default()
    }

    /// Set whether loads memory-map the file.
    pub fn use_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }

    /// Set whether saves are flushed to stable storage.
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Set whether saves create missing parent directories.
    pub fn create_dirs(mut self, create_dirs: bool) -> Self {
        self.create_dirs = create_dirs;
        self
    }
}

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

fn temp_path(path: &Path) -> Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        Error::InvalidArgument(format!("'{}' does not name a file", path.display()))
    })?;
    let mut name = std::ffi::OsString::from(".");
    name.push(file_name);
    name.push(format!(
        ".{}.{}.tmp",
        std::process::id(),
        TEMP_SEQ.fetch_add(1, Ordering::Relaxed)
    ));
    Ok(path.with_file_name(name))
}

/// Write `db` to `path`, replacing any existing file atomically.
pub(crate) fn save(db: &Database, path: &Path, options: &StorageOptions) -> Result<()> {
    metrics::measure(
        Operation::Save,
        || {
            let image = format::encode(db)?;
            write_atomic(path, &image, options)?;
            Ok::<_, Error>(image.len())
        },
        |&bytes| bytes,
    )
    .map(|bytes| {
        info!(
            path = %path.display(),
            columns = db.get_num_columns(),
            rows = db.get_num_rows(),
            bytes,
            "saved database"
        );
    })
}

fn write_atomic(path: &Path, image: &[u8], options: &StorageOptions) -> Result<()> {
    let tmp = temp_path(path)?;

    if options.create_dirs {
        if let Some(parent) = tmp.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
    }

    let written = write_file(&tmp, image, options.sync).and_then(|()| {
        fs::rename(&tmp, path)?;
        Ok(())
    });
    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(&tmp) {
            if cleanup.kind() != io::ErrorKind::NotFound {
                warn!(path = %tmp.display(), error = %cleanup, "failed to remove temporary file");
            }
        }
        return Err(e);
    }

    if options.sync {
        sync_parent(path);
    }
    debug!(path = %path.display(), bytes = image.len(), "replaced database file");
    Ok(())
}

fn write_file(path: &Path, image: &[u8], sync: bool) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(image)?;
    if sync {
        file.sync_all()?;
    }
    Ok(())
}

/// Make the rename durable. Best effort: failures are logged only.
#[cfg(unix)]
fn sync_parent(path: &Path) {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if let Err(e) = File::open(parent).and_then(|dir| dir.sync_all()) {
        warn!(path = %parent.display(), error = %e, "failed to sync directory");
    }
}

#[cfg(not(unix))]
fn sync_parent(_path: &Path) {}

/// Read and decode the database file at `path`.
pub(crate) fn load(path: &Path, options: &StorageOptions) -> Result<Database> {
    let (db, bytes) = metrics::measure(
        Operation::Load,
        || read_and_decode(path, options),
        |&(_, bytes)| bytes,
    )?;
    info!(
        path = %path.display(),
        columns = db.get_num_columns(),
        rows = db.get_num_rows(),
        bytes,
        "loaded database"
    );
    Ok(db)
}

fn read_and_decode(path: &Path, options: &StorageOptions) -> Result<(Database, usize)> {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    if metadata.is_dir() {
        return Err(Error::InvalidArgument(format!(
            "'{}' is a directory",
            path.display()
        )));
    }
    if metadata.len() == 0 {
        return Err(Error::corrupt("file is empty"));
    }

    if options.use_mmap {
        let file = File::open(path)?;
        // Safety: the map lives only for the duration of the decode.
        match unsafe { Mmap::map(&file) } {
            Ok(map) => {
                if let Err(e) = map.advise(Advice::Sequential) {
                    debug!(error = %e, "madvise failed");
                }
                let db = format::decode(&map)?;
                return Ok((db, map.len()));
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "mmap failed, reading file instead");
            }
        }
    }

    let bytes = fs::read(path)?;
    let db = format::decode(&bytes)?;
    Ok((db, bytes.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columnar::schema::DataType;
    use crate::columnar::value::Value;

    fn sample() -> Database {
        let mut db = Database::new();
        db.add_column("id", DataType::Int64).unwrap();
        db.add_column("name", DataType::String).unwrap();
        db.insert_row(vec![Value::from(1i64), Value::from("a")]).unwrap();
        db.insert_row(vec![Value::from(2i64), Value::Null]).unwrap();
        db
    }

    #[test]
    fn temp_file_sits_beside_target() {
        let tmp = temp_path(Path::new("/data/x.cdb")).unwrap();
        assert_eq!(tmp.parent(), Some(Path::new("/data")));
        let name = tmp.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(".x.cdb."));
        assert!(name.ends_with(".tmp"));
        assert_ne!(temp_path(Path::new("x.cdb")).unwrap(), temp_path(Path::new("x.cdb")).unwrap());
    }

    #[test]
    fn path_without_file_name_is_rejected() {
        assert!(matches!(temp_path(Path::new("/")), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn save_leaves_no_temporary_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.cdb");
        save(&sample(), &path, &StorageOptions::default()).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(load(&path, &StorageOptions::default()).unwrap(), sample());
    }

    #[test]
    fn mmap_and_read_paths_agree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.cdb");
        save(&sample(), &path, &StorageOptions::new().sync(false)).unwrap();

        let mapped = load(&path, &StorageOptions::new().use_mmap(true)).unwrap();
        let read = load(&path, &StorageOptions::new().use_mmap(false)).unwrap();
        assert_eq!(mapped, read);
    }

    #[test]
    fn create_dirs_builds_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("db.cdb");

        let err = save(&sample(), &path, &StorageOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));

        save(&sample(), &path, &StorageOptions::new().create_dirs(true)).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn load_classifies_missing_and_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.cdb");
        assert!(matches!(
            load(&missing, &StorageOptions::default()),
            Err(Error::FileNotFound(p)) if p == missing
        ));

        let empty = dir.path().join("empty.cdb");
        File::create(&empty).unwrap();
        assert!(matches!(
            load(&empty, &StorageOptions::default()),
            Err(Error::CorruptData(_))
        ));

        assert!(matches!(
            load(dir.path(), &StorageOptions::default()),
            Err(Error::InvalidArgument(_))
        ));
    }
}
