//! Source tree scanning and output file operations.

use chrono::{DateTime, Utc};
use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::NamedTempFile;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Default number of directory levels (counting the root's own files as
/// level 1) whose HTML files are treated as documents.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Errors during file system operations.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("atomic write failed for {path}: {source}")]
    AtomicWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("directory is not writable: {path}")]
    ReadOnly { path: PathBuf },

    #[error("invalid encoding in {path}: {encoding}")]
    InvalidEncoding { path: PathBuf, encoding: String },
}

impl FsError {
    /// Creates an appropriate FsError from an io::Error.
    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => FsError::NotFound { path: path.into() },
            io::ErrorKind::PermissionDenied => FsError::PermissionDenied { path: path.into() },
            _ => FsError::Io {
                path: path.into(),
                source: error,
            },
        }
    }
}

/// Reads a source document as UTF-8 text.
///
/// # Errors
///
/// Returns `FsError::NotFound` if the file doesn't exist.
/// Returns `FsError::PermissionDenied` if access is denied.
/// Returns `FsError::InvalidEncoding` if the file is not valid UTF-8.
pub fn read_source(path: &Path) -> Result<String, FsError> {
    let bytes = std::fs::read(path).map_err(|e| FsError::from_io(path, e))?;
    decode_source(bytes, path)
}

/// Decodes already-read bytes, rejecting UTF-16 and stripping a UTF-8 BOM.
pub fn decode_source(bytes: Vec<u8>, path: &Path) -> Result<String, FsError> {
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return Err(FsError::InvalidEncoding {
            path: path.into(),
            encoding: "UTF-16 LE detected (byte order mark FF FE); convert to UTF-8".into(),
        });
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        return Err(FsError::InvalidEncoding {
            path: path.into(),
            encoding: "UTF-16 BE detected (byte order mark FE FF); convert to UTF-8".into(),
        });
    }

    let content = String::from_utf8(bytes).map_err(|e| FsError::InvalidEncoding {
        path: path.into(),
        encoding: format!("invalid UTF-8 at byte {}", e.utf8_error().valid_up_to()),
    })?;

    match content.strip_prefix('\u{FEFF}') {
        Some(stripped) => Ok(stripped.to_string()),
        None => Ok(content),
    }
}

/// Files found under a source root, split into documents and assets.
///
/// Paths are absolute (joined onto the root) and sorted by file name within
/// each directory, directories' contents following their own files.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SourceTree {
    pub documents: Vec<PathBuf>,
    pub assets: Vec<PathBuf>,
}

/// Walks `root`, classifying every regular file.
///
/// A file is a document when it has an `.html`/`.htm` extension (any case)
/// and lies at most `max_depth` levels deep, the root's own files being level
/// 1. Everything else is an asset to copy verbatim. Hidden entries and the
/// optional `exclude` directory are skipped.
///
/// # Errors
///
/// Returns `FsError::NotFound` if the root doesn't exist.
/// Returns `FsError::NotADirectory` if the root is not a directory.
/// Returns `FsError::Io` if the root itself cannot be listed.
pub fn scan_source_tree(
    root: &Path,
    max_depth: usize,
    exclude: Option<&Path>,
) -> Result<SourceTree, FsError> {
    if !root.exists() {
        return Err(FsError::NotFound {
            path: root.to_path_buf(),
        });
    }
    if !root.is_dir() {
        return Err(FsError::NotADirectory {
            path: root.to_path_buf(),
        });
    }
    std::fs::read_dir(root).map_err(|e| FsError::from_io(root, e))?;

    let mut tree = SourceTree::default();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by(|a, b| {
            a.file_type()
                .is_dir()
                .cmp(&b.file_type().is_dir())
                .then_with(|| a.file_name().cmp(b.file_name()))
        })
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !(is_hidden(e) || is_excluded(e, exclude)));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::error!("cannot read source entry: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.depth() <= max_depth && is_document(entry.path()) {
            tree.documents.push(entry.into_path());
        } else {
            tree.assets.push(entry.into_path());
        }
    }

    Ok(tree)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|s| s.starts_with('.'))
}

fn is_excluded(entry: &DirEntry, exclude: Option<&Path>) -> bool {
    exclude.is_some_and(|ex| entry.path() == ex)
}

/// Returns true for `.html` and `.htm` files, ignoring case.
pub fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
}

/// Creation and modification time of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTimes {
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl FileTimes {
    /// Both timestamps set to the same instant.
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self {
            created: instant,
            modified: instant,
        }
    }
}

/// Reads file timestamps, falling back to the current time when the
/// filesystem can't tell. A missing creation time uses the modification time.
pub fn file_times(path: &Path) -> FileTimes {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(err) => {
            log::warn!("cannot determine file times for {}: {err}", path.display());
            return FileTimes::at(Utc::now());
        }
    };
    let modified = match metadata.modified() {
        Ok(t) => to_utc(t),
        Err(err) => {
            log::warn!("cannot determine modified time for {}: {err}", path.display());
            Utc::now()
        }
    };
    let created = match metadata.created() {
        Ok(t) => to_utc(t),
        Err(_) => {
            log::debug!("no creation time for {}, using modified time", path.display());
            modified
        }
    };
    FileTimes { created, modified }
}

fn to_utc(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}

/// Makes sure `target` is a writable directory, creating it when absent.
///
/// New directories get mode `rwxr-xr-x` on Unix.
///
/// # Errors
///
/// Returns `FsError::NotADirectory` if the path exists but is not a directory.
/// Returns `FsError::ReadOnly` if the directory exists but is read-only.
/// Returns `FsError::Io` if the directory can't be created.
pub fn prepare_target(target: &Path) -> Result<(), FsError> {
    if target.exists() {
        if !target.is_dir() {
            return Err(FsError::NotADirectory {
                path: target.to_path_buf(),
            });
        }
        let metadata = std::fs::metadata(target).map_err(|e| FsError::from_io(target, e))?;
        if metadata.permissions().readonly() {
            return Err(FsError::ReadOnly {
                path: target.to_path_buf(),
            });
        }
        return Ok(());
    }

    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder
        .create(target)
        .map_err(|e| FsError::from_io(target, e))
}

/// Writes `contents` to `path` atomically via a temp file in the same
/// directory. The parent directory must exist.
///
/// # Errors
///
/// Returns `FsError::NotFound` if the parent directory doesn't exist.
/// Returns `FsError::AtomicWrite` if the atomic rename fails.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), FsError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    if !parent.is_dir() {
        return Err(FsError::NotFound {
            path: parent.into(),
        });
    }

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| FsError::Io {
        path: path.into(),
        source: e,
    })?;

    temp.write_all(contents).map_err(|e| FsError::Io {
        path: path.into(),
        source: e,
    })?;

    temp.persist(path).map_err(|e| FsError::AtomicWrite {
        path: path.into(),
        source: e.error,
    })?;

    Ok(())
}

/// Copies a file byte for byte, creating the destination's directories.
pub fn copy_file(from: &Path, to: &Path) -> Result<(), FsError> {
    if let Some(dir) = to.parent()
        && !dir.as_os_str().is_empty()
    {
        std::fs::create_dir_all(dir).map_err(|e| FsError::from_io(dir, e))?;
    }
    std::fs::copy(from, to).map_err(|e| FsError::from_io(from, e))?;
    Ok(())
}
