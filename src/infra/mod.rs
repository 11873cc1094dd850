//! File I/O and output naming

mod filename;
mod fs;

pub use filename::{dynamic_filename, transliterate};
pub use fs::{
    DEFAULT_MAX_DEPTH, FileTimes, FsError, SourceTree, copy_file, decode_source, file_times,
    is_document, prepare_target, read_source, scan_source_tree, write_atomic,
};
