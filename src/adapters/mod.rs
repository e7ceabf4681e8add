//! Container sources: one contract over heterogeneous bundle containers.
//!
//! An exchange set arrives as an ISO disc image, a ZIP archive, or a plain
//! directory tree. Each source enumerates its entries once at open time
//! with `/`-normalized paths and serves random-access reads; underlying
//! file and archive handles are released when the source is dropped.

use std::io::Read;
use std::path::Path;

use crate::infra::error::{CheckError, CheckResult};

mod folder;
mod iso;
mod zip;

pub use folder::FolderSource;
pub use iso::IsoSource;
pub use zip::ZipSource;

/// Listing and streaming read over one exchange set container.
pub trait Source {
    /// Base path string, used to describe the container in messages.
    fn root(&self) -> &str;

    /// Every file entry, enumerated once at open time, `/`-separated.
    fn paths(&self) -> &[String];

    /// Open one entry for reading. Fails with `NotFound` when the path
    /// names no entry.
    fn open(&self, path: &str) -> CheckResult<Box<dyn Read + '_>>;
}

/// Read an entire entry into memory.
pub fn read_entry(source: &dyn Source, path: &str) -> CheckResult<Vec<u8>> {
    let mut reader = source.open(path)?;
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    Ok(data)
}

/// Open the right source for a path: `.iso` and `.zip` files by
/// extension, anything else as a directory tree.
pub fn open_source(path: &Path) -> CheckResult<Box<dyn Source>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("iso") => Ok(Box::new(IsoSource::open(path)?)),
        Some("zip") => Ok(Box::new(ZipSource::open(path)?)),
        _ => Ok(Box::new(FolderSource::open(path)?)),
    }
}

/// Normalize an entry path: `/` separators, no leading separator.
pub(crate) fn normalize_path(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches('/').to_string()
}

pub(crate) fn not_found(path: &str) -> CheckError {
    CheckError::NotFound(path.to_string())
}
