//! ZIP archive source.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Mutex;

use zip::ZipArchive;

use crate::adapters::{normalize_path, not_found, Source};
use crate::infra::error::CheckResult;

/// An exchange set packed into a ZIP archive.
///
/// Entries are decompressed one at a time on `open`. The archive handle
/// lives behind a mutex because the zip reader needs exclusive access to
/// seek within the file.
pub struct ZipSource {
    archive: Mutex<ZipArchive<File>>,
    root: String,
    paths: Vec<String>,
    /// Normalized entry path to the raw name stored in the archive.
    names: HashMap<String, String>,
}

impl ZipSource {
    pub fn open(path: &Path) -> CheckResult<Self> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(file)?;

        let mut paths = Vec::new();
        let mut names = HashMap::new();
        for index in 0..archive.len() {
            let entry = archive.by_index(index)?;
            if entry.is_dir() {
                continue;
            }
            let normalized = normalize_path(entry.name());
            names.insert(normalized.clone(), entry.name().to_string());
            paths.push(normalized);
        }
        paths.sort();

        Ok(Self {
            archive: Mutex::new(archive),
            root: path.display().to_string(),
            paths,
            names,
        })
    }
}

impl Source for ZipSource {
    fn root(&self) -> &str {
        &self.root
    }

    fn paths(&self) -> &[String] {
        &self.paths
    }

    fn open(&self, path: &str) -> CheckResult<Box<dyn Read + '_>> {
        let raw_name = self.names.get(path).ok_or_else(|| not_found(path))?;

        let mut archive = self.archive.lock().unwrap();
        let mut entry = archive
            .by_name(raw_name)
            .map_err(|_| not_found(path))?;

        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        Ok(Box::new(Cursor::new(data)))
    }
}
