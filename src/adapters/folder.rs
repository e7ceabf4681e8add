//! Directory tree source.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::adapters::{not_found, Source};
use crate::infra::error::{CheckError, CheckResult};

/// An exchange set laid out as a plain directory tree.
pub struct FolderSource {
    base: PathBuf,
    root: String,
    paths: Vec<String>,
}

impl FolderSource {
    /// Enumerate the tree under `path`. Entries are sorted so reporting
    /// order does not depend on directory iteration order.
    pub fn open(path: &Path) -> CheckResult<Self> {
        if !path.is_dir() {
            return Err(CheckError::Container(format!(
                "could not find exchange set directory {}",
                path.display()
            )));
        }

        let mut paths = Vec::new();
        walk(path, path, &mut paths)?;
        paths.sort();

        Ok(Self {
            base: path.to_path_buf(),
            root: path.display().to_string(),
            paths,
        })
    }
}

impl Source for FolderSource {
    fn root(&self) -> &str {
        &self.root
    }

    fn paths(&self) -> &[String] {
        &self.paths
    }

    fn open(&self, path: &str) -> CheckResult<Box<dyn Read + '_>> {
        let file = File::open(self.base.join(path)).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                not_found(path)
            } else {
                CheckError::Io(e.to_string())
            }
        })?;
        Ok(Box::new(file))
    }
}

fn walk(base: &Path, dir: &Path, out: &mut Vec<String>) -> CheckResult<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            walk(base, &path, out)?;
        } else {
            let relative = path.strip_prefix(base).map_err(|_| {
                CheckError::Container(format!("entry {} escapes the tree", path.display()))
            })?;
            let mut parts = Vec::new();
            for component in relative.components() {
                parts.push(component.as_os_str().to_string_lossy().into_owned());
            }
            out.push(parts.join("/"));
        }
    }
    Ok(())
}
