//! Source file resolution
//!
//! Checks the source directory once (fatal when it is unusable) and each
//! listed file individually (that file is skipped when it is unusable).

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::{BenchError, Result};

/// One listed file after resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Name as given on the command line; also the destination name and store key
    pub name: String,
    /// Full path under the source directory
    pub path: PathBuf,
    pub status: SourceStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    /// File exists, is a regular file and could be opened
    Ready { size: u64 },
    /// File cannot take part in the run
    Unavailable(String),
}

impl SourceFile {
    pub fn is_ready(&self) -> bool {
        matches!(self.status, SourceStatus::Ready { .. })
    }

    /// Size seen when the file was resolved
    pub fn size(&self) -> Option<u64> {
        match self.status {
            SourceStatus::Ready { size } => Some(size),
            SourceStatus::Unavailable(_) => None,
        }
    }

    /// Per-file error for an unavailable source
    pub fn to_error(&self) -> Option<BenchError> {
        match &self.status {
            SourceStatus::Ready { .. } => None,
            SourceStatus::Unavailable(reason) => Some(BenchError::MissingSource {
                path: self.path.clone(),
                reason: reason.clone(),
            }),
        }
    }
}

/// Ordered set of resolved source files
#[derive(Debug, Clone, Default)]
pub struct FileSet {
    entries: Vec<SourceFile>,
}

impl FileSet {
    /// Fatal check on the source directory itself
    pub fn check_source_dir(dir: &Path) -> Result<()> {
        let meta = fs::metadata(dir).map_err(|e| {
            BenchError::ConfigError(format!(
                "source directory {} is not accessible: {}",
                dir.display(),
                e
            ))
        })?;
        if !meta.is_dir() {
            return Err(BenchError::ConfigError(format!(
                "source path is not a directory: {}",
                dir.display()
            )));
        }
        Ok(())
    }

    /// Resolve `names` under `dir`, keeping their order
    pub fn resolve<S: AsRef<str>>(dir: &Path, names: &[S]) -> Result<Self> {
        Self::check_source_dir(dir)?;

        let entries = names
            .iter()
            .map(|name| {
                let name = name.as_ref().to_string();
                let path = dir.join(&name);
                let status = source_status(&path);
                SourceFile { name, path, status }
            })
            .collect();

        Ok(Self { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceFile> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ready_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_ready()).count()
    }
}

fn source_status(path: &Path) -> SourceStatus {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) => return SourceStatus::Unavailable(e.to_string()),
    };
    if !meta.is_file() {
        return SourceStatus::Unavailable("not a regular file".to_string());
    }
    match File::open(path) {
        Ok(_) => SourceStatus::Ready { size: meta.len() },
        Err(e) => SourceStatus::Unavailable(e.to_string()),
    }
}

/// Size of a destination file that read trials are about to use
pub fn check_destination(path: &Path) -> Result<u64> {
    let meta = fs::metadata(path)?;
    if !meta.is_file() {
        return Err(BenchError::BenchmarkError(format!(
            "destination is not a regular file: {}",
            path.display()
        )));
    }
    Ok(meta.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_keeps_order_and_flags_missing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.txt"), b"bbbb").unwrap();
        fs::write(dir.path().join("a.txt"), b"aa").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let set = FileSet::resolve(dir.path(), &["b.txt", "missing.bin", "a.txt", "sub"]).unwrap();
        let names: Vec<_> = set.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["b.txt", "missing.bin", "a.txt", "sub"]);
        assert_eq!(set.len(), 4);
        assert_eq!(set.ready_count(), 2);

        let entries: Vec<_> = set.iter().collect();
        assert_eq!(entries[0].status, SourceStatus::Ready { size: 4 });
        assert!(!entries[1].is_ready());
        assert_eq!(entries[1].size(), None);
        assert_eq!(entries[2].size(), Some(2));
        assert_eq!(entries[2].status, SourceStatus::Ready { size: 2 });
        assert_eq!(
            entries[3].status,
            SourceStatus::Unavailable("not a regular file".to_string())
        );
        assert!(matches!(
            entries[1].to_error(),
            Some(BenchError::MissingSource { .. })
        ));
        assert!(entries[0].to_error().is_none());
    }

    #[test]
    fn test_resolve_fails_on_bad_source_dir() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain");
        fs::write(&file, b"x").unwrap();

        assert!(FileSet::resolve(&file, &["x"]).is_err());
        assert!(FileSet::resolve(&dir.path().join("nope"), &["x"]).is_err());
    }

    #[test]
    fn test_check_destination() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dest.bin");
        assert!(check_destination(&path).is_err());
        fs::write(&path, vec![0u8; 10]).unwrap();
        assert_eq!(check_destination(&path).unwrap(), 10);
        assert!(check_destination(dir.path()).is_err());
    }
}
