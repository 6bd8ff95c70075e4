use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("could not read file: {0}")]
    Unreadable(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Byte store under a configured root directory. Names are flat, generated
/// by the file service, and never contain path separators.
#[derive(Debug, Clone)]
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the bytes under `name`, creating the root directory on first
    /// use.
    pub fn write(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.root.join(name), bytes)?;
        Ok(())
    }

    /// Resolves a stored name to its on-disk path, verifying the file
    /// exists and is a readable regular file.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, StorageError> {
        let path = self.root.join(name);
        let metadata =
            fs::metadata(&path).map_err(|_| StorageError::Unreadable(name.to_string()))?;
        if !metadata.is_file() {
            return Err(StorageError::Unreadable(name.to_string()));
        }
        Ok(path)
    }

    pub fn remove(&self, name: &str) -> Result<(), StorageError> {
        fs::remove_file(self.root.join(name))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claim::{assert_err, assert_ok};

    #[test]
    fn write_creates_the_root_directory_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskStorage::new(dir.path().join("uploads"));

        assert_ok!(storage.write("a.txt", b"hello"));
        assert_eq!(fs::read(dir.path().join("uploads/a.txt")).unwrap(), b"hello");
    }

    #[test]
    fn resolve_rejects_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskStorage::new(dir.path());

        assert_err!(storage.resolve("nope.txt"));
    }

    #[test]
    fn remove_fails_when_nothing_was_stored() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskStorage::new(dir.path());

        assert_err!(storage.remove("nope.txt"));
    }
}
