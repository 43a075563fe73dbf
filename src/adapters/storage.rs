use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::path::Path;

/// Writes below a base directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);
        let data = tokio::fs::read(full_path).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_then_read_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_string_lossy().to_string());

        storage.write_file("nested/profile.json", b"{}").await.unwrap();
        let data = storage.read_file("nested/profile.json").await.unwrap();

        assert_eq!(data, b"{}");
        assert!(dir.path().join("nested").is_dir());
    }

    #[tokio::test]
    async fn test_read_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_string_lossy().to_string());

        let err = storage.read_file("missing.json").await.unwrap_err();
        assert_eq!(err.kind(), crate::utils::error::ErrorKind::IoError);
    }
}
