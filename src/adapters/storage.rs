use crate::domain::ports::CertificateStore;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

/// Reads certificates relative to a base directory; absolute paths are used as-is.
#[derive(Debug, Clone)]
pub struct LocalCertificateStore {
    base_path: PathBuf,
}

impl LocalCertificateStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        Path::new(&self.base_path).join(path)
    }
}

impl CertificateStore for LocalCertificateStore {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let data = tokio::fs::read(self.full_path(path)).await?;
        Ok(data)
    }

    async fn exists(&self, path: &str) -> bool {
        tokio::fs::metadata(self.full_path(path))
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reads_relative_to_base() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("winners")).unwrap();
        std::fs::write(dir.path().join("winners/a.pdf"), b"%PDF-1.4").unwrap();

        let store = LocalCertificateStore::new(dir.path());
        assert!(store.exists("winners/a.pdf").await);
        assert!(!store.exists("winners/missing.pdf").await);
        assert!(!store.exists("winners").await);
        assert_eq!(store.read_file("winners/a.pdf").await.unwrap(), b"%PDF-1.4");
        assert!(store.read_file("winners/missing.pdf").await.is_err());
    }
}
