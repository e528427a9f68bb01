use anyhow::{anyhow, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Local object store for uploaded files. Objects are addressed by an opaque
/// file key and live flat under the configured data directory.
pub struct StorageService {
    data_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub file_key: String,
    pub size: i64,
    pub checksum: String,
}

impl StorageService {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        if !data_dir.exists() {
            std::fs::create_dir_all(&data_dir)?;
        }
        Ok(Self { data_dir })
    }

    /// Writes the object under a fresh key derived from the original filename
    /// extension, returning the key, byte size and SHA-256 checksum.
    pub async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<StoredObject> {
        let file_key = new_file_key(file_name);
        let checksum = hex_digest(bytes);

        tokio::fs::write(self.object_path(&file_key)?, bytes).await?;

        Ok(StoredObject {
            file_key,
            size: bytes.len() as i64,
            checksum,
        })
    }

    /// Opens a stored object for streaming back to a client.
    pub async fn open(&self, file_key: &str) -> Result<tokio::fs::File> {
        let file = tokio::fs::File::open(self.object_path(file_key)?).await?;
        Ok(file)
    }

    pub async fn read(&self, file_key: &str) -> Result<Vec<u8>> {
        let bytes = tokio::fs::read(self.object_path(file_key)?).await?;
        Ok(bytes)
    }

    pub async fn delete(&self, file_key: &str) -> Result<()> {
        tokio::fs::remove_file(self.object_path(file_key)?).await?;
        Ok(())
    }

    fn object_path(&self, file_key: &str) -> Result<PathBuf> {
        // Keys are server-generated, but never trust one as a path.
        if file_key.is_empty()
            || file_key.contains('/')
            || file_key.contains('\\')
            || file_key.contains("..")
        {
            return Err(anyhow!("Invalid file key: {}", file_key));
        }
        Ok(self.data_dir.join(file_key))
    }
}

fn new_file_key(file_name: &str) -> String {
    let id = Uuid::new_v4();
    match Path::new(file_name).extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => format!("{}.{}", id, ext.to_ascii_lowercase()),
        _ => id.to_string(),
    }
}

fn hex_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn store_and_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let storage = StorageService::new(dir.path()).unwrap();

        let stored = storage.store("notes.pdf", b"lecture notes").await.unwrap();
        assert!(stored.file_key.ends_with(".pdf"));
        assert_eq!(stored.size, 13);

        let bytes = storage.read(&stored.file_key).await.unwrap();
        assert_eq!(bytes, b"lecture notes");
    }

    #[tokio::test]
    async fn checksum_is_stable_for_same_content() {
        let dir = TempDir::new().unwrap();
        let storage = StorageService::new(dir.path()).unwrap();

        let a = storage.store("a.txt", b"same bytes").await.unwrap();
        let b = storage.store("b.txt", b"same bytes").await.unwrap();

        assert_ne!(a.file_key, b.file_key);
        assert_eq!(a.checksum, b.checksum);
        assert_eq!(a.checksum.len(), 64);
    }

    #[tokio::test]
    async fn delete_removes_object() {
        let dir = TempDir::new().unwrap();
        let storage = StorageService::new(dir.path()).unwrap();

        let stored = storage.store("tmp.bin", &[1, 2, 3]).await.unwrap();
        storage.delete(&stored.file_key).await.unwrap();
        assert!(storage.read(&stored.file_key).await.is_err());
    }

    #[tokio::test]
    async fn rejects_path_traversal_keys() {
        let dir = TempDir::new().unwrap();
        let storage = StorageService::new(dir.path()).unwrap();

        assert!(storage.read("../etc/passwd").await.is_err());
        assert!(storage.read("a/b").await.is_err());
        assert!(storage.read("").await.is_err());
    }
}
