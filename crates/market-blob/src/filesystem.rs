use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{BlobError, BlobResult};
use crate::traits::{validate_key, BlobStore, StoredBlob};

/// Local filesystem blob store.
///
/// Files live flat under `root`. Writes go to a hidden, uniquely named
/// temporary file that is then linked into place, so readers never observe a
/// partial picture and an existing file is never replaced.
#[derive(Debug, Clone)]
pub struct FilesystemBlobStore {
    root: PathBuf,
}

impl FilesystemBlobStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub async fn new(root: impl AsRef<Path>) -> BlobResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, filename: &str) -> BlobResult<PathBuf> {
        validate_key(filename)?;
        Ok(self.root.join(filename))
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put(&self, filename: &str, media_type: &str, data: Bytes) -> BlobResult<StoredBlob> {
        let path = self.path_for(filename)?;
        if fs::try_exists(&path).await? {
            return Err(BlobError::AlreadyExists(filename.to_string()));
        }

        let tmp = self
            .root
            .join(format!(".{filename}.{:016x}.tmp", rand::random::<u64>()));
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp)
            .await?;
        let write = async {
            file.write_all(&data).await?;
            file.sync_all().await?;
            // Fails if the name was taken since the check above.
            fs::hard_link(&tmp, &path).await
        };
        let written = write.await;
        drop(file);
        let _ = fs::remove_file(&tmp).await;
        match written {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(BlobError::AlreadyExists(filename.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::debug!(path = %path.display(), size = data.len(), "blob written");
        Ok(StoredBlob {
            filename: filename.to_string(),
            media_type: media_type.to_string(),
            size: data.len() as u64,
        })
    }

    async fn get(&self, filename: &str) -> BlobResult<Option<Bytes>> {
        let path = self.path_for(filename)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, filename: &str) -> BlobResult<bool> {
        let path = self.path_for(filename)?;
        Ok(fs::try_exists(&path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemBlobStore::new(dir.path()).await.unwrap();
        let stored = store
            .put("abc.png", "image/png", Bytes::from_static(b"\x89PNG"))
            .await
            .unwrap();
        assert_eq!(stored.size, 4);
        assert_eq!(stored.media_type, "image/png");
        assert_eq!(
            store.get("abc.png").await.unwrap().unwrap(),
            Bytes::from_static(b"\x89PNG")
        );
        assert!(dir.path().join("abc.png").exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemBlobStore::new(dir.path()).await.unwrap();
        assert!(store.get("nope.png").await.unwrap().is_none());
        assert!(!store.exists("nope.png").await.unwrap());
    }

    #[tokio::test]
    async fn refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemBlobStore::new(dir.path()).await.unwrap();
        store.put("a.jpg", "image/jpeg", Bytes::from_static(b"1")).await.unwrap();
        let err = store
            .put("a.jpg", "image/jpeg", Bytes::from_static(b"2"))
            .await
            .unwrap_err();
        assert!(matches!(err, BlobError::AlreadyExists(_)));
        assert_eq!(store.get("a.jpg").await.unwrap().unwrap(), Bytes::from_static(b"1"));
    }

    #[tokio::test]
    async fn concurrent_puts_of_one_name_keep_the_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemBlobStore::new(dir.path()).await.unwrap();
        let (a, b) = tokio::join!(
            store.put("same.png", "image/png", Bytes::from_static(b"a")),
            store.put("same.png", "image/png", Bytes::from_static(b"b")),
        );
        let winner = match (a, b) {
            (Ok(_), Err(BlobError::AlreadyExists(_))) => Bytes::from_static(b"a"),
            (Err(BlobError::AlreadyExists(_)), Ok(_)) => Bytes::from_static(b"b"),
            other => panic!("expected exactly one put to succeed: {other:?}"),
        };
        assert_eq!(store.get("same.png").await.unwrap().unwrap(), winner);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemBlobStore::new(dir.path().join("pics")).await.unwrap();
        let err = store
            .put("../escape.png", "image/png", Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, BlobError::InvalidFilename(_)));
        assert!(!dir.path().join("escape.png").exists());
    }

    #[tokio::test]
    async fn creates_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("public/pictures/items");
        let store = FilesystemBlobStore::new(&root).await.unwrap();
        assert!(root.is_dir());
        assert_eq!(store.root(), root.as_path());
    }
}
