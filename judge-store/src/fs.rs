use crate::{ObjectStorage, StoreError};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

/// Object storage where bucket `b` and object `p` live at `{root}/b/p`.
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> FsStorage {
        FsStorage { root: root.into() }
    }

    fn resolve(&self, bucket: &str, path: &str) -> Result<PathBuf, StoreError> {
        for part in [bucket, path] {
            let escapes = Path::new(part)
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
            if part.is_empty() || escapes {
                return Err(StoreError::InvalidPath(format!("{}/{}", bucket, path)));
            }
        }
        Ok(self.root.join(bucket).join(path))
    }
}

#[async_trait]
impl ObjectStorage for FsStorage {
    async fn read_string(&self, path: &str, bucket: &str) -> Result<String, StoreError> {
        let full = self.resolve(bucket, path)?;
        match tokio::fs::read_to_string(&full).await {
            Ok(s) => Ok(s),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::not_found("object", format!("{}/{}", bucket, path)))
            }
            Err(source) => Err(StoreError::Io { path: full, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_objects_from_bucket_dir() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::create_dir_all(dir.path().join("testcases/hello"))
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("testcases/hello/1.out"), "Hello, World!\n")
            .await
            .unwrap();

        let storage = FsStorage::new(dir.path());
        let text = storage.read_string("hello/1.out", "testcases").await.unwrap();
        assert_eq!(text, "Hello, World!\n");

        let missing = storage.read_string("hello/2.out", "testcases").await;
        assert!(matches!(missing, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn rejects_escaping_paths() {
        let storage = FsStorage::new("/srv/data");
        for (path, bucket) in [("../users.yaml", "testcases"), ("a", ".."), ("/etc/passwd", "b"), ("a", "")] {
            let res = storage.read_string(path, bucket).await;
            assert!(matches!(res, Err(StoreError::InvalidPath(_))), "{} {}", bucket, path);
        }
    }
}
