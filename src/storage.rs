use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;

#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, name: &str, body: Bytes) -> anyhow::Result<()>;
    async fn delete_object(&self, name: &str) -> anyhow::Result<()>;
}

/// Stores uploads as plain files inside one directory.
#[derive(Clone)]
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub async fn new(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .with_context(|| format!("create upload dir {}", root.display()))?;
        Ok(Self { root })
    }

    fn path_for(&self, name: &str) -> anyhow::Result<PathBuf> {
        anyhow::ensure!(
            !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != "..",
            "invalid object name {name:?}"
        );
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl StorageClient for DiskStorage {
    async fn put_object(&self, name: &str, body: Bytes) -> anyhow::Result<()> {
        let path = self.path_for(name)?;
        fs::write(&path, &body)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    async fn delete_object(&self, name: &str) -> anyhow::Result<()> {
        let path = self.path_for(name)?;
        fs::remove_file(&path)
            .await
            .with_context(|| format!("remove {}", path.display()))?;
        Ok(())
    }
}
