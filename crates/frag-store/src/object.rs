//! The object-storage service boundary and its filesystem implementation.
//!
//! Objects are opaque byte sequences addressed by a slash-separated path.
//! Reads hand back a stream of chunks; callers that need a single buffer
//! collect it themselves.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

/// Incrementally delivered object content.
pub type ObjectBody = BoxStream<'static, std::io::Result<Bytes>>;

/// Object-storage service primitives.
#[async_trait]
pub trait ObjectService: Send + Sync {
    /// Write the object at `path`, replacing any existing object.
    async fn put_object(&self, path: &str, data: Bytes) -> StoreResult<()>;

    /// Open the object at `path`. Returns `Ok(None)` if it does not exist.
    async fn get_object(&self, path: &str) -> StoreResult<Option<ObjectBody>>;

    /// Remove the object at `path`. Missing objects are not an error.
    async fn delete_object(&self, path: &str) -> StoreResult<()>;

    /// Object names directly under `prefix/`, sorted.
    async fn list_objects(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// Remove every object.
    async fn clear(&self) -> StoreResult<()>;
}

const READ_CHUNK: usize = 64 * 1024;

/// [`ObjectService`] on the local filesystem.
///
/// Path format: `{root}/{owner}/{id}`. Each write goes to its own sibling
/// `{id}.{uuid}.tmp` file that is renamed into place, so a reader never
/// observes a half-written object and concurrent writers to one path never
/// share a file. The last rename wins. Owner directories are never removed
/// while the service is live; only [`ObjectService::clear`] drops them.
#[derive(Clone, Debug)]
pub struct FsObjectService {
    root: PathBuf,
}

impl FsObjectService {
    /// Create a service rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map an object path onto the filesystem, rejecting anything that could
    /// escape the root.
    fn resolve(&self, path: &str) -> StoreResult<PathBuf> {
        let relative = Path::new(path);
        let plain = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return Err(StoreError::InvalidKey(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

fn temp_path_for(full_path: &Path) -> PathBuf {
    let name = full_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    full_path.with_file_name(format!("{name}.{}.tmp", uuid::Uuid::now_v7().simple()))
}

#[async_trait]
impl ObjectService for FsObjectService {
    async fn put_object(&self, path: &str, data: Bytes) -> StoreResult<()> {
        let full_path = self.resolve(path)?;
        debug!(object_path = %path, size = data.len(), "objects: put");

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "objects: create_dir_all failed");
                StoreError::backend("put_object", path, e)
            })?;
        }

        let temp_path = temp_path_for(&full_path);
        let write = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(&data).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&temp_path, &full_path).await
        };
        if let Err(e) = write.await {
            warn!(object_path = %path, error = %e, "objects: write failed");
            let _ = fs::remove_file(&temp_path).await;
            return Err(StoreError::backend("put_object", path, e));
        }
        Ok(())
    }

    async fn get_object(&self, path: &str) -> StoreResult<Option<ObjectBody>> {
        let full_path = self.resolve(path)?;
        let file = match fs::File::open(&full_path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::backend("get_object", path, e)),
        };

        let body = stream::try_unfold(file, |mut file| async move {
            let mut buf = vec![0u8; READ_CHUNK];
            let n = file.read(&mut buf).await?;
            if n == 0 {
                return Ok::<_, std::io::Error>(None);
            }
            buf.truncate(n);
            Ok(Some((Bytes::from(buf), file)))
        });
        Ok(Some(body.boxed()))
    }

    async fn delete_object(&self, path: &str) -> StoreResult<()> {
        let full_path = self.resolve(path)?;
        debug!(object_path = %path, "objects: delete");
        match fs::remove_file(&full_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::backend("delete_object", path, e)),
        }
        Ok(())
    }

    async fn list_objects(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let dir = self.resolve(prefix)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::backend("list_objects", prefix, e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::backend("list_objects", prefix, e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            // In-flight writes are not objects yet.
            if name.ends_with(".tmp") {
                continue;
            }
            names.push(name);
        }
        names.sort();
        Ok(names)
    }

    async fn clear(&self) -> StoreResult<()> {
        match fs::remove_dir_all(&self.root).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::backend("clear", self.root.display(), e)),
        }
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StoreError::backend("clear", self.root.display(), e))
    }
}
