//! Storage for user uploaded files such as category thumbnails.

use std::{
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
};

use sha2::{Digest, Sha256};

use crate::{Error, UserID, endpoints};

/// Somewhere to keep uploaded files.
pub trait BlobStore: Debug + Send + Sync {
    /// Store `bytes` on behalf of `owner` and return the public URL of the file.
    ///
    /// Files are keyed by their content, so uploading the same file twice
    /// returns the same URL.
    ///
    /// # Errors
    /// Returns [Error::NotAnImage] if `content_type` is not a supported raster image
    /// or [Error::BlobStoreError] if the file could not be written.
    fn put(&self, owner: UserID, content_type: &str, bytes: &[u8]) -> Result<String, Error>;
}

/// A [BlobStore] that writes files to a local directory served under [endpoints::UPLOADS].
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a store that writes to `root`. The directory is created on the first upload.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory the files are written to.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl BlobStore for LocalBlobStore {
    fn put(&self, owner: UserID, content_type: &str, bytes: &[u8]) -> Result<String, Error> {
        let extension = image_extension(content_type).ok_or(Error::NotAnImage)?;
        let file_name = format!("{:x}.{extension}", Sha256::digest(bytes));
        let owner_dir = self.root.join(owner.to_string());

        fs::create_dir_all(&owner_dir).map_err(|error| {
            Error::BlobStoreError(format!("could not create {}: {error}", owner_dir.display()))
        })?;

        let path = owner_dir.join(&file_name);
        fs::write(&path, bytes).map_err(|error| {
            Error::BlobStoreError(format!("could not write {}: {error}", path.display()))
        })?;

        tracing::debug!("Stored {} bytes at {}", bytes.len(), path.display());

        Ok(format!("{}/{owner}/{file_name}", endpoints::UPLOADS))
    }
}

/// The file extension for an uploadable image type, or `None` if the type is not accepted.
///
/// Only raster formats are accepted.
pub(crate) fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/avif" => Some("avif"),
        _ => None,
    }
}
