//! Stored-image handling.
//!
//! Uploads are validated (extension allowlist, size cap), decoded, and
//! re-encoded to JPEG before they touch disk, so nothing undecodable is ever
//! stored. Stored files get uuid filenames; the original name only
//! contributes its extension for the allowlist check.

use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use thiserror::Error;

use crate::models::business::DEFAULT_LOGO_PATH;

/// Maximum accepted upload size: 10 MiB.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Accepted upload extensions (case-insensitive).
const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Errors from image validation and storage.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Extension not in the allowlist.
    #[error("file extension not allowed")]
    InvalidExtension,

    /// Upload exceeds [`MAX_UPLOAD_BYTES`].
    #[error("file exceeds the 10 MiB limit")]
    TooLarge,

    /// Bytes did not decode as an image.
    #[error("file is not a valid image: {0}")]
    NotAnImage(#[from] image::ImageError),

    /// Filesystem operation failed.
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Filesystem store for uploaded images.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    /// Create a store rooted at `root`. The directory is created at startup,
    /// not here.
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Validate, re-encode, and store an uploaded image.
    ///
    /// Returns the public path (`/static/images/<uuid>.<ext>`) to record in
    /// the database.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::InvalidExtension` or `MediaError::TooLarge`
    /// before any decode work, `MediaError::NotAnImage` if the bytes don't
    /// decode, and `MediaError::Io` if the write fails.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String, MediaError> {
        let extension = allowed_extension(original_name)?;

        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(MediaError::TooLarge);
        }

        let decoded = image::load_from_memory(bytes)?;

        // Strip alpha and metadata by re-encoding to JPEG at quality 85.
        let rgb = decoded.to_rgb8();
        let mut encoded = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut encoded, 85);
        rgb.write_with_encoder(encoder)?;

        let stored_name = format!("{}.{extension}", uuid::Uuid::new_v4());
        tokio::fs::write(self.root.join(&stored_name), &encoded).await?;

        Ok(format!("/static/images/{stored_name}"))
    }

    /// Validate and store a batch of uploads, all or nothing.
    ///
    /// Files are saved in order; if any file fails validation or storage,
    /// the files already written for this batch are removed again and the
    /// failure is returned. On success every file is on disk and its public
    /// path is in the returned list, in input order.
    ///
    /// # Errors
    ///
    /// Returns the first per-file error, after rolling back earlier saves.
    pub async fn save_batch<B: AsRef<[u8]>>(
        &self,
        files: &[(String, B)],
    ) -> Result<Vec<String>, MediaError> {
        let mut saved = Vec::with_capacity(files.len());

        for (original_name, bytes) in files {
            match self.save(original_name, bytes.as_ref()).await {
                Ok(path) => saved.push(path),
                Err(err) => {
                    // The batch must leave no trace on disk.
                    for path in &saved {
                        if let Err(e) = self.remove(path).await {
                            tracing::warn!(path = %path, error = %e, "failed to roll back stored file");
                        }
                    }
                    return Err(err);
                }
            }
        }

        Ok(saved)
    }

    /// Delete a stored file by its public path.
    ///
    /// The shared default logo is never deleted; removing it is a no-op.
    /// A path that doesn't resolve under the store root is also a no-op.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Io` if the delete fails for a reason other than
    /// the file already being gone.
    pub async fn remove(&self, public_path: &str) -> Result<(), MediaError> {
        if public_path == DEFAULT_LOGO_PATH {
            return Ok(());
        }

        let Some(file_name) = stored_file_name(public_path) else {
            return Ok(());
        };

        match tokio::fs::remove_file(self.root.join(file_name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MediaError::Io(e)),
        }
    }
}

/// Check the extension against the allowlist, returning it lowercased.
fn allowed_extension(original_name: &str) -> Result<String, MediaError> {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .ok_or(MediaError::InvalidExtension)?;

    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(MediaError::InvalidExtension)
    }
}

/// Extract the bare file name from a public path, rejecting anything with
/// traversal components.
fn stored_file_name(public_path: &str) -> Option<&str> {
    let name = public_path.rsplit('/').next()?;
    if name.is_empty() || name == "." || name == ".." || name.contains('\\') {
        return None;
    }
    Some(name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_allowlist() {
        assert!(allowed_extension("photo.png").is_ok());
        assert!(allowed_extension("photo.JPG").is_ok());
        assert!(allowed_extension("photo.jpeg").is_ok());
        assert!(allowed_extension("photo.gif").is_ok());
        assert!(allowed_extension("photo.webp").is_err());
        assert!(allowed_extension("photo").is_err());
        assert!(allowed_extension(".png").is_err());
    }

    #[test]
    fn test_stored_file_name_rejects_traversal() {
        assert_eq!(
            stored_file_name("/static/images/abc.jpg"),
            Some("abc.jpg")
        );
        assert_eq!(stored_file_name("/static/images/.."), None);
        assert_eq!(stored_file_name("/static/images/"), None);
    }

    #[tokio::test]
    async fn test_oversized_upload_rejected() {
        let store = MediaStore::new(std::env::temp_dir());
        let bytes = vec![0_u8; MAX_UPLOAD_BYTES + 1];
        let err = store.save("big.png", &bytes).await.unwrap_err();
        assert!(matches!(err, MediaError::TooLarge));
    }

    #[tokio::test]
    async fn test_non_image_bytes_rejected() {
        let store = MediaStore::new(std::env::temp_dir());
        let err = store.save("fake.png", b"not an image").await.unwrap_err();
        assert!(matches!(err, MediaError::NotAnImage(_)));
    }

    #[tokio::test]
    async fn test_default_logo_never_deleted() {
        let store = MediaStore::new(std::env::temp_dir());
        store.remove(DEFAULT_LOGO_PATH).await.unwrap();
    }

    /// A store rooted at a fresh temp directory, so tests can count files.
    async fn temp_store() -> (MediaStore, PathBuf) {
        let root = std::env::temp_dir().join(format!("bazaar-media-test-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&root).await.unwrap();
        (MediaStore::new(root.clone()), root)
    }

    async fn count_files(root: &Path) -> usize {
        let mut entries = tokio::fs::read_dir(root).await.unwrap();
        let mut count = 0;
        while entries.next_entry().await.unwrap().is_some() {
            count += 1;
        }
        count
    }

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::new(4, 4);
        let mut out = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    #[tokio::test]
    async fn test_batch_success_stores_every_file() {
        let (store, root) = temp_store().await;

        let files = vec![
            ("first.png".to_string(), png_bytes()),
            ("second.png".to_string(), png_bytes()),
        ];
        let paths = store.save_batch(&files).await.unwrap();

        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.starts_with("/static/images/")));
        assert_eq!(count_files(&root).await, 2);

        tokio::fs::remove_dir_all(&root).await.ok();
    }

    #[tokio::test]
    async fn test_batch_failure_rolls_back_earlier_saves() {
        let (store, root) = temp_store().await;

        // First file is valid and gets written; the second fails the
        // extension allowlist, which must undo the first write.
        let files = vec![
            ("first.png".to_string(), png_bytes()),
            ("second.webp".to_string(), png_bytes()),
        ];
        let err = store.save_batch(&files).await.unwrap_err();

        assert!(matches!(err, MediaError::InvalidExtension));
        assert_eq!(count_files(&root).await, 0);

        tokio::fs::remove_dir_all(&root).await.ok();
    }

    #[tokio::test]
    async fn test_batch_failure_on_undecodable_file_rolls_back() {
        let (store, root) = temp_store().await;

        let files = vec![
            ("first.png".to_string(), png_bytes()),
            ("second.png".to_string(), b"not an image".to_vec()),
        ];
        let err = store.save_batch(&files).await.unwrap_err();

        assert!(matches!(err, MediaError::NotAnImage(_)));
        assert_eq!(count_files(&root).await, 0);

        tokio::fs::remove_dir_all(&root).await.ok();
    }
}
