//! Image upload validation, object naming and multipart collection.

use axum::body::Bytes;
use axum::extract::Multipart;
use muhan_core::UserId;
use thiserror::Error;
use uuid::Uuid;

use crate::error::AppError;
use crate::services::supabase::{SupabaseClient, SupabaseError};

/// Per-file size limit.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Bucket for review photos.
pub const REVIEW_IMAGES_BUCKET: &str = "review-images";

/// Bucket for profile pictures.
pub const AVATARS_BUCKET: &str = "avatars";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("unsupported content type: {0}")]
    UnsupportedType(String),
    #[error("file exceeds {MAX_IMAGE_BYTES} bytes")]
    TooLarge,
    #[error("file is empty")]
    Empty,
    #[error("at most {max} files per request")]
    TooMany { max: usize },
    #[error("no file in request")]
    Missing,
}

/// Accepted image types and the extension used for stored objects.
fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

/// Check an uploaded file and pick its extension.
///
/// # Errors
///
/// Returns [`UploadError`] for non-image, empty or oversized files.
pub fn validate_image(content_type: Option<&str>, len: usize) -> Result<&'static str, UploadError> {
    let content_type = content_type.unwrap_or_default().trim().to_ascii_lowercase();
    let ext = extension_for(&content_type)
        .ok_or_else(|| UploadError::UnsupportedType(content_type.clone()))?;
    if len == 0 {
        return Err(UploadError::Empty);
    }
    if len > MAX_IMAGE_BYTES {
        return Err(UploadError::TooLarge);
    }
    Ok(ext)
}

/// Object path `{user_id}/{uuid}.{ext}`; callers can only write under their own prefix.
#[must_use]
pub fn object_path(user_id: UserId, ext: &str) -> String {
    format!("{user_id}/{}.{ext}", Uuid::new_v4())
}

/// One validated image from a multipart request.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub content_type: String,
    pub extension: &'static str,
    pub bytes: Bytes,
}

/// Read up to `max_files` image parts, validating each as it arrives.
///
/// # Errors
///
/// Returns `BadRequest` for malformed multipart bodies, non-images, too many
/// files or no file at all, and `PayloadTooLarge` for oversized images.
pub async fn read_images(
    multipart: &mut Multipart,
    max_files: usize,
) -> Result<Vec<ImageFile>, AppError> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.file_name().is_none() {
            continue;
        }
        if files.len() == max_files {
            return Err(UploadError::TooMany { max: max_files }.into());
        }
        let content_type = field
            .content_type()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        let bytes = field.bytes().await?;
        let extension = validate_image(Some(&content_type), bytes.len())?;
        files.push(ImageFile {
            content_type,
            extension,
            bytes,
        });
    }
    if files.is_empty() {
        return Err(UploadError::Missing.into());
    }
    Ok(files)
}

/// Store one image under the owner's prefix and return its public URL.
///
/// # Errors
///
/// Returns an error if the storage upload fails.
pub async fn store_image(
    storage: &SupabaseClient,
    bucket: &str,
    owner: UserId,
    file: ImageFile,
) -> Result<String, SupabaseError> {
    let path = object_path(owner, file.extension);
    storage
        .upload(bucket, &path, &file.content_type, file.bytes.to_vec())
        .await
}

/// Upload several images, all or nothing.
///
/// If one upload fails, the objects already stored by this call are deleted
/// before the error is returned. A failed cleanup is logged, not reported.
///
/// # Errors
///
/// Returns the error of the first upload that failed.
pub async fn store_images(
    storage: &SupabaseClient,
    bucket: &str,
    owner: UserId,
    files: Vec<ImageFile>,
) -> Result<Vec<String>, SupabaseError> {
    let mut stored = Vec::with_capacity(files.len());
    let mut urls = Vec::with_capacity(files.len());
    for file in files {
        let path = object_path(owner, file.extension);
        match storage
            .upload(bucket, &path, &file.content_type, file.bytes.to_vec())
            .await
        {
            Ok(url) => {
                stored.push(path);
                urls.push(url);
            }
            Err(e) => {
                if !stored.is_empty()
                    && let Err(cleanup) = storage.remove(bucket, &stored).await
                {
                    tracing::warn!(
                        bucket,
                        orphaned = ?stored,
                        error = %cleanup,
                        "could not remove partially uploaded images"
                    );
                }
                return Err(e);
            }
        }
    }
    Ok(urls)
}
