//! Object storage contract for uploaded files.
//!
//! Implementations live in `infrastructure::storage`.

use async_trait::async_trait;

use super::DomainError;

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` under `key`, overwriting any existing object, and
    /// return its public URL.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str)
    -> Result<String, DomainError>;

    /// Remove the object. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), DomainError>;

    /// Public URL for a key, without checking it exists.
    fn url_for(&self, key: &str) -> String;
}

/// Supported upload formats, detected from file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl ImageFormat {
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            image::ImageFormat::Jpeg => Some(ImageFormat::Jpeg),
            image::ImageFormat::Png => Some(ImageFormat::Png),
            image::ImageFormat::Gif => Some(ImageFormat::Gif),
            image::ImageFormat::WebP => Some(ImageFormat::WebP),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::WebP => "webp",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Gif => "image/gif",
            ImageFormat::WebP => "image/webp",
        }
    }
}

/// Storage key for a book image: `books/{book_id}/{uuid}.{ext}`.
pub fn book_image_key(book_id: i32, format: ImageFormat) -> String {
    format!(
        "books/{}/{}.{}",
        book_id,
        uuid::Uuid::new_v4(),
        format.extension()
    )
}
