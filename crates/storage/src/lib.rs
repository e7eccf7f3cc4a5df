//! Durable storage for rendered try-on images.
//!
//! Every artifact is stored under a deterministic key derived from the
//! garment and the owner, so re-running a request overwrites the earlier
//! result instead of accumulating copies.

pub mod cloudinary;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use drapely_core::config::StorageCredentials;
use drapely_core::image::DecodedImage;

pub use cloudinary::CloudinaryStore;
pub use memory::MemoryStore;

/// Folder every artifact is uploaded into.
pub const ARTIFACT_FOLDER: &str = "ecommerce-products/users";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The bitmap could not be encoded to PNG.
    #[error("Failed to encode artifact: {0}")]
    Encode(#[from] image::ImageError),

    /// The upload request failed (network, DNS, timeout, etc.).
    #[error("Upload request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The storage API answered with a non-2xx status code.
    #[error("Storage API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// A 2xx answer without a usable URL.
    #[error("Storage API response missing secure_url")]
    MissingUrl,
}

// ---------------------------------------------------------------------------
// ArtifactStore
// ---------------------------------------------------------------------------

/// A backend that persists one rendered image and returns its durable URL.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn publish(
        &self,
        image: &DecodedImage,
        owner_id: &str,
        garment_id: &str,
    ) -> Result<String, PublishError>;
}

/// Storage key for an artifact: `{garment_id}_{owner_id}`.
pub fn artifact_key(garment_id: &str, owner_id: &str) -> String {
    format!("{garment_id}_{owner_id}")
}

/// Pick the store for the configured credentials.
///
/// Without credentials artifacts only live in process memory.
pub fn store_from_credentials(credentials: Option<&StorageCredentials>) -> Arc<dyn ArtifactStore> {
    match credentials {
        Some(credentials) => Arc::new(CloudinaryStore::new(credentials.clone())),
        None => {
            tracing::warn!("Storage credentials not configured, using in-memory artifact store");
            Arc::new(MemoryStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_combines_garment_then_owner() {
        assert_eq!(artifact_key("shirt", "user-42"), "shirt_user-42");
    }

    #[test]
    fn publish_error_display() {
        let err = PublishError::Api {
            status: 401,
            body: "Invalid Signature".into(),
        };
        assert_eq!(
            err.to_string(),
            "Storage API returned HTTP 401: Invalid Signature"
        );
    }
}
