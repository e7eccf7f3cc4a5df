use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use drapely_core::image::DecodedImage;

use crate::{artifact_key, ArtifactStore, PublishError, ARTIFACT_FOLDER};

/// Keeps encoded PNGs in a map keyed by [`artifact_key`].
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// URL handed out for `key`.
    pub fn url_for(key: &str) -> String {
        format!("memory://{ARTIFACT_FOLDER}/{key}.png")
    }

    /// Stored PNG bytes for `key`, if any.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn publish(
        &self,
        image: &DecodedImage,
        owner_id: &str,
        garment_id: &str,
    ) -> Result<String, PublishError> {
        let png = image.encode_png()?;
        let key = artifact_key(garment_id, owner_id);
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), png);

        let url = Self::url_for(&key);
        tracing::debug!(%url, "Stored artifact in memory");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use drapely_core::image::ImageSource;
    use drapely_test_support::fixtures::decoded;

    use super::*;

    #[tokio::test]
    async fn publish_returns_deterministic_url() {
        let store = MemoryStore::new();
        let image = decoded(ImageSource::Garment("shirt".into()), [1, 2, 3]);

        let url = store.publish(&image, "u1", "shirt").await.unwrap();

        assert_eq!(url, "memory://ecommerce-products/users/shirt_u1.png");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn republishing_overwrites_content() {
        let store = MemoryStore::new();
        let first = decoded(ImageSource::Garment("shirt".into()), [255, 0, 0]);
        let second = decoded(ImageSource::Garment("shirt".into()), [0, 0, 255]);

        let url_a = store.publish(&first, "u1", "shirt").await.unwrap();
        let url_b = store.publish(&second, "u1", "shirt").await.unwrap();

        assert_eq!(url_a, url_b);
        assert_eq!(store.len(), 1);
        let stored = store.get("shirt_u1").unwrap();
        let image = DecodedImage::decode(&stored, ImageSource::Subject).unwrap();
        assert_eq!(image.pixels().get_pixel(0, 0).0, [0, 0, 255]);
    }

    #[tokio::test]
    async fn different_owners_do_not_collide() {
        let store = MemoryStore::new();
        let image = decoded(ImageSource::Garment("shirt".into()), [9, 9, 9]);

        store.publish(&image, "u1", "shirt").await.unwrap();
        store.publish(&image, "u2", "shirt").await.unwrap();

        assert_eq!(store.len(), 2);
        assert!(!store.is_empty());
    }
}
