//! Signed uploads to a Cloudinary-compatible image API.
//!
//! Uploads go to `{api_base}/v1_1/{cloud_name}/image/upload` as multipart
//! forms. The signature is the SHA-256 of the alphabetically sorted signed
//! parameters (`k=v` joined by `&`) immediately followed by the API secret.

use std::time::Duration;

use async_trait::async_trait;
use drapely_core::config::StorageCredentials;
use drapely_core::hashing::sha256_hex;
use drapely_core::image::DecodedImage;
use drapely_core::retry::RetryPolicy;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::{artifact_key, ArtifactStore, PublishError, ARTIFACT_FOLDER};

/// HTTP request timeout for a single upload.
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

/// Parameters covered by the upload signature, already sorted by name.
pub fn signed_params(public_id: &str, timestamp: i64) -> Vec<(&'static str, String)> {
    vec![
        ("folder", ARTIFACT_FOLDER.to_string()),
        ("overwrite", "true".to_string()),
        ("public_id", public_id.to_string()),
        ("timestamp", timestamp.to_string()),
    ]
}

/// Sign `params` (must be sorted by name) with `api_secret`.
pub fn sign(params: &[(&str, String)], api_secret: &str) -> String {
    let joined = params
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    sha256_hex(format!("{joined}{api_secret}").as_bytes())
}

pub struct CloudinaryStore {
    client: reqwest::Client,
    credentials: StorageCredentials,
    retry: RetryPolicy,
}

impl CloudinaryStore {
    pub fn new(credentials: StorageCredentials) -> Self {
        Self::with_client(reqwest::Client::new(), credentials)
    }

    pub fn with_client(client: reqwest::Client, credentials: StorageCredentials) -> Self {
        Self {
            client,
            credentials,
            retry: RetryPolicy::NO_RETRY,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/v1_1/{}/image/upload",
            self.credentials.api_base.trim_end_matches('/'),
            self.credentials.cloud_name
        )
    }

    async fn upload(&self, png: &[u8], public_id: &str, timestamp: i64) -> Result<String, PublishError> {
        let params = signed_params(public_id, timestamp);
        let signature = sign(&params, &self.credentials.api_secret);

        let file = Part::bytes(png.to_vec())
            .file_name(format!("{public_id}.png"))
            .mime_str("image/png")?;
        let mut form = Form::new()
            .part("file", file)
            .text("api_key", self.credentials.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (name, value) in params {
            form = form.text(name, value);
        }

        let response = self
            .client
            .post(self.upload_url())
            .timeout(UPLOAD_TIMEOUT)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<UploadResponse>()
            .await?
            .secure_url
            .ok_or(PublishError::MissingUrl)
    }
}

#[async_trait]
impl ArtifactStore for CloudinaryStore {
    async fn publish(
        &self,
        image: &DecodedImage,
        owner_id: &str,
        garment_id: &str,
    ) -> Result<String, PublishError> {
        let png = image.encode_png()?;
        let public_id = artifact_key(garment_id, owner_id);
        let timestamp = chrono::Utc::now().timestamp();

        let url = self
            .retry
            .run("artifact_upload", || self.upload(&png, &public_id, timestamp))
            .await
            .inspect_err(|e| tracing::error!(garment_id, error = %e, "Artifact upload failed"))?;

        tracing::info!(garment_id, %url, "Uploaded artifact");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use drapely_core::image::ImageSource;
    use drapely_test_support::fixtures::decoded;
    use drapely_test_support::stubs::UploadStub;
    use httpmock::prelude::*;

    use super::*;

    fn credentials(api_base: String) -> StorageCredentials {
        StorageCredentials {
            cloud_name: "demo".into(),
            api_key: "1234".into(),
            api_secret: "shh".into(),
            api_base,
        }
    }

    #[test]
    fn signature_covers_sorted_params_then_secret() {
        let params = signed_params("shirt_u1", 1_700_000_000);
        assert_eq!(
            sign(&params, "shh"),
            "b5364df14fed57dec1740cdf21cacf27f8f3d932b39da7755f147cbde122582a"
        );
    }

    #[test]
    fn signed_params_are_sorted() {
        let params = signed_params("k", 1);
        let names: Vec<_> = params.iter().map(|(name, _)| *name).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[tokio::test]
    async fn publish_returns_secure_url() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/v1_1/demo/image/upload");
            then.status(200).json_body(serde_json::json!({
                "public_id": "ecommerce-products/users/shirt_u1",
                "secure_url": "https://res.cloudinary.test/demo/shirt_u1.png",
            }));
        });

        let store = CloudinaryStore::new(credentials(server.url("")));
        let image = decoded(ImageSource::Garment("shirt".into()), [5, 5, 5]);
        let url = store.publish(&image, "u1", "shirt").await.unwrap();

        mock.assert();
        assert_eq!(url, "https://res.cloudinary.test/demo/shirt_u1.png");
    }

    #[tokio::test]
    async fn upload_form_carries_signed_overwrite_params() {
        let stub = UploadStub::start("https://res.cloudinary.test/demo/coat_u7.png").await;
        let store = CloudinaryStore::new(credentials(stub.base_url()));
        let image = decoded(ImageSource::Garment("coat".into()), [9, 9, 9]);

        store.publish(&image, "u7", "coat").await.unwrap();

        let uploads = stub.uploads();
        assert_eq!(uploads.len(), 1);
        let form = &uploads[0];
        assert_eq!(form.text("public_id"), Some("coat_u7"));
        assert_eq!(form.text("overwrite"), Some("true"));
        assert_eq!(form.text("folder"), Some(ARTIFACT_FOLDER));
        assert_eq!(form.text("api_key"), Some("1234"));
        assert_eq!(form.text("signature_algorithm"), Some("sha256"));

        let timestamp: i64 = form.text("timestamp").unwrap().parse().unwrap();
        let expected = sign(&signed_params("coat_u7", timestamp), "shh");
        assert_eq!(form.text("signature"), Some(expected.as_str()));

        assert_eq!(form.files.len(), 1);
        assert_eq!(form.files[0].field, "file");
        assert_eq!(form.files[0].file_name, "coat_u7.png");
    }

    #[tokio::test]
    async fn rejected_upload_is_api_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/v1_1/demo/image/upload");
            then.status(401).body("Invalid Signature");
        });

        let store = CloudinaryStore::new(credentials(server.url("")));
        let image = decoded(ImageSource::Garment("shirt".into()), [5, 5, 5]);
        let err = store.publish(&image, "u1", "shirt").await.unwrap_err();

        assert_matches!(err, PublishError::Api { status: 401, .. });
    }

    #[tokio::test]
    async fn response_without_url_is_rejected() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/v1_1/demo/image/upload");
            then.status(200).json_body(serde_json::json!({ "public_id": "x" }));
        });

        let store = CloudinaryStore::new(credentials(server.url("")));
        let image = decoded(ImageSource::Garment("shirt".into()), [5, 5, 5]);
        let err = store.publish(&image, "u1", "shirt").await.unwrap_err();

        assert_matches!(err, PublishError::MissingUrl);
    }
}
