//! Client for the batch try-on transform service.
//!
//! One request carries the subject image and every garment image as a
//! single multipart form posted to `{endpoint}/tryon/batch`. The response
//! is a ZIP archive demultiplexed by [`crate::archive::demultiplex`].

use std::time::Duration;

use drapely_core::image::DecodedImage;
use drapely_core::retry::RetryPolicy;
use drapely_core::types::GarmentId;
use reqwest::multipart::{Form, Part};

use crate::archive::{self, BatchOutput};

/// Path of the batch endpoint, relative to the configured base URL.
pub const BATCH_PATH: &str = "/tryon/batch";

/// Batch renders are slow; this is the dominant latency of a request.
pub const TRANSFORM_TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// Form field carrying the subject image.
pub const SUBJECT_FIELD: &str = "human_image";

/// Repeated form field carrying garment images, in submission order.
pub const GARMENT_FIELD: &str = "garment_images";

/// Fixed processing knobs sent with every batch.
pub const PROCESSING_PARAMS: [(&str, &str); 4] = [
    ("auto_mask", "true"),
    ("auto_crop", "false"),
    ("denoise_steps", "30"),
    ("seed", "42"),
];

/// Whole-batch failures. None of these yield partial results.
#[derive(Debug, thiserror::Error)]
pub enum BatchTransformError {
    /// An input bitmap could not be encoded as PNG.
    #[error("Failed to encode {image} as PNG: {source}")]
    Encode {
        image: String,
        source: image::ImageError,
    },

    /// Transport failure or timeout.
    #[error("HTTP request to transform service failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Transform service error ({status}): {body}")]
    ApiError {
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response body is not a readable ZIP archive.
    #[error("Unreadable result archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Failed to read archive entry {name}: {source}")]
    Entry {
        name: String,
        source: std::io::Error,
    },

    #[error("Failed to decode archive entry {name}: {source}")]
    Decode {
        name: String,
        source: image::ImageError,
    },
}

/// HTTP client for one batch transform deployment.
#[derive(Clone)]
pub struct BatchTransformClient {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl BatchTransformClient {
    /// * `endpoint` - base URL, e.g. `https://tryon.example.com`.
    pub fn new(endpoint: String) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, endpoint: String) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            timeout: TRANSFORM_TIMEOUT,
            retry: RetryPolicy::NO_RETRY,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Render every garment onto the subject in one remote batch.
    ///
    /// `garments` order is significant: output `i` of the archive is
    /// attributed to `garments[i - 1]`. Garments without an output are
    /// reported in [`BatchOutput::missing`] rather than as an error.
    pub async fn submit_batch(
        &self,
        subject: &DecodedImage,
        garments: &[(GarmentId, DecodedImage)],
    ) -> Result<BatchOutput, BatchTransformError> {
        let subject_png = subject
            .encode_png()
            .map_err(|source| BatchTransformError::Encode {
                image: "subject image".into(),
                source,
            })?;
        tracing::debug!(bytes = subject_png.len(), "Prepared subject image");

        let mut garment_pngs = Vec::with_capacity(garments.len());
        for (garment_id, image) in garments {
            let png = image
                .encode_png()
                .map_err(|source| BatchTransformError::Encode {
                    image: format!("garment {garment_id}"),
                    source,
                })?;
            tracing::debug!(garment_id = %garment_id, bytes = png.len(), "Prepared garment image");
            garment_pngs.push((garment_id.clone(), png));
        }

        tracing::info!(
            garments = garment_pngs.len(),
            endpoint = %self.endpoint,
            "Submitting try-on batch"
        );

        let body = self
            .retry
            .run("batch_transform", || self.post_batch(&subject_png, &garment_pngs))
            .await?;

        let garment_ids: Vec<GarmentId> = garments.iter().map(|(id, _)| id.clone()).collect();
        archive::demultiplex(&body, &garment_ids)
    }

    // ---- private helpers ----

    async fn post_batch(
        &self,
        subject_png: &[u8],
        garment_pngs: &[(GarmentId, Vec<u8>)],
    ) -> Result<Vec<u8>, BatchTransformError> {
        let form = build_form(subject_png, garment_pngs)?;

        let response = self
            .client
            .post(format!("{}{BATCH_PATH}", self.endpoint))
            .multipart(form)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::error!(status = status.as_u16(), body = %body, "Transform service returned an error");
            return Err(BatchTransformError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Multipart body: subject first, then garments in caller order, then the
/// fixed processing parameters.
fn build_form(
    subject_png: &[u8],
    garment_pngs: &[(GarmentId, Vec<u8>)],
) -> Result<Form, reqwest::Error> {
    let subject = png_part(subject_png.to_vec(), "person.png".into())?;
    let mut form = Form::new().part(SUBJECT_FIELD, subject);

    for (garment_id, png) in garment_pngs {
        let part = png_part(png.clone(), format!("{garment_id}.png"))?;
        form = form.part(GARMENT_FIELD, part);
    }

    for (name, value) in PROCESSING_PARAMS {
        form = form.text(name, value);
    }

    Ok(form)
}

fn png_part(bytes: Vec<u8>, file_name: String) -> Result<Part, reqwest::Error> {
    Part::bytes(bytes).file_name(file_name).mime_str("image/png")
}
