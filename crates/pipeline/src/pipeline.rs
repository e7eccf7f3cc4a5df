//! The per-request try-on state machine.
//!
//! `Received -> FetchingImages -> BatchProcessing -> Publishing`, ending in
//! `Completed` or `Failed`. Whatever the terminal state, the notifier is
//! called exactly once and its own failure never changes the outcome.

use std::sync::Arc;

use drapely_core::config::{PublishPolicy, TryOnConfig};
use drapely_core::image::{DecodedImage, ImageSource};
use drapely_core::outcome::PipelineOutcome;
use drapely_core::types::{GarmentId, TryOnRequest};
use drapely_events::{DisabledNotifier, EmailNotifier, Notification, Notifier};
use drapely_storage::ArtifactStore;
use drapely_transform::{BatchOutput, BatchTransformClient, FetchError, ImageFetcher};
use futures::stream::{self, StreamExt, TryStreamExt};
use indexmap::IndexMap;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::stage::PipelineStage;

/// Garment downloads in flight per request.
pub const GARMENT_FETCH_CONCURRENCY: usize = 4;

/// Artifact uploads in flight per request.
pub const PUBLISH_CONCURRENCY: usize = 4;

pub struct TryOnPipeline {
    fetcher: ImageFetcher,
    transform: Option<BatchTransformClient>,
    store: Arc<dyn ArtifactStore>,
    notifier: Arc<dyn Notifier>,
    publish_policy: PublishPolicy,
}

impl TryOnPipeline {
    /// Assemble a pipeline from explicit parts. `transform: None` selects
    /// degraded mode.
    pub fn new(
        fetcher: ImageFetcher,
        transform: Option<BatchTransformClient>,
        store: Arc<dyn ArtifactStore>,
        notifier: Arc<dyn Notifier>,
        publish_policy: PublishPolicy,
    ) -> Self {
        Self {
            fetcher,
            transform,
            store,
            notifier,
            publish_policy,
        }
    }

    /// Build every component from process configuration, sharing one
    /// HTTP connection pool.
    pub fn from_config(config: &TryOnConfig) -> Self {
        let client = reqwest::Client::new();

        let transform = match &config.transform_endpoint {
            Some(endpoint) => Some(BatchTransformClient::with_client(
                client.clone(),
                endpoint.clone(),
            )),
            None => {
                tracing::warn!("TRANSFORM_ENDPOINT not set, running in degraded mode");
                None
            }
        };

        let store = drapely_storage::store_from_credentials(config.storage.as_ref());

        let notifier: Arc<dyn Notifier> = match &config.notification {
            Some(notification) => Arc::new(EmailNotifier::with_client(
                client.clone(),
                notification.clone(),
            )),
            None => {
                tracing::warn!("RESEND_API_KEY not set, result notifications disabled");
                Arc::new(DisabledNotifier)
            }
        };

        Self::new(
            ImageFetcher::with_client(client),
            transform,
            store,
            notifier,
            config.publish_policy,
        )
    }

    /// Process one request to its terminal state and notify the caller.
    pub async fn run(&self, request_id: Uuid, request: &TryOnRequest) -> PipelineOutcome {
        PipelineStage::Received.enter();
        tracing::info!(
            %request_id,
            garments = request.garments.len(),
            "Processing try-on request"
        );

        let outcome = match self.execute(request).await {
            Ok(urls) => {
                PipelineStage::Completed.enter();
                tracing::info!(%request_id, published = urls.len(), "Try-on request completed");
                PipelineOutcome::Success { urls }
            }
            Err(e) => {
                PipelineStage::Failed.enter();
                tracing::error!(%request_id, error = %e, "Try-on request failed");
                PipelineOutcome::Failure {
                    reason: e.to_string(),
                }
            }
        };

        self.notify(request, &outcome).await;
        outcome
    }

    async fn execute(
        &self,
        request: &TryOnRequest,
    ) -> Result<IndexMap<GarmentId, String>, PipelineError> {
        PipelineStage::FetchingImages.enter();
        let (subject, garments) = self.fetch_images(request).await?;

        PipelineStage::BatchProcessing.enter();
        let output = self.render(&subject, &garments).await?;
        drop(garments);

        PipelineStage::Publishing.enter();
        self.publish(&request.owner_id, output.images).await
    }

    /// Subject first; garments only once the subject is known to be good.
    async fn fetch_images(
        &self,
        request: &TryOnRequest,
    ) -> Result<(DecodedImage, Vec<(GarmentId, DecodedImage)>), PipelineError> {
        let subject = self
            .fetcher
            .fetch(&request.subject_image_url, ImageSource::Subject)
            .await?;

        // Owned items and an owned fetcher keep the spawned unit `Send`.
        let garments: Vec<(GarmentId, DecodedImage)> = stream::iter(request.garments.clone())
            .map(|(garment_id, url)| {
                let fetcher = self.fetcher.clone();
                async move {
                    let image = fetcher
                        .fetch(&url, ImageSource::Garment(garment_id.clone()))
                        .await?;
                    Ok::<_, FetchError>((garment_id, image))
                }
            })
            .buffered(GARMENT_FETCH_CONCURRENCY)
            .try_collect()
            .await?;

        Ok((subject, garments))
    }

    async fn render(
        &self,
        subject: &DecodedImage,
        garments: &[(GarmentId, DecodedImage)],
    ) -> Result<BatchOutput, PipelineError> {
        let Some(client) = &self.transform else {
            tracing::warn!(
                garments = garments.len(),
                "No transform endpoint configured, using subject image for every garment"
            );
            let images = garments
                .iter()
                .map(|(garment_id, _)| {
                    let copy = subject.relabelled(ImageSource::Garment(garment_id.clone()));
                    (garment_id.clone(), copy)
                })
                .collect();
            return Ok(BatchOutput {
                images,
                missing: Vec::new(),
            });
        };

        let output = client.submit_batch(subject, garments).await?;
        if !output.missing.is_empty() {
            tracing::warn!(
                rendered = output.images.len(),
                missing = output.missing.len(),
                "Batch result is missing some garments"
            );
        }
        Ok(output)
    }

    async fn publish(
        &self,
        owner_id: &str,
        images: IndexMap<GarmentId, DecodedImage>,
    ) -> Result<IndexMap<GarmentId, String>, PipelineError> {
        let results: Vec<_> = stream::iter(images)
            .map(|(garment_id, image)| {
                let store = Arc::clone(&self.store);
                let owner_id = owner_id.to_owned();
                async move {
                    let result = store.publish(&image, &owner_id, &garment_id).await;
                    (garment_id, result)
                }
            })
            .buffered(PUBLISH_CONCURRENCY)
            .collect()
            .await;

        let mut urls = IndexMap::with_capacity(results.len());
        let mut first_failure = None;

        for (garment_id, result) in results {
            match result {
                Ok(url) => {
                    urls.insert(garment_id, url);
                }
                Err(source) => match self.publish_policy {
                    PublishPolicy::AllOrNothing => {
                        return Err(PipelineError::Publish { garment_id, source });
                    }
                    PublishPolicy::BestEffort => {
                        tracing::warn!(
                            garment_id = %garment_id,
                            error = %source,
                            "Dropping garment after failed upload"
                        );
                        first_failure.get_or_insert(PipelineError::Publish { garment_id, source });
                    }
                },
            }
        }

        // Best effort still needs at least one result to call it a success.
        match first_failure {
            Some(e) if urls.is_empty() => Err(e),
            _ => Ok(urls),
        }
    }

    async fn notify(&self, request: &TryOnRequest, outcome: &PipelineOutcome) {
        let notification = Notification {
            recipient: request.notify_address.clone(),
            owner_id: request.owner_id.clone(),
            tier: request.tier,
            outcome: outcome.clone(),
        };

        if let Err(e) = self.notifier.notify(&notification).await {
            tracing::error!(
                recipient = %notification.recipient,
                error = %e,
                "Failed to deliver result notification"
            );
        }
    }
}
