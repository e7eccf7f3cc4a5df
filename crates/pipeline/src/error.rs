use drapely_core::types::GarmentId;
use drapely_storage::PublishError;
use drapely_transform::{BatchTransformError, FetchError};

/// Why a request ended in `Failed`.
///
/// The `Display` text is the failure reason delivered to the caller.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Batch try-on failed: {0}")]
    Transform(#[from] BatchTransformError),

    #[error("Failed to publish result for garment {garment_id}: {source}")]
    Publish {
        garment_id: GarmentId,
        #[source]
        source: PublishError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_error_display() {
        let err = PipelineError::from(BatchTransformError::ApiError {
            status: 503,
            body: "overloaded".into(),
        });
        assert_eq!(
            err.to_string(),
            "Batch try-on failed: Transform service error (503): overloaded"
        );
    }

    #[test]
    fn publish_error_names_the_garment() {
        let err = PipelineError::Publish {
            garment_id: "shirt".into(),
            source: PublishError::MissingUrl,
        };
        assert_eq!(
            err.to_string(),
            "Failed to publish result for garment shirt: Storage API response missing secure_url"
        );
    }
}
