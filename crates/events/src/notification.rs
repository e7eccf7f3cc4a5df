//! The notification seam between the pipeline and delivery channels.

use async_trait::async_trait;
use drapely_core::outcome::PipelineOutcome;
use drapely_core::types::Tier;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Delivery failures. The pipeline logs these and never retries them.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status code.
    #[error("Notification provider returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// Everything a channel needs to tell a caller how their request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient: String,
    pub owner_id: String,
    pub tier: Tier,
    pub outcome: PipelineOutcome,
}

/// A result-notification channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError>;
}

// ---------------------------------------------------------------------------
// DisabledNotifier
// ---------------------------------------------------------------------------

/// Stand-in used when notification credentials are not configured.
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError> {
        tracing::warn!(
            owner_id = %notification.owner_id,
            success = notification.outcome.is_success(),
            "Notifications not configured, skipping result notification"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_notifier_succeeds_silently() {
        let notification = Notification {
            recipient: "a@b.c".into(),
            owner_id: "u1".into(),
            tier: Tier::Trial,
            outcome: PipelineOutcome::Failure {
                reason: "nope".into(),
            },
        };
        assert!(DisabledNotifier.notify(&notification).await.is_ok());
    }

    #[test]
    fn api_error_display() {
        let err = NotificationError::Api {
            status: 422,
            body: "invalid from".into(),
        };
        assert_eq!(
            err.to_string(),
            "Notification provider returned HTTP 422: invalid from"
        );
    }
}
