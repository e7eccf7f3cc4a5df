//! Email delivery via a Resend-compatible HTTP API.
//!
//! [`EmailNotifier`] renders the result email with [`crate::template`] and
//! posts it as JSON to `{api_base}/emails` with a bearer key. Construct it
//! only when [`NotificationConfig`] is present; otherwise use
//! [`crate::DisabledNotifier`].

use std::time::Duration;

use async_trait::async_trait;
use drapely_core::config::NotificationConfig;
use drapely_core::retry::RetryPolicy;
use serde::{Deserialize, Serialize};

use crate::notification::{Notification, NotificationError, Notifier};
use crate::template::{self, Branding};

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    #[serde(default)]
    id: Option<String>,
}

// ---------------------------------------------------------------------------
// EmailNotifier
// ---------------------------------------------------------------------------

/// Sends try-on result emails.
pub struct EmailNotifier {
    client: reqwest::Client,
    config: NotificationConfig,
    retry: RetryPolicy,
}

impl EmailNotifier {
    pub fn new(config: NotificationConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: NotificationConfig) -> Self {
        Self {
            client,
            config,
            retry: RetryPolicy::NO_RETRY,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/emails", self.config.api_base.trim_end_matches('/'))
    }

    async fn send_once(&self, payload: &SendEmailRequest<'_>) -> Result<Option<String>, NotificationError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        // The id is informational; an unexpected body still counts as sent.
        let id = response
            .json::<SendEmailResponse>()
            .await
            .ok()
            .and_then(|r| r.id);
        Ok(id)
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError> {
        let email = template::render(
            notification,
            Branding {
                frontend_url: &self.config.frontend_url,
                logo_url: &self.config.logo_url,
            },
        );
        let payload = SendEmailRequest {
            from: &self.config.from_address,
            to: [&notification.recipient],
            subject: &email.subject,
            html: &email.html,
        };

        let id = self
            .retry
            .run("send_email", || self.send_once(&payload))
            .await?;

        tracing::info!(
            to = %notification.recipient,
            owner_id = %notification.owner_id,
            tier = %notification.tier,
            success = notification.outcome.is_success(),
            email_id = id.as_deref().unwrap_or("unknown"),
            "Result email sent"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use drapely_core::outcome::PipelineOutcome;
    use drapely_core::types::Tier;
    use httpmock::prelude::*;
    use indexmap::IndexMap;

    use super::*;

    fn config(api_base: String) -> NotificationConfig {
        NotificationConfig {
            api_key: "re_test_key".into(),
            from_address: "results@drapely.test".into(),
            api_base,
            frontend_url: "https://shop.example".into(),
            logo_url: "https://cdn.example/logo.png".into(),
        }
    }

    fn success() -> Notification {
        Notification {
            recipient: "shopper@example.com".into(),
            owner_id: "u1".into(),
            tier: Tier::Trial,
            outcome: PipelineOutcome::Success {
                urls: IndexMap::from([(
                    "shirt".to_string(),
                    "https://cdn.example/shirt_u1.png".to_string(),
                )]),
            },
        }
    }

    #[tokio::test]
    async fn posts_rendered_email_with_bearer_key() {
        let server = MockServer::start_async().await;
        let email = template::render(
            &success(),
            Branding {
                frontend_url: "https://shop.example",
                logo_url: "https://cdn.example/logo.png",
            },
        );
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/emails")
                .header("authorization", "Bearer re_test_key")
                .json_body(serde_json::json!({
                    "from": "results@drapely.test",
                    "to": ["shopper@example.com"],
                    "subject": "Your Virtual Try-On Results Are Ready! (Trial Plan)",
                    "html": email.html,
                }));
            then.status(200).json_body(serde_json::json!({ "id": "email_123" }));
        });

        let notifier = EmailNotifier::new(config(server.url("")));
        notifier.notify(&success()).await.unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn provider_error_is_reported() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/emails");
            then.status(422).body("invalid from address");
        });

        let notifier = EmailNotifier::new(config(server.url("")));
        let err = notifier.notify(&success()).await.unwrap_err();

        mock.assert();
        assert_matches!(
            err,
            NotificationError::Api { status: 422, ref body } if body == "invalid from address"
        );
    }

    #[tokio::test]
    async fn unparseable_success_body_still_counts_as_sent() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/emails");
            then.status(200).body("ok");
        });

        let notifier = EmailNotifier::new(config(server.url("")));
        assert!(notifier.notify(&success()).await.is_ok());
    }

    #[tokio::test]
    async fn unreachable_provider_is_a_request_error() {
        let notifier = EmailNotifier::new(config("http://127.0.0.1:1".into()));
        let err = notifier.notify(&success()).await.unwrap_err();
        assert_matches!(err, NotificationError::Request(_));
    }
}
