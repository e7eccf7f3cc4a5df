//! Process-wide try-on configuration.
//!
//! [`TryOnConfig`] is built once at startup and handed by reference (or
//! `Arc`) to every component constructor. Components never read the
//! environment themselves.
//!
//! | Env Var                 | Default                       |
//! |-------------------------|-------------------------------|
//! | `TRANSFORM_ENDPOINT`    | unset (placeholder mode)      |
//! | `CLOUDINARY_CLOUD_NAME` | unset (in-memory storage)     |
//! | `CLOUDINARY_API_KEY`    | unset                         |
//! | `CLOUDINARY_API_SECRET` | unset                         |
//! | `CLOUDINARY_API_BASE`   | `https://api.cloudinary.com`  |
//! | `RESEND_API_KEY`        | unset (notifications off)     |
//! | `RESEND_FROM_EMAIL`     | `onboarding@resend.dev`       |
//! | `RESEND_API_BASE`       | `https://api.resend.com`      |
//! | `FRONTEND_URL`          | `http://localhost:5173`       |
//! | `LOGO_URL`              | built-in logo                 |
//! | `API_KEY`               | unset (auth disabled)         |
//! | `PUBLISH_POLICY`        | `all_or_nothing`              |
//!
//! Empty values count as unset.

use std::str::FromStr;

use crate::error::CoreError;

pub const DEFAULT_CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com";
pub const DEFAULT_RESEND_API_BASE: &str = "https://api.resend.com";
pub const DEFAULT_FROM_ADDRESS: &str = "onboarding@resend.dev";
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
pub const DEFAULT_LOGO_URL: &str =
    "https://res.cloudinary.com/dnkrqpuqk/image/upload/v1763804717/logo2.2k_orepqx.png";

/// How the pipeline treats a failed artifact upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PublishPolicy {
    /// Any failed upload fails the whole request.
    #[default]
    AllOrNothing,
    /// Failed uploads are logged and the garment is left out of the result.
    BestEffort,
}

impl FromStr for PublishPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all_or_nothing" => Ok(Self::AllOrNothing),
            "best_effort" => Ok(Self::BestEffort),
            other => Err(CoreError::Config(format!(
                "Unknown publish policy '{other}'. Must be one of: all_or_nothing, best_effort"
            ))),
        }
    }
}

/// Object storage credentials.
#[derive(Clone)]
pub struct StorageCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// API base URL, overridable for tests and private deployments.
    pub api_base: String,
}

impl std::fmt::Debug for StorageCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageCredentials")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Email notification settings.
#[derive(Clone)]
pub struct NotificationConfig {
    pub api_key: String,
    pub from_address: String,
    pub api_base: String,
    /// Site linked from notification emails.
    pub frontend_url: String,
    pub logo_url: String,
}

impl std::fmt::Debug for NotificationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationConfig")
            .field("api_key", &"<redacted>")
            .field("from_address", &self.from_address)
            .field("api_base", &self.api_base)
            .field("frontend_url", &self.frontend_url)
            .field("logo_url", &self.logo_url)
            .finish()
    }
}

/// Immutable configuration shared by every pipeline component.
#[derive(Debug, Clone, Default)]
pub struct TryOnConfig {
    /// Base URL of the batch transform service. `None` selects placeholder
    /// mode, where the subject image stands in for every result.
    pub transform_endpoint: Option<String>,
    /// `None` falls back to in-memory storage.
    pub storage: Option<StorageCredentials>,
    /// `None` disables notifications.
    pub notification: Option<NotificationConfig>,
    /// Shared bearer token for intake. `None` disables authentication.
    pub api_key: Option<String>,
    pub publish_policy: PublishPolicy,
}

impl TryOnConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let transform_endpoint =
            get("TRANSFORM_ENDPOINT").map(|e| e.trim_end_matches('/').to_string());

        let storage = match (
            get("CLOUDINARY_CLOUD_NAME"),
            get("CLOUDINARY_API_KEY"),
            get("CLOUDINARY_API_SECRET"),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(StorageCredentials {
                cloud_name,
                api_key,
                api_secret,
                api_base: get("CLOUDINARY_API_BASE")
                    .unwrap_or_else(|| DEFAULT_CLOUDINARY_API_BASE.to_string()),
            }),
            (None, None, None) => None,
            _ => {
                return Err(CoreError::Config(
                    "CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET must be set together"
                        .into(),
                ))
            }
        };

        let notification = get("RESEND_API_KEY").map(|api_key| NotificationConfig {
            api_key,
            from_address: get("RESEND_FROM_EMAIL")
                .unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string()),
            api_base: get("RESEND_API_BASE")
                .unwrap_or_else(|| DEFAULT_RESEND_API_BASE.to_string()),
            frontend_url: get("FRONTEND_URL")
                .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
            logo_url: get("LOGO_URL").unwrap_or_else(|| DEFAULT_LOGO_URL.to_string()),
        });

        let publish_policy = match get("PUBLISH_POLICY") {
            Some(raw) => raw.parse()?,
            None => PublishPolicy::default(),
        };

        Ok(Self {
            transform_endpoint,
            storage,
            notification,
            api_key: get("API_KEY"),
            publish_policy,
        })
    }
}
