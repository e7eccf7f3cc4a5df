//! The single terminal result of a try-on request.

use indexmap::IndexMap;
use serde::Serialize;

use crate::types::GarmentId;

/// Produced exactly once per request and consumed exactly once by the
/// notifier.
///
/// A `Success` mapping may hold fewer garments than were requested: a
/// garment whose rendered output was missing from the batch archive is
/// simply absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineOutcome {
    Success { urls: IndexMap<GarmentId, String> },
    Failure { reason: String },
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineOutcome::Success { .. })
    }

    /// Published URLs, or `None` for a failure.
    pub fn urls(&self) -> Option<&IndexMap<GarmentId, String>> {
        match self {
            PipelineOutcome::Success { urls } => Some(urls),
            PipelineOutcome::Failure { .. } => None,
        }
    }

    /// Failure reason, or `None` for a success.
    pub fn reason(&self) -> Option<&str> {
        match self {
            PipelineOutcome::Success { .. } => None,
            PipelineOutcome::Failure { reason } => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_are_exclusive() {
        let ok = PipelineOutcome::Success {
            urls: IndexMap::from([("g1".to_string(), "https://cdn/g1.png".to_string())]),
        };
        assert!(ok.is_success());
        assert_eq!(ok.urls().map(IndexMap::len), Some(1));
        assert!(ok.reason().is_none());

        let failed = PipelineOutcome::Failure {
            reason: "boom".into(),
        };
        assert!(!failed.is_success());
        assert!(failed.urls().is_none());
        assert_eq!(failed.reason(), Some("boom"));
    }

    #[test]
    fn serializes_with_status_tag() {
        let failed = PipelineOutcome::Failure {
            reason: "timeout".into(),
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["reason"], "timeout");
    }
}
