use std::fmt;

/// Lifecycle of one request. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    FetchingImages,
    BatchProcessing,
    Publishing,
    Completed,
    Failed,
}

impl PipelineStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::FetchingImages => "fetching_images",
            Self::BatchProcessing => "batch_processing",
            Self::Publishing => "publishing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Record entering this stage.
    pub(crate) fn enter(self) {
        tracing::debug!(
            stage = self.as_str(),
            terminal = self.is_terminal(),
            "Pipeline stage"
        );
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
