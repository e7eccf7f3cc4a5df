use std::sync::Arc;

use drapely_core::config::TryOnConfig;
use drapely_pipeline::TryOnQueue;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: configuration sits behind `Arc` and the queue handle is
/// a channel sender.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Pipeline configuration; intake only reads the API key from it.
    pub tryon_config: Arc<TryOnConfig>,
    /// Submission side of the background job queue.
    pub queue: TryOnQueue,
}
