//! Try-on request orchestration.
//!
//! [`TryOnPipeline`] drives one request from image download through batch
//! rendering and publishing to its single notification. The [`queue`]
//! module decouples intake from that work: handlers submit a request and
//! return immediately while a [`TryOnWorker`] runs each accepted job as a
//! detached unit.

pub mod error;
pub mod pipeline;
pub mod queue;
pub mod stage;

pub use error::PipelineError;
pub use pipeline::{TryOnPipeline, GARMENT_FETCH_CONCURRENCY, PUBLISH_CONCURRENCY};
pub use queue::{JobReceiver, QueueError, TryOnJob, TryOnQueue, TryOnWorker};
pub use stage::PipelineStage;
