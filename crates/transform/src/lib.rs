//! Clients for the remote side of a try-on request.
//!
//! - [`fetch`] downloads and decodes subject and garment images.
//! - [`batch`] submits one subject plus N garments to the batch transform
//!   service as a single multipart job.
//! - [`archive`] maps the returned ZIP of rendered outputs back onto the
//!   caller's garment ids by position.

pub mod archive;
pub mod batch;
pub mod fetch;

pub use archive::{BatchOutput, MissingOutput};
pub use batch::{BatchTransformClient, BatchTransformError};
pub use fetch::{FetchError, ImageFetcher};
