//! Shared test helpers used across the workspace's unit and integration
//! suites.
//!
//! - [`fixtures`]: in-memory PNGs, ZIP archives, and sample requests.
//! - [`stubs`]: local axum servers standing in for image hosts and the
//!   batch transform service and the image upload API.
//! - [`notifier`]: a notifier that records instead of sending.

pub mod fixtures;
pub mod notifier;
pub mod stubs;
