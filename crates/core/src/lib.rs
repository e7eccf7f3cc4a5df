//! Shared domain types for the Drapely try-on service.
//!
//! Everything here is free of network and storage dependencies so that
//! the transform, storage, notification, and pipeline crates can agree
//! on one vocabulary:
//!
//! - [`types`]: the intake request and service tier.
//! - [`image`]: decoded RGB bitmaps and their provenance.
//! - [`outcome`]: the single terminal result of a try-on request.
//! - [`config`]: process-wide configuration read once at startup.
//! - [`retry`]: the remote-call attempt policy.
//! - [`validation`]: request-shape and tier-limit checks.
//! - [`hashing`]: SHA-256 digests for signed uploads.

pub mod config;
pub mod error;
pub mod hashing;
pub mod image;
pub mod outcome;
pub mod retry;
pub mod types;
pub mod validation;
