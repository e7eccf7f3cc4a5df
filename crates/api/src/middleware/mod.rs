//! Request extractors shared by handlers.
//!
//! - [`auth::ApiKeyAuth`] checks the shared bearer API key.

pub mod auth;
