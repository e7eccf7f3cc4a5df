//! Drapely result notifications.
//!
//! This crate delivers the single terminal notification of a try-on
//! request:
//!
//! - [`Notifier`] is the seam the pipeline calls exactly once per request.
//! - [`Notification`] carries recipient, owner, tier, and outcome.
//! - [`template`] renders HTML bodies and subject lines for success and failure.
//! - [`delivery`] holds concrete channels ([`EmailNotifier`]).
//! - [`DisabledNotifier`] is used when no notification credentials are set.

pub mod delivery;
pub mod notification;
pub mod template;

pub use delivery::email::EmailNotifier;
pub use notification::{DisabledNotifier, Notification, NotificationError, Notifier};
