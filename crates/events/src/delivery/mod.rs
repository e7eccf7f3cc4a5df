//! External delivery channels for result notifications.

pub mod email;
