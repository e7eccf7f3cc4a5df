use std::sync::Mutex;

use async_trait::async_trait;
use drapely_events::{Notification, NotificationError, Notifier};

/// Records every notification; optionally reports failure after recording.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every delivery fails (after being recorded).
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.sent.lock().expect("notifier lock").clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError> {
        self.sent
            .lock()
            .expect("notifier lock")
            .push(notification.clone());
        if self.fail {
            return Err(NotificationError::Api {
                status: 500,
                body: "mail provider down".into(),
            });
        }
        Ok(())
    }
}
