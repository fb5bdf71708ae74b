use std::sync::Arc;

use maybe_sync::{MaybeSend, MaybeSync};
use parking_lot::Mutex;

/// Shows notices to the user (the browser front-end shows an alert).
pub trait Notifier: MaybeSend + MaybeSync {
    /// Shows the message.
    fn notify(&self, message: &str);
}

/// Notifier collecting the messages. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct NoticeLog {
    messages: Arc<Mutex<Vec<String>>>,
}

impl NoticeLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages shown so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    /// Last message shown.
    pub fn last(&self) -> Option<String> {
        self.messages.lock().last().cloned()
    }
}

impl Notifier for NoticeLog {
    fn notify(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}
