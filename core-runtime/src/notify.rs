//! # Notice Bus
//!
//! User-facing success/failure notifications over
//! `tokio::sync::broadcast`. Top-level operations (backup, restore,
//! auto-sync) emit exactly one notice each, no matter how many
//! sub-operations they fanned out into; hosts subscribe and render the
//! messages however they like.
//!
//! Emitting never blocks and never fails: with no subscriber attached the
//! notice is simply dropped, and a slow subscriber misses old notices
//! (`RecvError::Lagged`) rather than stalling the sender.

use tokio::sync::broadcast;

/// A single user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success { message: String },
    Failure { message: String },
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Success { message } | Notice::Failure { message } => message,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Notice::Success { .. })
    }
}

/// Broadcast channel for user-facing notices.
#[derive(Clone)]
pub struct NoticeBus {
    sender: broadcast::Sender<Notice>,
}

impl NoticeBus {
    /// Create a bus buffering up to `capacity` undelivered notices per
    /// subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit a success notice.
    pub fn success(&self, message: impl Into<String>) {
        self.sender
            .send(Notice::Success {
                message: message.into(),
            })
            .ok();
    }

    /// Emit a failure notice.
    pub fn failure(&self, message: impl Into<String>) {
        self.sender
            .send(Notice::Failure {
                message: message.into(),
            })
            .ok();
    }

    /// Subscribe to all notices emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }
}

impl Default for NoticeBus {
    fn default() -> Self {
        Self::new(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_notices_in_order() {
        let bus = NoticeBus::new(8);
        let mut rx = bus.subscribe();

        bus.success("Backup finished");
        bus.failure("Restore failed: timeout");

        let first = rx.recv().await.unwrap();
        assert!(first.is_success());
        assert_eq!(first.message(), "Backup finished");

        let second = rx.recv().await.unwrap();
        assert!(!second.is_success());
    }

    #[test]
    fn test_emit_without_subscribers_is_silent() {
        let bus = NoticeBus::new(4);
        bus.success("nobody listening");
    }

    #[tokio::test]
    async fn test_each_subscriber_sees_every_notice() {
        let bus = NoticeBus::new(8);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.success("done");

        assert_eq!(a.recv().await.unwrap().message(), "done");
        assert_eq!(b.recv().await.unwrap().message(), "done");
    }
}
