use std::time::{Duration, Instant};

/// Severity of a transient status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    Info,
    Error,
}

impl NotificationType {
    fn timeout(&self) -> Duration {
        match self {
            NotificationType::Info => Duration::from_secs(3),
            NotificationType::Error => Duration::from_secs(10),
        }
    }
}

/// A message shown above the status bar until it expires.
///
/// Resolution failures reach the user through here rather than inside the overlay.
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub notification_type: NotificationType,
    pub timestamp: Instant,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, NotificationType::Info)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, NotificationType::Error)
    }

    fn new(message: impl Into<String>, notification_type: NotificationType) -> Self {
        Self {
            message: message.into(),
            notification_type,
            timestamp: Instant::now(),
        }
    }

    pub fn should_dismiss(&self) -> bool {
        self.timestamp.elapsed() > self.notification_type.timeout()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_notification_is_kept() {
        let n = Notification::error("boom");
        assert_eq!(n.notification_type, NotificationType::Error);
        assert!(!n.should_dismiss());
    }

    #[test]
    fn test_expired_notification_is_dismissed() {
        let mut n = Notification::info("done");
        n.timestamp = Instant::now() - Duration::from_secs(4);
        assert!(n.should_dismiss());
    }
}
