//! Shared video preferences

use std::sync::atomic::{AtomicU32, Ordering};

use tokio::sync::watch;

/// Video preferences observed (never owned) by the registry
pub trait VideoSettings: Send + Sync {
    /// Whether receivers should run in low-latency mode
    fn low_latency(&self) -> bool;

    /// Receiver start timeout in seconds; 0 means unset
    fn receiver_timeout(&self) -> u32;

    /// Change feed for the low-latency preference, if the backend has one
    fn watch_low_latency(&self) -> Option<watch::Receiver<bool>> {
        None
    }
}

/// In-process video settings with a low-latency change feed
#[derive(Debug)]
pub struct SharedVideoSettings {
    low_latency: watch::Sender<bool>,
    receiver_timeout: AtomicU32,
}

impl SharedVideoSettings {
    /// Create settings with low latency off and no timeout configured
    pub fn new() -> Self {
        let (low_latency, _) = watch::channel(false);
        Self {
            low_latency,
            receiver_timeout: AtomicU32::new(0),
        }
    }

    /// Change the low-latency preference, notifying watchers on change
    pub fn set_low_latency(&self, enabled: bool) {
        let changed = self.low_latency.send_if_modified(|current| {
            if *current == enabled {
                return false;
            }
            *current = enabled;
            true
        });
        if changed {
            tracing::debug!(enabled, "Low-latency preference changed");
        }
    }

    /// Set the receiver start timeout in seconds (0 = unset)
    pub fn set_receiver_timeout(&self, secs: u32) {
        self.receiver_timeout.store(secs, Ordering::Relaxed);
    }
}

impl Default for SharedVideoSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoSettings for SharedVideoSettings {
    fn low_latency(&self) -> bool {
        *self.low_latency.borrow()
    }

    fn receiver_timeout(&self) -> u32 {
        self.receiver_timeout.load(Ordering::Relaxed)
    }

    fn watch_low_latency(&self) -> Option<watch::Receiver<bool>> {
        Some(self.low_latency.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = SharedVideoSettings::new();

        assert!(!settings.low_latency());
        assert_eq!(settings.receiver_timeout(), 0);
    }

    #[test]
    fn test_set_receiver_timeout() {
        let settings = SharedVideoSettings::new();
        settings.set_receiver_timeout(8);

        assert_eq!(settings.receiver_timeout(), 8);
    }

    #[tokio::test]
    async fn test_low_latency_watch() {
        let settings = SharedVideoSettings::new();
        let mut rx = settings.watch_low_latency().unwrap();

        settings.set_low_latency(true);

        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());
        assert!(settings.low_latency());
    }

    #[test]
    fn test_low_latency_unchanged_does_not_notify() {
        let settings = SharedVideoSettings::new();
        let rx = settings.watch_low_latency().unwrap();

        settings.set_low_latency(false);
        assert!(!rx.has_changed().unwrap());

        settings.set_low_latency(true);
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn test_low_latency_without_watchers() {
        let settings = SharedVideoSettings::new();

        settings.set_low_latency(true);

        assert!(settings.low_latency());
    }
}
