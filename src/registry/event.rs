//! Receiver identity, completion events and change notifications
//!
//! Receivers report completions through a [`ReceiverEvents`] handle. Each
//! report is queued as a [`RegistryEvent`] tagged with the receiver's
//! [`ReceiverId`], so the registry can resolve it against the list as it is
//! when the event is handled, not as it was when the call was issued.

use tokio::sync::mpsc;

/// Stable identity of one receiver instance
///
/// Ids are never reused for the lifetime of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReceiverId(pub(crate) u64);

impl ReceiverId {
    /// Raw numeric value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ReceiverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "receiver#{}", self.0)
    }
}

/// Completion status reported by a receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverStatus {
    /// Operation succeeded
    Ok,
    /// Transport or decode failure
    Fail,
    /// Receiver was not in a state that allows the operation
    InvalidState,
    /// Source URI could not be used
    InvalidUrl,
    /// Receiver does not support the operation
    NotImplemented,
}

/// Events consumed by the registry's owner loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// A receiver finished starting
    StartComplete {
        receiver: ReceiverId,
        status: ReceiverStatus,
    },
    /// A receiver stopped
    StopComplete {
        receiver: ReceiverId,
        status: ReceiverStatus,
    },
    /// Restart delay elapsed for a stopped secondary stream
    RestartDue { receiver: ReceiverId },
    /// Low-latency preference changed in the video settings
    LowLatencyChanged,
}

/// Change notifications for observers of the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryChange {
    /// Camera list (names, urls, order or primary flags) changed
    Cameras,
    /// Secondary camera list changed
    SecondaryCameras,
    /// Primary index changed
    PrimaryIndex,
    /// Secondary visibility flag changed
    SecondaryVisible,
}

/// Handle a receiver uses to report completions
///
/// Cheap to clone and safe to use from any thread.
#[derive(Debug, Clone)]
pub struct ReceiverEvents {
    id: ReceiverId,
    tx: mpsc::UnboundedSender<RegistryEvent>,
}

impl ReceiverEvents {
    pub(crate) fn new(id: ReceiverId, tx: mpsc::UnboundedSender<RegistryEvent>) -> Self {
        Self { id, tx }
    }

    /// Identity of the receiver this handle belongs to
    pub fn id(&self) -> ReceiverId {
        self.id
    }

    /// Report that a start request completed
    pub fn start_complete(&self, status: ReceiverStatus) {
        self.post(RegistryEvent::StartComplete {
            receiver: self.id,
            status,
        });
    }

    /// Report that the receiver stopped
    pub fn stop_complete(&self, status: ReceiverStatus) {
        self.post(RegistryEvent::StopComplete {
            receiver: self.id,
            status,
        });
    }

    fn post(&self, event: RegistryEvent) {
        // Registry gone: nothing left to notify
        if self.tx.send(event).is_err() {
            tracing::trace!(receiver = %self.id, "Registry dropped, event discarded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_are_tagged_with_receiver() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let events = ReceiverEvents::new(ReceiverId(7), tx);

        events.start_complete(ReceiverStatus::Ok);
        events.clone().stop_complete(ReceiverStatus::InvalidUrl);

        assert_eq!(
            rx.try_recv().unwrap(),
            RegistryEvent::StartComplete {
                receiver: ReceiverId(7),
                status: ReceiverStatus::Ok
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            RegistryEvent::StopComplete {
                receiver: ReceiverId(7),
                status: ReceiverStatus::InvalidUrl
            }
        );
    }

    #[test]
    fn test_post_after_registry_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        let events = ReceiverEvents::new(ReceiverId(1), tx);
        drop(rx);

        // Must not panic
        events.stop_complete(ReceiverStatus::Fail);
    }

    #[test]
    fn test_receiver_id_display() {
        assert_eq!(ReceiverId(3).to_string(), "receiver#3");
        assert_eq!(ReceiverId(3).as_u64(), 3);
    }
}
