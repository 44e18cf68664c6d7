//! Stream receiver contract

use super::sink::SinkHandle;
use crate::registry::event::ReceiverEvents;

/// Decode/transport session for one camera
///
/// Start and stop are asynchronous: the receiver reports their outcome
/// later through the [`ReceiverEvents`] handle it was created with, from
/// whatever thread it runs on.
pub trait StreamReceiver: Send {
    /// Set the source URI
    fn set_uri(&mut self, uri: &str);

    /// Enable or disable low-latency mode
    fn set_low_latency(&mut self, enabled: bool);

    /// Begin connecting; completion is reported via `start_complete`
    fn start(&mut self, timeout_secs: u32);

    /// Stop the session; completion is reported via `stop_complete`
    ///
    /// Must be safe to call on a receiver that is already stopped.
    fn stop(&mut self);

    /// Start rendering decoded frames into `sink`
    fn start_decoding(&mut self, sink: &SinkHandle);

    /// Stop rendering; safe to call when not decoding
    fn stop_decoding(&mut self);

    /// Bind or clear the sink this receiver renders into
    fn set_sink(&mut self, sink: Option<&SinkHandle>);
}

/// Creates receivers on behalf of the registry
pub trait ReceiverFactory: Send + Sync {
    /// Create a receiver named `name`, or `None` if the engine is unavailable
    fn create(&self, name: &str, events: ReceiverEvents) -> Option<Box<dyn StreamReceiver>>;
}
