//! Camera entry and snapshot types
//!
//! This module defines the per-camera state stored in the registry.

use std::sync::{Arc, Weak};

use serde::Serialize;

use super::event::ReceiverId;
use crate::receiver::{SinkFactory, SinkHandle, StreamReceiver, ViewSurface};

/// Receiver owned by an entry, tagged with its identity
pub(super) struct ReceiverSlot {
    pub id: ReceiverId,
    pub receiver: Box<dyn StreamReceiver>,
}

/// One configured camera
pub(super) struct CameraEntry {
    /// Display name (trimmed, non-empty)
    pub name: String,

    /// Stream source address (trimmed, non-empty)
    pub url: String,

    /// Decode session, created on first view registration
    pub receiver: Option<ReceiverSlot>,

    /// Surface currently bound to this camera (not owned)
    pub surface: Option<Weak<dyn ViewSurface>>,

    /// Sink rendering into `surface`
    pub sink: Option<SinkHandle>,
}

impl CameraEntry {
    pub fn new(name: String, url: String) -> Self {
        Self {
            name,
            url,
            receiver: None,
            surface: None,
            sink: None,
        }
    }

    pub fn receiver_id(&self) -> Option<ReceiverId> {
        self.receiver.as_ref().map(|slot| slot.id)
    }

    /// Whether a bound surface is still alive
    pub fn has_surface(&self) -> bool {
        self.surface
            .as_ref()
            .is_some_and(|surface| surface.strong_count() > 0)
    }

    /// Whether `surface` is the one bound to this entry
    pub fn is_bound_to(&self, surface: &Arc<dyn ViewSurface>) -> bool {
        self.surface
            .as_ref()
            .is_some_and(|bound| Weak::ptr_eq(bound, &Arc::downgrade(surface)))
    }

    /// Receiver, surface and sink are all in place
    pub fn can_decode(&self) -> bool {
        self.receiver.is_some() && self.sink.is_some() && self.has_surface()
    }

    pub fn apply_low_latency(&mut self, enabled: bool) {
        if let Some(slot) = self.receiver.as_mut() {
            slot.receiver.set_low_latency(enabled);
        }
    }

    /// Start the receiver if it can decode; returns whether start was issued
    pub fn start(&mut self, low_latency: bool, timeout_secs: u32) -> bool {
        if !self.can_decode() || self.url.is_empty() {
            return false;
        }

        let Some(slot) = self.receiver.as_mut() else {
            return false;
        };
        slot.receiver.set_low_latency(low_latency);
        slot.receiver.set_uri(&self.url);
        slot.receiver.start(timeout_secs);
        true
    }

    /// Stop decoding and stop the receiver; no-op without a receiver
    pub fn stop(&mut self) {
        if let Some(slot) = self.receiver.as_mut() {
            slot.receiver.stop_decoding();
            slot.receiver.stop();
        }
    }

    /// Unbind the surface: stop, detach and release the sink
    pub fn unbind_view(&mut self, sinks: &dyn SinkFactory) {
        if let Some(slot) = self.receiver.as_mut() {
            slot.receiver.stop_decoding();
            slot.receiver.stop();
            slot.receiver.set_sink(None);
        }

        if let Some(sink) = self.sink.take() {
            sinks.release(sink);
        }

        self.surface = None;
    }

    /// Tear down everything: stop, release the sink, then drop the receiver
    pub fn destroy(&mut self, sinks: &dyn SinkFactory) {
        self.unbind_view(sinks);
        self.receiver = None;
    }

    pub fn info(&self, index: usize, is_primary: bool) -> CameraInfo {
        CameraInfo {
            name: self.name.clone(),
            url: self.url.clone(),
            index,
            is_primary,
        }
    }
}

/// Read-only view of one camera
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraInfo {
    /// Display name
    pub name: String,
    /// Stream source address
    pub url: String,
    /// Position in the camera list
    pub index: usize,
    /// Whether this camera feeds the main stream
    pub is_primary: bool,
}
