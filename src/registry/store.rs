//! Camera registry implementation
//!
//! The central registry that owns the camera list and reconciles every
//! camera's receiver with the current primary and visibility state.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};

use super::config::RegistryConfig;
use super::entry::{CameraEntry, CameraInfo, ReceiverSlot};
use super::error::RegistryError;
use super::event::{ReceiverEvents, ReceiverId, ReceiverStatus, RegistryChange, RegistryEvent};
use super::persist::{self, StoredCamera};
use crate::receiver::{ReceiverFactory, SinkFactory, ViewSurface};
use crate::settings::{MainStreamRouter, SettingsStore, VideoSettings, VideoSource};

/// External capabilities the registry drives
#[derive(Clone)]
pub struct Collaborators {
    /// Persistence for the camera list
    pub store: Arc<dyn SettingsStore>,
    /// Creates one receiver per viewed camera
    pub receivers: Arc<dyn ReceiverFactory>,
    /// Creates sinks for view surfaces
    pub sinks: Arc<dyn SinkFactory>,
    /// Shared video preferences
    pub video: Arc<dyn VideoSettings>,
    /// Main video pipeline fed by the primary camera
    pub router: Arc<dyn MainStreamRouter>,
}

/// Registry of configured cameras
///
/// Single owner: one task (usually the UI task) performs all
/// mutations and pumps completions with [`next_event`](Self::next_event) /
/// [`handle_event`](Self::handle_event). Receivers may report from any
/// thread; their reports are queued until the owner handles them.
pub struct CameraRegistry {
    config: RegistryConfig,

    cameras: Vec<CameraEntry>,

    /// `None` iff `cameras` is empty
    primary: Option<usize>,

    /// Never true with fewer than two cameras
    secondary_visible: bool,

    store: Arc<dyn SettingsStore>,
    receivers: Arc<dyn ReceiverFactory>,
    sinks: Arc<dyn SinkFactory>,
    video: Arc<dyn VideoSettings>,
    router: Arc<dyn MainStreamRouter>,

    changes: broadcast::Sender<RegistryChange>,
    events_tx: mpsc::UnboundedSender<RegistryEvent>,
    events_rx: mpsc::UnboundedReceiver<RegistryEvent>,
    low_latency_rx: Option<watch::Receiver<bool>>,

    next_receiver_id: u64,
}

impl CameraRegistry {
    /// Create a registry, loading the camera list from the settings store
    pub fn new(config: RegistryConfig, collaborators: Collaborators) -> Self {
        let Collaborators {
            store,
            receivers,
            sinks,
            video,
            router,
        } = collaborators;

        let record = persist::load(store.as_ref(), &config);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (changes, _) = broadcast::channel(config.change_capacity);
        let low_latency_rx = video.watch_low_latency();

        let cameras = record
            .cameras
            .into_iter()
            .map(|camera| CameraEntry::new(camera.name, camera.url))
            .collect::<Vec<_>>();

        tracing::info!(
            group = %config.settings_group,
            cameras = cameras.len(),
            primary = ?record.primary,
            "Camera registry loaded"
        );

        let mut registry = Self {
            config,
            cameras,
            primary: record.primary,
            secondary_visible: false,
            store,
            receivers,
            sinks,
            video,
            router,
            changes,
            events_tx,
            events_rx,
            low_latency_rx,
            next_receiver_id: 1,
        };

        registry.update_main_stream();
        registry.update_secondary_receivers();
        registry
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryChange> {
        self.changes.subscribe()
    }

    /// All cameras in display order
    pub fn cameras(&self) -> Vec<CameraInfo> {
        self.cameras
            .iter()
            .enumerate()
            .map(|(index, entry)| entry.info(index, self.primary == Some(index)))
            .collect()
    }

    /// Non-primary cameras, keeping their list indices
    pub fn secondary_cameras(&self) -> Vec<CameraInfo> {
        self.cameras
            .iter()
            .enumerate()
            .filter(|(index, _)| self.primary != Some(*index))
            .map(|(index, entry)| entry.info(index, false))
            .collect()
    }

    /// Snapshot of one camera; `None` for an invalid index
    pub fn camera(&self, index: usize) -> Option<CameraInfo> {
        self.cameras
            .get(index)
            .map(|entry| entry.info(index, self.primary == Some(index)))
    }

    pub fn primary_index(&self) -> Option<usize> {
        self.primary
    }

    pub fn secondary_streams_visible(&self) -> bool {
        self.secondary_visible
    }

    pub fn has_cameras(&self) -> bool {
        !self.cameras.is_empty()
    }

    /// Whether there is at least one camera besides the primary
    pub fn has_secondary_streams(&self) -> bool {
        self.cameras.len() > 1
    }

    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    /// Append a camera; the first camera becomes primary
    ///
    /// Returns the new camera's index.
    pub fn add(&mut self, name: &str, url: &str) -> Result<usize, RegistryError> {
        let (name, url) = validated(name, url).map_err(|e| {
            tracing::warn!(error = %e, "Ignoring camera with empty name or URL");
            e
        })?;

        tracing::info!(camera = %name, url = %url, "Camera added");
        self.cameras.push(CameraEntry::new(name, url));
        let index = self.cameras.len() - 1;

        self.normalize();
        self.save();
        self.emit_lists_changed();
        self.update_main_stream();
        self.update_secondary_receivers();

        Ok(index)
    }

    /// Replace a camera's name and URL in place
    pub fn update(&mut self, index: usize, name: &str, url: &str) -> Result<(), RegistryError> {
        self.check_index(index, "update")?;
        let (name, url) = validated(name, url).map_err(|e| {
            tracing::warn!(index, error = %e, "Ignoring update with empty name or URL");
            e
        })?;

        let entry = &mut self.cameras[index];
        entry.name = name;
        entry.url = url;
        if let Some(slot) = entry.receiver.as_mut() {
            slot.receiver.set_uri(&entry.url);
        }
        tracing::info!(index, camera = %entry.name, url = %entry.url, "Camera updated");

        self.normalize();
        self.save();
        self.emit_lists_changed();
        if self.primary == Some(index) {
            self.update_main_stream();
        }
        self.update_secondary_receivers();

        Ok(())
    }

    /// Remove a camera, shifting later cameras down by one
    pub fn remove(&mut self, index: usize) -> Result<(), RegistryError> {
        self.check_index(index, "remove")?;

        self.cameras[index].destroy(self.sinks.as_ref());
        let removed = self.cameras.remove(index);
        tracing::info!(index, camera = %removed.name, "Camera removed");

        match self.primary {
            Some(primary) if primary == index => {
                self.primary = None;
                self.notify(RegistryChange::PrimaryIndex);
            }
            Some(primary) if primary > index => {
                self.primary = Some(primary - 1);
                self.notify(RegistryChange::PrimaryIndex);
            }
            _ => {}
        }

        self.normalize();
        self.save();
        self.emit_lists_changed();
        self.update_main_stream();
        self.update_secondary_receivers();

        Ok(())
    }

    /// Make `index` the primary camera
    ///
    /// Promoting the current primary does nothing and notifies nobody.
    pub fn promote(&mut self, index: usize) -> Result<(), RegistryError> {
        if self.primary == Some(index) {
            return Ok(());
        }
        self.check_index(index, "promote")?;

        tracing::info!(
            index,
            camera = %self.cameras[index].name,
            previous = ?self.primary,
            "Camera promoted to primary"
        );
        self.primary = Some(index);
        self.notify(RegistryChange::PrimaryIndex);

        self.normalize();
        self.save();
        self.update_main_stream();
        self.update_secondary_receivers();
        self.emit_lists_changed();

        Ok(())
    }

    /// Allow or forbid secondary streams to decode
    ///
    /// The effective value is `visible` only while more than one camera
    /// exists.
    pub fn set_secondary_visible(&mut self, visible: bool) {
        let effective = visible && self.has_secondary_streams();
        if effective == self.secondary_visible {
            return;
        }

        tracing::debug!(requested = visible, effective, "Secondary visibility changed");
        self.secondary_visible = effective;
        self.update_secondary_receivers();
        self.notify(RegistryChange::SecondaryVisible);
    }

    /// Flip the requested secondary visibility
    pub fn toggle_secondary_streams(&mut self) {
        self.set_secondary_visible(!self.secondary_visible);
    }

    /// Bind a UI surface to a camera
    ///
    /// Creates the receiver on first use and a fresh sink for the surface.
    /// Registering the surface that is already fully bound is a no-op; a
    /// different surface replaces the old binding.
    pub fn register_view(
        &mut self,
        index: usize,
        surface: &Arc<dyn ViewSurface>,
    ) -> Result<(), RegistryError> {
        self.check_index(index, "register view for")?;

        let entry = &mut self.cameras[index];
        if entry.is_bound_to(surface) && entry.sink.is_some() {
            return Ok(());
        }
        if entry.surface.is_some() && !entry.is_bound_to(surface) {
            tracing::debug!(index, surface = surface.label(), "Replacing bound view");
            entry.unbind_view(self.sinks.as_ref());
        }
        entry.surface = Some(Arc::downgrade(surface));

        if self.cameras[index].receiver.is_none() {
            self.create_receiver(index)?;
        }

        let entry = &mut self.cameras[index];
        let Some(slot) = entry.receiver.as_mut() else {
            return Err(RegistryError::ReceiverUnavailable(entry.name.clone()));
        };

        if let Some(previous) = entry.sink.take() {
            slot.receiver.set_sink(None);
            self.sinks.release(previous);
        }

        let Some(sink) = self.sinks.create(&**surface, slot.receiver.as_ref()) else {
            tracing::warn!(index, camera = %entry.name, "Failed to create sink for camera");
            return Err(RegistryError::SinkUnavailable(entry.name.clone()));
        };
        slot.receiver.set_sink(Some(&sink));
        entry.sink = Some(sink);

        tracing::debug!(
            index,
            camera = %entry.name,
            surface = surface.label(),
            "View registered"
        );

        if self.secondary_visible && self.primary != Some(index) {
            self.start_receiver(index);
        }

        Ok(())
    }

    /// Unbind a camera's surface
    ///
    /// With `Some(surface)`, only that exact surface is unbound, so a late
    /// unregister from a replaced view cannot tear down its successor.
    pub fn unregister_view(
        &mut self,
        index: usize,
        surface: Option<&Arc<dyn ViewSurface>>,
    ) -> Result<(), RegistryError> {
        let Some(entry) = self.cameras.get_mut(index) else {
            return Err(RegistryError::InvalidIndex(index));
        };

        if let Some(surface) = surface {
            if !entry.is_bound_to(surface) {
                tracing::debug!(index, surface = surface.label(), "Ignoring unregister of unbound view");
                return Ok(());
            }
        }

        entry.unbind_view(self.sinks.as_ref());
        tracing::debug!(index, camera = %entry.name, "View unregistered");

        Ok(())
    }

    /// Re-apply the low-latency preference to every live receiver
    pub fn apply_low_latency(&mut self) {
        let enabled = self.video.low_latency();
        tracing::debug!(enabled, "Applying low-latency preference");

        for entry in &mut self.cameras {
            entry.apply_low_latency(enabled);
        }
    }

    /// Wait for the next receiver completion, restart or settings change
    ///
    /// Cancel-safe; pair with [`handle_event`](Self::handle_event).
    pub async fn next_event(&mut self) -> Option<RegistryEvent> {
        loop {
            let feed_closed = tokio::select! {
                event = self.events_rx.recv() => return event,
                changed = low_latency_changed(&mut self.low_latency_rx) => !changed,
            };

            if !feed_closed {
                return Some(RegistryEvent::LowLatencyChanged);
            }
            tracing::debug!("Low-latency feed closed");
            self.low_latency_rx = None;
        }
    }

    /// Handle every event that is already queued, without waiting
    ///
    /// Returns the number of events handled.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;

        let low_latency_changed = self
            .low_latency_rx
            .as_mut()
            .is_some_and(|rx| rx.has_changed().unwrap_or(false));
        if low_latency_changed {
            if let Some(rx) = self.low_latency_rx.as_mut() {
                let _ = rx.borrow_and_update();
            }
            self.handle_event(RegistryEvent::LowLatencyChanged);
            handled += 1;
        }

        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }

        handled
    }

    /// Apply one event to the registry
    pub fn handle_event(&mut self, event: RegistryEvent) {
        match event {
            RegistryEvent::StartComplete { receiver, status } => {
                self.on_start_complete(receiver, status)
            }
            RegistryEvent::StopComplete { receiver, status } => {
                self.on_stop_complete(receiver, status)
            }
            RegistryEvent::RestartDue { receiver } => self.on_restart_due(receiver),
            RegistryEvent::LowLatencyChanged => self.apply_low_latency(),
        }
    }

    /// Stop and release every receiver and sink
    ///
    /// Also runs on drop. Cameras stay configured.
    pub fn shutdown(&mut self) {
        for entry in &mut self.cameras {
            entry.destroy(self.sinks.as_ref());
        }
    }

    fn on_start_complete(&mut self, id: ReceiverId, status: ReceiverStatus) {
        if status != ReceiverStatus::Ok {
            tracing::debug!(receiver = %id, ?status, "Receiver failed to start");
            return;
        }

        let Some(index) = self.index_for_receiver(id) else {
            tracing::debug!(receiver = %id, "Dropping start completion for removed receiver");
            return;
        };
        if self.primary == Some(index) {
            return;
        }

        let entry = &mut self.cameras[index];
        if let (Some(slot), Some(sink)) = (entry.receiver.as_mut(), entry.sink.as_ref()) {
            slot.receiver.start_decoding(sink);
            tracing::debug!(index, camera = %entry.name, "Secondary decoding started");
        }
    }

    fn on_stop_complete(&mut self, id: ReceiverId, status: ReceiverStatus) {
        // Not a real stop; restarting would loop forever
        if status == ReceiverStatus::InvalidUrl {
            tracing::debug!(receiver = %id, "Receiver rejected its URL, not restarting");
            return;
        }

        let Some(index) = self.index_for_receiver(id) else {
            tracing::debug!(receiver = %id, "Dropping stop completion for removed receiver");
            return;
        };
        if !self.secondary_visible || self.primary == Some(index) {
            return;
        }

        self.schedule_restart(id);
    }

    fn on_restart_due(&mut self, id: ReceiverId) {
        let Some(index) = self.index_for_receiver(id) else {
            return;
        };
        if !self.secondary_visible || self.primary == Some(index) {
            return;
        }

        let entry = &self.cameras[index];
        if entry.sink.is_some() && entry.has_surface() {
            tracing::debug!(index, camera = %entry.name, "Restarting secondary stream");
            self.start_receiver(index);
        }
    }

    fn schedule_restart(&self, id: ReceiverId) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(receiver = %id, "No Tokio runtime, secondary restart skipped");
            return;
        };

        let tx = self.events_tx.clone();
        let delay = self.config.restart_delay;
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(RegistryEvent::RestartDue { receiver: id });
        });

        tracing::debug!(receiver = %id, delay_ms = delay.as_millis() as u64, "Secondary restart scheduled");
    }

    fn create_receiver(&mut self, index: usize) -> Result<(), RegistryError> {
        let id = ReceiverId(self.next_receiver_id);
        self.next_receiver_id += 1;

        let entry = &mut self.cameras[index];
        let events = ReceiverEvents::new(id, self.events_tx.clone());
        let Some(mut receiver) = self
            .receivers
            .create(&format!("camera_{}", entry.name), events)
        else {
            tracing::warn!(index, camera = %entry.name, "Unable to create receiver for camera");
            return Err(RegistryError::ReceiverUnavailable(entry.name.clone()));
        };

        receiver.set_uri(&entry.url);
        receiver.set_low_latency(self.video.low_latency());
        entry.receiver = Some(ReceiverSlot { id, receiver });

        tracing::info!(index, camera = %entry.name, receiver = %id, "Receiver created");
        Ok(())
    }

    fn start_receiver(&mut self, index: usize) {
        let timeout = self.start_timeout();
        let low_latency = self.video.low_latency();

        let entry = &mut self.cameras[index];
        if entry.start(low_latency, timeout) {
            tracing::debug!(index, camera = %entry.name, timeout, "Receiver start requested");
        }
    }

    fn start_timeout(&self) -> u32 {
        match self.video.receiver_timeout() {
            0 => self.config.default_start_timeout,
            secs => secs,
        }
    }

    /// Bring every receiver in line with primary and visibility state
    fn update_secondary_receivers(&mut self) {
        let timeout = self.start_timeout();
        let low_latency = self.video.low_latency();
        let visible = self.secondary_visible;
        let primary = self.primary;

        for (index, entry) in self.cameras.iter_mut().enumerate() {
            if !visible || primary == Some(index) {
                entry.stop();
                continue;
            }

            // Only cameras with a registered view are ever started
            if entry.can_decode() {
                entry.start(low_latency, timeout);
            }
        }

        self.notify(RegistryChange::SecondaryCameras);
    }

    fn update_main_stream(&self) {
        match self.primary.and_then(|index| self.cameras.get(index)) {
            None => {
                self.router.set_stream_enabled(false);
                self.router.set_video_source(VideoSource::Disabled);
                tracing::debug!("Main stream disabled");
            }
            Some(entry) => {
                self.router.set_video_source(VideoSource::NetworkStream);
                self.router.set_stream_url(&entry.url);
                self.router.set_stream_enabled(true);
                tracing::debug!(camera = %entry.name, url = %entry.url, "Main stream updated");
            }
        }
    }

    /// Repair invariants after a mutation
    fn normalize(&mut self) {
        let healed = match self.primary {
            _ if self.cameras.is_empty() => None,
            Some(index) if index < self.cameras.len() => Some(index),
            _ => Some(0),
        };
        if healed != self.primary {
            self.primary = healed;
            self.notify(RegistryChange::PrimaryIndex);
        }

        if self.secondary_visible && !self.has_secondary_streams() {
            self.secondary_visible = false;
            self.notify(RegistryChange::SecondaryVisible);
        }
    }

    fn save(&self) {
        let cameras = self
            .cameras
            .iter()
            .map(|entry| StoredCamera::new(entry.name.as_str(), entry.url.as_str()))
            .collect::<Vec<_>>();

        if let Err(e) = persist::save(self.store.as_ref(), &self.config, &cameras, self.primary) {
            tracing::error!(error = %e, "Failed to save camera settings");
        }
    }

    fn emit_lists_changed(&self) {
        self.notify(RegistryChange::Cameras);
        self.notify(RegistryChange::SecondaryCameras);
    }

    fn notify(&self, change: RegistryChange) {
        // No subscribers is fine
        let _ = self.changes.send(change);
    }

    fn check_index(&self, index: usize, action: &str) -> Result<(), RegistryError> {
        if index < self.cameras.len() {
            Ok(())
        } else {
            tracing::warn!(index, action, "Invalid camera index");
            Err(RegistryError::InvalidIndex(index))
        }
    }

    fn index_for_receiver(&self, id: ReceiverId) -> Option<usize> {
        self.cameras
            .iter()
            .position(|entry| entry.receiver_id() == Some(id))
    }
}

impl Drop for CameraRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn validated(name: &str, url: &str) -> Result<(String, String), RegistryError> {
    let name = name.trim();
    let url = url.trim();

    if name.is_empty() {
        return Err(RegistryError::EmptyName);
    }
    if url.is_empty() {
        return Err(RegistryError::EmptyUrl);
    }

    Ok((name.to_string(), url.to_string()))
}

async fn low_latency_changed(rx: &mut Option<watch::Receiver<bool>>) -> bool {
    match rx {
        Some(rx) => rx.changed().await.is_ok(),
        None => std::future::pending().await,
    }
}
