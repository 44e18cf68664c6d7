//! Recording test doubles for the registry's collaborators

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use super::config::RegistryConfig;
use super::event::ReceiverEvents;
use super::persist::{self, StoredCamera};
use super::store::{CameraRegistry, Collaborators};
use crate::receiver::{ReceiverFactory, SinkFactory, SinkHandle, StreamReceiver, ViewSurface};
use crate::settings::{MemoryStore, SettingsStore, SharedMainStream, SharedVideoSettings};

/// Call recorded by a [`MockReceiver`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SetUri(String),
    SetLowLatency(bool),
    Start(u32),
    Stop,
    StartDecoding(u64),
    StopDecoding,
    SetSink(Option<u64>),
}

pub struct MockReceiver {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl StreamReceiver for MockReceiver {
    fn set_uri(&mut self, uri: &str) {
        self.calls.lock().push(Call::SetUri(uri.to_string()));
    }

    fn set_low_latency(&mut self, enabled: bool) {
        self.calls.lock().push(Call::SetLowLatency(enabled));
    }

    fn start(&mut self, timeout_secs: u32) {
        self.calls.lock().push(Call::Start(timeout_secs));
    }

    fn stop(&mut self) {
        self.calls.lock().push(Call::Stop);
    }

    fn start_decoding(&mut self, sink: &SinkHandle) {
        self.calls.lock().push(Call::StartDecoding(sink.raw()));
    }

    fn stop_decoding(&mut self) {
        self.calls.lock().push(Call::StopDecoding);
    }

    fn set_sink(&mut self, sink: Option<&SinkHandle>) {
        self.calls.lock().push(Call::SetSink(sink.map(SinkHandle::raw)));
    }
}

pub struct CreatedReceiver {
    pub name: String,
    pub events: ReceiverEvents,
    pub calls: Arc<Mutex<Vec<Call>>>,
}

#[derive(Default)]
pub struct MockReceiverFactory {
    pub created: Mutex<Vec<CreatedReceiver>>,
    pub fail: AtomicBool,
}

impl MockReceiverFactory {
    pub fn count(&self) -> usize {
        self.created.lock().len()
    }

    pub fn name(&self, n: usize) -> String {
        self.created.lock()[n].name.clone()
    }

    pub fn events(&self, n: usize) -> ReceiverEvents {
        self.created.lock()[n].events.clone()
    }

    pub fn calls(&self, n: usize) -> Vec<Call> {
        self.created.lock()[n].calls.lock().clone()
    }

    pub fn clear_calls(&self, n: usize) {
        self.created.lock()[n].calls.lock().clear();
    }
}

impl ReceiverFactory for MockReceiverFactory {
    fn create(&self, name: &str, events: ReceiverEvents) -> Option<Box<dyn StreamReceiver>> {
        if self.fail.load(Ordering::Relaxed) {
            return None;
        }

        let calls = Arc::new(Mutex::new(Vec::new()));
        self.created.lock().push(CreatedReceiver {
            name: name.to_string(),
            events,
            calls: Arc::clone(&calls),
        });
        Some(Box::new(MockReceiver { calls }))
    }
}

#[derive(Default)]
pub struct MockSinkFactory {
    next: AtomicU64,
    pub created: Mutex<Vec<u64>>,
    pub released: Mutex<Vec<u64>>,
    pub fail: AtomicBool,
}

impl MockSinkFactory {
    pub fn created(&self) -> Vec<u64> {
        self.created.lock().clone()
    }

    pub fn released(&self) -> Vec<u64> {
        self.released.lock().clone()
    }
}

impl SinkFactory for MockSinkFactory {
    fn create(
        &self,
        _surface: &dyn ViewSurface,
        _receiver: &dyn StreamReceiver,
    ) -> Option<SinkHandle> {
        if self.fail.load(Ordering::Relaxed) {
            return None;
        }

        let raw = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        self.created.lock().push(raw);
        Some(SinkHandle::new(raw))
    }

    fn release(&self, sink: SinkHandle) {
        self.released.lock().push(sink.raw());
    }
}

pub struct TestSurface(pub &'static str);

impl ViewSurface for TestSurface {
    fn label(&self) -> &str {
        self.0
    }
}

pub fn surface(label: &'static str) -> Arc<dyn ViewSurface> {
    Arc::new(TestSurface(label))
}

/// Collaborators plus handles to inspect them
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub receivers: Arc<MockReceiverFactory>,
    pub sinks: Arc<MockSinkFactory>,
    pub video: Arc<SharedVideoSettings>,
    pub router: Arc<SharedMainStream>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            receivers: Arc::new(MockReceiverFactory::default()),
            sinks: Arc::new(MockSinkFactory::default()),
            video: Arc::new(SharedVideoSettings::new()),
            router: Arc::new(SharedMainStream::new()),
        }
    }

    /// Harness whose store already holds `cameras` and `primary`
    pub fn seeded(cameras: &[(&str, &str)], primary: i64) -> Self {
        let harness = Self::new();
        let config = RegistryConfig::default();
        let stored: Vec<StoredCamera> = cameras
            .iter()
            .map(|(name, url)| StoredCamera::new(*name, *url))
            .collect();

        persist::save(harness.store.as_ref(), &config, &stored, None).unwrap();
        harness
            .store
            .set_value(&config.settings_group, &config.primary_key, Value::from(primary))
            .unwrap();
        harness
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            store: self.store.clone(),
            receivers: self.receivers.clone(),
            sinks: self.sinks.clone(),
            video: self.video.clone(),
            router: self.router.clone(),
        }
    }

    pub fn config() -> RegistryConfig {
        RegistryConfig::default().restart_delay(std::time::Duration::from_millis(20))
    }

    pub fn registry(&self) -> CameraRegistry {
        CameraRegistry::new(Self::config(), self.collaborators())
    }
}
