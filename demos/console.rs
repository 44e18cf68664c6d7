//! Operator console walkthrough with simulated receivers
//!
//! Run with: cargo run --example console [SETTINGS_FILE]
//!
//! Configures three cameras, shows secondary streams, binds views, promotes
//! a secondary to primary and prints the resulting state. The camera list
//! is persisted to SETTINGS_FILE (default: a file in the temp directory), so
//! a second run starts from where the first one ended.
//!
//! Simulated receivers complete a start after 50ms, reject URLs that do not
//! start with `rtsp://`, and drop the `flaky` camera every few seconds to
//! exercise the restart path.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use camera_manager::receiver::{
    ReceiverEvents, ReceiverFactory, ReceiverStatus, SinkFactory, SinkHandle, StreamReceiver,
    ViewSurface,
};
use camera_manager::registry::{CameraRegistry, Collaborators, RegistryConfig};
use camera_manager::settings::{JsonFileStore, SharedMainStream, SharedVideoSettings};

struct SimulatedReceiver {
    name: String,
    uri: String,
    events: ReceiverEvents,
    generation: Arc<AtomicU64>,
}

impl StreamReceiver for SimulatedReceiver {
    fn set_uri(&mut self, uri: &str) {
        self.uri = uri.to_string();
    }

    fn set_low_latency(&mut self, enabled: bool) {
        tracing::trace!(receiver = %self.name, enabled, "low latency");
    }

    fn start(&mut self, timeout_secs: u32) {
        let events = self.events.clone();
        let valid = self.uri.starts_with("rtsp://");
        let flaky = self.name.contains("flaky");
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let current = Arc::clone(&self.generation);
        tracing::info!(receiver = %self.name, uri = %self.uri, timeout_secs, "start");

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            if !valid {
                events.start_complete(ReceiverStatus::InvalidUrl);
                events.stop_complete(ReceiverStatus::InvalidUrl);
                return;
            }
            events.start_complete(ReceiverStatus::Ok);

            if flaky {
                tokio::time::sleep(Duration::from_secs(3)).await;
                // Only drop the session this task started
                if current.load(Ordering::Relaxed) == generation {
                    events.stop_complete(ReceiverStatus::Fail);
                }
            }
        });
    }

    fn stop(&mut self) {
        self.generation.fetch_add(1, Ordering::Relaxed);
    }

    fn start_decoding(&mut self, sink: &SinkHandle) {
        tracing::info!(receiver = %self.name, sink = sink.raw(), "decoding");
    }

    fn stop_decoding(&mut self) {}

    fn set_sink(&mut self, sink: Option<&SinkHandle>) {
        tracing::debug!(receiver = %self.name, sink = ?sink.map(SinkHandle::raw), "sink bound");
    }
}

struct SimulatedEngine;

impl ReceiverFactory for SimulatedEngine {
    fn create(&self, name: &str, events: ReceiverEvents) -> Option<Box<dyn StreamReceiver>> {
        Some(Box::new(SimulatedReceiver {
            name: name.to_string(),
            uri: String::new(),
            events,
            generation: Arc::new(AtomicU64::new(0)),
        }))
    }
}

#[derive(Default)]
struct LoggingSinks {
    next: AtomicU64,
}

impl SinkFactory for LoggingSinks {
    fn create(&self, surface: &dyn ViewSurface, _receiver: &dyn StreamReceiver) -> Option<SinkHandle> {
        let raw = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(sink = raw, surface = surface.label(), "sink created");
        Some(SinkHandle::new(raw))
    }

    fn release(&self, sink: SinkHandle) {
        tracing::info!(sink = sink.raw(), "sink released");
    }
}

struct Tile(String);

impl ViewSurface for Tile {
    fn label(&self) -> &str {
        &self.0
    }
}

/// Pump registry events for `duration`
async fn pump(registry: &mut CameraRegistry, duration: Duration) {
    let deadline = tokio::time::sleep(duration);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => return,
            event = registry.next_event() => match event {
                Some(event) => registry.handle_event(event),
                None => return,
            },
        }
    }
}

fn print_state(registry: &CameraRegistry, main: &SharedMainStream) {
    let cameras = serde_json::to_string_pretty(&registry.cameras()).unwrap_or_default();
    println!("cameras: {}", cameras);
    println!("secondary visible: {}", registry.secondary_streams_visible());
    println!("main stream: {:?}", main.snapshot());
    println!();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("camera_manager=debug".parse()?)
                .add_directive("console=info".parse()?),
        )
        .init();

    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("camera-manager-console.json"));
    println!("Settings file: {}", settings_path.display());

    let video = Arc::new(SharedVideoSettings::new());
    let main_stream = Arc::new(SharedMainStream::new());
    let collaborators = Collaborators {
        store: Arc::new(JsonFileStore::open(&settings_path)?),
        receivers: Arc::new(SimulatedEngine),
        sinks: Arc::new(LoggingSinks::default()),
        video: video.clone(),
        router: main_stream.clone(),
    };

    let mut registry = CameraRegistry::new(RegistryConfig::default(), collaborators);

    if registry.is_empty() {
        registry.add("Gimbal", "rtsp://192.168.144.25:8554/main.264")?;
        registry.add("Belly flaky", "rtsp://192.168.144.26:8554/main.264")?;
        registry.add("Broken", "udp://239.0.0.1:5600")?;
    }
    print_state(&registry, &main_stream);

    let tiles: Vec<Arc<dyn ViewSurface>> = (0..registry.len())
        .map(|index| Arc::new(Tile(format!("tile-{}", index))) as Arc<dyn ViewSurface>)
        .collect();

    registry.set_secondary_visible(true);
    for (index, tile) in tiles.iter().enumerate() {
        if let Err(e) = registry.register_view(index, tile) {
            eprintln!("register view {}: {}", index, e);
        }
    }

    tokio::select! {
        _ = async {
            pump(&mut registry, Duration::from_secs(4)).await;

            video.set_low_latency(true);
            registry.promote(1).ok();
            print_state(&registry, &main_stream);

            pump(&mut registry, Duration::from_secs(4)).await;
        } => {}
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
        }
    }

    registry.shutdown();
    print_state(&registry, &main_stream);

    Ok(())
}
