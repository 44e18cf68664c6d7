//! Camera stream management for operator consoles
//!
//! Keeps an ordered, persisted list of network cameras, mirrors one of them
//! (the *primary*) into the application's main video pipeline, and decodes
//! the others (*secondary* streams) into UI surfaces on demand.
//!
//! The decode engine, UI surfaces, settings storage and the main video
//! pipeline are collaborators expressed as traits; see [`receiver`] and
//! [`settings`].
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use camera_manager::registry::{CameraRegistry, Collaborators, RegistryConfig};
//! use camera_manager::settings::{MemoryStore, SharedMainStream, SharedVideoSettings};
//! # fn factories() -> (Arc<dyn camera_manager::receiver::ReceiverFactory>, Arc<dyn camera_manager::receiver::SinkFactory>) { unimplemented!() }
//!
//! # async fn example() {
//! let (receivers, sinks) = factories();
//! let collaborators = Collaborators {
//!     store: Arc::new(MemoryStore::new()),
//!     receivers,
//!     sinks,
//!     video: Arc::new(SharedVideoSettings::new()),
//!     router: Arc::new(SharedMainStream::new()),
//! };
//!
//! let mut registry = CameraRegistry::new(RegistryConfig::default(), collaborators);
//! registry.add("Gimbal", "rtsp://192.168.144.25:8554/main.264").ok();
//!
//! while let Some(event) = registry.next_event().await {
//!     registry.handle_event(event);
//! }
//! # }
//! ```

pub mod error;
pub mod receiver;
pub mod registry;
pub mod settings;

pub use error::{Error, Result};
pub use registry::{CameraInfo, CameraRegistry, Collaborators, RegistryConfig, RegistryError};
