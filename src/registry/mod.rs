//! Camera registry
//!
//! The registry owns the ordered camera list, keeps the primary index valid,
//! and drives each camera's receiver/sink pair in response to list edits,
//! view registration, visibility changes and receiver completions.
//!
//! # Architecture
//!
//! ```text
//!          UI thread / owner task
//!   add / update / remove / promote / register_view / set_secondary_visible
//!                      │
//!                      ▼
//!        ┌─────────────────────────────┐   save    ┌───────────────┐
//!        │ CameraRegistry              │──────────►│ SettingsStore │
//!        │   cameras: Vec<CameraEntry> │           └───────────────┘
//!        │   primary: Option<usize>    │  primary  ┌──────────────────┐
//!        │   secondary_visible: bool   │──────────►│ MainStreamRouter │
//!        └──────┬───────────────▲──────┘           └──────────────────┘
//!               │ start/stop    │ RegistryEvent (mpsc)
//!               ▼               │
//!        [StreamReceiver] ── ReceiverEvents ── restart timers, low-latency watch
//! ```
//!
//! # Identity
//!
//! Indices shift when cameras are removed, so asynchronous completions are
//! matched by [`ReceiverId`], scanned against the list at handling time.
//! Completions for receivers that no longer exist are dropped.

pub mod config;
pub mod entry;
pub mod error;
pub mod event;
pub mod persist;
pub mod store;

#[cfg(test)]
pub(crate) mod mock;

pub use config::RegistryConfig;
pub use entry::CameraInfo;
pub use error::RegistryError;
pub use event::{ReceiverEvents, ReceiverId, ReceiverStatus, RegistryChange, RegistryEvent};
pub use persist::{StoredCamera, StoredRecord};
pub use store::{CameraRegistry, Collaborators};
