//! Settings collaborators
//!
//! - [`SettingsStore`]: grouped key-value persistence for the camera list
//! - [`VideoSettings`]: shared video preferences the registry observes
//! - [`MainStreamRouter`]: the main video pipeline the primary camera feeds

pub mod main_stream;
pub mod store;
pub mod video;

pub use main_stream::{MainStreamRouter, MainStreamState, SharedMainStream, VideoSource};
pub use store::{JsonFileStore, MemoryStore, SettingsStore};
pub use video::{SharedVideoSettings, VideoSettings};
