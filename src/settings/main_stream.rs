//! Main video pipeline routing

use parking_lot::RwLock;

/// Source kind of the main video pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoSource {
    /// No source; main video is off
    #[default]
    Disabled,
    /// Network stream addressed by URL
    NetworkStream,
}

/// Global main-stream configuration the primary camera is pushed into
pub trait MainStreamRouter: Send + Sync {
    /// Enable or disable the main stream
    fn set_stream_enabled(&self, enabled: bool);

    /// Set the main stream's source kind
    fn set_video_source(&self, source: VideoSource);

    /// Set the main stream's network address
    fn set_stream_url(&self, url: &str);
}

/// Snapshot of the main stream configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MainStreamState {
    pub enabled: bool,
    pub source: VideoSource,
    pub url: String,
}

/// In-process main stream configuration
#[derive(Debug, Default)]
pub struct SharedMainStream {
    state: RwLock<MainStreamState>,
}

impl SharedMainStream {
    /// Create a disabled main stream
    pub fn new() -> Self {
        Self::default()
    }

    /// Current configuration
    pub fn snapshot(&self) -> MainStreamState {
        self.state.read().clone()
    }
}

impl MainStreamRouter for SharedMainStream {
    fn set_stream_enabled(&self, enabled: bool) {
        self.state.write().enabled = enabled;
    }

    fn set_video_source(&self, source: VideoSource) {
        self.state.write().source = source;
    }

    fn set_stream_url(&self, url: &str) {
        self.state.write().url = url.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_disabled() {
        let router = SharedMainStream::new();

        assert_eq!(router.snapshot(), MainStreamState::default());
        assert_eq!(router.snapshot().source, VideoSource::Disabled);
    }

    #[test]
    fn test_updates_are_visible_in_snapshot() {
        let router = SharedMainStream::new();

        router.set_video_source(VideoSource::NetworkStream);
        router.set_stream_url("rtsp://cam/main");
        router.set_stream_enabled(true);

        let state = router.snapshot();
        assert!(state.enabled);
        assert_eq!(state.source, VideoSource::NetworkStream);
        assert_eq!(state.url, "rtsp://cam/main");
    }
}
