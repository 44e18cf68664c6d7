//! Video sinks and the UI surfaces they render into

use super::stream::StreamReceiver;

/// UI surface a secondary stream can be rendered into
///
/// The registry only ever holds a `Weak` reference; dropping the last
/// `Arc` on the UI side is equivalent to the surface going away.
pub trait ViewSurface: Send + Sync {
    /// Label used in log output
    fn label(&self) -> &str {
        "surface"
    }
}

/// Opaque frame target created for one surface
///
/// Not `Clone`: each sink has exactly one owner and goes back to its
/// factory through [`SinkFactory::release`].
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct SinkHandle(u64);

impl SinkHandle {
    /// Wrap a factory-specific raw token
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Factory-specific raw token
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Creates and releases sinks
pub trait SinkFactory: Send + Sync {
    /// Create a sink bound to `surface` for `receiver`
    fn create(
        &self,
        surface: &dyn ViewSurface,
        receiver: &dyn StreamReceiver,
    ) -> Option<SinkHandle>;

    /// Release a sink previously returned by `create`
    fn release(&self, sink: SinkHandle);
}
