//! Decode pipeline capabilities
//!
//! The registry never decodes video itself. Each camera gets a
//! [`StreamReceiver`] from a [`ReceiverFactory`]; frames are rendered into a
//! [`SinkHandle`] created by a [`SinkFactory`] for a UI [`ViewSurface`].
//!
//! ```text
//!   ViewSurface (UI, weakly held)
//!        │ SinkFactory::create
//!        ▼
//!   SinkHandle ◄── start_decoding ── StreamReceiver ── ReceiverEvents ──► registry queue
//! ```

pub mod sink;
pub mod stream;

pub use sink::{SinkFactory, SinkHandle, ViewSurface};
pub use stream::{ReceiverFactory, StreamReceiver};

pub use crate::registry::event::{ReceiverEvents, ReceiverId, ReceiverStatus};
