//! Transport layer for the VTube Studio channel.
//!
//! A transport owns the one physical channel to the peer. It hands received
//! text frames over through an internal queue drained with
//! [`Transport::poll_incoming`], and reports lifecycle changes as
//! [`TransportEvent`]s on the channel supplied to [`Transport::start`].
//!
//! Reconnect policy belongs to the transport: the session engine only reacts
//! to `Connected` / `Disconnected` notifications.
//!
//! # Implementations
//!
//! - [`WebSocketTransport`]: `ws://` client built on `tokio-tungstenite`
//! - [`MemoryTransport`]: in-process scripted peer for tests and tooling

mod memory;
mod websocket;

use async_trait::async_trait;
use tokio::sync::mpsc;

pub use memory::{MemoryTransport, Responder, respond_to};
pub use websocket::{WebSocketConfig, WebSocketTransport};

use crate::error::Result;

/// Lifecycle notifications emitted by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
	/// The channel is open (initially or after a transport-driven reconnect).
	Connected,
	/// The channel closed, cleanly or not.
	Disconnected,
	/// A non-fatal transport failure worth surfacing to the host.
	Error(String),
	/// At least one frame is waiting in the intake queue.
	FrameReady,
}

/// Sender half used by transports to report [`TransportEvent`]s.
pub type TransportEvents = mpsc::UnboundedSender<TransportEvent>;

/// A bidirectional text-frame channel to one peer.
#[async_trait]
pub trait Transport: Send + Sync {
	/// Opens the channel to `url` and starts reporting on `events`.
	async fn start(&self, url: &str, events: TransportEvents) -> Result<()>;

	/// Closes the channel. No further `Connected` events are emitted afterwards.
	async fn stop(&self);

	/// Queues one text frame for transmission.
	fn send(&self, text: String) -> Result<()>;

	/// Takes the next received frame, if any, without blocking.
	fn poll_incoming(&self) -> Option<String>;

	/// Returns true while the channel is open.
	fn is_open(&self) -> bool;
}
