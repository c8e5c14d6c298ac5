//! VTube Studio runtime - transport, request correlation, and discovery
//!
//! This crate provides the low-level session engine for talking to the
//! VTube Studio public API:
//!
//! - **Transport**: one bidirectional text-frame channel (WebSocket, or an
//!   in-memory peer for tests)
//! - **Connection**: correlation of concurrent requests with their responses,
//!   and routing of pushed events to subscriptions
//! - **Discovery**: UDP listener for the API state broadcast
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │    vts-rs    │  Plugin facade, auth gate, event registry
//! └──────┬───────┘
//!        │
//! ┌──────▼───────┐
//! │ vts-runtime  │  This crate
//! │  ┌────────┐  │
//! │  │ Conn   │  │  RequestID correlation, frame routing
//! │  └────────┘  │
//! │  ┌────────┐  │
//! │  │ Trans  │  │  WebSocket / memory transport
//! │  └────────┘  │
//! │  ┌────────┐  │
//! │  │ Disc   │  │  UDP broadcast listener
//! │  └────────┘  │
//! └──────────────┘
//! ```

pub mod connection;
pub mod discovery;
pub mod error;
pub mod transport;

pub use connection::{
	Connection, Dispatch, ErrorHandler, EventHandler, EventSubscription, SubscriptionTable,
};
pub use discovery::{ConnectionTarget, DiscoveredPeer, DiscoveryService};
pub use error::{Error, Result};
pub use transport::{
	MemoryTransport, Responder, Transport, TransportEvent, TransportEvents, WebSocketConfig,
	WebSocketTransport, respond_to,
};
