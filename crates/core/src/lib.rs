//! Rust plugin library for the VTube Studio public API.
//!
//! A [`Plugin`] connects to VTube Studio over a WebSocket, authenticates with a
//! token the user approved once, and exposes the request/response API as typed
//! async methods. Pushed events are delivered to handlers registered with
//! [`Plugin::subscribe`]; subscriptions survive reconnects.
//!
//! # Example
//!
//! ```ignore
//! use vts::{Plugin, PluginConfig};
//!
//! let plugin = Plugin::new(PluginConfig::new("My Plugin", "Me Myself"))?;
//! plugin.connect().await?;
//!
//! let model = plugin.current_model().await?;
//! println!("{}", model.model.model_name);
//!
//! plugin
//! 	.subscribe("ModelLoadedEvent", None, |event| println!("{event:?}"), |e| eprintln!("{e}"))
//! 	.await?;
//! ```
//!
//! Instances announce themselves on UDP port 47779. Use
//! [`Plugin::poll_discovery`] and [`Plugin::set_port`] to pick one when more
//! than one VTube Studio runs on the machine.

pub mod api;
pub mod auth;
pub mod config;
pub mod events;
pub mod plugin;
pub mod session;
pub mod token;

pub use api::{
	CustomParameter, ItemAnimationOptions, ItemLoadOptions, ItemMoveOptions, ItemUnloadOptions,
};
pub use auth::{AuthGate, AuthState};
pub use config::PluginConfig;
pub use events::{
	EventConfig, EventKind, EventRegistry, ModelLoadedEventConfig, ModelOutlineEventConfig,
	TestEventConfig,
};
pub use plugin::{Plugin, PluginBuilder};
pub use session::{SessionEvent, SessionEvents};
pub use token::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use vts_protocol as protocol;
pub use vts_protocol::{Envelope, EventPayload, Message, Payload, SchemaRegistry};
pub use vts_runtime::{
	Connection, ConnectionTarget, DiscoveredPeer, DiscoveryService, Error, MemoryTransport,
	Result, Transport, TransportEvent, WebSocketConfig, WebSocketTransport, respond_to,
};
