//! Wire types for the VTube Studio public API.
//!
//! Every frame exchanged with VTube Studio, in either direction, is a JSON
//! [`Envelope`] carrying routing metadata (`RequestID`, `MessageType`) and a
//! type-specific `Data` payload. This crate owns:
//!
//! - [`Envelope`] and the text encoding used on the wire
//! - [`message_type`] discriminator constants
//! - Typed request/response/event payloads ([`api`], [`events`], [`broadcast`])
//! - [`SchemaRegistry`], the explicit discriminator → decoder table that turns
//!   a raw envelope into a [`Message`] with a tagged [`Payload`]
//!
//! The crate performs no I/O; the session engine in `vts-runtime` drives it.

pub mod api;
pub mod broadcast;
pub mod envelope;
pub mod events;
pub mod message_type;
pub mod schema;

pub use broadcast::BroadcastData;
pub use envelope::{API_NAME, API_VERSION, Envelope, ErrorData, ErrorId, decode_envelope};
pub use events::{EventPayload, EventSubscriptionRequest, EventSubscriptionResponse};
pub use schema::{DecodeFn, Message, Payload, SchemaRegistry};
